//! Core data types for rpi_sources.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static COMMIT_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9a-f]{40}$").expect("commit hash pattern"));

/// A validated kernel source commit hash.
///
/// Constructible only through parsing: the value is guaranteed to be
/// exactly 40 lowercase hexadecimal characters. Anything else coming back
/// from upstream means the firmware metadata is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHash(String);

impl CommitHash {
    /// Full 40-character hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 8-character short form for display.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl FromStr for CommitHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if COMMIT_HASH_RE.is_match(s) {
            Ok(CommitHash(s.to_string()))
        } else {
            Err(format!(
                "not a 40-character lowercase hex commit hash: {:?}",
                s
            ))
        }
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Architecture suffix distinguishing the kernel variants shipped in one
/// firmware build.
///
/// The firmware snapshot publishes one uname string, one symbol-versions
/// file and one packaged configuration per suffix. Not every suffix exists
/// for every build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchSuffix {
    /// BCM2835 kernel (`kernel.img`), no uname suffix.
    V6,
    /// BCM2836/2837 32-bit kernel (`kernel7.img`).
    V7,
    /// BCM2711 32-bit kernel (`kernel7l.img`).
    V7l,
    /// 64-bit kernel (`kernel8.img`).
    V8,
    /// BCM2712 16k-page kernel (Raspberry Pi 5).
    Pi2712,
}

impl ArchSuffix {
    /// All suffix candidates, in discovery order.
    pub const CANDIDATES: [ArchSuffix; 5] = [
        ArchSuffix::V6,
        ArchSuffix::V7,
        ArchSuffix::V7l,
        ArchSuffix::V8,
        ArchSuffix::Pi2712,
    ];

    /// Suffix as it appears in upstream metadata file names
    /// (`uname_string7l`, `Module8.symvers`, ...).
    pub fn uname_suffix(&self) -> &'static str {
        match self {
            ArchSuffix::V6 => "",
            ArchSuffix::V7 => "7",
            ArchSuffix::V7l => "7l",
            ArchSuffix::V8 => "8",
            ArchSuffix::Pi2712 => "_2712",
        }
    }

    /// Human-readable architecture label used in directory names and the
    /// release-class filter.
    pub fn label(&self) -> &'static str {
        match self {
            ArchSuffix::V6 => "v6",
            ArchSuffix::V7 => "v7",
            ArchSuffix::V7l => "v7l",
            ArchSuffix::V8 => "v8",
            ArchSuffix::Pi2712 => "2712",
        }
    }

    /// ARM family this variant belongs to.
    pub fn family(&self) -> ArmFamily {
        match self {
            ArchSuffix::V6 | ArchSuffix::V7 | ArchSuffix::V7l => ArmFamily::Arm32,
            ArchSuffix::V8 | ArchSuffix::Pi2712 => ArmFamily::Arm64,
        }
    }
}

impl fmt::Display for ArchSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ArchSuffix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v6" => Ok(ArchSuffix::V6),
            "v7" => Ok(ArchSuffix::V7),
            "v7l" => Ok(ArchSuffix::V7l),
            "v8" => Ok(ArchSuffix::V8),
            "2712" => Ok(ArchSuffix::Pi2712),
            _ => Err(format!(
                "unknown architecture label: {} (expected v6, v7, v7l, v8 or 2712)",
                s
            )),
        }
    }
}

/// ARM instruction-set family of a kernel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmFamily {
    Arm32,
    Arm64,
}

impl ArmFamily {
    /// `ARCH=` value for the kernel build system.
    pub fn kernel_arch(&self) -> &'static str {
        match self {
            ArmFamily::Arm32 => "arm",
            ArmFamily::Arm64 => "arm64",
        }
    }

    /// Cross-toolchain prefix for this family.
    pub fn cross_prefix(&self) -> &'static str {
        match self {
            ArmFamily::Arm32 => "arm-linux-gnueabihf-",
            ArmFamily::Arm64 => "aarch64-linux-gnu-",
        }
    }

    /// Whether a `uname -m` machine identifier is native to this family.
    pub fn matches_machine(&self, machine: &str) -> bool {
        match self {
            ArmFamily::Arm32 => matches!(machine, "armv6l" | "armv6hf" | "armv7l" | "armv7hf"),
            ArmFamily::Arm64 => matches!(machine, "aarch64" | "arm64"),
        }
    }
}

/// One architecture-specific kernel release derived from a firmware build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Raw uname version token, e.g. `6.12.36-v8-16k+`.
    pub version: String,
    pub suffix: ArchSuffix,
}

impl Release {
    pub fn new(version: impl Into<String>, suffix: ArchSuffix) -> Self {
        Release {
            version: version.into(),
            suffix,
        }
    }

    /// Version with everything from the first `-` or `+` removed,
    /// e.g. `6.12.36-v8-16k+` -> `6.12.36`.
    pub fn base_version(&self) -> &str {
        match self.version.find(|c| c == '-' || c == '+') {
            Some(idx) => &self.version[..idx],
            None => &self.version,
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.suffix.label())
    }
}

/// Insertion-ordered mapping from release version string to architecture
/// suffix, populated once per run by the enumerator and read-only
/// afterward.
#[derive(Debug, Clone, Default)]
pub struct ReleaseSet {
    releases: Vec<Release>,
}

impl ReleaseSet {
    pub fn new() -> Self {
        ReleaseSet::default()
    }

    /// Insert a release. A release with the same version string replaces
    /// the existing entry (map semantics); insertion order of first
    /// occurrence is preserved.
    pub fn insert(&mut self, release: Release) {
        if let Some(existing) = self
            .releases
            .iter_mut()
            .find(|r| r.version == release.version)
        {
            *existing = release;
        } else {
            self.releases.push(release);
        }
    }

    pub fn suffix_of(&self, version: &str) -> Option<ArchSuffix> {
        self.releases
            .iter()
            .find(|r| r.version == version)
            .map(|r| r.suffix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Release> {
        self.releases.iter()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// How the kernel `.config` for a release is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Fetch the packaged configuration shipped with the firmware build.
    Module,
    /// Read the running kernel's `/proc/config.gz`.
    Proc,
    /// Leave the tree unconfigured.
    Skip,
}

impl ConfigSource {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ConfigSource::Module => "module",
            ConfigSource::Proc => "proc",
            ConfigSource::Skip => "skip",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl FromStr for ConfigSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "module" => Ok(ConfigSource::Module),
            "proc" => Ok(ConfigSource::Proc),
            "skip" => Ok(ConfigSource::Skip),
            _ => Err(format!(
                "unknown config source: {} (expected module, proc or skip)",
                s
            )),
        }
    }
}

/// Distro-specific preparation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepMode {
    /// Run `modules_prepare` directly.
    Standard,
    /// Refresh the packaged configuration with `olddefconfig` first, the
    /// way Raspberry Pi OS kernel trees expect.
    Raspios,
}

impl PrepMode {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            PrepMode::Standard => "standard",
            PrepMode::Raspios => "raspios",
        }
    }
}

impl fmt::Display for PrepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl FromStr for PrepMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(PrepMode::Standard),
            "raspios" => Ok(PrepMode::Raspios),
            _ => Err(format!(
                "unknown preparation mode: {} (expected standard or raspios)",
                s
            )),
        }
    }
}
