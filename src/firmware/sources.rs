//! Upstream source URL management.
//!
//! Maps a firmware build identifier and an architecture suffix to the
//! concrete URLs of the metadata published for that build: the kernel
//! commit hash, per-architecture uname strings, symbol versions and
//! packaged configurations, plus the kernel source archive itself.
//! This module is the single place that knows the upstream layout.

use crate::models::{ArchSuffix, CommitHash};

/// Default firmware snapshot repository (`owner/name`).
pub const DEFAULT_FIRMWARE_REPO: &str = "raspberrypi/rpi-firmware";

/// Default kernel source repository (`owner/name`).
pub const DEFAULT_KERNEL_REPO: &str = "raspberrypi/linux";

/// Upstream repository coordinates and URL derivation.
///
/// Every fetch in the pipeline goes through one of these methods. The
/// bases are overridable so tests can point the whole pipeline at a mock
/// server, and so forks of the firmware repositories keep working.
#[derive(Debug, Clone)]
pub struct UpstreamSources {
    firmware_repo: String,
    kernel_repo: String,
    raw_base: String,
    archive_base: String,
    api_base: String,
}

impl Default for UpstreamSources {
    fn default() -> Self {
        UpstreamSources {
            firmware_repo: DEFAULT_FIRMWARE_REPO.to_string(),
            kernel_repo: DEFAULT_KERNEL_REPO.to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            archive_base: "https://github.com".to_string(),
            api_base: "https://api.github.com".to_string(),
        }
    }
}

impl UpstreamSources {
    /// Point every derived URL at a single alternate base. Used by tests
    /// to route the pipeline through a local mock server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        UpstreamSources {
            firmware_repo: DEFAULT_FIRMWARE_REPO.to_string(),
            kernel_repo: DEFAULT_KERNEL_REPO.to_string(),
            raw_base: base.clone(),
            archive_base: base.clone(),
            api_base: base,
        }
    }

    /// URL of the commit-hash text resource for a firmware build.
    pub fn commit_hash_url(&self, build: &str) -> String {
        format!(
            "{}/{}/{}/git_hash",
            self.raw_base, self.firmware_repo, build
        )
    }

    /// URL of the uname-string resource for one architecture suffix.
    pub fn uname_url(&self, build: &str, suffix: ArchSuffix) -> String {
        format!(
            "{}/{}/{}/uname_string{}",
            self.raw_base,
            self.firmware_repo,
            build,
            suffix.uname_suffix()
        )
    }

    /// URL of the symbol-versions file for one architecture suffix.
    pub fn symvers_url(&self, build: &str, suffix: ArchSuffix) -> String {
        format!(
            "{}/{}/{}/Module{}.symvers",
            self.raw_base,
            self.firmware_repo,
            build,
            suffix.uname_suffix()
        )
    }

    /// URL of the packaged kernel configuration for one architecture
    /// suffix.
    pub fn config_url(&self, build: &str, suffix: ArchSuffix) -> String {
        format!(
            "{}/{}/{}/config{}",
            self.raw_base,
            self.firmware_repo,
            build,
            suffix.uname_suffix()
        )
    }

    /// URL of the gzip-compressed kernel source archive for a commit.
    pub fn archive_url(&self, commit: &CommitHash) -> String {
        format!(
            "{}/{}/archive/{}.tar.gz",
            self.archive_base,
            self.kernel_repo,
            commit.as_str()
        )
    }

    /// Commits listing endpoint of the firmware repository.
    pub fn commits_url(&self) -> String {
        format!("{}/repos/{}/commits", self.api_base, self.firmware_repo)
    }
}
