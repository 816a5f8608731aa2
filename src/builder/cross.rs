//! Cross-compile decision.
//!
//! The preparation step runs natively when the host machine already
//! belongs to the target release's ARM family, and through a
//! cross-toolchain otherwise. A missing cross compiler is detected
//! before any work is done for the release.

use crate::error::PrepareError;
use crate::models::ArmFamily;
use std::env;
use std::path::PathBuf;
use std::process::Command;

/// Toolchain settings handed to the kernel build system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// `CROSS_COMPILE=` prefix, e.g. `aarch64-linux-gnu-`.
    pub prefix: String,
    /// `ARCH=` value, e.g. `arm64`.
    pub kernel_arch: &'static str,
}

impl Toolchain {
    pub fn for_family(family: ArmFamily) -> Self {
        Toolchain {
            prefix: family.cross_prefix().to_string(),
            kernel_arch: family.kernel_arch(),
        }
    }
}

/// Machine identifier of the host, as reported by `uname -m`.
pub fn host_machine() -> Result<String, PrepareError> {
    let output = Command::new("uname")
        .arg("-m")
        .output()
        .map_err(|e| PrepareError::Spawn {
            cmd: "uname -m".to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(PrepareError::HostDetect(format!(
            "uname -m exited with {}",
            output.status
        )));
    }

    let machine = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if machine.is_empty() {
        return Err(PrepareError::HostDetect("uname -m printed nothing".to_string()));
    }
    Ok(machine)
}

/// Decide whether a cross-toolchain is needed for the target family.
///
/// Returns `None` for a native build.
pub fn decide(host_machine: &str, family: ArmFamily) -> Option<Toolchain> {
    if family.matches_machine(host_machine) {
        None
    } else {
        Some(Toolchain::for_family(family))
    }
}

/// Locate `<prefix>gcc` on PATH.
///
/// # Errors
/// Returns `PrepareError::CrossCompilerMissing` when no PATH entry
/// contains the executable.
pub fn ensure_available(toolchain: &Toolchain) -> Result<PathBuf, PrepareError> {
    let gcc = format!("{}gcc", toolchain.prefix);
    let path = env::var_os("PATH").unwrap_or_default();

    for dir in env::split_paths(&path) {
        let candidate = dir.join(&gcc);
        if candidate.is_file() {
            log::debug!("[Cross] Found {} at {}", gcc, candidate.display());
            return Ok(candidate);
        }
    }

    Err(PrepareError::CrossCompilerMissing(toolchain.prefix.clone()))
}
