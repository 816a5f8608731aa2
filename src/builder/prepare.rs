//! Module preparation: invoking the kernel build system.
//!
//! Runs the `modules_prepare` target (preceded by `olddefconfig` in
//! Raspios mode) in the extracted source tree, streaming child output
//! into the log as it is produced.

use crate::builder::cross::Toolchain;
use crate::error::PrepareError;
use crate::models::PrepMode;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Run one make target in the source tree.
async fn run_make(
    source_dir: &Path,
    target: &str,
    jobs: usize,
    cross: Option<&Toolchain>,
) -> Result<(), PrepareError> {
    let mut command = Command::new("make");
    command.arg(format!("-j{}", jobs));
    command.arg(target);
    command.current_dir(source_dir);
    command.env("KBUILD_BUILD_TIMESTAMP", "");

    if let Some(toolchain) = cross {
        command.env("ARCH", toolchain.kernel_arch);
        command.env("CROSS_COMPILE", &toolchain.prefix);
    }

    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    log::info!(
        "[Make] Running make -j{} {} in {}",
        jobs,
        target,
        source_dir.display()
    );

    let mut child = command.spawn().map_err(|e| PrepareError::Spawn {
        cmd: format!("make {}", target),
        source: e,
    })?;

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                log::info!("[Make] {}", line);
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                log::warn!("[Make] {}", line);
            }
        });
    }

    let status = child.wait().await?;
    if !status.success() {
        return Err(PrepareError::MakeFailed {
            target: target.to_string(),
            code: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

/// Prepare a source tree for out-of-tree module builds.
pub async fn prepare_modules(
    source_dir: &Path,
    prep_mode: PrepMode,
    cross: Option<&Toolchain>,
) -> Result<(), PrepareError> {
    let jobs = num_cpus::get();

    if prep_mode == PrepMode::Raspios {
        run_make(source_dir, "olddefconfig", jobs, cross).await?;
    }
    run_make(source_dir, "modules_prepare", jobs, cross).await
}
