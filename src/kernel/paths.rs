//! Destination layout planning for extracted kernel sources.
//!
//! Derives the per-release directory names and creates the source and
//! module directories plus the `build` symlink that out-of-tree module
//! builds resolve through. Path computation is pure; creation is
//! idempotent, so re-running against an already prepared destination is
//! safe.

use crate::error::PlanError;
use crate::models::Release;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

/// Plans and creates the destination layout for one run.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    dest: PathBuf,
    extra_version: String,
}

impl PathPlanner {
    pub fn new(dest: impl Into<PathBuf>, extra_version: impl Into<String>) -> Self {
        PathPlanner {
            dest: dest.into(),
            extra_version: extra_version.into(),
        }
    }

    /// Destination root this planner resolves against.
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Directory name for a release: base version, extra-version tag,
    /// architecture label. E.g. `6.12.36-v8-16k+` with extra `+rpt-rpi`
    /// and suffix `_2712` becomes `6.12.36+rpt-rpi-2712`.
    pub fn directory_name(&self, release: &Release) -> String {
        format!(
            "{}{}-{}",
            release.base_version(),
            self.extra_version,
            release.suffix.label()
        )
    }

    /// `<dest>/usr/src/<directory name>`
    pub fn source_dir(&self, release: &Release) -> PathBuf {
        self.dest
            .join("usr/src")
            .join(self.directory_name(release))
    }

    /// `<dest>/lib/modules/<directory name>`
    pub fn module_dir(&self, release: &Release) -> PathBuf {
        self.dest
            .join("lib/modules")
            .join(self.directory_name(release))
    }

    /// Create the source directory, returning its path.
    pub fn ensure_source_dir(&self, release: &Release) -> Result<PathBuf, PlanError> {
        let dir = self.source_dir(release);
        fs::create_dir_all(&dir).map_err(|e| PlanError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;
        Ok(dir)
    }

    /// Create the module directory and its `build` symlink pointing at
    /// the source directory, atomically replacing any pre-existing link.
    ///
    /// Idempotent: a link that already points at the source directory is
    /// left untouched.
    pub fn link_build_dir(&self, release: &Release) -> Result<PathBuf, PlanError> {
        let module_dir = self.module_dir(release);
        fs::create_dir_all(&module_dir).map_err(|e| PlanError::CreateDir {
            path: module_dir.clone(),
            source: e,
        })?;

        let link = module_dir.join("build");
        let target = self.source_dir(release);

        if let Ok(existing) = fs::read_link(&link) {
            if existing == target {
                log::debug!("[Paths] Link {} already up to date", link.display());
                return Ok(link);
            }
        }

        // Stage the new link next to the final name, then rename over it.
        let staged = module_dir.join(".build.new");
        let _ = fs::remove_file(&staged);
        symlink(&target, &staged).map_err(|e| PlanError::Symlink {
            link: staged.clone(),
            target: target.clone(),
            source: e,
        })?;
        fs::rename(&staged, &link).map_err(|e| PlanError::Symlink {
            link: link.clone(),
            target: target.clone(),
            source: e,
        })?;

        log::info!("[Paths] Linked {} -> {}", link.display(), target.display());
        Ok(link)
    }
}
