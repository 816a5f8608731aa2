//! The per-release processing pipeline.
//!
//! Ties the stages together: resolve the kernel commit, enumerate the
//! releases of the firmware build, download the source archive once, and
//! for each selected release plan paths, fetch metadata, extract sources
//! and run module preparation. Strictly sequential; the first failing
//! step aborts the run.

pub mod cross;
pub mod prepare;

use crate::error::Result;
use crate::firmware::{enumerate_releases, resolve_commit, UpstreamSources};
use crate::kernel::{
    acquire_config, apply_local_version, download_kernel_archive, extract_kernel_archive,
    install_symvers, PathPlanner,
};
use crate::models::{ArchSuffix, ConfigSource, PrepMode, Release};
use std::path::{Path, PathBuf};

pub use cross::Toolchain;

/// Everything the pipeline needs to know about one run, assembled from
/// the CLI and threaded through as a value.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Destination root the `usr/src` and `lib/modules` trees live under.
    pub dest: PathBuf,
    /// Working directory for downloaded archives.
    pub workdir: PathBuf,
    /// Extra-version tag folded into directory names.
    pub extra_version: String,
    /// Optional CONFIG_LOCALVERSION override.
    pub local_version: Option<String>,
    /// Restrict processing to one release class.
    pub only: Option<ArchSuffix>,
    pub config_source: ConfigSource,
    pub prep_mode: PrepMode,
    /// Create `lib/modules/<release>/build` symlinks.
    pub create_links: bool,
}

/// Sequential pipeline over the releases of one firmware build.
pub struct Pipeline {
    client: reqwest::Client,
    sources: UpstreamSources,
    options: BuildOptions,
}

impl Pipeline {
    pub fn new(options: BuildOptions) -> std::result::Result<Self, crate::error::FetchError> {
        Self::with_sources(options, UpstreamSources::default())
    }

    pub fn with_sources(
        options: BuildOptions,
        sources: UpstreamSources,
    ) -> std::result::Result<Self, crate::error::FetchError> {
        Ok(Pipeline {
            client: crate::firmware::fetch::http_client()?,
            sources,
            options,
        })
    }

    /// Process every selected release of the given firmware build.
    pub async fn run(&self, build: &str) -> Result<()> {
        let commit = resolve_commit(&self.client, &self.sources, build).await?;
        let releases = enumerate_releases(&self.client, &self.sources, build).await?;

        let host = cross::host_machine()?;
        log::debug!("[Pipeline] Host machine: {}", host);

        let archive =
            download_kernel_archive(&self.client, &self.sources, &commit, &self.options.workdir)
                .await?;

        let planner = PathPlanner::new(&self.options.dest, &self.options.extra_version);
        for release in releases.iter() {
            if let Some(only) = self.options.only {
                if release.suffix != only {
                    log::info!(
                        "[Pipeline] Skipping {} (restricted to {})",
                        release,
                        only.label()
                    );
                    continue;
                }
            }
            self.process_release(build, &host, &archive, &planner, release)
                .await?;
        }

        Ok(())
    }

    async fn process_release(
        &self,
        build: &str,
        host: &str,
        archive: &Path,
        planner: &PathPlanner,
        release: &Release,
    ) -> Result<()> {
        log::info!("[Pipeline] Processing release {}", release);

        // Environment check first: a missing cross compiler must abort
        // before any per-release network or filesystem work.
        let toolchain = cross::decide(host, release.suffix.family());
        if let Some(toolchain) = &toolchain {
            cross::ensure_available(toolchain)?;
            log::info!(
                "[Pipeline] Cross compiling {} with prefix {}",
                release.version,
                toolchain.prefix
            );
        }

        let source_dir = planner.ensure_source_dir(release)?;
        extract_kernel_archive(archive, &source_dir)?;

        acquire_config(
            &self.client,
            &self.sources,
            build,
            release,
            &source_dir,
            self.options.config_source,
        )
        .await?;
        if let Some(local_version) = &self.options.local_version {
            apply_local_version(&source_dir, local_version)?;
        }

        install_symvers(&self.client, &self.sources, build, release, &source_dir).await?;

        if self.options.create_links {
            planner.link_build_dir(release)?;
        }

        prepare::prepare_modules(&source_dir, self.options.prep_mode, toolchain.as_ref()).await?;

        log::info!(
            "[Pipeline] ✓ {} ready for module builds in {}",
            release.version,
            source_dir.display()
        );
        Ok(())
    }
}
