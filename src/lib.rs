//! rpi_sources: fetch and prepare Raspberry Pi kernel sources for
//! out-of-tree module builds.
//!
//! Given a firmware build identifier, the pipeline resolves the kernel
//! source commit that build was produced from, enumerates the
//! architecture-specific releases it ships, and for each one downloads
//! the sources and metadata, lays out `usr/src`/`lib/modules`
//! destinations and runs the kernel build system's `modules_prepare`
//! target (cross-compiling when the host is not the target ARM family).
//!
//! The system is organized into functional modules:
//! - **error**: unified error type hierarchy
//! - **models**: core data structures and types
//! - **system**: logging initialization
//! - **firmware**: upstream metadata (commit resolution, release
//!   enumeration, build discovery)
//! - **kernel**: per-release source handling (paths, archive, config,
//!   symbol versions)
//! - **builder**: cross-compile decision and the processing pipeline

// Core foundational modules
pub mod error;
pub mod models;

// Logging initialization
pub mod system;

// Upstream firmware metadata
pub mod firmware;

// Per-release kernel source handling
pub mod kernel;

// Pipeline and build-system invocation
pub mod builder;

// Re-export the log crate for macro usage
pub use log;

// Re-export error types for easy access
pub use error::{FetchError, PlanError, PrepareError, ResolveError, Result};

// Re-export model types for easy access
pub use models::{ArchSuffix, ArmFamily, CommitHash, ConfigSource, PrepMode, Release, ReleaseSet};

// Re-export the pipeline entry points
pub use builder::{BuildOptions, Pipeline};
pub use firmware::UpstreamSources;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
