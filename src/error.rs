//! Unified error type hierarchy for rpi_sources.
//!
//! Provides structured error handling with FetchError, ResolveError,
//! PlanError, and PrepareError. No error is recovered locally; every
//! failure aborts the current run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Network fetch and download errors.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Resource not found upstream: {0}")]
    NotFound(String),

    #[error("Upstream returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Failed to construct HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Malformed upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error while saving download: {0}")]
    Io(#[from] io::Error),
}

/// Build-identifier and release resolution errors.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Commit metadata unavailable for build {build}: {source}")]
    CommitUnavailable { build: String, source: FetchError },

    #[error("Malformed kernel commit hash {hash:?} for build {build}")]
    MalformedCommit { build: String, hash: String },

    #[error("No kernel release resolved for build {0}")]
    EmptyReleaseSet(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Destination layout errors (directory and symlink creation).
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to link {link} -> {target}: {source}")]
    Symlink {
        link: PathBuf,
        target: PathBuf,
        source: io::Error,
    },
}

/// Source preparation errors (extraction, configuration, module prep).
#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Kernel configuration unavailable: {0}")]
    Config(String),

    #[error("Symbol versions unavailable: {0}")]
    Symvers(String),

    #[error("Failed to determine host machine type: {0}")]
    HostDetect(String),

    #[error("Cross compiler '{0}gcc' not found in PATH")]
    CrossCompilerMissing(String),

    #[error("Failed to spawn '{cmd}': {source}")]
    Spawn { cmd: String, source: io::Error },

    #[error("make {target} failed with exit code {code}")]
    MakeFailed { target: String, code: i32 },

    #[error("IO error during preparation: {0}")]
    Io(#[from] io::Error),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Top-level result type for operations that may fail.
/// Use this as the return type for all fallible pipeline functions.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
