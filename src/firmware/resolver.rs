//! Commit resolution: firmware build identifier -> kernel source commit.

use crate::error::ResolveError;
use crate::firmware::fetch::fetch_text;
use crate::firmware::sources::UpstreamSources;
use crate::models::CommitHash;
use reqwest::Client;

/// Resolve the kernel source commit a firmware build was produced from.
///
/// Fetches the commit-hash text resource published with the build and
/// validates its shape. A single attempt, no retry: a missing resource or
/// anything that is not a 40-character lowercase hex hash means the
/// upstream metadata is missing or malformed and the run is over.
///
/// # Errors
/// Returns `ResolveError::CommitUnavailable` when the resource cannot be
/// fetched and `ResolveError::MalformedCommit` when it has the wrong
/// shape.
pub async fn resolve_commit(
    client: &Client,
    sources: &UpstreamSources,
    build: &str,
) -> Result<CommitHash, ResolveError> {
    let url = sources.commit_hash_url(build);
    let body = fetch_text(client, &url)
        .await
        .map_err(|e| ResolveError::CommitUnavailable {
            build: build.to_string(),
            source: e,
        })?;

    let trimmed = body.trim();
    let commit = trimmed
        .parse::<CommitHash>()
        .map_err(|_| ResolveError::MalformedCommit {
            build: build.to_string(),
            hash: trimmed.to_string(),
        })?;

    log::info!(
        "[Resolver] Build {} -> kernel commit {}",
        build,
        commit.short()
    );
    Ok(commit)
}
