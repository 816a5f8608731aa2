//! Firmware build discovery via the commits listing endpoint.
//!
//! Lets users find valid build identifiers without leaving the tool:
//! every commit in the firmware snapshot repository is a build, and the
//! subject line usually names the kernel version it bumps to.

use crate::error::FetchError;
use crate::firmware::fetch::fetch_text;
use crate::firmware::sources::UpstreamSources;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetail,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    message: String,
}

/// One firmware build as shown in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Full commit sha of the firmware snapshot.
    pub sha: String,
    /// First line of the commit message.
    pub subject: String,
}

impl BuildSummary {
    /// 8-character identifier, enough to use as a build argument.
    pub fn short_sha(&self) -> &str {
        if self.sha.len() >= 8 {
            &self.sha[..8]
        } else {
            &self.sha
        }
    }
}

/// Parse the JSON payload of the commits listing endpoint.
pub fn parse_build_listing(body: &str) -> Result<Vec<BuildSummary>, FetchError> {
    let commits: Vec<ApiCommit> = serde_json::from_str(body)?;
    Ok(commits
        .into_iter()
        .map(|c| BuildSummary {
            sha: c.sha,
            subject: c
                .commit
                .message
                .lines()
                .next()
                .unwrap_or_default()
                .to_string(),
        })
        .collect())
}

/// List the most recent firmware builds.
pub async fn list_recent_builds(
    client: &Client,
    sources: &UpstreamSources,
    count: usize,
) -> Result<Vec<BuildSummary>, FetchError> {
    let url = format!("{}?per_page={}", sources.commits_url(), count);
    let body = fetch_text(client, &url).await?;
    let builds = parse_build_listing(&body)?;
    log::info!("[Commits] {} firmware build(s) listed", builds.len());
    Ok(builds)
}
