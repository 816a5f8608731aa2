//! HTTP fetch helpers shared by every upstream consumer.
//!
//! Two access patterns: small text resources read into memory, and large
//! archives streamed straight to disk. Both distinguish a missing
//! resource (HTTP 404) from other failures, because a missing
//! per-architecture metadata file is expected and skippable while a
//! transport error is not.

use crate::error::FetchError;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Construct the HTTP client used for every fetch in a run.
///
/// The commits API rejects anonymous requests without a User-Agent, so
/// one client with a stable identity is shared across the pipeline.
pub fn http_client() -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(concat!("rpi_sources/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(FetchError::Client)
}

async fn checked_get(client: &Client, url: &str) -> Result<reqwest::Response, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(url.to_string()));
    }
    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    Ok(response)
}

/// Fetch a small text resource into memory.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    log::debug!("[Fetch] GET {}", url);
    let response = checked_get(client, url).await?;
    response.text().await.map_err(|e| FetchError::Transport {
        url: url.to_string(),
        source: e,
    })
}

/// Stream a resource to a file on disk.
pub async fn download_to(client: &Client, url: &str, dest: &Path) -> Result<(), FetchError> {
    log::debug!("[Fetch] GET {} -> {}", url, dest.display());
    let response = checked_get(client, url).await?;

    let mut stream = response.bytes_stream();
    let mut file = tokio::fs::File::create(dest).await?;
    let mut total: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        file.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }
    file.flush().await?;

    log::info!("[Fetch] Downloaded {} ({} bytes)", dest.display(), total);
    Ok(())
}
