//! Release enumeration: one firmware build -> the kernel releases it ships.
//!
//! The firmware snapshot publishes one uname-string file per architecture
//! suffix. Each is fetched and the version token extracted; candidates
//! whose file is absent or unparseable are skipped, because not every
//! firmware build supports every architecture.

use crate::error::{FetchError, ResolveError};
use crate::firmware::fetch::fetch_text;
use crate::firmware::sources::UpstreamSources;
use crate::models::{ArchSuffix, Release, ReleaseSet};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

// Matches `<digit>.<1-2 digits>.<1-2 digits><non-space...>+` inside a
// uname string, e.g. "Linux version 6.12.36-v8-16k+ (gcc ...)".
static RELEASE_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]\.[0-9]{1,2}\.[0-9]{1,2}\S*\+").expect("release version pattern")
});

/// Extract the release version token from a uname string.
///
/// Returns `None` when the text contains no version-shaped token; the
/// caller treats that as "this architecture is not shipped", not as an
/// error.
pub fn extract_release_version(text: &str) -> Option<String> {
    RELEASE_VERSION_RE
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// Enumerate the releases shipped by a firmware build.
///
/// Fetches one uname string per suffix candidate, in fixed order, and
/// populates a `ReleaseSet` keyed by version string. Missing candidates
/// are skipped; an empty result is fatal.
///
/// # Errors
/// Returns `ResolveError::EmptyReleaseSet` when no architecture variant
/// resolves, and propagates transport or server errors as-is.
pub async fn enumerate_releases(
    client: &Client,
    sources: &UpstreamSources,
    build: &str,
) -> Result<ReleaseSet, ResolveError> {
    let mut set = ReleaseSet::new();

    for suffix in ArchSuffix::CANDIDATES {
        let url = sources.uname_url(build, suffix);
        let body = match fetch_text(client, &url).await {
            Ok(body) => body,
            Err(FetchError::NotFound(_)) => {
                log::debug!(
                    "[Releases] No uname string for {} in build {} (skipped)",
                    suffix.label(),
                    build
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match extract_release_version(&body) {
            Some(version) => {
                log::info!("[Releases] {} -> {}", suffix.label(), version);
                set.insert(Release::new(version, suffix));
            }
            None => {
                log::warn!(
                    "[Releases] Uname string for {} carries no version token (skipped)",
                    suffix.label()
                );
            }
        }
    }

    if set.is_empty() {
        return Err(ResolveError::EmptyReleaseSet(build.to_string()));
    }

    log::info!(
        "[Releases] {} release(s) discovered for build {}",
        set.len(),
        build
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::fetch::http_client;
    use proptest::prelude::*;

    #[test]
    fn test_extract_release_version_from_uname() {
        let uname = "Linux version 6.12.36-v8-16k+ (gcc-12 (Debian)) #1 SMP PREEMPT";
        assert_eq!(
            extract_release_version(uname),
            Some("6.12.36-v8-16k+".to_string())
        );
    }

    #[test]
    fn test_extract_release_version_bare_token() {
        assert_eq!(
            extract_release_version("6.1.21-v7l+"),
            Some("6.1.21-v7l+".to_string())
        );
        assert_eq!(extract_release_version("6.1.21+"), Some("6.1.21+".to_string()));
    }

    #[test]
    fn test_extract_release_version_rejects_non_matching() {
        assert_eq!(extract_release_version(""), None);
        assert_eq!(extract_release_version("Linux version unknown"), None);
        // No trailing plus.
        assert_eq!(extract_release_version("Linux version 6.12.36-v8"), None);
    }

    proptest! {
        #[test]
        fn extraction_returns_exactly_the_token(
            major in 1u8..=9,
            minor in 0u8..=99,
            patch in 0u8..=99,
            tag in "(-v[0-9a-z]{1,4}){0,2}",
        ) {
            let version = format!("{}.{}.{}{}+", major, minor, patch, tag);
            let uname = format!("Linux version {} (gcc) #1 SMP", version);
            prop_assert_eq!(extract_release_version(&uname), Some(version));
        }
    }

    #[tokio::test]
    async fn test_missing_candidates_are_skipped() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        mocks.push(
            server
                .mock("GET", "/raspberrypi/rpi-firmware/fw1/uname_string")
                .with_status(200)
                .with_body("Linux version 6.12.36+ (gcc) #1")
                .create_async()
                .await,
        );
        mocks.push(
            server
                .mock("GET", "/raspberrypi/rpi-firmware/fw1/uname_string8")
                .with_status(200)
                .with_body("Linux version 6.12.36-v8+ (gcc) #1 SMP")
                .create_async()
                .await,
        );
        // uname_string7, uname_string7l and uname_string_2712 are absent.
        for missing in ["uname_string7", "uname_string7l", "uname_string_2712"] {
            mocks.push(
                server
                    .mock(
                        "GET",
                        format!("/raspberrypi/rpi-firmware/fw1/{}", missing).as_str(),
                    )
                    .with_status(404)
                    .create_async()
                    .await,
            );
        }

        let sources = UpstreamSources::with_base(&server.url());
        let client = http_client().unwrap();
        let set = enumerate_releases(&client, &sources, "fw1").await.unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.suffix_of("6.12.36+"), Some(ArchSuffix::V6));
        assert_eq!(set.suffix_of("6.12.36-v8+"), Some(ArchSuffix::V8));
    }

    #[tokio::test]
    async fn test_empty_release_set_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for missing in [
            "uname_string",
            "uname_string7",
            "uname_string7l",
            "uname_string8",
            "uname_string_2712",
        ] {
            mocks.push(
                server
                    .mock(
                        "GET",
                        format!("/raspberrypi/rpi-firmware/fw1/{}", missing).as_str(),
                    )
                    .with_status(404)
                    .create_async()
                    .await,
            );
        }

        let sources = UpstreamSources::with_base(&server.url());
        let client = http_client().unwrap();
        let err = enumerate_releases(&client, &sources, "fw1")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::EmptyReleaseSet(_)));
    }
}
