//! Symbol-version metadata installation.

use crate::error::PrepareError;
use crate::firmware::fetch::fetch_text;
use crate::firmware::sources::UpstreamSources;
use crate::models::Release;
use reqwest::Client;
use std::fs;
use std::path::Path;

/// Fetch the per-release symbol-versions file into the source tree as
/// `Module.symvers`, so out-of-tree modules link against the symbol CRCs
/// of the shipped kernel.
pub async fn install_symvers(
    client: &Client,
    sources: &UpstreamSources,
    build: &str,
    release: &Release,
    source_dir: &Path,
) -> Result<(), PrepareError> {
    let url = sources.symvers_url(build, release.suffix);
    let text = fetch_text(client, &url).await.map_err(|e| {
        PrepareError::Symvers(format!("{} for {}: {}", url, release.version, e))
    })?;

    fs::write(source_dir.join("Module.symvers"), text)?;
    log::info!("[Symvers] Installed Module.symvers for {}", release.version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::fetch::http_client;
    use crate::models::ArchSuffix;

    #[tokio::test]
    async fn test_installs_symvers_file() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/raspberrypi/rpi-firmware/fw1/Module7l.symvers")
            .with_status(200)
            .with_body("0x12345678\tprintk\tvmlinux\tEXPORT_SYMBOL\n")
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let sources = UpstreamSources::with_base(&server.url());
        let client = http_client().unwrap();
        let release = Release::new("6.12.36-v7l+", ArchSuffix::V7l);

        install_symvers(&client, &sources, "fw1", &release, temp.path())
            .await
            .unwrap();

        let written = fs::read_to_string(temp.path().join("Module.symvers")).unwrap();
        assert!(written.contains("printk"));
    }

    #[tokio::test]
    async fn test_missing_symvers_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/raspberrypi/rpi-firmware/fw1/Module8.symvers")
            .with_status(404)
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let sources = UpstreamSources::with_base(&server.url());
        let client = http_client().unwrap();
        let release = Release::new("6.12.36-v8+", ArchSuffix::V8);

        let err = install_symvers(&client, &sources, "fw1", &release, temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PrepareError::Symvers(_)));
    }
}
