//! Kernel configuration acquisition and patching.
//!
//! A prepared source tree needs the `.config` the shipped kernel was
//! built with, otherwise out-of-tree modules are built against the wrong
//! option set. The configuration comes either from the firmware snapshot
//! (packaged per release) or from the running kernel's `/proc/config.gz`.

use crate::error::PrepareError;
use crate::firmware::fetch::fetch_text;
use crate::firmware::sources::UpstreamSources;
use crate::models::{ConfigSource, Release};
use flate2::read::GzDecoder;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::fs;
use std::io::Read;
use std::path::Path;

const PROC_CONFIG_GZ: &str = "/proc/config.gz";

static LOCALVERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^CONFIG_LOCALVERSION=.*$").expect("localversion pattern"));

/// Acquire `.config` for a release according to the chosen mode.
///
/// # Errors
/// Returns `PrepareError::Config` when the selected source cannot be
/// read; `Skip` never fails.
pub async fn acquire_config(
    client: &Client,
    sources: &UpstreamSources,
    build: &str,
    release: &Release,
    source_dir: &Path,
    mode: ConfigSource,
) -> Result<(), PrepareError> {
    match mode {
        ConfigSource::Skip => {
            log::info!("[Config] Skipping .config acquisition for {}", release.version);
            Ok(())
        }
        ConfigSource::Module => {
            let url = sources.config_url(build, release.suffix);
            let text = fetch_text(client, &url).await.map_err(|e| {
                PrepareError::Config(format!(
                    "packaged configuration for {} unavailable: {}",
                    release.version, e
                ))
            })?;
            fs::write(source_dir.join(".config"), text)?;
            log::info!("[Config] Installed packaged .config for {}", release.version);
            Ok(())
        }
        ConfigSource::Proc => {
            let text = read_proc_config(Path::new(PROC_CONFIG_GZ))?;
            fs::write(source_dir.join(".config"), text)?;
            log::info!("[Config] Installed running-kernel .config for {}", release.version);
            Ok(())
        }
    }
}

/// Gunzip the running kernel's configuration.
fn read_proc_config(path: &Path) -> Result<String, PrepareError> {
    let raw = fs::read(path)
        .map_err(|e| PrepareError::Config(format!("{} not readable: {}", path.display(), e)))?;
    let mut decoder = GzDecoder::new(&raw[..]);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| PrepareError::Config(format!("{} not gzip text: {}", path.display(), e)))?;
    Ok(text)
}

/// Override `CONFIG_LOCALVERSION` in an acquired `.config` so modules
/// built against the tree report the expected uname.
pub fn apply_local_version(source_dir: &Path, local_version: &str) -> Result<(), PrepareError> {
    let path = source_dir.join(".config");
    let content = fs::read_to_string(&path)
        .map_err(|e| PrepareError::Config(format!("{} not readable: {}", path.display(), e)))?;

    let line = format!("CONFIG_LOCALVERSION=\"{}\"", local_version);
    let patched = if LOCALVERSION_RE.is_match(&content) {
        LOCALVERSION_RE.replace(&content, line.as_str()).into_owned()
    } else {
        format!("{}\n{}\n", content.trim_end(), line)
    };

    fs::write(&path, patched)?;
    log::info!("[Config] CONFIG_LOCALVERSION set to {:?}", local_version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::fetch::http_client;
    use crate::models::ArchSuffix;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[tokio::test]
    async fn test_module_mode_installs_packaged_config() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/raspberrypi/rpi-firmware/fw1/config8")
            .with_status(200)
            .with_body("CONFIG_ARM64=y\nCONFIG_LOCALVERSION=\"-v8\"\n")
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let sources = UpstreamSources::with_base(&server.url());
        let client = http_client().unwrap();
        let release = Release::new("6.12.36-v8+", ArchSuffix::V8);

        acquire_config(
            &client,
            &sources,
            "fw1",
            &release,
            temp.path(),
            ConfigSource::Module,
        )
        .await
        .unwrap();

        let written = fs::read_to_string(temp.path().join(".config")).unwrap();
        assert!(written.contains("CONFIG_ARM64=y"));
    }

    #[tokio::test]
    async fn test_skip_mode_touches_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let sources = UpstreamSources::with_base("http://127.0.0.1:1");
        let client = http_client().unwrap();
        let release = Release::new("6.12.36+", ArchSuffix::V6);

        acquire_config(
            &client,
            &sources,
            "fw1",
            &release,
            temp.path(),
            ConfigSource::Skip,
        )
        .await
        .unwrap();

        assert!(!temp.path().join(".config").exists());
    }

    #[test]
    fn test_read_proc_config_gunzips() {
        let temp = tempfile::tempdir().unwrap();
        let gz_path = temp.path().join("config.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&gz_path).unwrap(), Compression::fast());
        encoder.write_all(b"CONFIG_BCM2835=y\n").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_proc_config(&gz_path).unwrap(), "CONFIG_BCM2835=y\n");
    }

    #[test]
    fn test_apply_local_version_replaces_existing_line() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join(".config"),
            "CONFIG_ARM64=y\nCONFIG_LOCALVERSION=\"\"\nCONFIG_SMP=y\n",
        )
        .unwrap();

        apply_local_version(temp.path(), "-v8-custom").unwrap();
        let patched = fs::read_to_string(temp.path().join(".config")).unwrap();
        assert!(patched.contains("CONFIG_LOCALVERSION=\"-v8-custom\""));
        assert!(!patched.contains("CONFIG_LOCALVERSION=\"\""));
        assert!(patched.contains("CONFIG_SMP=y"));
    }

    #[test]
    fn test_apply_local_version_appends_when_absent() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(".config"), "CONFIG_ARM64=y\n").unwrap();

        apply_local_version(temp.path(), "-v8").unwrap();
        let patched = fs::read_to_string(temp.path().join(".config")).unwrap();
        assert!(patched.ends_with("CONFIG_LOCALVERSION=\"-v8\"\n"));
    }
}
