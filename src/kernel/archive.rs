//! Kernel source archive download and extraction.

use crate::error::{FetchError, PrepareError};
use crate::firmware::fetch::download_to;
use crate::firmware::sources::UpstreamSources;
use crate::models::CommitHash;
use flate2::read::GzDecoder;
use reqwest::Client;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Download the kernel source archive for a commit into the working
/// directory. The archive is keyed by commit, so an existing file is
/// reused instead of re-downloaded.
pub async fn download_kernel_archive(
    client: &Client,
    sources: &UpstreamSources,
    commit: &CommitHash,
    workdir: &Path,
) -> Result<PathBuf, FetchError> {
    tokio::fs::create_dir_all(workdir).await?;

    let archive = workdir.join(format!("linux-{}.tar.gz", commit.short()));
    if archive.is_file() {
        log::info!("[Archive] Reusing cached archive {}", archive.display());
        return Ok(archive);
    }

    download_to(client, &sources.archive_url(commit), &archive).await?;
    Ok(archive)
}

/// Unpack a kernel source archive into the planned source directory.
///
/// Hosted archives wrap everything in a single `<repo>-<commit>/`
/// directory; that leading component is stripped so the Makefile lands
/// directly in `source_dir`.
pub fn extract_kernel_archive(archive: &Path, source_dir: &Path) -> Result<(), PrepareError> {
    log::info!(
        "[Archive] Extracting {} into {}",
        archive.display(),
        source_dir.display()
    );

    let file = File::open(archive)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut tar = tar::Archive::new(decoder);

    let entries = tar
        .entries()
        .map_err(|e| PrepareError::Extract(format!("{}: {}", archive.display(), e)))?;

    let mut unpacked: usize = 0;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| PrepareError::Extract(format!("{}: {}", archive.display(), e)))?;
        let path = entry
            .path()
            .map_err(|e| PrepareError::Extract(format!("{}: {}", archive.display(), e)))?
            .into_owned();

        let stripped: PathBuf = path.components().skip(1).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        let dest = source_dir.join(&stripped);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&dest)
            .map_err(|e| PrepareError::Extract(format!("{}: {}", stripped.display(), e)))?;
        unpacked += 1;
    }

    if unpacked == 0 {
        return Err(PrepareError::Extract(format!(
            "{} contained no entries",
            archive.display()
        )));
    }

    log::info!("[Archive] Extracted {} entries", unpacked);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn build_fixture_archive(path: &Path) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::fast());
        let mut builder = tar::Builder::new(encoder);

        let contents = b"obj-m += demo.o\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                "linux-a94c6c35/Makefile",
                contents.as_slice(),
            )
            .unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                "linux-a94c6c35/scripts/Kbuild.include",
                std::io::empty(),
            )
            .unwrap();

        builder.into_inner().unwrap().finish().unwrap().flush().unwrap();
    }

    #[test]
    fn test_extract_strips_leading_component() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("linux.tar.gz");
        build_fixture_archive(&archive);

        let source_dir = temp.path().join("src");
        std::fs::create_dir_all(&source_dir).unwrap();
        extract_kernel_archive(&archive, &source_dir).unwrap();

        assert!(source_dir.join("Makefile").is_file());
        assert!(source_dir.join("scripts/Kbuild.include").is_file());
        assert!(!source_dir.join("linux-a94c6c35").exists());
    }

    #[test]
    fn test_extract_missing_archive_errors() {
        let temp = tempfile::tempdir().unwrap();
        let result = extract_kernel_archive(&temp.path().join("absent.tar.gz"), temp.path());
        assert!(result.is_err());
    }
}
