// src/recipe/kitchen/archive.rs

//! Archive and source file utilities for the Kitchen

use crate::error::{Error, Result};
use crate::hash::Checksum;
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("cellar/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {e}")))
}

/// Local path for `file://` URLs and bare paths, `None` for remote URLs
fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(path) = url.strip_prefix("file://") {
        Some(PathBuf::from(path))
    } else if url.contains("://") {
        None
    } else {
        Some(PathBuf::from(url))
    }
}

/// Download a file from a URL
///
/// `file://` URLs and plain paths are copied, which is how local fixtures
/// and mirrors are served.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    if let Some(path) = local_path(url) {
        debug!("Copying local source {}", path.display());
        fs::copy(&path, dest).map_err(|e| {
            Error::DownloadError(format!("Failed to copy {}: {}", path.display(), e))
        })?;
        return Ok(());
    }

    let mut response = http_client()?
        .get(url)
        .send()
        .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::DownloadError(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let mut file = File::create(dest)?;
    let bytes = io::copy(&mut response, &mut file)
        .map_err(|e| Error::DownloadError(format!("Failed to write {}: {}", dest.display(), e)))?;
    debug!("Downloaded {} bytes from {}", bytes, url);

    Ok(())
}

/// Fetch a small text document (release listings)
pub fn fetch_text(url: &str) -> Result<String> {
    if let Some(path) = local_path(url) {
        return fs::read_to_string(&path).map_err(|e| {
            Error::DownloadError(format!("Failed to read {}: {}", path.display(), e))
        });
    }

    let response = http_client()?
        .get(url)
        .send()
        .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::DownloadError(format!(
            "Failed to fetch {}: HTTP {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .map_err(|e| Error::DownloadError(format!("Failed to read body of {}: {}", url, e)))
}

/// Verify a file against a prefixed checksum (`sha256:...`)
pub fn verify_file_checksum(path: &Path, expected: &str) -> Result<()> {
    Checksum::parse_prefixed(expected)?.verify_file(path)
}

/// Extract an archive to a destination directory
///
/// Supports: .tar.gz, .tgz, .tar.xz, .txz, .tar
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let filename = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let reader: Box<dyn Read> = if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
        Box::new(flate2::read::GzDecoder::new(File::open(archive)?))
    } else if filename.ends_with(".tar.xz") || filename.ends_with(".txz") {
        Box::new(xz2::read::XzDecoder::new(File::open(archive)?))
    } else if filename.ends_with(".tar") {
        Box::new(File::open(archive)?)
    } else {
        return Err(Error::ParseError(format!(
            "Unknown archive format: {}",
            filename
        )));
    };

    fs::create_dir_all(dest)?;
    let mut tar = tar::Archive::new(reader);
    tar.set_preserve_permissions(true);
    tar.unpack(dest).map_err(|e| {
        Error::IoError(format!("Failed to extract {}: {}", archive.display(), e))
    })?;

    Ok(())
}

/// The directory builds run in after extraction
///
/// Archives conventionally hold a single top-level directory; if so, that
/// directory is the source root.
pub fn source_root(extracted: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extracted)?
        .filter_map(|e| e.ok())
        .collect();

    if entries.len() == 1 && entries[0].file_type().map(|t| t.is_dir()).unwrap_or(false) {
        Ok(entries[0].path())
    } else {
        Ok(extracted.to_path_buf())
    }
}
