//! Resource fetcher: probe a URL, then stream it into a destination directory.

use crate::scan::error::ScanError;
use crate::scan::probe::{classify, probe, ProbeOutcome};
use crate::scan::PoliteClient;
use reqwest::Url;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Read size when streaming a response body to disk (2.5 MB).
pub const CHUNK_SIZE: usize = 256 * 10240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Retrieved over the network in this call.
    Downloaded,
    /// File was already on disk and overwrite was off; nothing was retrieved.
    AlreadyPresent,
}

/// Where a resolved resource lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub path: PathBuf,
    pub status: FetchStatus,
}

/// Final path segment of a URL, if any.
pub fn url_basename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .last()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Fetch `url` into `dest_dir/<basename>`.
///
/// `Ok(None)` when the resource is absent (probe failed, HTTP error, transport error while
/// streaming). `Err` only for filesystem failures. The body is written to a temporary file in
/// `dest_dir` and renamed onto the final path once complete, so an interrupted transfer never
/// leaves a truncated file under the final name.
pub fn fetch(
    client: &mut PoliteClient,
    url: &str,
    dest_dir: &Path,
    overwrite: bool,
) -> Result<Option<Fetched>, ScanError> {
    if !probe(client, url) {
        return Ok(None);
    }

    let Some(basename) = url_basename(url) else {
        tracing::warn!("No file name in URL: {}", url);
        return Ok(None);
    };
    let path = dest_dir.join(basename);

    if path.is_file() && !overwrite {
        tracing::info!("Already downloaded: {}", path.display());
        return Ok(Some(Fetched {
            path,
            status: FetchStatus::AlreadyPresent,
        }));
    }

    let mut response = match client.get(url) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("URL Error: {} {}", e, url);
            return Ok(None);
        }
    };
    match classify(response.status(), response.url().as_str()) {
        ProbeOutcome::Found => {}
        outcome => {
            tracing::warn!("Retrieval of {} failed: {:?}", url, outcome);
            return Ok(None);
        }
    }

    let mut tmp = NamedTempFile::new_in(dest_dir).map_err(|e| ScanError::CreateFile {
        path: dest_dir.to_path_buf(),
        source: e,
    })?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match response.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                // tmp is removed on drop
                tracing::warn!("Transfer of {} interrupted: {}", url, e);
                return Ok(None);
            }
        };
        tmp.write_all(&buf[..n]).map_err(|e| ScanError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
    }

    tmp.persist(&path).map_err(|e| ScanError::Persist {
        path: path.clone(),
        source: e.error,
    })?;
    set_readable(&path)?;

    Ok(Some(Fetched {
        path,
        status: FetchStatus::Downloaded,
    }))
}

/// Temp files are created owner-only; downloaded pages should be group/world readable.
#[cfg(unix)]
fn set_readable(path: &Path) -> Result<(), ScanError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)).map_err(|e| {
        ScanError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> Result<(), ScanError> {
    Ok(())
}
