use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use zip::ZipArchive;

use arsenic_detect::{Label, ServiceConfig};

/// Largest training archive accepted from `training_archive_url`.
pub const MAX_ARCHIVE_BYTES: u64 = 1 << 30;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("download failed: {0}")]
    Download(#[from] Box<ureq::Error>),
    #[error("archive exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches and unpacks the training archive when the training directory is
/// absent and an archive URL is configured. Returns whether it did so.
pub fn bootstrap_training_data(config: &ServiceConfig) -> Result<bool, BootstrapError> {
    let Some(url) = config.training_archive_url.as_deref() else { return Ok(false) };
    if config.training_dir.exists() {
        info!(dir = %config.training_dir.display(), "training data present; skipping download");
        return Ok(false);
    }

    info!(url, "downloading training archive");
    let bytes = fetch_archive(url)?;
    install_archive(&bytes, &config.training_dir)?;
    info!(dir = %config.training_dir.display(), bytes = bytes.len(), "training data ready");
    Ok(true)
}

fn fetch_archive(url: &str) -> Result<Vec<u8>, BootstrapError> {
    let response = ureq::get(url).call().map_err(Box::new)?;
    let mut bytes = Vec::new();
    response.into_reader().take(MAX_ARCHIVE_BYTES + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > MAX_ARCHIVE_BYTES {
        return Err(BootstrapError::TooLarge { limit: MAX_ARCHIVE_BYTES });
    }
    Ok(bytes)
}

/// Unpacks a zip archive into `training_dir`.
///
/// The archive is extracted into a sibling staging directory first and only
/// renamed into place once complete, so a failed extraction never leaves a
/// half-filled training directory behind. Archives that wrap the label
/// directories in a single top-level folder are unwrapped.
pub fn install_archive(bytes: &[u8], training_dir: &Path) -> Result<(), BootstrapError> {
    let staging = staging_dir(training_dir);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    if let Some(parent) = training_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let result = unpack(bytes, &staging, training_dir);
    if staging.exists() {
        let _ = fs::remove_dir_all(&staging);
    }
    result
}

fn unpack(bytes: &[u8], staging: &Path, training_dir: &Path) -> Result<(), BootstrapError> {
    fs::create_dir_all(staging)?;
    ZipArchive::new(Cursor::new(bytes))?.extract(staging)?;
    fs::rename(corpus_root(staging)?, training_dir)?;
    Ok(())
}

fn staging_dir(training_dir: &Path) -> PathBuf {
    let name = training_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "training_data".to_owned());
    training_dir.with_file_name(format!("{}.partial", name))
}

/// The extracted directory holding the label folders: `staging` itself, or
/// its only subdirectory when that one holds them.
fn corpus_root(staging: &Path) -> Result<PathBuf, BootstrapError> {
    if has_label_dir(staging) {
        return Ok(staging.to_path_buf());
    }
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(staging)? {
        let path = entry?.path();
        if path.is_dir() && path.file_name().map_or(true, |n| n != "__MACOSX") {
            subdirs.push(path);
        }
    }
    match subdirs.as_slice() {
        [only] if has_label_dir(only) => Ok(only.clone()),
        _ => Ok(staging.to_path_buf()),
    }
}

fn has_label_dir(dir: &Path) -> bool {
    Label::ALL.iter().any(|label| dir.join(label.dir_name()).is_dir())
}
