//! Deterministic cache file naming.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Derives the cache file name for a resource URL.
///
/// The mapping is a pure function of the URL string, so repeated lookups
/// for the same URL always probe the same path.
pub fn cache_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("video_{}.mp4", hex::encode(digest))
}

/// Resolves the final cache path for a URL inside `cache_dir`.
pub fn cache_path(cache_dir: &Path, url: &str) -> PathBuf {
    cache_dir.join(cache_file_name(url))
}

/// Resolves the temporary download path for a URL inside `cache_dir`.
///
/// Partial downloads land here and are renamed into place on success.
pub fn partial_path(cache_dir: &Path, url: &str) -> PathBuf {
    cache_dir.join(format!("{}.part", cache_file_name(url)))
}
