//! Completion report types.

use std::path::PathBuf;

/// Outcome of a single fetch request, delivered exactly once per
/// requested URL.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// The URL exactly as it was requested.
    pub url: String,
    /// Local path of the cached file, or `None` if the fetch failed.
    /// Network errors, filesystem errors and cancellation all report the
    /// same way.
    pub local_path: Option<PathBuf>,
}

impl FetchReport {
    pub(crate) fn success(url: String, local_path: PathBuf) -> Self {
        Self {
            url,
            local_path: Some(local_path),
        }
    }

    pub(crate) fn failure(url: String) -> Self {
        Self {
            url,
            local_path: None,
        }
    }

    /// Whether the resource ended up cached locally.
    pub fn succeeded(&self) -> bool {
        self.local_path.is_some()
    }
}
