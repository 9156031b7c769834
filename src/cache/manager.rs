//! The cache manager itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::{AbortRegistration, Abortable};
use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::downloader::{HttpDownloader, ProgressTracker};
use crate::utils::paths;

use super::config::CacheConfig;
use super::models::FetchReport;
use super::naming;
use super::registry::{Admission, InFlightRegistry};

/// Download cache for remote video resources.
///
/// Fetches every requested URL to local storage at most once, caps the
/// number of concurrent transfers, and answers synchronous URL-to-path
/// lookups. Cheap to clone; clones share the registry, the slot pool and
/// the cache directory.
#[derive(Clone)]
pub struct VideoCacheManager {
    downloader: Arc<HttpDownloader>,
    registry: Arc<InFlightRegistry>,
    slots: Arc<Semaphore>,
    cache_dir: Arc<PathBuf>,
}

impl VideoCacheManager {
    /// Creates a manager with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a manager from an explicit configuration, ensuring the
    /// cache directory exists.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        let cache_dir = match config.cache_dir {
            Some(dir) => dir,
            None => paths::default_cache_dir()?,
        };
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {cache_dir:?}"))?;

        let downloader = HttpDownloader::new(
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
        )?;

        Ok(Self {
            downloader: Arc::new(downloader),
            registry: Arc::new(InFlightRegistry::new()),
            slots: Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1))),
            cache_dir: Arc::new(cache_dir),
        })
    }

    /// Directory cached files are stored in.
    pub fn cache_dir(&self) -> &Path {
        self.cache_dir.as_path()
    }

    /// Schedules a fetch-if-absent operation for every URL in the batch.
    ///
    /// Returns immediately; each URL's outcome arrives on the returned
    /// channel exactly once, in no guaranteed order across URLs. A request
    /// for a URL whose transfer is already running fans in to that
    /// transfer instead of starting a duplicate download.
    pub fn cache_resources<I, S>(&self, urls: I) -> UnboundedReceiver<FetchReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut scheduled = 0usize;
        for url in urls {
            self.schedule_fetch(url.into(), &tx);
            scheduled += 1;
        }
        if scheduled == 0 {
            warn!("cache_resources called with an empty URL list");
        }

        rx
    }

    /// Synchronous cache probe: returns the local path only if a file
    /// already exists at the deterministic cache path for `url`.
    ///
    /// Does not verify file integrity or completeness.
    pub fn lookup(&self, url: &str) -> Option<PathBuf> {
        let path = naming::cache_path(&self.cache_dir, url);
        path.is_file().then_some(path)
    }

    /// Cancels the in-flight transfer for `url`, if any.
    ///
    /// The transfer's completion path still releases its slot, removes the
    /// registry entry and reports failure to every waiter.
    pub fn cancel(&self, url: &str) {
        if self.registry.cancel(url) {
            info!("Cancelled download of {url}");
        }
    }

    /// Cancels every in-flight transfer.
    pub fn cancel_all(&self) {
        let cancelled = self.registry.cancel_all();
        if cancelled > 0 {
            info!("Cancelled {cancelled} in-flight downloads");
        }
    }

    /// Number of transfers currently registered as in flight.
    pub fn in_flight_count(&self) -> usize {
        self.registry.in_flight_count()
    }

    /// Deletes every file in the cache directory, returning how many were
    /// removed. Best-effort: failures are logged per file and the sweep
    /// continues.
    pub async fn clear(&self) -> usize {
        let mut entries = match tokio::fs::read_dir(self.cache_dir.as_path()).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read cache directory {:?}: {e}", self.cache_dir);
                return 0;
            }
        };

        let mut removed = 0usize;
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    match tokio::fs::remove_file(&path).await {
                        Ok(()) => removed += 1,
                        Err(e) => warn!("Failed to remove cached file {path:?}: {e}"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to walk cache directory {:?}: {e}", self.cache_dir);
                    break;
                }
            }
        }

        info!("Cache cleared, {removed} files removed");
        removed
    }

    /// Total size in bytes of the files in the cache directory.
    /// Best-effort: unreadable entries count as zero.
    pub fn cache_size_bytes(&self) -> u64 {
        let Ok(entries) = std::fs::read_dir(self.cache_dir.as_path()) else {
            return 0;
        };
        entries
            .flatten()
            .filter_map(|entry| entry.metadata().ok())
            .filter(|metadata| metadata.is_file())
            .map(|metadata| metadata.len())
            .sum()
    }

    fn schedule_fetch(&self, url: String, reports: &UnboundedSender<FetchReport>) {
        // Malformed URLs fail immediately, without touching the network.
        if reqwest::Url::parse(&url).is_err() {
            warn!("Invalid URL: {url}");
            let _ = reports.send(FetchReport::failure(url));
            return;
        }

        // Cache hit: report the existing file, no network access.
        if let Some(path) = self.lookup(&url) {
            debug!("Cache hit for {url}");
            let _ = reports.send(FetchReport::success(url, path));
            return;
        }

        match self.registry.admit(&url, reports) {
            Admission::Joined => {
                debug!("Joining in-flight download of {url}");
            }
            Admission::Started(registration) => {
                self.spawn_transfer(url, registration);
            }
        }
    }

    fn spawn_transfer(&self, url: String, registration: AbortRegistration) {
        let manager = self.clone();
        tokio::spawn(async move {
            let destination = naming::cache_path(&manager.cache_dir, &url);
            let partial = naming::partial_path(&manager.cache_dir, &url);

            let transfer = manager.transfer(&url, &destination, &partial);
            let outcome = match Abortable::new(transfer, registration).await {
                Ok(Ok(())) => Some(destination.clone()),
                Ok(Err(e)) => {
                    warn!("Download of {url} failed: {e:#}");
                    None
                }
                Err(_aborted) => {
                    info!("Download of {url} was cancelled");
                    None
                }
            };

            if outcome.is_none() {
                // A failed or aborted transfer may leave a partial file.
                let _ = tokio::fs::remove_file(&partial).await;
            }

            let report = match outcome {
                Some(path) => FetchReport::success(url.clone(), path),
                None => FetchReport::failure(url.clone()),
            };
            for waiter in manager.registry.finish(&url) {
                let _ = waiter.send(report.clone());
            }
        });
    }

    /// The bounded transfer: waits for a slot, streams the body to a
    /// partial file, then renames it into place in a single step.
    async fn transfer(&self, url: &str, destination: &Path, partial: &Path) -> Result<()> {
        // Another transfer may have finished between scheduling and now.
        if destination.is_file() {
            debug!("{url} is already cached");
            return Ok(());
        }

        let _permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .context("Slot pool closed")?;

        let name = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        let mut tracker = ProgressTracker::new(name);

        self.downloader
            .download_file(url, partial, Some(&mut tracker))
            .await?;

        // Atomic rename replaces any stale destination file in one step.
        tokio::fs::rename(partial, destination)
            .await
            .with_context(|| format!("Failed to move {partial:?} into cache"))?;

        Ok(())
    }
}
