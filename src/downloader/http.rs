//! Streaming HTTP transfers.

use anyhow::Result;
use futures_util::StreamExt;
use log::debug;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::progress::ProgressTracker;

/// HTTP downloader used for all cache transfers.
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Downloads `url` to `destination`, streaming the body to disk.
    ///
    /// `destination` is expected to be a temporary path; relocating the
    /// finished file into the cache is the caller's concern.
    pub async fn download_file(
        &self,
        url: &str,
        destination: &Path,
        mut tracker: Option<&mut ProgressTracker>,
    ) -> Result<()> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!("Downloading {url} to {destination:?}");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            ));
        }

        let total_size = response.content_length();
        if let (Some(tracker), Some(size)) = (tracker.as_mut(), total_size) {
            tracker.set_total(size);
        }

        let mut file = File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(tracker) = tracker.as_mut() {
                tracker.update(downloaded);
            }
        }

        file.flush().await?;
        drop(file);

        if downloaded == 0 {
            tokio::fs::remove_file(destination).await?;
            return Err(anyhow::anyhow!("Downloaded file is empty: {url}"));
        }

        if let Some(tracker) = tracker {
            tracker.complete();
        }

        Ok(())
    }
}
