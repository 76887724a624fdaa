// file: src/network/download.rs
// version: 2.0.0
// guid: u1v2w3x4-y5z6-7890-1234-567890uvwxyz

//! Network download utilities

use crate::Result;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Source of release artifacts
#[async_trait::async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Download `url` into the file at `dest`
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;

    /// Fetch a small text resource (checksum lists and the like)
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Network downloader with progress tracking
pub struct NetworkDownloader {
    client: reqwest::Client,
    show_progress: bool,
}

impl NetworkDownloader {
    /// Create a new network downloader
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pages-agent/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            show_progress: true,
        })
    }

    /// Disable the terminal progress bar (service mode, quiet runs)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress_bar(&self, total_size: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total_size);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

#[async_trait::async_trait]
impl ArtifactFetcher for NetworkDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(crate::error::AgentError::NetworkError(format!(
                "Download of {} failed with status: {}",
                url,
                response.status()
            )));
        }

        let pb = self.progress_bar(response.content_length().unwrap_or(0));

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        file.flush().await?;
        pb.finish_and_clear();

        info!("Downloaded {} bytes to: {}", downloaded, dest.display());
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(crate::error::AgentError::NetworkError(format!(
                "Fetch of {} failed with status: {}",
                url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}
