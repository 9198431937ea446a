//! Client for the rclone HTTP mirror of the debrid storage.
//!
//! rclone exposes every finished torrent as a directory under a common root
//! (`/torrents/<name>/`). The tracker only needs three things from it: a
//! cheap existence probe, a directory listing, and a streaming GET.

pub mod listing;

use crate::config::MirrorConfig;
use crate::error::{Error, Result};
use crate::types::FileEntry;
use std::time::Duration;
use tracing::{debug, warn};

pub use listing::parse_listing;

/// Percent-encode each segment of a path, keeping `/` separators
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// rclone HTTP mirror client
pub struct MirrorClient {
    http_client: reqwest::Client,
    base_url: String,
    root: String,
    probe_timeout: Duration,
    listing_timeout: Duration,
    stream_timeout: Duration,
}

impl MirrorClient {
    /// Create a new mirror client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.stream_timeout)
            .user_agent(concat!("debrid-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            root: config.root.trim_matches('/').to_string(),
            probe_timeout: config.probe_timeout,
            listing_timeout: config.listing_timeout,
            stream_timeout: config.stream_timeout,
        })
    }

    /// Relative directory of a torrent on the mirror, with a trailing slash
    pub fn torrent_path(&self, filename: &str) -> String {
        if self.root.is_empty() {
            format!("{}/", encode_path(filename))
        } else {
            format!("{}/{}/", self.root, encode_path(filename))
        }
    }

    fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative.trim_start_matches('/'))
    }

    /// Check whether the torrent directory is served by the mirror
    ///
    /// Any failure counts as "not yet".
    pub async fn probe(&self, filename: &str) -> bool {
        let url = self.url(&self.torrent_path(filename));

        match self
            .http_client
            .head(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Mirror probe negative");
                false
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Mirror probe failed");
                false
            }
        }
    }

    /// List a directory on the mirror
    ///
    /// `path` is relative to the mirror base URL and already encoded (as
    /// returned by [`MirrorClient::torrent_path`]). Failures are logged and
    /// yield an empty list.
    pub async fn list(&self, path: &str) -> Vec<FileEntry> {
        let url = self.url(path);

        let response = match self
            .http_client
            .get(&url)
            .timeout(self.listing_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch mirror listing");
                return Vec::new();
            }
        };

        match response.text().await {
            Ok(html) => parse_listing(&html),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read mirror listing");
                Vec::new()
            }
        }
    }

    /// Open a file inside a torrent directory for streaming
    ///
    /// `file_path` is the decoded path below the torrent directory. Only the
    /// wait for response headers is bounded; the body is streamed without a
    /// deadline.
    pub async fn open_file(&self, filename: &str, file_path: &str) -> Result<reqwest::Response> {
        let url = self.url(&format!(
            "{}{}",
            self.torrent_path(filename),
            encode_path(file_path.trim_start_matches('/'))
        ));

        debug!(url = %url, "Opening mirror file");

        let response = tokio::time::timeout(self.stream_timeout, self.http_client.get(&url).send())
            .await
            .map_err(|_| {
                Error::Other(format!(
                    "Timed out after {:?} waiting for mirror response",
                    self.stream_timeout
                ))
            })??;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("mirror returned {} for {}", status, url),
            });
        }

        Ok(response)
    }
}
