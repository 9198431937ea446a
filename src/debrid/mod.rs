//! Real-Debrid REST client
//!
//! Thin wrapper over `reqwest` for the handful of endpoints the tracker
//! needs. Every request carries the bearer credential; when none is
//! configured the call fails with [`Error::NotConfigured`] before anything
//! goes on the wire.
//!
//! Non-success responses become [`Error::Upstream`] with the HTTP status, so
//! callers can tell "not registered yet" (404) and throttling (429) apart
//! from real failures.

use crate::config::DebridConfig;
use crate::error::{Error, Result};
use crate::types::TorrentId;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// Torrent details as reported by `GET /torrents/info/{id}`
///
/// Every field is optional so partially populated answers (common right
/// after submission) still deserialize.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TorrentInfo {
    /// Debrid identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Torrent name
    #[serde(default)]
    pub filename: Option<String>,
    /// Info hash
    #[serde(default)]
    pub hash: Option<String>,
    /// Selected size in bytes
    #[serde(default)]
    pub bytes: Option<i64>,
    /// Hoster domain
    #[serde(default)]
    pub host: Option<String>,
    /// Split size
    #[serde(default)]
    pub split: Option<i64>,
    /// Progress percentage, possibly fractional
    #[serde(default)]
    pub progress: Option<f64>,
    /// Status string
    #[serde(default)]
    pub status: Option<String>,
    /// Download links
    #[serde(default)]
    pub links: Vec<String>,
    /// Completion time (RFC 3339), present once finished
    #[serde(default)]
    pub ended: Option<String>,
}

impl TorrentInfo {
    /// Progress rounded to a whole percentage
    pub fn progress_percent(&self) -> Option<i64> {
        self.progress.map(|p| p.round() as i64)
    }

    /// Completion time as a unix timestamp, when present and parseable
    pub fn ended_timestamp(&self) -> Option<i64> {
        let raw = self.ended.as_deref()?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc).timestamp()),
            Err(e) => {
                debug!(ended = raw, error = %e, "Ignoring unparseable completion time");
                None
            }
        }
    }
}

/// Answer to `addMagnet` and `addTorrent`
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AddedTorrent {
    /// Identifier assigned by the service
    pub id: String,
    /// Resource URI of the new torrent
    #[serde(default)]
    pub uri: Option<String>,
    /// Info hash, when the service already knows it
    #[serde(default)]
    pub hash: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: String,
}

/// Real-Debrid API client
pub struct DebridClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl DebridClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &DebridConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("debrid-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
        })
    }

    /// Whether an API credential is available
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn credential(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(Error::NotConfigured)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send an authorized request and turn non-success statuses into errors
    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let api_key = self.credential()?;
        let url = self.endpoint(path);

        debug!(%method, url = %url, "Calling debrid API");

        let request = self
            .http_client
            .request(method, &url)
            .bearer_auth(api_key);
        let response = build(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<UpstreamErrorBody>(&body)
            .map(|b| b.error)
            .ok()
            .filter(|m| !m.is_empty())
            .or_else(|| Some(body.trim().to_string()).filter(|m| !m.is_empty()))
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_default();

        Err(Error::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetch torrent details
    pub async fn torrent_info(&self, id: &TorrentId) -> Result<TorrentInfo> {
        let response = self
            .send(
                reqwest::Method::GET,
                &format!("torrents/info/{}", urlencoding::encode(id.as_str())),
                |req| req,
            )
            .await?;

        Ok(response.json().await?)
    }

    /// Submit a magnet link
    pub async fn add_magnet(&self, magnet: &str) -> Result<AddedTorrent> {
        let response = self
            .send(reqwest::Method::POST, "torrents/addMagnet", |req| {
                req.form(&[("magnet", magnet)])
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Upload a `.torrent` file as the raw request body
    pub async fn add_torrent_file(&self, torrent: Vec<u8>) -> Result<AddedTorrent> {
        let response = self
            .send(reqwest::Method::PUT, "torrents/addTorrent", |req| {
                req.header(reqwest::header::CONTENT_TYPE, "application/x-bittorrent")
                    .body(torrent)
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Select every file of a torrent so the service starts downloading
    pub async fn select_all_files(&self, id: &TorrentId) -> Result<()> {
        self.send(
            reqwest::Method::POST,
            &format!("torrents/selectFiles/{}", urlencoding::encode(id.as_str())),
            |req| req.form(&[("files", "all")]),
        )
        .await?;

        Ok(())
    }

    /// Remove a torrent from the service
    pub async fn delete_torrent(&self, id: &TorrentId) -> Result<()> {
        self.send(
            reqwest::Method::DELETE,
            &format!("torrents/delete/{}", urlencoding::encode(id.as_str())),
            |req| req,
        )
        .await?;

        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
