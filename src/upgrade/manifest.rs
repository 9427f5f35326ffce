use chrono::{DateTime, Local, Utc};
use reqwest::blocking::Client;
use semver::Version;
use serde::Deserialize;
use tracing::debug;

use super::version::parse_version;
use crate::error::{Result, UpgradeError};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Contents of `version.json` published next to the release binaries.
///
/// Example:
/// ```json
/// {"version": "1.4.0", "release_time": 1700000000}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionManifest {
    pub version: String,
    /// Unix epoch seconds.
    pub release_time: i64,
}

impl VersionManifest {
    /// The published version as a semver value.
    pub fn latest(&self) -> Result<Version> {
        parse_version(&self.version)
    }

    pub fn release_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.release_time, 0)
    }

    /// Release time rendered as `YYYY-MM-DD HH:MM:SS` in the local timezone.
    /// Falls back to the raw number when the timestamp is out of range.
    pub fn release_time_local(&self) -> String {
        match self.release_time_utc() {
            Some(t) => t.with_timezone(&Local).format(TIME_FORMAT).to_string(),
            None => self.release_time.to_string(),
        }
    }
}

/// Fetch and parse the manifest at `url`.
///
/// # Errors
/// - [`UpgradeError::Network`] when the request fails or the server answers with
///   an error status.
/// - [`UpgradeError::ManifestParse`] when the body is not a valid manifest.
pub fn fetch_manifest(client: &Client, url: &str) -> Result<VersionManifest> {
    let network = |source| UpgradeError::Network {
        url: url.to_string(),
        source,
    };

    debug!(url, "fetching manifest");
    let resp = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(network)?;
    let body = resp.text().map_err(network)?;
    debug!(url, body = %body, "manifest response");

    parse_manifest(url, body)
}

fn parse_manifest(url: &str, body: String) -> Result<VersionManifest> {
    serde_json::from_str(&body).map_err(|source| UpgradeError::ManifestParse {
        url: url.to_string(),
        body,
        source,
    })
}
