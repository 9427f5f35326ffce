use indicatif::ProgressBar;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::path::Path;

use super::ReleaseSource;
use super::download::{Platform, ReleaseUrls, download_release};
use super::manifest::{VersionManifest, fetch_manifest};
use crate::config::{StorageConfig, UpgradeConfig};
use crate::error::{Result, UpgradeError};

/// URL layout of one application inside a COS bucket.
///
/// Everything hangs off `{base}/{folder}/{app}` where `base` is
/// `https://{bucket}.cos.{location}.myqcloud.com` unless an explicit endpoint
/// is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosEndpoint {
    app_name: String,
    app_root: String,
}

impl CosEndpoint {
    pub fn new(storage: &StorageConfig, app_name: &str) -> Self {
        let base = match storage.endpoint.as_deref() {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.cos.{}.myqcloud.com",
                storage.bucket, storage.location
            ),
        };
        let folder = storage.folder.trim_matches('/');
        let app_root = if folder.is_empty() {
            format!("{base}/{app_name}")
        } else {
            format!("{base}/{folder}/{app_name}")
        };
        Self {
            app_name: app_name.to_string(),
            app_root,
        }
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/version.json", self.app_root)
    }

    pub fn release_urls(&self, platform: &Platform) -> ReleaseUrls {
        ReleaseUrls::new(&self.app_root, &self.app_name, platform)
    }
}

/// [`ReleaseSource`] backed by a COS bucket over blocking HTTP.
pub struct CosSource {
    client: Client,
    endpoint: CosEndpoint,
    platform: Platform,
}

impl CosSource {
    /// Build the HTTP client and resolve URLs for `config`.
    ///
    /// A client that cannot be constructed means the manifest cannot be
    /// reached either, so that failure is reported as [`UpgradeError::Network`].
    pub fn new(config: &UpgradeConfig) -> Result<Self> {
        let endpoint = CosEndpoint::new(&config.storage, &config.app_name);
        let client = cos_client(&config.app_name).map_err(|source| UpgradeError::Network {
            url: endpoint.manifest_url(),
            source,
        })?;
        Ok(Self {
            client,
            endpoint,
            platform: config.platform(),
        })
    }
}

fn cos_client(app_name: &str) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    let agent = format!("{app_name}-upgrader/{}", env!("CARGO_PKG_VERSION"));
    if let Ok(v) = HeaderValue::from_str(&agent) {
        headers.insert(USER_AGENT, v);
    }
    Client::builder().default_headers(headers).build()
}

impl ReleaseSource for CosSource {
    fn fetch_manifest(&self) -> Result<VersionManifest> {
        fetch_manifest(&self.client, &self.endpoint.manifest_url())
    }

    fn download_release(&self, dest: &Path, progress: &ProgressBar) -> Result<String> {
        let urls = self.endpoint.release_urls(&self.platform);
        download_release(&self.client, &urls, dest, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(folder: &str, endpoint: Option<&str>) -> StorageConfig {
        StorageConfig {
            bucket: "releases-125".into(),
            location: "ap-guangzhou".into(),
            folder: folder.into(),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn default_endpoint_is_cos_virtual_host() {
        let ep = CosEndpoint::new(&storage("tools", None), "scanner");
        assert_eq!(
            ep.manifest_url(),
            "https://releases-125.cos.ap-guangzhou.myqcloud.com/tools/scanner/version.json"
        );
        let urls = ep.release_urls(&Platform::new("darwin", "arm64"));
        assert_eq!(
            urls.binary,
            "https://releases-125.cos.ap-guangzhou.myqcloud.com/tools/scanner/latest/scanner_darwin_arm64/scanner"
        );
    }

    #[test]
    fn folder_slashes_and_empty_folder_are_normalized() {
        let ep = CosEndpoint::new(&storage("/a/b/", Some("http://mirror.local/")), "app");
        assert_eq!(ep.manifest_url(), "http://mirror.local/a/b/app/version.json");

        let ep = CosEndpoint::new(&storage("", Some("http://mirror.local")), "app");
        assert_eq!(ep.manifest_url(), "http://mirror.local/app/version.json");
    }
}
