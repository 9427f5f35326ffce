use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoOp, UpgradeError};
use crate::paths::paths;
use crate::upgrade::Platform;

/// Where releases are published.
///
/// Example TOML:
/// ```toml
/// [storage]
/// bucket   = "releases-1250000000"
/// location = "ap-shanghai"
/// folder   = "tools"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub location: String,
    #[serde(default)]
    pub folder: String,
    /// Replaces `https://{bucket}.cos.{location}.myqcloud.com`, e.g. for a mirror.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Everything the upgrader needs to know about the application it updates.
///
/// Owned by the caller and never modified by the upgrade flow.
#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeConfig {
    pub app_name: String,
    #[serde(default = "default_current_version")]
    pub current_version: String,
    pub storage: StorageConfig,
    #[serde(default)]
    pub tmp_bin_file: Option<PathBuf>,
    #[serde(default)]
    pub install_path: Option<PathBuf>,
    #[serde(default)]
    pub target: Option<Platform>,
    #[serde(default)]
    pub debug: bool,
}

fn default_current_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl UpgradeConfig {
    /// Configured target, or the platform this binary runs on.
    pub fn platform(&self) -> Platform {
        self.target.clone().unwrap_or_else(Platform::current)
    }

    /// The executable to replace: `install_path`, or the running binary.
    pub fn install_path(&self) -> crate::error::Result<PathBuf> {
        match &self.install_path {
            Some(p) => Ok(p.clone()),
            None => std::env::current_exe()
                .map_err(|e| UpgradeError::io(IoOp::Install, &self.app_name, e)),
        }
    }

    /// Temporary download location, `.<app>.download` next to `install` by default
    /// so the final rename stays on one filesystem.
    pub fn tmp_path(&self, install: &Path) -> PathBuf {
        match &self.tmp_bin_file {
            Some(p) => p.clone(),
            None => install.with_file_name(format!(".{}.download", self.app_name)),
        }
    }
}

/// Load an [`UpgradeConfig`] from `path`, or from `$(cosup home)/config.toml`.
///
/// # Errors
/// - Returns an error if the file cannot be read; the message names the path.
/// - Returns an error if the TOML does not match [`UpgradeConfig`].
pub fn load_config(path: Option<&Path>) -> Result<UpgradeConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => paths()?.config,
    };
    let txt = fs::read_to_string(&path)
        .with_context(|| format!("config not found: {}", path.display()))?;
    let cfg: UpgradeConfig =
        toml::from_str(&txt).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}
