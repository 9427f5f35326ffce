//! Crate entry point for **cosup**.
//!
//! Self-update for command-line tools whose releases live in a Tencent COS
//! bucket: read `version.json`, compare it with the running version, download
//! the platform binary, check it against the published SHA-256 and rename it
//! over the executable.
//!
//! Embedders build an [`UpgradeConfig`] and call [`upgrade_message`] or drive
//! an [`Upgrader`] directly with their own [`ReleaseSource`].

mod config;
mod error;
mod logging;
mod paths;
mod progress;
mod upgrade;

/// Re-export commonly used types and commands so they can be accessed from `cosup::*`.
pub use config::{StorageConfig, UpgradeConfig, load_config};
pub use error::{IoOp, Result, UpgradeError};
pub use logging::init as init_logging;
pub use paths::cosup_home;
pub use upgrade::{
    CosEndpoint, CosSource, Outcome, Platform, ReleaseSource, ReleaseUrls, Stage, Upgrader,
    VersionManifest, check_failure_message, cmd_check, cmd_upgrade, download_release,
    error_chain, fetch_manifest, install_binary, is_older_than, normalize_checksum,
    outcome_message, parse_version, precedes, sha256_file, upgrade_message, verify_file,
};
