use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which step of the upgrade touched the filesystem when an I/O error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Creating or writing the temporary download file.
    Download,
    /// Reading the downloaded file to compute its digest.
    Verify,
    /// Renaming the verified file over the executable.
    Install,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IoOp::Download => "write",
            IoOp::Verify => "read",
            IoOp::Install => "install",
        };
        f.write_str(s)
    }
}

/// Every way an upgrade or version check can fail.
///
/// All variants are terminal for the current invocation. Nothing is retried.
/// [`crate::upgrade::outcome_message`] renders one fixed message per variant.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// The manifest endpoint was unreachable or answered with an error status.
    #[error("cannot reach {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The manifest body is not valid JSON or misses required fields.
    #[error("invalid manifest from {url}")]
    ManifestParse {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Either the current or the published version is not a semantic version.
    #[error("invalid version {input:?}")]
    VersionParse {
        input: String,
        #[source]
        source: semver::Error,
    },

    /// The binary or its checksum artifact could not be fetched.
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("cannot {op} {}", .path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UpgradeError {
    pub(crate) fn io(op: IoOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        UpgradeError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpgradeError>;
