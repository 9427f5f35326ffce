use std::error::Error;

use super::Outcome;
use crate::error::{IoOp, UpgradeError};

pub const INSTALLED: &str = "[+] upgrade succeeded, please restart the program.";
pub const UP_TO_DATE: &str = "[x] no new version found.";
pub const CANNOT_CHECK: &str =
    "[x] upgrade failed: cannot check for update, please contact the administrator.";
pub const CANNOT_PARSE: &str =
    "[x] upgrade failed: cannot parse update information, please contact the administrator.";
pub const BAD_VERSION: &str =
    "[x] upgrade failed: invalid version information, please contact the administrator.";
pub const DOWNLOAD_FAILED: &str =
    "[x] upgrade failed: download failed, please contact the administrator.";
pub const CANNOT_READ: &str =
    "[x] upgrade failed: cannot read downloaded file, please contact the administrator.";
pub const CHECKSUM_FAILED: &str =
    "[x] upgrade failed: checksum verification failed, please contact the administrator.";
pub const CANNOT_REPLACE: &str =
    "[x] upgrade failed: cannot replace executable, please contact the administrator.";

pub const CHECK_UNREACHABLE: &str =
    "failed to fetch latest version info, please contact the administrator.";
pub const CHECK_UNPARSABLE: &str =
    "failed to parse latest version info, please contact the administrator.";

/// The one user-facing line for an upgrade result.
pub fn outcome_message(result: &Result<Outcome, UpgradeError>) -> &'static str {
    match result {
        Ok(Outcome::Installed { .. }) => INSTALLED,
        Ok(Outcome::UpToDate { .. }) => UP_TO_DATE,
        Err(e) => failure_message(e),
    }
}

fn failure_message(err: &UpgradeError) -> &'static str {
    match err {
        UpgradeError::Network { .. } => CANNOT_CHECK,
        UpgradeError::ManifestParse { .. } => CANNOT_PARSE,
        UpgradeError::VersionParse { .. } => BAD_VERSION,
        UpgradeError::Download { .. } => DOWNLOAD_FAILED,
        UpgradeError::ChecksumMismatch { .. } => CHECKSUM_FAILED,
        UpgradeError::Io { op, .. } => match op {
            IoOp::Download => DOWNLOAD_FAILED,
            IoOp::Verify => CANNOT_READ,
            IoOp::Install => CANNOT_REPLACE,
        },
    }
}

/// Message for a failed version check.
pub fn check_failure_message(err: &UpgradeError) -> &'static str {
    match err {
        UpgradeError::ManifestParse { .. } => CHECK_UNPARSABLE,
        _ => CHECK_UNREACHABLE,
    }
}

/// `err` and all of its sources joined with `: `, for debug diagnostics.
pub fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}
