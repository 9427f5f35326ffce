use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

use crate::error::{IoOp, Result, UpgradeError};

/// Lowercase hex SHA-256 of the file at `path`, streamed in 8 KiB chunks.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut f = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Normalize published checksum text for comparison.
///
/// Servers often add a trailing newline, some tools publish uppercase hex, and
/// `sha256sum` output carries the file name after the digest. Only the first
/// whitespace-separated token is kept, lowercased.
pub fn normalize_checksum(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Check that the file at `path` hashes to `expected`.
///
/// # Errors
/// - [`UpgradeError::Io`] with [`IoOp::Verify`] if the file cannot be read.
/// - [`UpgradeError::ChecksumMismatch`] on any difference after normalization.
pub fn verify_file(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path).map_err(|e| UpgradeError::io(IoOp::Verify, path, e))?;
    let expected = normalize_checksum(expected);
    debug!(path = %path.display(), %expected, %actual, "verifying download");
    if expected != actual {
        return Err(UpgradeError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}
