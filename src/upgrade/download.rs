use indicatif::ProgressBar;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::{IoOp, Result, UpgradeError};

/// Target `(os, arch)` pair used to pick the release artifact.
///
/// Names follow the Go toolchain (`linux`, `darwin`, `windows` / `amd64`,
/// `arm64`, `386`) because that is how release folders are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "powerpc64" => "ppc64",
            other => other,
        };
        Self::new(os, arch)
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

/// Binary and checksum locations for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseUrls {
    pub binary: String,
    pub checksum: String,
}

impl ReleaseUrls {
    /// Build both URLs below `app_root` (`{base}/{folder}/{app}`).
    ///
    /// ```text
    /// {app_root}/latest/{app}_{os}_{arch}/{app}[.exe]
    /// {app_root}/latest/{app}_{os}_{arch}/{app}[.exe]_{os}_{arch}.sha256
    /// ```
    pub fn new(app_root: &str, app_name: &str, platform: &Platform) -> Self {
        let Platform { os, arch } = platform;
        let mut binary = format!("{app_root}/latest/{app_name}_{os}_{arch}/{app_name}");
        if platform.is_windows() {
            binary.push_str(".exe");
        }
        let checksum = format!("{binary}_{os}_{arch}.sha256");
        Self { binary, checksum }
    }
}

/// Download the release binary into `dest` and fetch its published checksum.
///
/// Process:
/// 1. GET the binary. Anything but `200 OK` fails before `dest` is touched.
/// 2. Stream the body into `dest` (created or truncated), teeing the byte
///    count into `progress`.
/// 3. GET the checksum artifact. If that fails the written file stays on disk
///    but the download as a whole is a failure.
///
/// Returns the trimmed checksum text.
pub fn download_release(
    client: &Client,
    urls: &ReleaseUrls,
    dest: &Path,
    progress: &ProgressBar,
) -> Result<String> {
    debug!(binary = %urls.binary, checksum = %urls.checksum, "release urls");

    let mut resp = client
        .get(&urls.binary)
        .send()
        .map_err(|e| download_error(&urls.binary, e.to_string()))?;
    if resp.status() != StatusCode::OK {
        debug!(url = %urls.binary, status = %resp.status(), "binary not available");
        return Err(download_error(
            &urls.binary,
            format!("server answered {}", resp.status()),
        ));
    }

    if let Some(len) = resp.content_length() {
        progress.set_length(len);
    }
    let file = create_download_file(dest).map_err(|e| UpgradeError::io(IoOp::Download, dest, e))?;
    let written = io::copy(&mut resp, &mut progress.wrap_write(file))
        .map_err(|e| UpgradeError::io(IoOp::Download, dest, e))?;
    debug!(path = %dest.display(), bytes = written, "binary written");

    let checksum = client
        .get(&urls.checksum)
        .send()
        .map_err(|e| download_error(&urls.checksum, e.to_string()))?;
    if checksum.status() != StatusCode::OK {
        debug!(url = %urls.checksum, status = %checksum.status(), "checksum not available");
        return Err(download_error(
            &urls.checksum,
            format!("server answered {}", checksum.status()),
        ));
    }
    let text = checksum
        .text()
        .map_err(|e| download_error(&urls.checksum, e.to_string()))?;

    Ok(text.trim().to_string())
}

fn download_error(url: &str, reason: String) -> UpgradeError {
    UpgradeError::Download {
        url: url.to_string(),
        reason,
    }
}

fn create_download_file(dest: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o755);
    }
    opts.open(dest)
}
