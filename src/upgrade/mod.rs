mod cos;
mod download;
mod install;
mod manifest;
mod report;
mod verify;
mod version;

use colored::Colorize;
use indicatif::ProgressBar;
use semver::Version;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::UpgradeConfig;
use crate::error::{IoOp, Result, UpgradeError};
use crate::progress::{download_style, err_style, ok_style, spinner, spinner_style};

pub use cos::{CosEndpoint, CosSource};
pub use download::{Platform, ReleaseUrls, download_release};
pub use install::install_binary;
pub use manifest::{VersionManifest, fetch_manifest};
pub use report::{check_failure_message, error_chain, outcome_message};
pub use verify::{normalize_checksum, sha256_file, verify_file};
pub use version::{is_older_than, parse_version, precedes};

/// Where releases come from.
///
/// [`CosSource`] is the production implementation; anything else (a mirror,
/// a test double) only has to provide these two calls.
pub trait ReleaseSource {
    fn fetch_manifest(&self) -> Result<VersionManifest>;

    /// Write the platform binary to `dest` and return the published checksum text.
    fn download_release(&self, dest: &Path, progress: &ProgressBar) -> Result<String>;
}

/// Non-terminal steps of an upgrade, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingManifest,
    ComparingVersions,
    Downloading,
    Verifying,
    Installing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::FetchingManifest => "fetching latest version info…",
            Stage::ComparingVersions => "comparing versions…",
            Stage::Downloading => "downloading",
            Stage::Verifying => "verifying checksum…",
            Stage::Installing => "installing…",
        };
        f.write_str(s)
    }
}

/// Successful end states of [`Upgrader::upgrade`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The running version is not older than the published one.
    UpToDate { current: Version, latest: Version },
    /// The executable at `path` was replaced.
    Installed {
        from: Version,
        to: Version,
        path: PathBuf,
    },
}

/// Runs the check → download → verify → install sequence once.
///
/// Every failure ends the run immediately; nothing is retried and a partial
/// download is left on disk.
pub struct Upgrader<'a, S> {
    config: &'a UpgradeConfig,
    source: S,
    progress: ProgressBar,
}

impl<'a, S: ReleaseSource> Upgrader<'a, S> {
    pub fn new(config: &'a UpgradeConfig, source: S) -> Self {
        Self {
            config,
            source,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report steps and download progress on `pb` instead of a hidden bar.
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = pb;
        self
    }

    fn enter(&self, stage: Stage) {
        debug!(?stage, "upgrade stage");
        let style = match stage {
            Stage::Downloading => download_style(),
            _ => spinner_style(),
        };
        self.progress.set_style(style);
        self.progress.set_message(stage.to_string());
    }

    /// Upgrade the configured executable if a newer version is published.
    ///
    /// Process:
    /// 1. Fetch `version.json`.
    /// 2. Compare with `current_version`; stop with [`Outcome::UpToDate`] unless
    ///    the current version is strictly older.
    /// 3. Download the platform binary to the temporary path and fetch its checksum.
    /// 4. Hash the download and compare.
    /// 5. Rename the download over the executable.
    pub fn upgrade(&self) -> Result<Outcome> {
        self.enter(Stage::FetchingManifest);
        let manifest = self.source.fetch_manifest()?;

        self.enter(Stage::ComparingVersions);
        let current = parse_version(&self.config.current_version)?;
        let latest = manifest.latest()?;
        if !precedes(&current, &latest) {
            debug!(%current, %latest, "no newer version");
            return Ok(Outcome::UpToDate { current, latest });
        }
        info!(
            %current,
            %latest,
            released = %manifest.release_time_local(),
            "newer version available"
        );

        let dst = self.config.install_path()?;
        let tmp = self.config.tmp_path(&dst);
        if same_location(&tmp, &dst) {
            return Err(UpgradeError::io(
                IoOp::Install,
                dst,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "temporary download path is the executable itself",
                ),
            ));
        }

        self.enter(Stage::Downloading);
        let expected = self.source.download_release(&tmp, &self.progress)?;

        self.enter(Stage::Verifying);
        verify_file(&tmp, &expected)?;

        self.enter(Stage::Installing);
        install_binary(&tmp, &dst)?;

        Ok(Outcome::Installed {
            from: current,
            to: latest,
            path: dst,
        })
    }

    /// Fetch the manifest and nothing else.
    pub fn check_version(&self) -> Result<VersionManifest> {
        self.enter(Stage::FetchingManifest);
        self.source.fetch_manifest()
    }
}

/// Run the upgrade against COS and return the one-line outcome message.
pub fn upgrade_message(config: &UpgradeConfig) -> String {
    let result = CosSource::new(config).and_then(|s| Upgrader::new(config, s).upgrade());
    log_failure(&result);
    outcome_message(&result).to_string()
}

/// CLI command: upgrade the configured application, printing the outcome.
///
/// Returns `false` when the upgrade failed; "already up to date" counts as success.
pub fn cmd_upgrade(config: &UpgradeConfig) -> bool {
    let pb = spinner(&Stage::FetchingManifest.to_string());
    let result = CosSource::new(config)
        .and_then(|s| Upgrader::new(config, s).with_progress(pb.clone()).upgrade());
    pb.finish_and_clear();
    log_failure(&result);

    let msg = outcome_message(&result);
    match &result {
        Ok(Outcome::Installed { .. }) => println!("{}", msg.green()),
        Ok(Outcome::UpToDate { .. }) => println!("{}", msg),
        Err(_) => println!("{}", msg.red()),
    }
    result.is_ok()
}

/// CLI command: print the current version and the latest published one.
///
/// Example output:
/// ```text
/// [+] current version v1.0.0
/// ✔ version info fetched.
/// latest version 1.2.0
/// released at 2024-03-01 10:00:00
/// ```
pub fn cmd_check(config: &UpgradeConfig) {
    println!("[+] current version v{}", config.current_version);

    let pb = spinner(&Stage::FetchingManifest.to_string());
    let result = CosSource::new(config)
        .and_then(|s| Upgrader::new(config, s).with_progress(pb.clone()).check_version());

    match result {
        Ok(m) => {
            pb.set_style(ok_style());
            pb.finish_with_message("version info fetched.");
            println!("latest version {}", m.version);
            println!("released at {}", m.release_time_local());
        }
        Err(e) => {
            pb.set_style(err_style());
            pb.finish_with_message(check_failure_message(&e));
            debug!(error = %error_chain(&e), "version check failed");
        }
    }
}

/// Whether `a` and `b` name the same directory entry.
///
/// Parents are canonicalized so `./app`, `bin/../app` and an absolute path to
/// the same file all compare equal. The file names themselves are compared as
/// given; a parent that does not exist yet is compared literally.
fn same_location(a: &Path, b: &Path) -> bool {
    fn resolve(p: &Path) -> PathBuf {
        let parent = match p.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        match (parent.canonicalize(), p.file_name()) {
            (Ok(dir), Some(name)) => dir.join(name),
            _ => p.to_path_buf(),
        }
    }
    a == b || resolve(a) == resolve(b)
}

fn log_failure(result: &Result<Outcome>) {
    if let Err(e) = result {
        debug!(error = %error_chain(e), "upgrade failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use std::cell::Cell;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// In-memory release source that counts calls.
    struct FakeSource {
        manifest: VersionManifest,
        binary: Vec<u8>,
        checksum: Option<String>,
        fetches: Cell<usize>,
        downloads: Cell<usize>,
    }

    impl FakeSource {
        fn publishing(version: &str, binary: &[u8]) -> Self {
            Self {
                manifest: VersionManifest {
                    version: version.into(),
                    release_time: 1_700_000_000,
                },
                binary: binary.to_vec(),
                checksum: Some(sha256_hex(binary)),
                fetches: Cell::new(0),
                downloads: Cell::new(0),
            }
        }
    }

    impl ReleaseSource for &FakeSource {
        fn fetch_manifest(&self) -> Result<VersionManifest> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(self.manifest.clone())
        }

        fn download_release(&self, dest: &Path, _progress: &ProgressBar) -> Result<String> {
            self.downloads.set(self.downloads.get() + 1);
            fs::write(dest, &self.binary).map_err(|e| UpgradeError::io(IoOp::Download, dest, e))?;
            self.checksum.clone().ok_or_else(|| UpgradeError::Download {
                url: "checksum".into(),
                reason: "server answered 404 Not Found".into(),
            })
        }
    }

    fn config(current: &str) -> (TempDir, UpgradeConfig) {
        let td = tempdir().unwrap();
        let install = td.path().join("app");
        fs::write(&install, b"old build").unwrap();
        let cfg = UpgradeConfig {
            app_name: "app".into(),
            current_version: current.into(),
            storage: StorageConfig {
                bucket: "b".into(),
                location: "l".into(),
                folder: "f".into(),
                endpoint: None,
            },
            tmp_bin_file: Some(td.path().join(".app.download")),
            install_path: Some(install),
            target: Some(Platform::new("linux", "amd64")),
            debug: false,
        };
        (td, cfg)
    }

    #[test]
    fn up_to_date_never_downloads() {
        let (td, cfg) = config("2.0.0");
        for published in ["2.0.0", "1.9.9", "v2.0"] {
            let src = FakeSource::publishing(published, b"new build");
            let outcome = Upgrader::new(&cfg, &src).upgrade().unwrap();
            assert!(matches!(outcome, Outcome::UpToDate { .. }));
            assert_eq!(src.fetches.get(), 1);
            assert_eq!(src.downloads.get(), 0);
        }
        assert!(!td.path().join(".app.download").exists());
        assert_eq!(fs::read(td.path().join("app")).unwrap(), b"old build");
    }

    #[test]
    fn differing_build_metadata_is_up_to_date() {
        let (td, cfg) = config("1.0.0+20240301");
        let src = FakeSource::publishing("1.0.0+20240302", b"new build");

        let outcome = Upgrader::new(&cfg, &src).upgrade().unwrap();

        assert!(matches!(outcome, Outcome::UpToDate { .. }));
        assert_eq!(src.downloads.get(), 0);
        assert!(!td.path().join(".app.download").exists());
        assert_eq!(fs::read(td.path().join("app")).unwrap(), b"old build");
    }

    #[test]
    fn newer_version_is_installed() {
        let (td, cfg) = config("1.0.0");
        let src = FakeSource::publishing("2.0.0", b"new build");

        let outcome = Upgrader::new(&cfg, &src).upgrade().unwrap();

        assert_eq!(
            outcome,
            Outcome::Installed {
                from: Version::new(1, 0, 0),
                to: Version::new(2, 0, 0),
                path: td.path().join("app"),
            }
        );
        assert_eq!(fs::read(td.path().join("app")).unwrap(), b"new build");
        assert!(!td.path().join(".app.download").exists());
    }

    #[test]
    fn checksum_fetch_failure_skips_install() {
        let (td, cfg) = config("1.0.0");
        let mut src = FakeSource::publishing("2.0.0", b"new build");
        src.checksum = None;

        let err = Upgrader::new(&cfg, &src).upgrade().unwrap_err();

        assert!(matches!(err, UpgradeError::Download { .. }));
        assert_eq!(fs::read(td.path().join(".app.download")).unwrap(), b"new build");
        assert_eq!(fs::read(td.path().join("app")).unwrap(), b"old build");
    }

    #[test]
    fn digest_mismatch_leaves_executable_untouched() {
        let (td, cfg) = config("1.0.0");
        let mut src = FakeSource::publishing("2.0.0", b"new build");
        src.checksum = Some(sha256_hex(b"something else"));

        let err = Upgrader::new(&cfg, &src).upgrade().unwrap_err();

        assert!(matches!(err, UpgradeError::ChecksumMismatch { .. }));
        assert_eq!(outcome_message(&Err(err)), report::CHECKSUM_FAILED);
        assert!(td.path().join(".app.download").exists());
        assert_eq!(fs::read(td.path().join("app")).unwrap(), b"old build");
    }

    #[test]
    fn unparsable_versions_stop_before_download() {
        let (_td, cfg) = config("not-a-version");
        let src = FakeSource::publishing("2.0.0", b"new build");
        let err = Upgrader::new(&cfg, &src).upgrade().unwrap_err();
        assert!(matches!(err, UpgradeError::VersionParse { .. }));

        let (_td, cfg) = config("1.0.0");
        let src = FakeSource::publishing("latest", b"new build");
        let err = Upgrader::new(&cfg, &src).upgrade().unwrap_err();
        assert!(matches!(err, UpgradeError::VersionParse { .. }));
        assert_eq!(src.downloads.get(), 0);
    }

    #[test]
    fn temp_path_equal_to_executable_is_refused() {
        let (td, mut cfg) = config("1.0.0");
        cfg.tmp_bin_file = cfg.install_path.clone();
        let src = FakeSource::publishing("2.0.0", b"new build");

        let err = Upgrader::new(&cfg, &src).upgrade().unwrap_err();

        assert!(matches!(err, UpgradeError::Io { op: IoOp::Install, .. }));
        assert_eq!(src.downloads.get(), 0);
        assert_eq!(fs::read(td.path().join("app")).unwrap(), b"old build");
    }

    #[test]
    fn temp_path_reaching_executable_through_dotdot_is_refused() {
        let (td, mut cfg) = config("1.0.0");
        fs::create_dir_all(td.path().join("sub")).unwrap();
        cfg.tmp_bin_file = Some(td.path().join("sub").join("..").join("app"));
        let src = FakeSource::publishing("2.0.0", b"new build");

        let err = Upgrader::new(&cfg, &src).upgrade().unwrap_err();

        assert!(matches!(err, UpgradeError::Io { op: IoOp::Install, .. }));
        assert_eq!(src.downloads.get(), 0);
        assert_eq!(fs::read(td.path().join("app")).unwrap(), b"old build");
    }

    #[test]
    fn same_location_resolves_parents() {
        let td = tempdir().unwrap();
        fs::create_dir_all(td.path().join("bin")).unwrap();
        let app = td.path().join("app");

        assert!(same_location(&app, &td.path().join("bin/../app")));
        assert!(same_location(&app, &td.path().join("./app")));
        assert!(!same_location(&app, &td.path().join(".app.download")));
        assert!(!same_location(&app, &td.path().join("bin/app")));
    }

    #[test]
    fn check_version_only_fetches_manifest() {
        let (_td, cfg) = config("1.0.0");
        let src = FakeSource::publishing("2.0.0", b"new build");

        let m = Upgrader::new(&cfg, &src).check_version().unwrap();

        assert_eq!(m.version, "2.0.0");
        assert_eq!(src.fetches.get(), 1);
        assert_eq!(src.downloads.get(), 0);
    }

    fn sha256_hex(data: &[u8]) -> String {
        use sha2::Digest;
        hex::encode(sha2::Sha256::digest(data))
    }
}
