use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::{IoOp, Result, UpgradeError};

#[cfg(unix)]
fn make_executable(p: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perm = fs::metadata(p)?.permissions();
    perm.set_mode(0o755);
    fs::set_permissions(p, perm)
}

#[cfg(not(unix))]
fn make_executable(_p: &Path) -> io::Result<()> {
    Ok(())
}

/// Move the verified download at `tmp` over the executable at `dst`.
///
/// Relies on `rename(2)` semantics: on one filesystem `dst` shows either the old
/// or the new binary, never a partial one. Cross-device moves fail instead of
/// falling back to a copy. On error `tmp` stays where it is and `dst` is untouched.
pub fn install_binary(tmp: &Path, dst: &Path) -> Result<()> {
    make_executable(tmp).map_err(|e| UpgradeError::io(IoOp::Install, tmp, e))?;
    fs::rename(tmp, dst).map_err(|e| UpgradeError::io(IoOp::Install, dst, e))?;
    debug!(from = %tmp.display(), to = %dst.display(), "binary replaced");
    Ok(())
}
