use anyhow::Result;
use std::{env, path::PathBuf};

#[derive(Clone)]
pub struct Paths {
    pub config: PathBuf,
}

/// Directory holding `config.toml`: `$XDG_CONFIG_HOME/cosup`, or
/// `$HOME/.config/cosup` when `XDG_CONFIG_HOME` is unset.
pub fn cosup_home() -> Result<PathBuf> {
    let xdg = env::var_os("XDG_CONFIG_HOME");
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    Ok(base.join("cosup"))
}

pub fn paths() -> Result<Paths> {
    let home = cosup_home()?;
    Ok(Paths {
        config: home.join("config.toml"),
    })
}
