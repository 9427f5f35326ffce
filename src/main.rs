//! # cosup
//!
//! **cosup** upgrades a command-line tool from releases published in a
//! Tencent COS bucket.
//!
//! Features:
//! - `cosup upgrade` downloads, verifies and installs the latest release
//! - `cosup check` shows the running and the latest published version
//! - `cosup home` prints the directory holding `config.toml`
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{Parser, Subcommand};
use cosup::{UpgradeConfig, cmd_check, cmd_upgrade, cosup_home, init_logging, load_config};
use std::path::{Path, PathBuf};

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "cosup",
    version,
    about = "cosup - self-update from Tencent COS releases",
    arg_required_else_help = true
)]
struct Cli {
    /// Config file (default: $(cosup home)/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print diagnostic details (URLs, response bodies, underlying errors)
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Download and install the latest release if it is newer
    Upgrade,
    /// Show the current and the latest published version
    Check,
    /// Print the cosup home directory
    Home,
}

/// Load the config file and apply the global `--debug` flag.
fn upgrade_config(path: Option<&Path>, debug: bool) -> Result<UpgradeConfig> {
    let mut cfg = load_config(path)?;
    cfg.debug |= debug;
    init_logging(cfg.debug);
    Ok(cfg)
}

/// CLI entry point.
///
/// Parses arguments with `clap` and executes the selected subcommand.
/// A failed upgrade exits with status 1 after printing its message.
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Upgrade => {
            let cfg = upgrade_config(cli.config.as_deref(), cli.debug)?;
            if !cmd_upgrade(&cfg) {
                std::process::exit(1);
            }
            Ok(())
        }
        Cmd::Check => {
            let cfg = upgrade_config(cli.config.as_deref(), cli.debug)?;
            cmd_check(&cfg);
            Ok(())
        }
        Cmd::Home => {
            println!("{}", cosup_home()?.display());
            Ok(())
        }
    }
}
