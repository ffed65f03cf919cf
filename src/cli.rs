use std::path::{Path, PathBuf};

mod check;
mod compile;
mod config;
mod init;
mod report;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use reqsync::{Config, Layout};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The project root, containing `.reqsync.toml` and the requirement files
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Create a `.reqsync.toml` listing the requirement sets found under the
    /// root
    Init(init::Command),

    /// Compile every requirement set, then check and rewrite the locked files
    ///
    /// Runs the configured compiler (pip-compile by default) once per set,
    /// then verifies that every package resolves to a single version across
    /// all locked files and carries declaration comments into them.
    Compile(compile::Command),

    /// Check and rewrite existing locked files without compiling
    Check(check::Command),

    /// Show the loaded configuration
    Config(config::Command),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(&root)?,
            Self::Compile(command) => command.run(&root)?,
            Self::Check(command) => command.run(&root)?,
            Self::Config(command) => command.run(&root)?,
        }
        Ok(())
    }
}

/// Loads `.reqsync.toml` from the project root.
fn load_config(root: &Path) -> anyhow::Result<Config> {
    let path = root.join(Config::FILE_NAME);
    if !path.exists() {
        anyhow::bail!(
            "No configuration found at {} (run 'reqsync init' to create one)",
            path.display()
        );
    }
    Config::load(&path).map_err(|e| anyhow::anyhow!("{e}"))
}

/// The requirement-set names to reconcile, failing if none are configured.
fn set_names(config: &Config) -> anyhow::Result<Vec<String>> {
    let names = config.set_names();
    if names.is_empty() {
        anyhow::bail!("Requirements must be specified in the config file");
    }
    Ok(names)
}

/// Resolves where declaration and locked files live.
///
/// With `alt_target`, locked files go to the configured `target_root`
/// (relative to the project root) instead of next to their declarations.
fn layout(root: &Path, config: &Config, alt_target: bool) -> anyhow::Result<Layout> {
    let source_root = root.to_path_buf();
    let target_root = if alt_target {
        let target = config
            .target_root
            .as_ref()
            .context("--alt-target requires 'target_root' in the config file")?;
        root.join(target)
    } else {
        source_root.clone()
    };
    Ok(Layout::new(source_root, target_root, config.extensions()))
}
