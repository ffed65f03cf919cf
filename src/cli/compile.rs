use std::path::Path;

use reqsync::{GeneratorCredit, PipCompile, Reconciler};
use tracing::instrument;

use super::report::ReportArgs;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Upgrade requirements to the latest allowed versions
    #[arg(short = 'U', long)]
    upgrade: bool,

    /// Override the configured package index
    #[arg(long, value_name = "URL")]
    index_url: Option<String>,

    /// Don't apply the configured environment overrides to the compiler
    #[arg(long)]
    no_env_mods: bool,

    /// Write locked files to the configured alternative `target_root`
    #[arg(long)]
    alt_target: bool,

    #[command(flatten)]
    report: ReportArgs,

    /// Extra arguments passed through to the compiler
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    compiler_args: Vec<String>,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = super::load_config(root)?;
        let set_names = super::set_names(&config)?;
        let layout = super::layout(root, &config, self.alt_target)?;

        let mut args = self.compiler_args;
        if self.upgrade {
            args.push("--upgrade".to_string());
        }
        if let Some(index_url) = self.index_url.or_else(|| config.index_url.clone()) {
            args.push("--index-url".to_string());
            args.push(index_url);
        }

        let mut compiler = PipCompile::new(config.compile_command()).with_args(args);
        if !self.no_env_mods {
            compiler = compiler.with_environment(config.environment().clone());
        }

        tracing::info!(
            sets = ?set_names,
            upgrade = self.upgrade,
            no_env_mods = self.no_env_mods,
            source_root = %layout.source_root().display(),
            target_root = %layout.target_root().display(),
            extra_args = ?compiler.extra_args(),
            "Setup summary"
        );

        let outcome = Reconciler::new(layout, GeneratorCredit::new(compiler.program()))
            .run(&set_names, Some(&compiler))?;

        self.report.finish(&outcome)
    }
}
