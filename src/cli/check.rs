use std::path::Path;

use reqsync::{GeneratorCredit, Reconciler};
use tracing::instrument;

use super::report::ReportArgs;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Report conflicts without rewriting locked files
    #[arg(long)]
    dry_run: bool,

    /// Read locked files from the configured alternative `target_root`
    #[arg(long)]
    alt_target: bool,

    #[command(flatten)]
    report: ReportArgs,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = super::load_config(root)?;
        let set_names = super::set_names(&config)?;
        let layout = super::layout(root, &config, self.alt_target)?;

        let outcome = Reconciler::new(layout, GeneratorCredit::new(config.compile_command()))
            .regenerate(!self.dry_run)
            .run(&set_names, None)?;

        self.report.finish(&outcome)
    }
}
