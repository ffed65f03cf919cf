use std::path::Path;

use reqsync::{Config, storage::discover_set_names};
use tracing::instrument;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Requirement sets to list, instead of discovering `*.in` files
    #[arg(long, value_name = "NAME", num_args = 1..)]
    sets: Vec<String>,

    /// Overwrite an existing configuration without asking
    #[arg(long, short)]
    force: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(Config::FILE_NAME);
        if config_path.exists() && !self.force {
            let overwrite = dialoguer::Confirm::new()
                .with_prompt(format!("{} already exists. Overwrite?", config_path.display()))
                .default(false)
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {e}"))?;
            if !overwrite {
                println!("Cancelled");
                return Ok(());
            }
        }

        let mut config = Config::default();
        let sets = if self.sets.is_empty() {
            discover_set_names(root, &config.extensions().declaration)
        } else {
            self.sets
        };
        config.set_requirements(sets);

        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", Config::FILE_NAME))?;

        println!("Initialized reqsync configuration in {}", root.display());
        println!("  Created: {}", Config::FILE_NAME);
        if config.requirements().is_empty() {
            println!("  No requirement sets found; add them to 'requirements'");
        } else {
            for set_name in config.set_names() {
                println!("  Requirement set: {set_name}");
            }
        }

        println!();
        println!("Next steps:");
        println!("  reqsync compile   # Compile, check and rewrite locked files");

        Ok(())
    }
}
