use std::path::Path;

use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
/// Show the project configuration
///
/// Configuration is stored in .reqsync.toml at the project root.
pub struct Command {
    /// Also show the resolved declaration and locked file of each set
    #[arg(long)]
    files: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = super::load_config(root)?;

        println!("Configuration:");
        if config.requirements().is_empty() {
            println!("  requirements: {} (none configured)", "[]".dim());
        } else {
            println!("  requirements: {:?}", config.requirements());
        }
        println!(
            "  index_url: {}",
            config.index_url.as_deref().unwrap_or("(compiler default)")
        );
        match &config.target_root {
            Some(target) => println!("  target_root: {}", target.display()),
            None => println!("  target_root: {}", "(same as source)".dim()),
        }
        println!("  compile_command: {}", config.compile_command());
        for (key, value) in config.environment() {
            println!("  environment.{key}: {value}");
        }
        let extensions = config.extensions();
        println!("  declaration_extension: {}", extensions.declaration);
        println!("  locked_extension: {}", extensions.locked);

        if self.files {
            let layout = super::layout(root, &config, false)?;
            println!();
            println!("Requirement sets:");
            for set_name in config.set_names() {
                println!(
                    "  {set_name}: {} -> {}",
                    layout.declaration_path(&set_name).display(),
                    layout.locked_path(&set_name).display()
                );
            }
        }

        Ok(())
    }
}
