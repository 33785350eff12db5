use anyhow::{Context, Result};

use crate::cli::{ConfigCommands, OutputFormat};
use crate::config::CliConfig;

pub fn run(
    config: &CliConfig,
    config_path: Option<std::path::PathBuf>,
    command: ConfigCommands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            match config_path.or_else(CliConfig::default_path) {
                Some(path) => println!("{}", path.display()),
                None => println!("(no config directory on this platform)"),
            }
            Ok(())
        }
        ConfigCommands::Show => {
            let shown = config.redacted();
            let rendered = if format.is_json() {
                serde_json::to_string_pretty(&shown)?
            } else {
                toml::to_string_pretty(&shown).context("Failed to render config")?
            };
            println!("{}", rendered);
            Ok(())
        }
    }
}
