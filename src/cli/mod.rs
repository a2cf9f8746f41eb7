pub mod commands;
pub mod deploy;
pub mod progress;
pub mod serve;
pub mod status;
pub mod tool;

pub use commands::{Cli, Commands};

use std::path::PathBuf;
use crate::config::{self, CenterConfig};
use crate::errors::CoreError;

/// Load the given config file, or fall back to built-in defaults.
pub async fn load_config(path: Option<&str>) -> Result<CenterConfig, CoreError> {
    match path {
        Some(p) => config::parse_config(&PathBuf::from(p)).await,
        None => Ok(CenterConfig::default()),
    }
}

pub async fn handle_validate(args: commands::ValidateArgs) -> Result<(), CoreError> {
    let path = PathBuf::from(&args.config);
    let config = config::parse_config(&path).await?;
    println!(
        "Configuration is valid: {} ({} agents, {} commands, {} rules)",
        args.config,
        config.agent_specs().len(),
        config.command_specs().len(),
        config.rule_specs().len(),
    );
    Ok(())
}
