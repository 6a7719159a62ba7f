//! CLI-side config resolution: file + env from `execlink-config`, then
//! command-line overrides.

use execlink_config::Config;
use execlink_core::OrchestratorConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Output};

pub use execlink_config::{config_path, save_config};

/// Load the config and apply `--host` / `--port`.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = execlink_config::load_config()?;
    if let Some(ref host) = global.host {
        cfg.connection.host.clone_from(host);
    }
    if let Some(port) = global.port {
        cfg.connection.base_port = port;
    }
    Ok(cfg)
}

pub fn orchestrator_config(cfg: &Config) -> Result<OrchestratorConfig, CliError> {
    Ok(execlink_config::to_orchestrator_config(cfg)?)
}

/// Flags win over config defaults; unknown config values fall back.
pub fn resolve_output(global: &GlobalOpts, cfg: &Config) -> Output {
    let format = global
        .output
        .or_else(|| output::parse_format(&cfg.defaults.output))
        .unwrap_or(OutputFormat::Table);
    let color = global
        .color
        .or_else(|| output::parse_color(&cfg.defaults.color))
        .unwrap_or(ColorMode::Auto);
    Output::new(format, color, global.quiet)
}
