//! Config subcommand handlers.

use dialoguer::{Input, Select};

use execlink_config::{Config, SessionBackend};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let out = config::resolve_output(global, &cfg);
            // Table and plain both show the file format.
            let rendered = match out.format {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(&rendered, out.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(global),
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global).unwrap_or_else(|_| Config::default());
    eprintln!("execlink configuration");
    eprintln!("   Config path: {}\n", config::config_path().display());

    cfg.connection.host = Input::new()
        .with_prompt("Backend host")
        .default(cfg.connection.host.clone())
        .interact_text()
        .map_err(prompt_err)?;

    cfg.connection.base_port = Input::new()
        .with_prompt("First candidate port")
        .default(cfg.connection.base_port)
        .interact_text()
        .map_err(prompt_err)?;

    cfg.connection.candidate_count = Input::new()
        .with_prompt("Ports to try")
        .default(cfg.connection.candidate_count)
        .interact_text()
        .map_err(prompt_err)?;

    let backends = [
        SessionBackend::File,
        SessionBackend::Keyring,
        SessionBackend::Memory,
    ];
    let labels = [
        "File in the data directory",
        "System keyring",
        "Don't persist",
    ];
    let current = backends
        .iter()
        .position(|b| *b == cfg.session.backend)
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Where should the session be kept?")
        .items(&labels)
        .default(current)
        .interact()
        .map_err(prompt_err)?;
    cfg.session.backend = backends.get(selection).copied().unwrap_or_default();

    execlink_config::to_orchestrator_config(&cfg)?;
    let path = config::save_config(&cfg)?;
    eprintln!("\n   Config written to {}", path.display());
    Ok(())
}
