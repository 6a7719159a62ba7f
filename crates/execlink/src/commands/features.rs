//! Feature list and toggle handlers.

use tabled::Tabled;

use execlink_core::{Feature, Operation, Orchestrator};

use crate::cli::{FeaturesArgs, FeaturesCommand};
use crate::error::CliError;
use crate::output::{self, Output};

use super::{exec, util};

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl FeatureRow {
    fn new(feature: &Feature, color: bool) -> Self {
        let state = if feature.enabled { "on" } else { "off" };
        Self {
            name: feature.name.clone(),
            enabled: output::state_word(state, feature.enabled, color),
            description: feature.description.clone(),
        }
    }
}

pub async fn handle(orch: &Orchestrator, args: FeaturesArgs, out: &Output) -> Result<(), CliError> {
    let (name, enabled) = match args.command {
        FeaturesCommand::List => return list(orch, out).await,
        FeaturesCommand::Enable { name } => (name, true),
        FeaturesCommand::Disable { name } => (name, false),
    };
    exec::run(orch, Operation::ToggleFeature { name, enabled }, out).await
}

async fn list(orch: &Orchestrator, out: &Output) -> Result<(), CliError> {
    util::prepare(orch, &Operation::ListFeatures, out).await?;
    let features = orch.list_features().await?;

    let rendered = output::render_list(
        out.format,
        &features,
        |f| FeatureRow::new(f, out.color),
        |f| f.name.clone(),
    )?;
    output::print_output(&rendered, out.quiet);
    Ok(())
}
