use std::path::PathBuf;

use crate::{schema::scenario::ScenarioFile, util::Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ScenarioArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ScenarioArg) -> anyhow::Result<()> {
    let ScenarioArg { output } = arg;

    let scenario = ScenarioFile::reference();
    let config = scenario.to_game_config()?;
    Output::save_json(&scenario, output.clone())?;

    eprintln!("Scenario `{}` written", scenario.name);
    if let Some(path) = output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Map: {}x{}", config.width(), config.height());
    eprintln!("  Path length: {}", config.path().len());
    eprintln!("  Tower types: {}", config.towers().len());

    Ok(())
}
