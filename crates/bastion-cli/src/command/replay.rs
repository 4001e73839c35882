use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use bastion_engine::{Candidate, GameConfig};
use rand::SeedableRng as _;
use rand_pcg::Pcg64;

use crate::{schema::solution::SolutionRecord, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Scenario file the solution was computed for; the built-in reference
    /// scenario when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Path to the solution file (JSON format)
    #[arg(long)]
    solution: PathBuf,
    /// Seed for stochastic spawn curves; the solution's seed when omitted
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        scenario,
        solution,
        seed,
    } = arg;

    let scenario = util::load_scenario(scenario.as_ref())?;
    let config = Arc::new(scenario.to_game_config()?);

    eprintln!("Loading solution from {}", solution.display());
    let record = util::read_solution_file(solution)?;
    if record.scenario != scenario.name {
        tracing::warn!(
            solution = %record.scenario,
            scenario = %scenario.name,
            "solution was computed for a different scenario"
        );
    }
    eprintln!("Loaded {} purchases", record.schedule.len());

    let mut rng = Pcg64::seed_from_u64(seed.unwrap_or(record.seed));
    let recorded_fitness = record.fitness;
    let step_limit = record.params.step_limit;
    let mut candidate = replay_candidate(config, record)?;
    let survived = candidate.run_to_death(step_limit, &mut rng);

    eprintln!();
    eprintln!("Replay finished");
    eprintln!("  Survival time: {survived}");
    eprintln!("  Recorded survival time: {recorded_fitness}");
    eprintln!("  Executed purchases:");
    for purchase in candidate.executed() {
        eprintln!(
            "    t={:<5} tower {:<3} at {}",
            purchase.time, purchase.tower, purchase.cell
        );
    }
    eprintln!("  Deferred purchases: {}", candidate.deferred().len());
    eprintln!("  Gold left: {:.1}", candidate.gold());
    util::print_grid("Damage map", candidate.damage_map());

    Ok(())
}

fn replay_candidate(config: Arc<GameConfig>, record: SolutionRecord) -> anyhow::Result<Candidate> {
    config
        .validate_schedule(&record.schedule)
        .with_context(|| {
            format!(
                "Solution for scenario `{}` does not fit the loaded scenario",
                record.scenario
            )
        })?;
    Ok(Candidate::new(config, record.schedule))
}
