use clap::{Parser, Subcommand};

use self::{replay::ReplayArg, scenario::ScenarioArg, solve::SolveArg};

mod replay;
mod scenario;
mod solve;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Search for the purchase schedule that keeps the base alive longest
    Solve(#[clap(flatten)] SolveArg),
    /// Re-simulate a saved solution
    Replay(#[clap(flatten)] ReplayArg),
    /// Write the built-in reference scenario as JSON
    Scenario(#[clap(flatten)] ScenarioArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Solve(arg) => solve::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
        Mode::Scenario(arg) => scenario::run(&arg)?,
    }
    Ok(())
}
