mod battery;
mod compare;
mod cost;
mod input;
mod recommend;
mod simulate;

use clap::{Parser, Subcommand};

pub use self::{
    compare::{CompareArgs, compare},
    recommend::{RecommendArgs, recommend},
    simulate::{SimulateArgs, simulate},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Simulate the battery dispatch over the PV and consumption history.
    #[clap(name = "simulate")]
    Simulate(Box<SimulateArgs>),

    /// Compare the grid cost without and with the battery.
    #[clap(name = "compare")]
    Compare(Box<CompareArgs>),

    /// Plan the upcoming hours and advise on what to do.
    #[clap(name = "recommend")]
    Recommend(Box<RecommendArgs>),
}

#[derive(Parser)]
pub struct OutputArgs {
    /// Print the result as JSON instead of tables.
    #[clap(long, env = "OUTPUT_JSON")]
    pub json: bool,
}
