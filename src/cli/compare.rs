use clap::Parser;
use itertools::Itertools;
use kestrel::{
    core::{CostSummary, DailyCost, compare_costs},
    prelude::*,
};
use serde::Serialize;

use crate::{
    cli::{OutputArgs, battery::BatteryArgs, cost::CostArgs, input::InputArgs},
    tables::{build_comparison_table, build_daily_table},
};

#[derive(Parser)]
pub struct CompareArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub battery: BatteryArgs,

    #[clap(flatten)]
    pub cost: CostArgs,

    /// Price the optimized scenario without the battery.
    #[clap(long = "no-battery", env = "NO_BATTERY")]
    pub no_battery: bool,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Serialize)]
struct CompareOutput {
    #[serde(flatten)]
    summary: CostSummary,

    daily: Vec<DailyCost>,
}

#[instrument(skip_all)]
pub fn compare(args: &CompareArgs) -> Result {
    let battery = args.battery.configuration()?;
    let policy = args.cost.policy()?;
    let series = args.input.load(true)?;

    let comparison = compare_costs(&series, &battery, &policy, !args.no_battery)?;
    let summary = comparison.summary();
    let timestamps = series.iter().map(|step| step.timestamp).collect_vec();
    let daily = comparison.optimized.daily(&timestamps)?;
    info!(
        baseline = ?summary.baseline_cost,
        optimized = ?summary.optimized_cost,
        savings = ?summary.savings,
        "compared",
    );

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&CompareOutput { summary, daily })?);
    } else {
        println!("{}", build_comparison_table(&summary));
        println!("{}", build_daily_table(&daily));
    }
    Ok(())
}
