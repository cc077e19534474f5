use chrono::{DateTime, NaiveTime, Utc};
use clap::Parser;
use kestrel::{
    core::{self, PriceThreshold, compare_costs},
    dataset::build_plan,
    prelude::*,
    quantity::rate::KilowattHourRate,
};
use serde::Serialize;

use crate::{
    cli::{OutputArgs, battery::BatteryArgs, cost::CostArgs, input::InputArgs},
    tables::{build_comparison_table, build_recommendations_table},
};

#[derive(Parser)]
pub struct RecommendArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub battery: BatteryArgs,

    #[clap(flatten)]
    pub cost: CostArgs,

    /// Planning horizon in hours.
    #[clap(
        long,
        default_value = "24",
        value_parser = clap::value_parser!(u16).range(1..=168),
        env = "PLAN_HOURS"
    )]
    pub hours: u16,

    /// Fixed price threshold in euro per kilowatt-hour, the 75th percentile of the plan prices by default.
    #[clap(long = "price-threshold", env = "PRICE_THRESHOLD")]
    pub price_threshold: Option<KilowattHourRate>,

    /// Plan start, today's midnight UTC by default.
    #[clap(long, env = "PLAN_START")]
    pub start: Option<DateTime<Utc>>,

    #[clap(flatten)]
    pub output: OutputArgs,
}

impl RecommendArgs {
    fn threshold(&self) -> PriceThreshold {
        self.price_threshold.map_or(PriceThreshold::Auto, PriceThreshold::Fixed)
    }

    fn start(&self) -> DateTime<Utc> {
        self.start.unwrap_or_else(|| Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc())
    }
}

#[derive(Serialize)]
struct RecommendOutput {
    recommendations: Vec<core::Recommendation>,
    cost: core::CostSummary,
}

#[instrument(skip_all)]
pub fn recommend(args: &RecommendArgs) -> Result {
    let battery = args.battery.configuration()?;
    let policy = args.cost.policy()?;
    let history = args.input.load(true)?;

    let start = args.start();
    let plan = build_plan(&history, start, usize::from(args.hours))?;
    info!(%start, hours = args.hours, "built the plan");

    let comparison = compare_costs(&plan, &battery, &policy, true)?;
    let simulation = comparison.simulation.as_deref().context("the battery was not simulated")?;
    let recommendations = core::recommend(&plan, simulation, args.threshold())?;
    let cost = comparison.summary();

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&RecommendOutput { recommendations, cost })?);
    } else {
        println!("{}", build_recommendations_table(&plan, &recommendations));
        println!("{}", build_comparison_table(&cost));
    }
    Ok(())
}
