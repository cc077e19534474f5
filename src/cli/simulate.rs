use clap::Parser;
use kestrel::{core, prelude::*};

use crate::{
    cli::{OutputArgs, battery::BatteryArgs, input::InputArgs},
    tables::build_simulation_table,
};

#[derive(Parser)]
pub struct SimulateArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub battery: BatteryArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[instrument(skip_all)]
pub fn simulate(args: &SimulateArgs) -> Result {
    let battery = args.battery.configuration()?;
    let series = args.input.load(false)?;
    let steps = core::simulate(&battery, &series)?;
    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        println!("{}", build_simulation_table(&series, &steps));
    }
    Ok(())
}
