use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use kestrel::{
    core::TimeStep,
    dataset::{Column, Window, align, read_column},
    prelude::*,
};

#[derive(Parser)]
pub struct InputArgs {
    /// CSV with the PV production.
    #[clap(long = "pv-csv", env = "PV_CSV_PATH")]
    pub production: PathBuf,

    /// CSV with the household consumption.
    #[clap(long = "consumption-csv", env = "CONS_CSV_PATH")]
    pub consumption: PathBuf,

    /// CSV with the grid prices.
    #[clap(long = "price-csv", env = "PRICE_CSV_PATH")]
    pub price: Option<PathBuf>,

    /// Skip the rows before this instant (inclusive).
    #[clap(long, env = "SINCE")]
    pub since: Option<DateTime<Utc>>,

    /// Skip the rows starting from this instant (exclusive).
    #[clap(long, env = "UNTIL")]
    pub until: Option<DateTime<Utc>>,
}

impl InputArgs {
    /// Read and align the input series, optionally with the prices.
    #[instrument(skip_all, fields(with_price = with_price))]
    pub fn load(&self, with_price: bool) -> Result<Vec<TimeStep>> {
        if let (Some(since), Some(until)) = (self.since, self.until) {
            ensure!(since < until, "`--since` ({since}) must precede `--until` ({until})");
        }
        let production = read_column(&self.production, Column::Production)?;
        let consumption = read_column(&self.consumption, Column::Consumption)?;
        let price = if with_price {
            let path = self.price.as_ref().context("`--price-csv` is required")?;
            Some(read_column(path, Column::Price)?)
        } else {
            None
        };
        let series = align(
            production,
            consumption,
            price,
            Window { since: self.since, until: self.until },
        )?;
        ensure!(!series.is_empty(), "the input files have no timestamps in common");
        Ok(series)
    }
}
