use clap::Parser;
use kestrel::{
    core::{CostPolicy, ExportMode},
    prelude::*,
    quantity::rate::KilowattHourRate,
};

#[must_use]
#[derive(Copy, Clone, Parser)]
pub struct CostArgs {
    /// How the exported energy is credited.
    #[clap(long = "export-mode", value_enum, default_value = "feed-in", env = "EXPORT_MODE")]
    pub export_mode: ExportMode,

    /// Feed-in tariff in euro per kilowatt-hour.
    #[clap(long = "feed-in-tariff", default_value = "0.08", env = "FEED_IN_TARIFF")]
    pub feed_in_tariff: KilowattHourRate,
}

impl CostArgs {
    pub fn policy(&self) -> Result<CostPolicy> {
        let policy = CostPolicy::builder()
            .export_mode(self.export_mode)
            .feed_in_tariff(self.feed_in_tariff)
            .build()?;
        Ok(policy)
    }
}
