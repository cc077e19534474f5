//! Battery-related CLI arguments.

use clap::Parser;
use kestrel::{
    core::BatteryConfiguration,
    prelude::*,
    quantity::{energy::KilowattHours, power::Kilowatts},
};

#[must_use]
#[derive(Copy, Clone, Parser)]
pub struct BatteryArgs {
    /// Usable battery capacity in kilowatt-hours.
    #[clap(long = "battery-capacity-kwh", default_value = "10", env = "BATTERY_CAPACITY_KWH")]
    pub capacity: KilowattHours,

    /// Minimum state-of-charge as a fraction of the capacity.
    #[clap(long = "battery-min-soc", default_value = "0.05", env = "BATTERY_MIN_SOC")]
    pub min_state_of_charge: f64,

    /// Maximum state-of-charge as a fraction of the capacity.
    #[clap(long = "battery-max-soc", default_value = "0.95", env = "BATTERY_MAX_SOC")]
    pub max_state_of_charge: f64,

    #[clap(
        long = "battery-charging-efficiency",
        default_value = "0.95",
        env = "BATTERY_CHARGING_EFFICIENCY"
    )]
    pub charging_efficiency: f64,

    #[clap(
        long = "battery-discharging-efficiency",
        default_value = "0.95",
        env = "BATTERY_DISCHARGING_EFFICIENCY"
    )]
    pub discharging_efficiency: f64,

    /// Charging power limit in kilowatts.
    #[clap(
        long = "battery-max-charging-power-kw",
        default_value = "5",
        env = "BATTERY_MAX_CHARGING_POWER_KW"
    )]
    pub max_charging_power: Kilowatts,

    /// Discharging power limit in kilowatts.
    #[clap(
        long = "battery-max-discharging-power-kw",
        default_value = "5",
        env = "BATTERY_MAX_DISCHARGING_POWER_KW"
    )]
    pub max_discharging_power: Kilowatts,

    /// Starting residual energy in kilowatt-hours, half of the capacity by default.
    #[clap(long = "battery-initial-soc-kwh", env = "BATTERY_INITIAL_SOC_KWH")]
    pub initial_residual_energy: Option<KilowattHours>,
}

impl BatteryArgs {
    pub fn configuration(&self) -> Result<BatteryConfiguration> {
        let configuration = BatteryConfiguration::builder()
            .capacity(self.capacity)
            .min_state_of_charge(self.min_state_of_charge)
            .max_state_of_charge(self.max_state_of_charge)
            .charging_efficiency(self.charging_efficiency)
            .discharging_efficiency(self.discharging_efficiency)
            .max_charging_power(self.max_charging_power)
            .max_discharging_power(self.max_discharging_power)
            .maybe_initial_residual_energy(self.initial_residual_energy)
            .build()?;
        Ok(configuration)
    }
}
