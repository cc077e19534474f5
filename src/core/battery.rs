mod simulator;

use bon::bon;
use serde::Serialize;

pub use self::simulator::{Simulator, simulate};
use crate::{
    error::{Error, Result},
    quantity::{energy::KilowattHours, power::Kilowatts},
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BatteryEfficiency {
    /// Charging efficiency, `(0, 1]`.
    pub charging: f64,

    /// Discharging efficiency, `(0, 1]`.
    pub discharging: f64,
}

/// Validated physical parameters of a household battery.
///
/// State-of-charge bounds are fractions of the usable capacity.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BatteryConfiguration {
    capacity: KilowattHours,
    min_state_of_charge: f64,
    max_state_of_charge: f64,
    efficiency: BatteryEfficiency,
    max_charging_power: Kilowatts,
    max_discharging_power: Kilowatts,
    initial_residual_energy: Option<KilowattHours>,
}

#[bon]
impl BatteryConfiguration {
    #[builder]
    pub fn new(
        #[builder(default = BatteryConfiguration::DEFAULT_CAPACITY)] capacity: KilowattHours,
        #[builder(default = BatteryConfiguration::DEFAULT_MIN_STATE_OF_CHARGE)] min_state_of_charge: f64,
        #[builder(default = BatteryConfiguration::DEFAULT_MAX_STATE_OF_CHARGE)] max_state_of_charge: f64,
        #[builder(default = BatteryConfiguration::DEFAULT_EFFICIENCY)] charging_efficiency: f64,
        #[builder(default = BatteryConfiguration::DEFAULT_EFFICIENCY)] discharging_efficiency: f64,
        #[builder(default = BatteryConfiguration::DEFAULT_MAX_POWER)] max_charging_power: Kilowatts,
        #[builder(default = BatteryConfiguration::DEFAULT_MAX_POWER)] max_discharging_power: Kilowatts,

        // Defaults to half of the capacity.
        initial_residual_energy: Option<KilowattHours>,
    ) -> Result<Self> {
        if !capacity.is_finite() || !capacity.is_non_negative() {
            return Err(Error::configuration(format!(
                "capacity must be finite and non-negative, got {capacity}"
            )));
        }
        if !(0.0..=1.0).contains(&min_state_of_charge) {
            return Err(Error::configuration(format!(
                "minimum state-of-charge must be within 0..=1, got {min_state_of_charge}"
            )));
        }
        if !(0.0..=1.0).contains(&max_state_of_charge) {
            return Err(Error::configuration(format!(
                "maximum state-of-charge must be within 0..=1, got {max_state_of_charge}"
            )));
        }
        if min_state_of_charge > max_state_of_charge {
            return Err(Error::configuration(format!(
                "minimum state-of-charge ({min_state_of_charge}) exceeds the maximum ({max_state_of_charge})"
            )));
        }
        check_efficiency("charging", charging_efficiency)?;
        check_efficiency("discharging", discharging_efficiency)?;
        check_power("charging", max_charging_power)?;
        check_power("discharging", max_discharging_power)?;
        if let Some(initial_residual_energy) = initial_residual_energy
            && !initial_residual_energy.is_finite()
        {
            return Err(Error::configuration(format!(
                "initial residual energy must be finite, got {initial_residual_energy:?}"
            )));
        }
        Ok(Self {
            capacity,
            min_state_of_charge,
            max_state_of_charge,
            efficiency: BatteryEfficiency {
                charging: charging_efficiency,
                discharging: discharging_efficiency,
            },
            max_charging_power,
            max_discharging_power,
            initial_residual_energy,
        })
    }
}

fn check_efficiency(direction: &str, efficiency: f64) -> Result {
    if efficiency > 0.0 && efficiency <= 1.0 {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "{direction} efficiency must be within (0, 1], got {efficiency}"
        )))
    }
}

fn check_power(direction: &str, power: Kilowatts) -> Result {
    if power.is_finite() && power.is_non_negative() {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "maximum {direction} power must be finite and non-negative, got {power}"
        )))
    }
}

impl BatteryConfiguration {
    pub const DEFAULT_CAPACITY: KilowattHours = KilowattHours::new(10.0);
    pub const DEFAULT_MIN_STATE_OF_CHARGE: f64 = 0.05;
    pub const DEFAULT_MAX_STATE_OF_CHARGE: f64 = 0.95;
    pub const DEFAULT_EFFICIENCY: f64 = 0.95;
    pub const DEFAULT_MAX_POWER: Kilowatts = Kilowatts::new(5.0);

    pub const fn capacity(&self) -> KilowattHours {
        self.capacity
    }

    pub const fn efficiency(&self) -> BatteryEfficiency {
        self.efficiency
    }

    pub const fn max_charging_power(&self) -> Kilowatts {
        self.max_charging_power
    }

    pub const fn max_discharging_power(&self) -> Kilowatts {
        self.max_discharging_power
    }

    pub fn min_residual_energy(&self) -> KilowattHours {
        self.capacity * self.min_state_of_charge
    }

    pub fn max_residual_energy(&self) -> KilowattHours {
        self.capacity * self.max_state_of_charge
    }

    /// Clamp the residual energy into the allowed band.
    pub fn clamp(&self, residual_energy: KilowattHours) -> KilowattHours {
        residual_energy.clamp(self.min_residual_energy(), self.max_residual_energy())
    }

    /// Residual energy at the start of a simulation, already clamped into the allowed band.
    pub fn initial_residual_energy(&self) -> KilowattHours {
        self.clamp(self.initial_residual_energy.unwrap_or(self.capacity * 0.5))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let battery = BatteryConfiguration::builder().build().unwrap();
        assert_abs_diff_eq!(battery.capacity().0, 10.0);
        assert_abs_diff_eq!(battery.min_residual_energy().0, 0.5);
        assert_abs_diff_eq!(battery.max_residual_energy().0, 9.5);
        assert_abs_diff_eq!(battery.initial_residual_energy().0, 5.0);
        assert_abs_diff_eq!(battery.efficiency().charging, 0.95);
        assert_abs_diff_eq!(battery.efficiency().discharging, 0.95);
    }

    #[test]
    fn test_initial_residual_energy_is_clamped() {
        let battery = BatteryConfiguration::builder()
            .initial_residual_energy(KilowattHours::from(100.0))
            .build()
            .unwrap();
        assert_abs_diff_eq!(battery.initial_residual_energy().0, 9.5);

        let battery = BatteryConfiguration::builder()
            .initial_residual_energy(KilowattHours::from(-1.0))
            .build()
            .unwrap();
        assert_abs_diff_eq!(battery.initial_residual_energy().0, 0.5);
    }

    #[test]
    fn test_zero_capacity_is_valid() {
        let battery = BatteryConfiguration::builder()
            .capacity(KilowattHours::ZERO)
            .build()
            .unwrap();
        assert_eq!(battery.initial_residual_energy(), KilowattHours::ZERO);
    }

    #[test]
    fn test_negative_capacity_fails() {
        let result = BatteryConfiguration::builder().capacity(KilowattHours::from(-1.0)).build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_inverted_band_fails() {
        let result = BatteryConfiguration::builder()
            .min_state_of_charge(0.8)
            .max_state_of_charge(0.2)
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_out_of_range_state_of_charge_fails() {
        assert!(BatteryConfiguration::builder().max_state_of_charge(1.5).build().is_err());
        assert!(BatteryConfiguration::builder().min_state_of_charge(-0.1).build().is_err());
        assert!(BatteryConfiguration::builder().min_state_of_charge(f64::NAN).build().is_err());
    }

    #[test]
    fn test_efficiency_bounds() {
        assert!(BatteryConfiguration::builder().charging_efficiency(0.0).build().is_err());
        assert!(BatteryConfiguration::builder().discharging_efficiency(1.01).build().is_err());
        assert!(BatteryConfiguration::builder().charging_efficiency(1.0).build().is_ok());
    }

    #[test]
    fn test_negative_power_fails() {
        let result = BatteryConfiguration::builder()
            .max_discharging_power(Kilowatts::from(-0.1))
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
