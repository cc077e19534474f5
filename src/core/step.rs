use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    core::flow::{Flow, SystemFlow},
    quantity::energy::KilowattHours,
};

/// Outcome of simulating a single step.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(into = "StepPoint")]
pub struct SimulationStep {
    pub timestamp: DateTime<Utc>,

    /// Residual energy after the step.
    pub residual_energy: KilowattHours,

    pub flow: SystemFlow<KilowattHours>,
}

impl SimulationStep {
    /// Energy taken from the PV surplus into the battery.
    pub const fn charge(&self) -> KilowattHours {
        self.flow.battery.import
    }

    /// Energy delivered by the battery to the load.
    pub const fn discharge(&self) -> KilowattHours {
        self.flow.battery.export
    }

    pub const fn grid_flow(&self) -> Flow<KilowattHours> {
        self.flow.grid
    }
}

/// Flat serialized shape of [`SimulationStep`].
#[derive(Serialize)]
struct StepPoint {
    timestamp: DateTime<Utc>,
    soc_kwh: KilowattHours,
    charge_kwh: KilowattHours,
    discharge_kwh: KilowattHours,
    grid_import_kwh: KilowattHours,
    grid_export_kwh: KilowattHours,
}

impl From<SimulationStep> for StepPoint {
    fn from(step: SimulationStep) -> Self {
        Self {
            timestamp: step.timestamp,
            soc_kwh: step.residual_energy,
            charge_kwh: step.charge(),
            discharge_kwh: step.discharge(),
            grid_import_kwh: step.flow.grid.import,
            grid_export_kwh: step.flow.grid.export,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::fixtures::start;

    #[test]
    fn test_serialize() {
        let step = SimulationStep {
            timestamp: start(),
            residual_energy: KilowattHours::from(5.5),
            flow: SystemFlow {
                grid: Flow { import: KilowattHours::ZERO, export: KilowattHours::from(1.0) },
                battery: Flow { import: KilowattHours::from(0.5), export: KilowattHours::ZERO },
            },
        };
        let value = serde_json::to_value(step).unwrap();
        assert_eq!(value["soc_kwh"], 5.5);
        assert_eq!(value["charge_kwh"], 0.5);
        assert_eq!(value["discharge_kwh"], 0.0);
        assert_eq!(value["grid_import_kwh"], 0.0);
        assert_eq!(value["grid_export_kwh"], 1.0);
        assert_eq!(value["timestamp"], "2025-06-01T00:00:00Z");
    }
}
