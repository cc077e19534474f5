use chrono::TimeDelta;

use crate::{
    core::{
        battery::BatteryConfiguration,
        flow::{Flow, SystemFlow},
        series::{TimeStep, step_duration},
        step::SimulationStep,
    },
    error::Result,
    prelude::{debug, instrument, trace},
    quantity::energy::KilowattHours,
};

/// Greedy self-consumption dispatch: store any PV surplus, cover any deficit from storage.
#[derive(Copy, Clone)]
pub struct Simulator {
    battery: BatteryConfiguration,

    /// Current residual energy.
    pub residual_energy: KilowattHours,

    /// Power limits converted into energy per step.
    max_flow: Flow<KilowattHours>,
}

impl Simulator {
    pub fn new(battery: BatteryConfiguration, step_duration: TimeDelta) -> Self {
        Self {
            battery,
            residual_energy: battery.initial_residual_energy(),
            max_flow: Flow {
                import: battery.max_charging_power() * step_duration,
                export: battery.max_discharging_power() * step_duration,
            },
        }
    }

    /// Dispatch a single step, update the residual energy and return the resulting flows.
    pub fn apply(
        &mut self,
        production: KilowattHours,
        consumption: KilowattHours,
    ) -> SystemFlow<KilowattHours> {
        let efficiency = self.battery.efficiency();
        let surplus = production - consumption;

        let flow = if surplus >= KilowattHours::ZERO {
            let room =
                (self.battery.max_residual_energy() - self.residual_energy).max(KilowattHours::ZERO);
            let stored = room.min(surplus.min(self.max_flow.import) * efficiency.charging);
            let charge = if efficiency.charging > 0.0 {
                stored / efficiency.charging
            } else {
                KilowattHours::ZERO
            };
            self.residual_energy += stored;
            SystemFlow {
                grid: Flow { import: KilowattHours::ZERO, export: (surplus - charge).max(KilowattHours::ZERO) },
                battery: Flow { import: charge, export: KilowattHours::ZERO },
            }
        } else {
            let need = -surplus;
            let available =
                (self.residual_energy - self.battery.min_residual_energy()).max(KilowattHours::ZERO);
            let deliverable = available.min(self.max_flow.export) * efficiency.discharging;
            let discharge = need.min(deliverable);
            let spent = if efficiency.discharging > 0.0 {
                discharge / efficiency.discharging
            } else {
                KilowattHours::ZERO
            };
            self.residual_energy -= spent;
            SystemFlow {
                grid: Flow { import: (need - discharge).max(KilowattHours::ZERO), export: KilowattHours::ZERO },
                battery: Flow { import: KilowattHours::ZERO, export: discharge },
            }
        };

        // Absorb rounding drift:
        self.residual_energy = self.battery.clamp(self.residual_energy);
        flow
    }
}

/// Run the dispatch over the whole series.
///
/// The output has exactly one step per input step, in the same order.
#[instrument(skip_all, fields(n_steps = series.len()))]
pub fn simulate(battery: &BatteryConfiguration, series: &[TimeStep]) -> Result<Vec<SimulationStep>> {
    let step_duration = step_duration(series)?;
    let mut simulator = Simulator::new(*battery, step_duration);
    let steps: Vec<SimulationStep> = series
        .iter()
        .map(|time_step| {
            let flow = simulator.apply(time_step.production, time_step.consumption);
            trace!(
                timestamp = ?time_step.timestamp,
                residual_energy = ?simulator.residual_energy,
                ?flow,
                "dispatched",
            );
            SimulationStep {
                timestamp: time_step.timestamp,
                residual_energy: simulator.residual_energy,
                flow,
            }
        })
        .collect();
    let total: SystemFlow<KilowattHours> = steps.iter().map(|step| step.flow).sum();
    debug!(
        charge = ?total.battery.import,
        discharge = ?total.battery.export,
        import = ?total.grid.import,
        export = ?total.grid.export,
        "simulated",
    );
    Ok(steps)
}
