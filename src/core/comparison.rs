use serde::Serialize;

use crate::{
    core::{
        battery::{BatteryConfiguration, simulate},
        cost::{CostPolicy, CostReport, price},
        flow::{Flow, SystemFlow},
        series::{TimeStep, step_duration},
        step::SimulationStep,
    },
    error::{Error, Result},
    prelude::{debug, instrument},
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// Grid cost without storage versus with the dispatched battery.
#[must_use]
#[derive(Clone, Debug)]
pub struct CostComparison {
    pub baseline: CostReport,
    pub optimized: CostReport,

    /// Dispatch result, absent when the battery was disabled.
    pub simulation: Option<Vec<SimulationStep>>,
}

impl CostComparison {
    /// Baseline minus optimized cost, negative when the battery made things worse.
    pub fn savings(&self) -> Cost {
        self.baseline.total.net() - self.optimized.total.net()
    }

    pub fn summary(&self) -> CostSummary {
        CostSummary {
            baseline_cost: self.baseline.total.net(),
            optimized_cost: self.optimized.total.net(),
            savings: self.savings(),
            baseline_import: self.baseline.total.flow.import,
            baseline_export: self.baseline.total.flow.export,
            optimized_import: self.optimized.total.flow.import,
            optimized_export: self.optimized.total.flow.export,
            baseline_import_cost: self.baseline.total.import_cost,
            baseline_export_revenue: self.baseline.total.export_revenue,
            optimized_import_cost: self.optimized.total.import_cost,
            optimized_export_revenue: self.optimized.total.export_revenue,
        }
    }
}

/// Totals of a [`CostComparison`].
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CostSummary {
    #[serde(rename = "baseline_cost_eur")]
    pub baseline_cost: Cost,

    #[serde(rename = "optimized_cost_eur")]
    pub optimized_cost: Cost,

    #[serde(rename = "savings_eur")]
    pub savings: Cost,

    #[serde(rename = "baseline_import_kwh")]
    pub baseline_import: KilowattHours,

    #[serde(rename = "baseline_export_kwh")]
    pub baseline_export: KilowattHours,

    #[serde(rename = "optimized_import_kwh")]
    pub optimized_import: KilowattHours,

    #[serde(rename = "optimized_export_kwh")]
    pub optimized_export: KilowattHours,

    #[serde(rename = "baseline_import_cost_eur")]
    pub baseline_import_cost: Cost,

    #[serde(rename = "baseline_export_revenue_eur")]
    pub baseline_export_revenue: Cost,

    #[serde(rename = "optimized_import_cost_eur")]
    pub optimized_import_cost: Cost,

    #[serde(rename = "optimized_export_revenue_eur")]
    pub optimized_export_revenue: Cost,
}

/// Price the series with and without the battery.
///
/// With the battery disabled, the optimized scenario is the baseline itself.
#[instrument(skip_all, fields(n_steps = series.len(), battery_enabled = battery_enabled))]
pub fn compare_costs(
    series: &[TimeStep],
    battery: &BatteryConfiguration,
    policy: &CostPolicy,
    battery_enabled: bool,
) -> Result<CostComparison> {
    step_duration(series)?;
    let prices = series
        .iter()
        .map(|step| {
            step.price.ok_or_else(|| Error::input(format!("missing price at {}", step.timestamp)))
        })
        .collect::<Result<Vec<KilowattHourRate>>>()?;

    let baseline_flows: Vec<Flow<KilowattHours>> = series
        .iter()
        .map(|step| SystemFlow::without_battery(step.production, step.consumption).grid)
        .collect();
    let baseline = price(&baseline_flows, &prices, policy)?;

    let (optimized, simulation) = if battery_enabled {
        let simulation = simulate(battery, series)?;
        let flows: Vec<_> = simulation.iter().map(SimulationStep::grid_flow).collect();
        (price(&flows, &prices, policy)?, Some(simulation))
    } else {
        (baseline.clone(), None)
    };

    let comparison = CostComparison { baseline, optimized, simulation };
    debug!(
        baseline = ?comparison.baseline.total.net(),
        optimized = ?comparison.optimized.total.net(),
        savings = ?comparison.savings(),
        "compared",
    );
    Ok(comparison)
}
