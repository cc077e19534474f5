//! Grid cost accounting over a sequence of grid flows.
//!
//! Import is always billed at the step price. Export is credited either at the same market price
//! or at a fixed feed-in tariff, depending on the [`ExportMode`].

use std::{
    fmt::{Display, Formatter},
    iter::Sum,
    ops::Add,
};

use bon::bon;
use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    core::flow::Flow,
    error::{Error, Result},
    prelude::{debug, instrument},
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMode {
    /// Export is credited at the step market price.
    Market,

    /// Export is credited at the fixed feed-in tariff.
    #[default]
    FeedIn,
}

impl Display for ExportMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Market => write!(f, "Market"),
            Self::FeedIn => write!(f, "Feed-in"),
        }
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CostPolicy {
    export_mode: ExportMode,
    feed_in_tariff: KilowattHourRate,
}

#[bon]
impl CostPolicy {
    #[builder]
    pub fn new(
        #[builder(default)] export_mode: ExportMode,
        #[builder(default = CostPolicy::DEFAULT_FEED_IN_TARIFF)] feed_in_tariff: KilowattHourRate,
    ) -> Result<Self> {
        if !feed_in_tariff.is_finite() || !feed_in_tariff.is_non_negative() {
            return Err(Error::configuration(format!(
                "feed-in tariff must be finite and non-negative, got {feed_in_tariff}"
            )));
        }
        Ok(Self { export_mode, feed_in_tariff })
    }
}

impl CostPolicy {
    pub const DEFAULT_FEED_IN_TARIFF: KilowattHourRate = KilowattHourRate::new(0.08);

    /// Rate at which the exported energy is credited.
    pub const fn export_rate(&self, market_price: KilowattHourRate) -> KilowattHourRate {
        match self.export_mode {
            ExportMode::Market => market_price,
            ExportMode::FeedIn => self.feed_in_tariff,
        }
    }

    pub fn evaluate(&self, flow: Flow<KilowattHours>, price: KilowattHourRate) -> StepCost {
        StepCost {
            flow,
            import_cost: flow.import * price,
            export_revenue: flow.export * self.export_rate(price),
        }
    }
}

/// Grid energy and money of a single step, or an aggregate of steps.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, derive_more::Add, derive_more::AddAssign)]
pub struct StepCost {
    pub flow: Flow<KilowattHours>,

    #[serde(rename = "import_cost_eur")]
    pub import_cost: Cost,

    #[serde(rename = "export_revenue_eur")]
    pub export_revenue: Cost,
}

impl StepCost {
    /// Import cost minus export revenue.
    pub fn net(&self) -> Cost {
        self.import_cost - self.export_revenue
    }
}

impl Sum for StepCost {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct DailyCost {
    pub date: NaiveDate,

    #[serde(flatten)]
    pub cost: StepCost,
}

#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct CostReport {
    pub steps: Vec<StepCost>,
    pub total: StepCost,
}

impl CostReport {
    /// Group the steps by UTC calendar day.
    pub fn daily(&self, timestamps: &[DateTime<Utc>]) -> Result<Vec<DailyCost>> {
        if timestamps.len() != self.steps.len() {
            return Err(Error::input(format!(
                "got {} timestamps for {} cost steps",
                timestamps.len(),
                self.steps.len(),
            )));
        }
        let days = timestamps
            .iter()
            .zip(&self.steps)
            .chunk_by(|(timestamp, _)| timestamp.date_naive())
            .into_iter()
            .map(|(date, group)| DailyCost { date, cost: group.map(|(_, cost)| *cost).sum() })
            .collect();
        Ok(days)
    }
}

/// Price the grid flows step by step.
#[instrument(skip_all, fields(n_steps = flows.len(), export_mode = %policy.export_mode))]
pub fn price(
    flows: &[Flow<KilowattHours>],
    prices: &[KilowattHourRate],
    policy: &CostPolicy,
) -> Result<CostReport> {
    if flows.is_empty() {
        return Err(Error::input("there are no flows to price"));
    }
    if flows.len() != prices.len() {
        return Err(Error::input(format!(
            "got {} prices for {} flows",
            prices.len(),
            flows.len(),
        )));
    }
    let steps = flows
        .iter()
        .zip(prices)
        .enumerate()
        .map(|(i, (flow, price))| {
            if !flow.is_valid() {
                return Err(Error::input(format!("invalid flow at step #{i}: {flow:?}")));
            }
            if !price.is_finite() {
                return Err(Error::input(format!("invalid price at step #{i}: {price:?}")));
            }
            Ok(policy.evaluate(*flow, *price))
        })
        .collect::<Result<Vec<_>>>()?;
    let total: StepCost = steps.iter().copied().sum();
    debug!(import = ?total.flow.import, export = ?total.flow.export, net = ?total.net(), "priced");
    Ok(CostReport { steps, total })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeDelta;

    use super::*;
    use crate::core::series::fixtures::start;

    fn flow(import: f64, export: f64) -> Flow<KilowattHours> {
        Flow { import: KilowattHours::from(import), export: KilowattHours::from(export) }
    }

    fn rates(values: &[f64]) -> Vec<KilowattHourRate> {
        values.iter().copied().map(KilowattHourRate::from).collect()
    }

    #[test]
    fn test_feed_in_pricing() {
        let policy = CostPolicy::builder().build().unwrap();
        let report = price(&[flow(2.0, 0.0), flow(0.0, 1.0)], &rates(&[0.3, 0.1]), &policy).unwrap();
        assert_abs_diff_eq!(report.steps[0].import_cost.0, 0.6);
        assert_abs_diff_eq!(report.steps[1].export_revenue.0, 0.08);
        assert_abs_diff_eq!(report.total.net().0, 0.52, epsilon = 1e-12);
        assert_abs_diff_eq!(report.total.flow.import.0, 2.0);
        assert_abs_diff_eq!(report.total.flow.export.0, 1.0);
    }

    #[test]
    fn test_feed_in_report() {
        let policy = CostPolicy::builder()
            .export_mode(ExportMode::FeedIn)
            .feed_in_tariff(KilowattHourRate::from(0.08))
            .build()
            .unwrap();
        let report =
            price(&[flow(1.0, 0.0), flow(2.0, 1.0)], &rates(&[0.20, 0.10]), &policy).unwrap();
        assert_abs_diff_eq!(report.steps[0].import_cost.0, 0.20);
        assert_abs_diff_eq!(report.steps[1].import_cost.0, 0.20);
        assert_abs_diff_eq!(report.total.import_cost.0, 0.40);
        assert_abs_diff_eq!(report.steps[0].export_revenue.0, 0.0);
        assert_abs_diff_eq!(report.steps[1].export_revenue.0, 0.08);
        assert_abs_diff_eq!(report.total.export_revenue.0, 0.08);
        assert_abs_diff_eq!(report.total.net().0, 0.32, epsilon = 1e-12);
    }

    #[test]
    fn test_market_pricing() {
        let policy = CostPolicy::builder().export_mode(ExportMode::Market).build().unwrap();
        let report = price(&[flow(0.0, 2.0)], &rates(&[0.25]), &policy).unwrap();
        assert_abs_diff_eq!(report.total.export_revenue.0, 0.5);
        assert_abs_diff_eq!(report.total.net().0, -0.5);
    }

    #[test]
    fn test_negative_price_is_allowed() {
        let policy = CostPolicy::builder().build().unwrap();
        let report = price(&[flow(1.0, 0.0)], &rates(&[-0.05]), &policy).unwrap();
        assert_abs_diff_eq!(report.total.net().0, -0.05);
    }

    #[test]
    fn test_length_mismatch_fails() {
        let policy = CostPolicy::builder().build().unwrap();
        let result = price(&[flow(1.0, 0.0), flow(1.0, 0.0)], &rates(&[0.1]), &policy);
        assert!(matches!(result, Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_empty_fails() {
        let policy = CostPolicy::builder().build().unwrap();
        assert!(matches!(price(&[], &[], &policy), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_negative_flow_fails() {
        let policy = CostPolicy::builder().build().unwrap();
        let result = price(&[flow(-1.0, 0.0)], &rates(&[0.1]), &policy);
        assert!(matches!(result, Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_negative_tariff_fails() {
        let result = CostPolicy::builder().feed_in_tariff(KilowattHourRate::from(-0.01)).build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_daily() {
        let policy = CostPolicy::builder().build().unwrap();
        let flows = vec![flow(1.0, 0.0); 30];
        let report = price(&flows, &vec![KilowattHourRate::from(0.2); 30], &policy).unwrap();
        let timestamps: Vec<_> = (0..30).map(|i| start() + TimeDelta::hours(i)).collect();
        let days = report.daily(&timestamps).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, start().date_naive());
        assert_abs_diff_eq!(days[0].cost.import_cost.0, 24.0 * 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(days[1].cost.flow.import.0, 6.0);
    }
}
