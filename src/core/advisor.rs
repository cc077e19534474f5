//! Rule-based hourly advice on top of the dispatch simulation.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use comfy_table::Color;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{series::TimeStep, step::SimulationStep},
    error::{Error, Result},
    prelude::{debug, instrument},
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
};

/// Minimal surplus worth charging for.
const MIN_CHARGING_SURPLUS: KilowattHours = KilowattHours::new(0.2);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Store the PV surplus.
    Charge,

    /// Cover the load from the battery during an expensive hour.
    Discharge,

    /// Run flexible appliances now.
    ShiftLoad,

    Idle,
}

impl Action {
    const fn score(self) -> f64 {
        match self {
            Self::Charge => 0.85,
            Self::Discharge => 0.75,
            Self::ShiftLoad => 0.65,
            Self::Idle => 0.30,
        }
    }

    pub const fn color(self) -> Color {
        match self {
            Self::Charge => Color::Green,
            Self::Discharge => Color::Blue,
            Self::ShiftLoad => Color::DarkYellow,
            Self::Idle => Color::Reset,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Charge => write!(f, "Charge"),
            Self::Discharge => write!(f, "Discharge"),
            Self::ShiftLoad => write!(f, "Shift load"),
            Self::Idle => write!(f, "Idle"),
        }
    }
}

/// Price separating cheap hours from expensive ones.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PriceThreshold {
    Fixed(KilowattHourRate),

    /// 75th percentile of the plan prices.
    Auto,
}

impl PriceThreshold {
    const AUTO_PERCENTILE: f64 = 0.75;

    pub fn resolve(self, prices: &[KilowattHourRate]) -> Result<KilowattHourRate> {
        match self {
            Self::Fixed(threshold) if threshold.is_finite() => Ok(threshold),
            Self::Fixed(threshold) => {
                Err(Error::configuration(format!("price threshold must be finite, got {threshold:?}")))
            }
            Self::Auto => percentile(prices, Self::AUTO_PERCENTILE)
                .ok_or_else(|| Error::input("cannot derive a price threshold from an empty plan")),
        }
    }
}

/// Linearly interpolated percentile, `q` in `[0, 1]`.
fn percentile(values: &[KilowattHourRate], q: f64) -> Option<KilowattHourRate> {
    let sorted = values.iter().copied().sorted_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0)).collect_vec();
    let last = sorted.len().checked_sub(1)?;
    #[expect(clippy::cast_precision_loss)]
    let position = q * last as f64;
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(last);
    let weight = position - position.floor();
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub reason: String,

    /// Confidence in `[0, 1]`.
    pub score: f64,

    /// Simulated residual energy at the end of the step.
    #[serde(rename = "soc_kwh")]
    pub residual_energy: KilowattHours,
}

fn classify(step: &TimeStep, price: KilowattHourRate, threshold: KilowattHourRate) -> (Action, String) {
    let surplus = step.surplus();
    if surplus > MIN_CHARGING_SURPLUS {
        (Action::Charge, format!("predicted PV surplus ({:.2} kWh)", surplus.0))
    } else if price >= threshold && surplus < KilowattHours::ZERO {
        (Action::Discharge, "high price hour; avoid grid usage".to_owned())
    } else if price < threshold && surplus > KilowattHours::ZERO {
        (Action::ShiftLoad, "cheap hour with PV available".to_owned())
    } else {
        (Action::Idle, "no clear advantage".to_owned())
    }
}

/// Advise on every plan step, given the simulation of that same plan.
#[instrument(skip_all, fields(n_steps = plan.len()))]
pub fn recommend(
    plan: &[TimeStep],
    simulation: &[SimulationStep],
    threshold: PriceThreshold,
) -> Result<Vec<Recommendation>> {
    if plan.is_empty() {
        return Err(Error::input("the plan is empty"));
    }
    if plan.len() != simulation.len() {
        return Err(Error::input(format!(
            "got {} simulated steps for {} plan steps",
            simulation.len(),
            plan.len(),
        )));
    }
    let prices = plan
        .iter()
        .map(|step| {
            step.price.ok_or_else(|| Error::input(format!("missing price at {}", step.timestamp)))
        })
        .collect::<Result<Vec<_>>>()?;
    let threshold = threshold.resolve(&prices)?;

    let recommendations = plan
        .iter()
        .zip(simulation)
        .zip(prices)
        .map(|((step, simulated), price)| {
            if step.timestamp != simulated.timestamp {
                return Err(Error::input(format!(
                    "plan step at {} is paired with a simulated step at {}",
                    step.timestamp, simulated.timestamp,
                )));
            }
            let (action, reason) = classify(step, price, threshold);
            Ok(Recommendation {
                timestamp: step.timestamp,
                action,
                reason,
                score: action.score(),
                residual_energy: simulated.residual_energy,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        ?threshold,
        n_charge = recommendations.iter().filter(|it| it.action == Action::Charge).count(),
        n_discharge = recommendations.iter().filter(|it| it.action == Action::Discharge).count(),
        "recommended",
    );
    Ok(recommendations)
}
