use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
};

pub type Point<K, V> = (K, V);
pub type Series<K, V> = Vec<Point<K, V>>;

/// Household energy balance within a single fixed-length interval.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    pub timestamp: DateTime<Utc>,

    /// PV energy produced within the interval.
    #[serde(rename = "production_kwh")]
    pub production: KilowattHours,

    /// Household energy demand within the interval.
    #[serde(rename = "consumption_kwh")]
    pub consumption: KilowattHours,

    /// Grid import price, required only for cost evaluation.
    #[serde(rename = "price_eur_kwh", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<KilowattHourRate>,
}

impl TimeStep {
    pub const fn new(
        timestamp: DateTime<Utc>,
        production: KilowattHours,
        consumption: KilowattHours,
    ) -> Self {
        Self { timestamp, production, consumption, price: None }
    }

    pub const fn with_price(mut self, price: KilowattHourRate) -> Self {
        self.price = Some(price);
        self
    }

    /// Production minus consumption, negative for a deficit.
    pub fn surplus(&self) -> KilowattHours {
        self.production - self.consumption
    }

    fn validate(&self) -> Result {
        if !self.production.is_finite() || !self.production.is_non_negative() {
            return Err(Error::input(format!(
                "production at {} must be finite and non-negative, got {:?}",
                self.timestamp, self.production,
            )));
        }
        if !self.consumption.is_finite() || !self.consumption.is_non_negative() {
            return Err(Error::input(format!(
                "consumption at {} must be finite and non-negative, got {:?}",
                self.timestamp, self.consumption,
            )));
        }
        if let Some(price) = self.price
            && !price.is_finite()
        {
            return Err(Error::input(format!(
                "price at {} must be finite, got {price:?}",
                self.timestamp,
            )));
        }
        Ok(())
    }
}

/// Validate the series and return its step duration.
///
/// The duration is taken from the first two timestamps; a single-step series is assumed hourly.
/// Every following gap must match it exactly.
pub fn step_duration(series: &[TimeStep]) -> Result<TimeDelta> {
    let Some(first) = series.first() else {
        return Err(Error::input("the series is empty"));
    };
    first.validate()?;
    let step_duration = match series.get(1) {
        Some(second) => second.timestamp - first.timestamp,
        None => TimeDelta::hours(1),
    };
    for (previous, current) in series.iter().zip(series.iter().skip(1)) {
        current.validate()?;
        let gap = current.timestamp - previous.timestamp;
        if gap <= TimeDelta::zero() {
            return Err(Error::input(format!(
                "timestamps must be strictly increasing: {} is followed by {}",
                previous.timestamp, current.timestamp,
            )));
        }
        if gap != step_duration {
            return Err(Error::input(format!(
                "step at {} lasts {gap}, expected {step_duration}",
                previous.timestamp,
            )));
        }
    }
    Ok(step_duration)
}

/// Deterministic series generators shared by the engine tests.
#[cfg(test)]
pub mod fixtures {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::TimeStep;
    use crate::quantity::{energy::KilowattHours, rate::KilowattHourRate};

    pub fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    /// Hourly series from `(production, consumption)` pairs.
    pub fn hourly(values: &[(f64, f64)]) -> Vec<TimeStep> {
        values
            .iter()
            .enumerate()
            .map(|(i, (production, consumption))| {
                TimeStep::new(
                    start() + TimeDelta::hours(i as i64),
                    KilowattHours::from(*production),
                    KilowattHours::from(*consumption),
                )
            })
            .collect()
    }

    /// Hourly series from `(production, consumption, price)` triples.
    pub fn priced(values: &[(f64, f64, f64)]) -> Vec<TimeStep> {
        values
            .iter()
            .enumerate()
            .map(|(i, (production, consumption, price))| {
                TimeStep::new(
                    start() + TimeDelta::hours(i as i64),
                    KilowattHours::from(*production),
                    KilowattHours::from(*consumption),
                )
                .with_price(KilowattHourRate::from(*price))
            })
            .collect()
    }

    /// Pseudo-random but reproducible series with a daily PV bell and evening load peak.
    pub fn generated(seed: u64, n_steps: usize) -> Vec<TimeStep> {
        let mut state = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let mut next = move || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1_u64 << 53) as f64
        };
        (0..n_steps)
            .map(|i| {
                let hour = (i % 24) as f64;
                let sun = (std::f64::consts::PI * (hour - 6.0) / 12.0).sin().max(0.0);
                let production = 4.0 * sun * next();
                let evening = if (17.0..22.0).contains(&hour) { 1.5 } else { 0.0 };
                let consumption = 0.2 + evening + 1.5 * next();
                let price = 0.05 + 0.4 * next();
                TimeStep::new(
                    start() + TimeDelta::hours(i as i64),
                    KilowattHours::from(production),
                    KilowattHours::from(consumption),
                )
                .with_price(KilowattHourRate::from(price))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::{fixtures::*, *};

    #[test]
    fn test_step_duration_hourly() {
        let series = hourly(&[(0.0, 1.0), (1.0, 0.0), (2.0, 2.0)]);
        assert_eq!(step_duration(&series).unwrap(), TimeDelta::hours(1));
    }

    #[test]
    fn test_step_duration_single_step() {
        let series = hourly(&[(0.0, 1.0)]);
        assert_eq!(step_duration(&series).unwrap(), TimeDelta::hours(1));
    }

    #[test]
    fn test_step_duration_quarter_hour() {
        let mut series = hourly(&[(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)]);
        for (i, step) in series.iter_mut().enumerate() {
            step.timestamp = start() + TimeDelta::minutes(15 * i as i64);
        }
        assert_eq!(step_duration(&series).unwrap(), TimeDelta::minutes(15));
    }

    #[test]
    fn test_empty_series_fails() {
        assert!(matches!(step_duration(&[]), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_negative_consumption_fails() {
        let series = hourly(&[(0.0, 1.0), (0.0, -1.0)]);
        assert!(matches!(step_duration(&series), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_nan_production_fails() {
        let series = hourly(&[(f64::NAN, 1.0)]);
        assert!(matches!(step_duration(&series), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_unordered_timestamps_fail() {
        let mut series = hourly(&[(0.0, 1.0), (0.0, 1.0)]);
        series.swap(0, 1);
        assert!(matches!(step_duration(&series), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_gap_fails() {
        let mut series = hourly(&[(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)]);
        series[2].timestamp += TimeDelta::hours(1);
        assert!(matches!(step_duration(&series), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_surplus() {
        let series = hourly(&[(3.0, 1.0)]);
        assert_eq!(series[0].surplus(), KilowattHours::from(2.0));
    }
}
