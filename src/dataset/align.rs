use std::{collections::BTreeMap, iter::repeat_n};

use chrono::{DateTime, TimeDelta, Utc};
use itertools::{Itertools, iterate};

use crate::{
    core::series::{Series, TimeStep},
    prelude::*,
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
};

/// Longest run of missing hours that is still filled in.
pub const MAX_FILLED_GAP: usize = 3;

/// Half-open time window `[since, until)`, unbounded on the missing sides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Window {
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| timestamp >= since)
            && self.until.is_none_or(|until| timestamp < until)
    }

    /// Index the series by timestamp, keeping the last of duplicates.
    fn index(self, series: Series<DateTime<Utc>, f64>) -> BTreeMap<DateTime<Utc>, f64> {
        series.into_iter().filter(|(timestamp, _)| self.contains(*timestamp)).collect()
    }
}

/// Take the series values on the grid, filling short gaps from the neighbouring hours.
///
/// A gap is forward-filled from the previous hour, or back-filled at the start of the grid.
fn fill(
    label: &str,
    values: &BTreeMap<DateTime<Utc>, f64>,
    grid: &[DateTime<Utc>],
) -> Result<Vec<f64>> {
    let sparse = grid.iter().map(|timestamp| values.get(timestamp).copied()).collect_vec();
    let mut filled = Vec::with_capacity(sparse.len());
    let mut n_filled = 0;
    let mut i = 0;
    while i < sparse.len() {
        if let Some(value) = sparse[i] {
            filled.push(value);
            i += 1;
            continue;
        }
        let gap_end = sparse[i..].iter().position(Option::is_some).map_or(sparse.len(), |n| i + n);
        let n_missing = gap_end - i;
        ensure!(
            n_missing <= MAX_FILLED_GAP,
            "{label} is missing {n_missing} hours starting from {}",
            grid[i],
        );
        let value = filled
            .last()
            .copied()
            .or_else(|| sparse.get(gap_end).copied().flatten())
            .with_context(|| format!("{label} has no values on the hourly grid"))?;
        filled.extend(repeat_n(value, n_missing));
        n_filled += n_missing;
        i = gap_end;
    }
    if n_filled != 0 {
        warn!(label, n_filled, "filled missing hours");
    }
    let n_off_grid = grid
        .first()
        .zip(grid.last())
        .map_or(0, |(first, last)| values.range(first..=last).count())
        .saturating_sub(sparse.iter().flatten().count());
    if n_off_grid != 0 {
        warn!(label, n_off_grid, "ignored values off the hourly grid");
    }
    Ok(filled)
}

/// Align the series on a common hourly grid.
///
/// The grid spans the period covered by every series, anchored at its first hour.
/// Gaps of up to [`MAX_FILLED_GAP`] hours are filled, longer gaps fail.
#[instrument(skip_all)]
pub fn align(
    production: Series<DateTime<Utc>, f64>,
    consumption: Series<DateTime<Utc>, f64>,
    price: Option<Series<DateTime<Utc>, f64>>,
    window: Window,
) -> Result<Vec<TimeStep>> {
    let production = window.index(production);
    let consumption = window.index(consumption);
    let price = price.map(|price| window.index(price));

    let indices = [Some(&production), Some(&consumption), price.as_ref()].into_iter().flatten();
    let bounds: Option<Vec<_>> = indices
        .map(|index| Some((*index.first_key_value()?.0, *index.last_key_value()?.0)))
        .collect();
    let Some(bounds) = bounds else {
        return Ok(Vec::new());
    };
    let (Some(start), Some(end)) =
        (bounds.iter().map(|(first, _)| *first).max(), bounds.iter().map(|(_, last)| *last).min())
    else {
        return Ok(Vec::new());
    };
    let grid = iterate(start, |timestamp| *timestamp + TimeDelta::hours(1))
        .take_while(|timestamp| *timestamp <= end)
        .collect_vec();

    let production = fill("production", &production, &grid)?;
    let consumption = fill("consumption", &consumption, &grid)?;
    let price = price.map(|price| fill("price", &price, &grid)).transpose()?;

    let series: Vec<TimeStep> = grid
        .iter()
        .enumerate()
        .map(|(i, timestamp)| {
            let step = TimeStep::new(
                *timestamp,
                KilowattHours::from(production[i]),
                KilowattHours::from(consumption[i]),
            );
            match &price {
                Some(price) => step.with_price(KilowattHourRate::from(price[i])),
                None => step,
            }
        })
        .collect();
    info!(
        n_steps = series.len(),
        first = ?series.first().map(|step| step.timestamp),
        last = ?series.last().map(|step| step.timestamp),
        "aligned",
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::core::{BatteryConfiguration, simulate};

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + TimeDelta::hours(hour)
    }

    fn hourly(hours: impl IntoIterator<Item = i64>, value: f64) -> Series<DateTime<Utc>, f64> {
        hours.into_iter().map(|hour| (at(hour), value)).collect()
    }

    #[test]
    fn test_common_span() {
        let production = vec![(at(2), 3.0), (at(0), 1.0), (at(1), 2.0)];
        let consumption = vec![(at(1), 0.5), (at(2), 0.5), (at(3), 0.5)];
        let series = align(production, consumption, None, Window::default()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].timestamp, at(1));
        assert_eq!(series[1].timestamp, at(2));
        assert_eq!(series[1].production, KilowattHours::from(3.0));
        assert_eq!(series[1].price, None);
    }

    #[test]
    fn test_price_join() {
        let production = hourly(0..3, 1.0);
        let consumption = hourly(0..3, 0.5);
        let price = vec![(at(0), 0.1), (at(1), 0.25), (at(2), 0.3)];
        let series = align(production, consumption, Some(price), Window::default()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[1].price, Some(KilowattHourRate::from(0.25)));
    }

    #[test]
    fn test_window_is_half_open() {
        let window = Window { since: Some(at(1)), until: Some(at(3)) };
        let series = align(hourly(0..5, 1.0), hourly(0..5, 1.0), None, window).unwrap();
        assert_eq!(series.iter().map(|step| step.timestamp).collect_vec(), [at(1), at(2)]);
    }

    #[test]
    fn test_short_gap_is_forward_filled() {
        let production = vec![(at(0), 1.0), (at(1), 2.0), (at(3), 4.0), (at(4), 5.0)];
        let series = align(production, hourly(0..5, 1.0), None, Window::default()).unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series[2].timestamp, at(2));
        assert_eq!(series[2].production, KilowattHours::from(2.0));

        let battery = BatteryConfiguration::builder().build().unwrap();
        assert_eq!(simulate(&battery, &series).unwrap().len(), 5);
    }

    #[test]
    fn test_leading_gap_is_back_filled() {
        let production = vec![(at(0) - TimeDelta::minutes(30), 9.0), (at(1), 2.0), (at(2), 3.0)];
        let series = align(production, hourly(0..3, 1.0), None, Window::default()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].timestamp, at(0));
        assert_eq!(series[0].production, KilowattHours::from(2.0));
    }

    #[test]
    fn test_long_gap_fails() {
        let production = hourly((0..3).chain(7..10), 1.0);
        let result = align(production, hourly(0..10, 1.0), None, Window::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_longest_filled_gap() {
        let production = hourly((0..3).chain(3 + MAX_FILLED_GAP as i64..10), 1.0);
        let series = align(production, hourly(0..10, 1.0), None, Window::default()).unwrap();
        assert_eq!(series.len(), 10);
    }

    #[test]
    fn test_disjoint_series_are_empty() {
        let series = align(hourly(0..3, 1.0), hourly(5..8, 1.0), None, Window::default()).unwrap();
        assert!(series.is_empty());
    }
}
