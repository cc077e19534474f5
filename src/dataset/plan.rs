use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use itertools::iterate;

use crate::{
    core::series::TimeStep,
    error::{Error, Result},
    prelude::debug,
};

pub const MAX_PLAN_HOURS: usize = 168;

const HOURS_PER_DAY: usize = 24;

/// Build an hourly plan by repeating a complete day of history.
///
/// The template day starts at the same time of day as `start`. The latest such day that ends
/// by `start` is preferred, otherwise the latest day that is complete at all.
pub fn build_plan(
    history: &[TimeStep],
    start: DateTime<Utc>,
    hours: usize,
) -> Result<Vec<TimeStep>> {
    if !(1..=MAX_PLAN_HOURS).contains(&hours) {
        return Err(Error::input(format!(
            "plan length must be within 1..={MAX_PLAN_HOURS} hours, got {hours}"
        )));
    }
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return Err(Error::input(format!("need at least {HOURS_PER_DAY} hours of history, got 0")));
    };
    if history.len() < HOURS_PER_DAY {
        return Err(Error::input(format!(
            "need at least {HOURS_PER_DAY} hours of history, got {}",
            history.len(),
        )));
    }
    let index: BTreeMap<_, _> = history.iter().map(|step| (step.timestamp, step)).collect();
    let day = TimeDelta::days(1);
    let template_at = |anchor: DateTime<Utc>| {
        (0..HOURS_PER_DAY as i64)
            .map(|hour| index.get(&(anchor + TimeDelta::hours(hour))).copied())
            .collect::<Option<Vec<_>>>()
    };

    // Latest anchor congruent to `start` modulo a day whose last hour is still in history.
    let last_anchor = last.timestamp - TimeDelta::hours(HOURS_PER_DAY as i64 - 1);
    let n_days = (start - last_anchor).num_seconds().div_euclid(day.num_seconds())
        + i64::from((start - last_anchor).num_seconds().rem_euclid(day.num_seconds()) != 0);
    let latest = start - TimeDelta::days(n_days);
    let mut complete = iterate(latest, |anchor| *anchor - day)
        .take_while(|anchor| *anchor >= first.timestamp)
        .filter_map(|anchor| Some((anchor, template_at(anchor)?)))
        .peekable();
    let fallback = complete.peek().cloned();
    let (anchor, template) = complete
        .find(|(anchor, _)| *anchor + day <= start)
        .or(fallback)
        .ok_or_else(|| {
            Error::input(format!("history has no complete day aligned with {start}"))
        })?;
    debug!(%anchor, "selected the template day");

    let plan = (0_i64..)
        .zip(template.into_iter().cycle())
        .take(hours)
        .map(|(hour, step)| TimeStep { timestamp: start + TimeDelta::hours(hour), ..*step })
        .collect();
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::{
        core::series::fixtures::{generated, start},
        quantity::energy::KilowattHours,
    };

    #[test]
    fn test_repeats_preceding_day() {
        let history = generated(1, 72);
        let plan = build_plan(&history, start() + TimeDelta::days(2), 30).unwrap();
        assert_eq!(plan.len(), 30);
        assert_eq!(plan[0].timestamp, start() + TimeDelta::days(2));
        assert_eq!(plan[0].production, history[24].production);
        assert_eq!(plan[23].consumption, history[47].consumption);
        assert_eq!(plan[24].price, history[24].price);
        assert_eq!(plan[29].timestamp - plan[28].timestamp, TimeDelta::hours(1));
    }

    #[test]
    fn test_falls_back_to_last_day() {
        let history = generated(2, 48);
        let plan = build_plan(&history, start(), 24).unwrap();
        assert_eq!(plan[0].production, history[24].production);
        assert_eq!(plan[0].timestamp, start());
    }

    #[test]
    fn test_short_history_fails() {
        let history = generated(3, 23);
        assert!(matches!(build_plan(&history, start(), 24), Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_hours_bounds() {
        let history = generated(4, 24);
        assert!(build_plan(&history, start(), 0).is_err());
        assert!(build_plan(&history, start(), MAX_PLAN_HOURS + 1).is_err());
        assert_eq!(build_plan(&history, start(), MAX_PLAN_HOURS).unwrap().len(), MAX_PLAN_HOURS);
    }

    #[test]
    fn test_time_of_day_is_kept() {
        let history = generated(6, 40);
        let plan = build_plan(&history, start() + TimeDelta::days(2), 24).unwrap();
        assert_eq!(plan[0].production, history[0].production);
        assert_eq!(plan[0].consumption, history[0].consumption);
        assert_eq!(plan[23].consumption, history[23].consumption);
    }

    #[test]
    fn test_incomplete_day_is_skipped() {
        let mut history = generated(7, 48);
        history.remove(30);
        let plan = build_plan(&history, start() + TimeDelta::days(2), 24).unwrap();
        assert_eq!(plan[0].production, history[0].production);
        assert_eq!(plan[12].consumption, history[12].consumption);
    }

    #[test]
    fn test_no_complete_day_fails() {
        let mut history = generated(8, 30);
        history.remove(10);
        let result = build_plan(&history, start() + TimeDelta::days(1), 24);
        assert!(matches!(result, Err(Error::InputValidation(_))));
    }

    #[test]
    fn test_values_are_copied() {
        let history = generated(5, 24);
        let plan = build_plan(&history, start() + TimeDelta::days(1), 1).unwrap();
        assert!(plan[0].production >= KilowattHours::ZERO);
        assert_eq!(plan[0].surplus(), history[0].surplus());
    }
}
