// libs/availability-cell/src/services/resolver.rs
use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::models::{BranchId, DateOverride, EffectiveWindow, OverrideKind, TimeRange, WeeklySchedule};

/// A schedule record that cannot be applied. The owning provider is dropped
/// for the date and the anomaly is reported as a warning, never as a failure
/// of the whole computation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleAnomaly {
    #[error("more than one specific_schedule override for the date")]
    DuplicateSpecificSchedule,

    #[error("specific_schedule override is missing its start or end time")]
    IncompleteSpecificSchedule,

    #[error("blackout_partial override has no time slots")]
    MissingBlackoutTimes,

    #[error("working window starts at or after its end")]
    EmptyWindow,
}

/// Resolves one provider's working window for one date at one branch.
///
/// A full-day blackout wins over everything. Otherwise a specific_schedule
/// override replaces the weekly entry for that date; with neither, the
/// weekly entry for the date's weekday applies. Partial blackouts never
/// shrink the window, they mark individual slot starts as blocked.
///
/// Ok(None) means the provider simply does not work that day.
pub fn resolve_effective_window(
    weekly: Option<&WeeklySchedule>,
    overrides: &[DateOverride],
    branch: &BranchId,
    date: NaiveDate,
) -> Result<Option<EffectiveWindow>, ScheduleAnomaly> {
    let overrides: Vec<&DateOverride> = overrides
        .iter()
        .filter(|o| o.branch == *branch && o.date == date)
        .collect();

    if overrides
        .iter()
        .any(|o| o.kind == OverrideKind::BlackoutFullDay)
    {
        return Ok(None);
    }

    let mut specific = overrides
        .iter()
        .filter(|o| o.kind == OverrideKind::SpecificSchedule);
    let replacement = specific.next();
    if specific.next().is_some() {
        return Err(ScheduleAnomaly::DuplicateSpecificSchedule);
    }

    let range = match replacement {
        Some(entry) => {
            let (Some(start), Some(end)) = (entry.start_time, entry.end_time) else {
                return Err(ScheduleAnomaly::IncompleteSpecificSchedule);
            };
            TimeRange::new(start, end).ok_or(ScheduleAnomaly::EmptyWindow)?
        }
        None => {
            let Some(day) = weekly.and_then(|w| w.day_schedule(branch, date.weekday())) else {
                return Ok(None);
            };
            if !day.enabled {
                return Ok(None);
            }
            TimeRange::new(day.start, day.end).ok_or(ScheduleAnomaly::EmptyWindow)?
        }
    };

    let mut blocked_starts = BTreeSet::new();
    for entry in overrides
        .iter()
        .filter(|o| o.kind == OverrideKind::BlackoutPartial)
    {
        let Some(times) = &entry.time_slots else {
            return Err(ScheduleAnomaly::MissingBlackoutTimes);
        };
        blocked_starts.extend(times.iter().copied());
    }

    Ok(Some(EffectiveWindow {
        range,
        blocked_starts,
    }))
}
