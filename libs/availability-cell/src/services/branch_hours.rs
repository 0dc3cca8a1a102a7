// libs/availability-cell/src/services/branch_hours.rs
use crate::models::{BranchHours, EffectiveWindow, TimeOfDay, TimeRange};

/// Union of effective windows: earliest start to latest end. None when no
/// window exists or the union is degenerate.
pub fn union_window<'a, I>(windows: I) -> Option<TimeRange>
where
    I: IntoIterator<Item = &'a EffectiveWindow>,
{
    let mut bounds: Option<(TimeOfDay, TimeOfDay)> = None;
    for window in windows {
        bounds = Some(match bounds {
            None => (window.range.start, window.range.end),
            Some((start, end)) => (
                start.min(window.range.start),
                end.max(window.range.end),
            ),
        });
    }
    bounds.and_then(|(start, end)| TimeRange::new(start, end))
}

/// Branch-level opening hours for a date: the union of every provider's
/// effective window, or closed when nobody works.
pub fn summarize_branch_hours<'a, I>(windows: I) -> BranchHours
where
    I: IntoIterator<Item = &'a EffectiveWindow>,
{
    match union_window(windows) {
        Some(range) => BranchHours {
            open: true,
            start: Some(range.start),
            end: Some(range.end),
        },
        None => BranchHours::closed(),
    }
}
