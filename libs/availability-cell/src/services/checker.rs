// libs/availability-cell/src/services/checker.rs
use crate::models::{EffectiveWindow, TimeOfDay};

/// Whether one provider can take an appointment of the given duration
/// starting at `start`, judged against their effective window alone.
///
/// Booking overlap is not tested here: a booked slot blocks the whole
/// branch and is enforced once per candidate by the calculator.
pub fn provider_can_take(
    window: &EffectiveWindow,
    start: TimeOfDay,
    duration_minutes: i32,
) -> bool {
    if !window.range.fits(start, duration_minutes) {
        return false;
    }
    !window.blocked_starts.contains(&start)
}
