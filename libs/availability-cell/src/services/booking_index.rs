// libs/availability-cell/src/services/booking_index.rs
use uuid::Uuid;

use crate::models::{Booking, TimeOfDay};

#[derive(Debug)]
struct BookedInterval {
    provider_id: Uuid,
    start: i32,
    end: i32,
}

/// Booked intervals for one branch and date, as raw minutes since midnight.
/// End minutes may pass 1440 when a long booking runs past midnight; the
/// overlap math stays correct either way.
#[derive(Debug, Default)]
pub struct BookingIndex {
    intervals: Vec<BookedInterval>,
}

impl BookingIndex {
    /// Indexes the bookings that still hold their slot. Records without a
    /// duration occupy the default 30 minutes.
    pub fn from_bookings(bookings: &[Booking]) -> BookingIndex {
        let intervals = bookings
            .iter()
            .filter(|booking| booking.blocks_slots())
            .map(|booking| {
                let start = booking.time.minutes();
                BookedInterval {
                    provider_id: booking.provider_id,
                    start,
                    end: start + booking.resolved_duration(),
                }
            })
            .collect();

        BookingIndex { intervals }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// True when any booking at the branch overlaps the candidate interval,
    /// regardless of provider: the branch calendar holds one shared run of
    /// slots, so a booked slot is gone for everyone.
    pub fn overlaps(&self, start: TimeOfDay, duration_minutes: i32) -> bool {
        let candidate_start = start.minutes();
        let candidate_end = candidate_start + duration_minutes;
        self.intervals
            .iter()
            .any(|booked| candidate_start < booked.end && candidate_end > booked.start)
    }

    /// Overlap test narrowed to one provider's own bookings.
    pub fn overlaps_for_provider(
        &self,
        provider_id: Uuid,
        start: TimeOfDay,
        duration_minutes: i32,
    ) -> bool {
        let candidate_start = start.minutes();
        let candidate_end = candidate_start + duration_minutes;
        self.intervals
            .iter()
            .filter(|booked| booked.provider_id == provider_id)
            .any(|booked| candidate_start < booked.end && candidate_end > booked.start)
    }
}
