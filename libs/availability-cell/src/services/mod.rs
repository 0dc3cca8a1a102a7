pub mod availability;
pub mod booking_index;
pub mod branch_hours;
pub mod checker;
pub mod resolver;

pub use availability::AvailabilityService;
pub use booking_index::BookingIndex;
pub use resolver::{resolve_effective_window, ScheduleAnomaly};
