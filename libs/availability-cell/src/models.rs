// libs/availability-cell/src/models.rs
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::repository::RepositoryError;

/// Candidate slot starts are generated on this fixed grid.
pub const SLOT_STEP_MINUTES: i32 = 30;

/// Assumed length of a booking that carries no duration of its own.
pub const DEFAULT_BOOKING_MINUTES: i32 = 30;

/// Longest appointment a caller may ask for.
pub const MAX_DURATION_MINUTES: i32 = 24 * 60;

// ==============================================================================
// TIME PRIMITIVES
// ==============================================================================

/// A time of day in minutes since local midnight.
///
/// 1440 ("24:00") is a valid value so a working window can end exactly at
/// midnight; it never appears as a slot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(24 * 60);

    pub fn from_minutes(minutes: u16) -> Option<TimeOfDay> {
        if minutes <= 24 * 60 {
            Some(TimeOfDay(minutes))
        } else {
            None
        }
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<TimeOfDay> {
        if minute > 59 {
            return None;
        }
        TimeOfDay::from_minutes(hour * 60 + minute)
    }

    /// Parses "HH:MM" and the "HH:MM:SS" form Postgres uses for time
    /// columns. Seconds are validated and dropped; the grid is minutes.
    pub fn parse(raw: &str) -> Option<TimeOfDay> {
        let mut parts = raw.split(':');
        let hour: u16 = parts.next()?.trim().parse().ok()?;
        let minute: u16 = parts.next()?.trim().parse().ok()?;
        if let Some(seconds) = parts.next() {
            let _: u16 = seconds.trim().parse().ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
        TimeOfDay::from_hm(hour, minute)
    }

    pub fn minutes(self) -> i32 {
        self.0 as i32
    }

    /// Adds minutes, capping at 24:00. Fit checks use raw minute arithmetic;
    /// the cap only affects rendered end times.
    pub fn saturating_add(self, minutes: i32) -> TimeOfDay {
        let total = self.minutes() + minutes.max(0);
        TimeOfDay(total.min(24 * 60) as u16)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        TimeOfDay::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", raw)))
    }
}

/// Half-open interval [start, end) of minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    /// Returns None for empty or inverted ranges.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Option<TimeRange> {
        if start < end {
            Some(TimeRange { start, end })
        } else {
            None
        }
    }

    pub fn duration_minutes(&self) -> i32 {
        self.end.minutes() - self.start.minutes()
    }

    /// start <= at < end.
    pub fn contains(&self, at: TimeOfDay) -> bool {
        at >= self.start && at < self.end
    }

    /// Whether [start, start + duration) lies entirely inside the range.
    pub fn fits(&self, start: TimeOfDay, duration_minutes: i32) -> bool {
        self.contains(start) && start.minutes() + duration_minutes <= self.end.minutes()
    }

    /// Half-open overlap; ranges that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// Branch key, trimmed once at construction so lookups cannot disagree on
/// padded variants of the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct BranchId(String);

impl BranchId {
    pub fn new(key: impl Into<String>) -> BranchId {
        let key = key.into();
        BranchId(key.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for BranchId {
    fn from(value: String) -> Self {
        BranchId::new(value)
    }
}

impl From<&str> for BranchId {
    fn from(value: &str) -> Self {
        BranchId::new(value)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub key: BranchId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub display_name: String,
    pub role: ProviderRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRole {
    Doctor,
    Staff,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRole::Doctor => write!(f, "doctor"),
            ProviderRole::Staff => write!(f, "staff"),
        }
    }
}

/// One provider's recurring week, keyed by branch. A provider may work at
/// several branches with different hours at each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub branches: HashMap<BranchId, WeekdayHours>,
}

impl WeeklySchedule {
    pub fn day_schedule(&self, branch: &BranchId, weekday: Weekday) -> Option<&DaySchedule> {
        self.branches
            .get(branch)
            .and_then(|hours| hours.for_weekday(weekday))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeekdayHours {
    pub monday: Option<DaySchedule>,
    pub tuesday: Option<DaySchedule>,
    pub wednesday: Option<DaySchedule>,
    pub thursday: Option<DaySchedule>,
    pub friday: Option<DaySchedule>,
    pub saturday: Option<DaySchedule>,
    pub sunday: Option<DaySchedule>,
}

impl WeekdayHours {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DaySchedule> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    pub fn set(&mut self, weekday: Weekday, schedule: DaySchedule) {
        let entry = match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };
        *entry = Some(schedule);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// A dated exception to a provider's weekly schedule at one branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateOverride {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub branch: BranchId,
    pub kind: OverrideKind,
    /// Exact slot starts removed by a partial blackout.
    pub time_slots: Option<Vec<TimeOfDay>>,
    /// Replacement window for a specific schedule.
    pub start_time: Option<TimeOfDay>,
    pub end_time: Option<TimeOfDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    BlackoutFullDay,
    BlackoutPartial,
    SpecificSchedule,
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideKind::BlackoutFullDay => write!(f, "blackout_full_day"),
            OverrideKind::BlackoutPartial => write!(f, "blackout_partial"),
            OverrideKind::SpecificSchedule => write!(f, "specific_schedule"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub branch: BranchId,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub provider_id: Uuid,
    pub duration_minutes: Option<i32>,
    pub status: BookingStatus,
}

impl Booking {
    /// Duration in minutes, falling back to the default when the record has
    /// none or a non-positive one.
    pub fn resolved_duration(&self) -> i32 {
        match self.duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_BOOKING_MINUTES,
        }
    }

    /// Cancelled and rejected bookings release their slot.
    pub fn blocks_slots(&self) -> bool {
        !matches!(
            self.status,
            BookingStatus::Cancelled | BookingStatus::Rejected
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
    Rejected,
    NoShow,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Approved => write!(f, "approved"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Rejected => write!(f, "rejected"),
            BookingStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// A provider's working hours on one concrete date after overrides are
/// applied, plus the slot starts a partial blackout removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveWindow {
    pub range: TimeRange,
    pub blocked_starts: BTreeSet<TimeOfDay>,
}

impl EffectiveWindow {
    pub fn open(range: TimeRange) -> EffectiveWindow {
        EffectiveWindow {
            range,
            blocked_starts: BTreeSet::new(),
        }
    }
}

// ==============================================================================
// OUTPUT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub time: TimeOfDay,
    pub available: bool,
    pub available_provider_ids: Vec<Uuid>,
    pub end_time: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchHours {
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<TimeOfDay>,
}

impl BranchHours {
    pub fn closed() -> BranchHours {
        BranchHours {
            open: false,
            start: None,
            end: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResult {
    pub slots: Vec<SlotAvailability>,
    pub branch_hours: BranchHours,
    /// Set only when no slots could exist at all for the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-provider anomalies that degraded the result without failing it.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown branch: {0}")]
    UnknownBranch(BranchId),

    #[error("schedule data fetch failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("schedule data fetch timed out after {0}s")]
    RepositoryTimeout(u64),
}

impl AvailabilityError {
    /// Failures of the data source may succeed on retry; bad requests and
    /// unknown branches never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AvailabilityError::Repository(_) | AvailabilityError::RepositoryTimeout(_)
        )
    }
}
