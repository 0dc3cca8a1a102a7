// libs/availability-cell/src/services/availability.rs
use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{
    AvailabilityError, Branch, BranchHours, BranchId, EffectiveWindow, Provider,
    SlotAvailability, SlotsResult, TimeOfDay, MAX_DURATION_MINUTES, SLOT_STEP_MINUTES,
};
use crate::repository::{RepositoryError, ScheduleRepository, SupabaseScheduleRepository};
use crate::services::booking_index::BookingIndex;
use crate::services::branch_hours::{summarize_branch_hours, union_window};
use crate::services::checker::provider_can_take;
use crate::services::resolver::resolve_effective_window;

struct ProviderWindow {
    provider_id: Uuid,
    window: EffectiveWindow,
}

/// Everything known about one branch-date after per-provider resolution.
struct ResolvedDay {
    windows: Vec<ProviderWindow>,
    providers_total: usize,
    warnings: Vec<String>,
}

impl ResolvedDay {
    fn empty_message(&self, branch: &BranchId, date: NaiveDate) -> String {
        if self.providers_total == 0 {
            format!("No bookable providers are configured for branch {}.", branch)
        } else {
            format!("No provider works at branch {} on {}.", branch, date)
        }
    }
}

pub struct AvailabilityService<R: ScheduleRepository> {
    repository: R,
    fetch_timeout: Duration,
}

impl AvailabilityService<SupabaseScheduleRepository> {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            repository: SupabaseScheduleRepository::new(config),
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

impl<R: ScheduleRepository> AvailabilityService<R> {
    pub fn with_repository(repository: R, fetch_timeout: Duration) -> Self {
        Self {
            repository,
            fetch_timeout,
        }
    }

    /// Compute every bookable slot for a branch and date.
    ///
    /// The grid runs over the union of provider windows in 30 minute steps;
    /// each candidate is judged for the requested duration. An empty result
    /// carries a message naming the cause, and data problems scoped to a
    /// single provider surface as warnings instead of failing the query.
    pub async fn compute_available_slots(
        &self,
        branch: &BranchId,
        date: NaiveDate,
        duration_minutes: i32,
    ) -> Result<SlotsResult, AvailabilityError> {
        validate_branch(branch)?;
        validate_duration(duration_minutes)?;

        debug!(
            "Computing available slots for branch {} on {} ({} minute duration)",
            branch, date, duration_minutes
        );

        self.require_branch(branch).await?;
        let day = self.resolve_provider_windows(branch, date).await?;

        let Some(union) = union_window(day.windows.iter().map(|p| &p.window)) else {
            debug!("No usable provider windows for branch {} on {}", branch, date);
            return Ok(SlotsResult {
                slots: Vec::new(),
                branch_hours: BranchHours::closed(),
                message: Some(day.empty_message(branch, date)),
                warnings: day.warnings,
            });
        };

        let bookings = self
            .fetch(self.repository.get_bookings(branch, date))
            .await?;
        let index = BookingIndex::from_bookings(&bookings);
        debug!(
            "Indexed {} blocking bookings for branch {} on {}",
            index.len(),
            branch,
            date
        );

        let mut slots = Vec::new();
        let mut start = union.start;
        while start < union.end {
            slots.push(evaluate_slot(&day.windows, &index, start, duration_minutes));
            start = start.saturating_add(SLOT_STEP_MINUTES);
        }

        let available = slots.iter().filter(|slot| slot.available).count();
        debug!("Found {} available of {} candidate slots", available, slots.len());

        Ok(SlotsResult {
            slots,
            branch_hours: summarize_branch_hours(day.windows.iter().map(|p| &p.window)),
            message: None,
            warnings: day.warnings,
        })
    }

    /// Point query for one candidate slot, evaluated by the same rules as
    /// the full listing so the two can never disagree.
    pub async fn is_slot_available(
        &self,
        branch: &BranchId,
        date: NaiveDate,
        time: TimeOfDay,
        duration_minutes: i32,
    ) -> Result<bool, AvailabilityError> {
        validate_branch(branch)?;
        validate_duration(duration_minutes)?;

        debug!(
            "Checking slot {} at branch {} on {} ({} minute duration)",
            time, branch, date, duration_minutes
        );

        self.require_branch(branch).await?;
        let day = self.resolve_provider_windows(branch, date).await?;
        if day.windows.is_empty() {
            return Ok(false);
        }

        let bookings = self
            .fetch(self.repository.get_bookings(branch, date))
            .await?;
        let index = BookingIndex::from_bookings(&bookings);

        Ok(evaluate_slot(&day.windows, &index, time, duration_minutes).available)
    }

    /// Branch-level opening hours for a date.
    pub async fn branch_hours(
        &self,
        branch: &BranchId,
        date: NaiveDate,
    ) -> Result<BranchHours, AvailabilityError> {
        validate_branch(branch)?;

        debug!("Summarizing branch hours for {} on {}", branch, date);

        self.require_branch(branch).await?;
        let day = self.resolve_provider_windows(branch, date).await?;
        Ok(summarize_branch_hours(day.windows.iter().map(|p| &p.window)))
    }

    // Private helper methods

    async fn require_branch(&self, branch: &BranchId) -> Result<Branch, AvailabilityError> {
        self.fetch(self.repository.get_branch(branch))
            .await?
            .ok_or_else(|| AvailabilityError::UnknownBranch(branch.clone()))
    }

    /// Resolves an effective window per provider. Providers whose schedule
    /// data is malformed are dropped with a warning; transport failures
    /// abort the computation so the caller can retry.
    async fn resolve_provider_windows(
        &self,
        branch: &BranchId,
        date: NaiveDate,
    ) -> Result<ResolvedDay, AvailabilityError> {
        let mut providers = self
            .fetch(self.repository.get_providers_for_branch(branch))
            .await?;
        providers.sort_by_key(|provider| provider.id);
        let providers_total = providers.len();

        let mut windows = Vec::new();
        let mut warnings = Vec::new();
        for provider in &providers {
            let weekly = match self
                .fetch(self.repository.get_weekly_schedule(provider.id))
                .await
            {
                Ok(weekly) => weekly,
                Err(err) => {
                    note_provider_failure(&mut warnings, provider, date, err)?;
                    continue;
                }
            };

            let overrides = match self
                .fetch(self.repository.get_date_overrides(provider.id, date, branch))
                .await
            {
                Ok(overrides) => overrides,
                Err(err) => {
                    note_provider_failure(&mut warnings, provider, date, err)?;
                    continue;
                }
            };

            match resolve_effective_window(weekly.as_ref(), &overrides, branch, date) {
                Ok(Some(window)) => windows.push(ProviderWindow {
                    provider_id: provider.id,
                    window,
                }),
                Ok(None) => {}
                Err(anomaly) => {
                    warn!(
                        "Dropping provider {} for {} at branch {}: {}",
                        provider.id, date, branch, anomaly
                    );
                    warnings.push(format!(
                        "provider {} ({}) skipped for {}: {}",
                        provider.display_name, provider.id, date, anomaly
                    ));
                }
            }
        }

        Ok(ResolvedDay {
            windows,
            providers_total,
            warnings,
        })
    }

    async fn fetch<T>(
        &self,
        query: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, AvailabilityError> {
        match tokio::time::timeout(self.fetch_timeout, query).await {
            Ok(result) => result.map_err(AvailabilityError::from),
            Err(_) => Err(AvailabilityError::RepositoryTimeout(
                self.fetch_timeout.as_secs(),
            )),
        }
    }
}

/// Judge one candidate start against every provider window and the booking
/// index. A booked slot is unavailable for the whole branch, so nobody is
/// offered for it even when another provider is free then.
fn evaluate_slot(
    windows: &[ProviderWindow],
    index: &BookingIndex,
    start: TimeOfDay,
    duration_minutes: i32,
) -> SlotAvailability {
    let end_time = start.saturating_add(duration_minutes);

    if index.overlaps(start, duration_minutes) {
        return SlotAvailability {
            time: start,
            available: false,
            available_provider_ids: Vec::new(),
            end_time,
        };
    }

    let available_provider_ids: Vec<Uuid> = windows
        .iter()
        .filter(|candidate| provider_can_take(&candidate.window, start, duration_minutes))
        .map(|candidate| candidate.provider_id)
        .collect();

    SlotAvailability {
        time: start,
        available: !available_provider_ids.is_empty(),
        available_provider_ids,
        end_time,
    }
}

/// Malformed data scoped to one provider degrades to a warning; anything
/// else propagates and fails the whole computation.
fn note_provider_failure(
    warnings: &mut Vec<String>,
    provider: &Provider,
    date: NaiveDate,
    err: AvailabilityError,
) -> Result<(), AvailabilityError> {
    match err {
        AvailabilityError::Repository(RepositoryError::Decode(detail)) => {
            warn!(
                "Provider {} has undecodable schedule data for {}: {}",
                provider.id, date, detail
            );
            warnings.push(format!(
                "provider {} ({}) skipped for {}: malformed schedule data",
                provider.display_name, provider.id, date
            ));
            Ok(())
        }
        other => Err(other),
    }
}

fn validate_branch(branch: &BranchId) -> Result<(), AvailabilityError> {
    if branch.is_empty() {
        return Err(AvailabilityError::InvalidInput(
            "branch key must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_duration(duration_minutes: i32) -> Result<(), AvailabilityError> {
    if duration_minutes <= 0 {
        return Err(AvailabilityError::InvalidInput(
            "duration_minutes must be positive".to_string(),
        ));
    }
    if duration_minutes > MAX_DURATION_MINUTES {
        return Err(AvailabilityError::InvalidInput(format!(
            "duration_minutes must not exceed {}",
            MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}
