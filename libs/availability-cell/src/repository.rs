// libs/availability-cell/src/repository.rs
use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Booking, Branch, BranchId, DateOverride, DaySchedule, Provider, TimeOfDay, WeeklySchedule,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed record: {0}")]
    Decode(String),
}

/// Read-side source of scheduling data. One availability query fetches a
/// fresh snapshot through this trait; implementations must not answer from
/// a cache that can drift within a single computation.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn get_branch(&self, branch: &BranchId) -> Result<Option<Branch>, RepositoryError>;

    async fn get_providers_for_branch(
        &self,
        branch: &BranchId,
    ) -> Result<Vec<Provider>, RepositoryError>;

    async fn get_weekly_schedule(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<WeeklySchedule>, RepositoryError>;

    async fn get_date_overrides(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        branch: &BranchId,
    ) -> Result<Vec<DateOverride>, RepositoryError>;

    async fn get_bookings(
        &self,
        branch: &BranchId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, RepositoryError>;
}

/// One weekly schedule row as stored: provider x branch x weekday.
#[derive(Debug, Deserialize)]
struct ScheduleRow {
    branch: BranchId,
    weekday: String,
    enabled: bool,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
}

pub struct SupabaseScheduleRepository {
    supabase: SupabaseClient,
}

impl SupabaseScheduleRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch_rows(&self, path: &str) -> Result<Vec<Value>, RepositoryError> {
        self.supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| RepositoryError::Request(e.to_string()))
    }
}

fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, RepositoryError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| RepositoryError::Decode(e.to_string())))
        .collect()
}

#[async_trait]
impl ScheduleRepository for SupabaseScheduleRepository {
    async fn get_branch(&self, branch: &BranchId) -> Result<Option<Branch>, RepositoryError> {
        debug!("Fetching branch record for {}", branch);

        let path = format!("/rest/v1/branches?key=eq.{}&select=key,name", branch);
        let rows = self.fetch_rows(&path).await?;
        let mut branches: Vec<Branch> = decode_rows(rows)?;

        if branches.is_empty() {
            return Ok(None);
        }
        Ok(Some(branches.remove(0)))
    }

    async fn get_providers_for_branch(
        &self,
        branch: &BranchId,
    ) -> Result<Vec<Provider>, RepositoryError> {
        debug!("Fetching providers for branch {}", branch);

        let path = format!(
            "/rest/v1/providers?branch_keys=cs.{{{}}}&role=in.(doctor,staff)&select=id,display_name,role&order=id.asc",
            branch
        );
        let rows = self.fetch_rows(&path).await?;
        decode_rows(rows)
    }

    async fn get_weekly_schedule(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<WeeklySchedule>, RepositoryError> {
        let path = format!(
            "/rest/v1/provider_schedules?provider_id=eq.{}&order=branch.asc,weekday.asc",
            provider_id
        );
        let rows = self.fetch_rows(&path).await?;
        let rows: Vec<ScheduleRow> = decode_rows(rows)?;

        let mut schedule = WeeklySchedule::default();
        for row in rows {
            let weekday: Weekday = match row.weekday.parse() {
                Ok(weekday) => weekday,
                Err(_) => {
                    warn!(
                        "Skipping schedule row with unrecognized weekday '{}' for provider {}",
                        row.weekday, provider_id
                    );
                    continue;
                }
            };
            schedule.branches.entry(row.branch).or_default().set(
                weekday,
                DaySchedule {
                    enabled: row.enabled,
                    start: row.start_time,
                    end: row.end_time,
                },
            );
        }

        if schedule.branches.is_empty() {
            return Ok(None);
        }
        Ok(Some(schedule))
    }

    async fn get_date_overrides(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        branch: &BranchId,
    ) -> Result<Vec<DateOverride>, RepositoryError> {
        let path = format!(
            "/rest/v1/provider_date_overrides?provider_id=eq.{}&date=eq.{}&branch=eq.{}&order=kind.asc",
            provider_id, date, branch
        );
        let rows = self.fetch_rows(&path).await?;
        decode_rows(rows)
    }

    async fn get_bookings(
        &self,
        branch: &BranchId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, RepositoryError> {
        debug!("Fetching bookings for branch {} on {}", branch, date);

        let path = format!(
            "/rest/v1/bookings?branch=eq.{}&date=eq.{}&status=not.in.(cancelled,rejected)&order=time.asc,provider_id.asc",
            branch, date
        );
        let rows = self.fetch_rows(&path).await?;
        decode_rows(rows)
    }
}
