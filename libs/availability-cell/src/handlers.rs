// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AvailabilityError, BranchId, TimeOfDay, DEFAULT_BOOKING_MINUTES};
use crate::services::availability::AvailabilityService;

// Query parameters for the availability endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub date: NaiveDate,
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCheckQuery {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct HoursQuery {
    pub date: NaiveDate,
}

fn default_duration() -> i32 {
    DEFAULT_BOOKING_MINUTES
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(branch): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let branch = BranchId::new(branch);

    let result = service
        .compute_available_slots(&branch, query.date, query.duration_minutes)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn check_slot(
    State(state): State<Arc<AppConfig>>,
    Path(branch): Path<String>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let branch = BranchId::new(branch);

    let available = service
        .is_slot_available(&branch, query.date, query.time, query.duration_minutes)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "branch": branch,
        "date": query.date,
        "time": query.time,
        "durationMinutes": query.duration_minutes,
        "available": available
    })))
}

#[axum::debug_handler]
pub async fn get_branch_hours(
    State(state): State<Arc<AppConfig>>,
    Path(branch): Path<String>,
    Query(query): Query<HoursQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let branch = BranchId::new(branch);

    let hours = service
        .branch_hours(&branch, query.date)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "branch": branch,
        "date": query.date,
        "branchHours": hours
    })))
}

fn into_app_error(err: AvailabilityError) -> AppError {
    match err {
        AvailabilityError::InvalidInput(msg) => AppError::BadRequest(msg),
        AvailabilityError::UnknownBranch(branch) => {
            AppError::NotFound(format!("Unknown branch: {}", branch))
        }
        AvailabilityError::Repository(detail) => AppError::Upstream(detail.to_string()),
        AvailabilityError::RepositoryTimeout(secs) => {
            AppError::UpstreamTimeout(format!("schedule data fetch exceeded {}s", secs))
        }
    }
}
