// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn availability_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{branch}/available-slots", get(handlers::get_available_slots))
        .route("/{branch}/available-slots/check", get(handlers::check_slot))
        .route("/{branch}/hours", get(handlers::get_branch_hours))
        .with_state(state)
}
