use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/availability", post(handlers::create_slots))
        .route("/availability", get(handlers::list_own_slots))
        .route("/availability/{slot_id}/toggle", patch(handlers::toggle_slot))
        .route("/availability/{slot_id}", delete(handlers::delete_slot))
        .route("/schedule", get(handlers::get_schedule))
        .route("/{doctor_id}/slots", get(handlers::open_slots))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
