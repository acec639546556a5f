use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn record_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_record))
        .route("/me", get(handlers::list_own_records))
        .route("/patient/{patient_id}", get(handlers::list_patient_records))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
