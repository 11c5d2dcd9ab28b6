//! keyshift-tp library - Transposer service
//!
//! Accepts an audio upload plus a transposition (semitones or target key),
//! pitch-shifts it through an external tool and returns the result as a download.

pub mod api;
pub mod error;
pub mod processing;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use keyshift_common::config::ServiceConfig;
use tower_http::trace::TraceLayer;

use crate::processing::PitchShifter;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved bootstrap configuration
    pub config: Arc<ServiceConfig>,
    /// External pitch shifter
    pub shifter: Arc<dyn PitchShifter>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig, shifter: Arc<dyn PitchShifter>) -> Self {
        Self {
            config: Arc::new(config),
            shifter,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/transpose", post(api::transpose))
        .route("/api/keys", get(api::list_keys))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
