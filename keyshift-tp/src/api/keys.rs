//! Supported key listing
//!
//! Lets the UI offer only target keys the resolver knows about.

use axum::{extract::State, Json};
use keyshift_common::key::supported_keys;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct KeyEntry {
    pub name: &'static str,
    pub pitch_class: u8,
}

#[derive(Debug, Serialize)]
pub struct KeysResponse {
    /// Deployed transposition mode, so the UI knows which field to show
    pub mode: String,
    pub keys: Vec<KeyEntry>,
}

/// GET /api/keys
pub async fn list_keys(State(state): State<AppState>) -> Json<KeysResponse> {
    let keys = supported_keys()
        .map(|(name, pitch_class)| KeyEntry { name, pitch_class })
        .collect();

    Json(KeysResponse {
        mode: state.config.mode.to_string(),
        keys,
    })
}
