use axum::{extract::State, Json};
use serde_json::{json, Value};
use crate::api::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let connectivity = state.center.broker().connectivity().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built_at": option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        "executor": connectivity,
    }))
}

pub async fn project_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.center.project_status().await))
}
