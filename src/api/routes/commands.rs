use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::models::ExecuteCommandRequest;
use crate::api::AppState;
use crate::errors::CoreError;

pub async fn list_commands(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "commands": state.center.commands().await }))
}

pub async fn execute_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ExecuteCommandRequest>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.execute_command(&id, req.params).await?)))
}

pub async fn list_rules(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "rules": state.center.rules().await }))
}
