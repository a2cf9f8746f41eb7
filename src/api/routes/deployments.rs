use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use crate::api::models::DeployRequest;
use crate::api::AppState;
use crate::errors::CoreError;

/// Start a deployment. With `wait` the response carries the finished
/// deployment; otherwise it returns 202 with the new id.
pub async fn create_deployment(
    State(state): State<AppState>,
    Json(req): Json<DeployRequest>,
) -> Result<(StatusCode, Json<Value>), CoreError> {
    if req.wait {
        let deployment = state.center.deploy(req.config).await?;
        return Ok((StatusCode::CREATED, Json(json!(deployment))));
    }

    let id = state.center.start_deployment(req.config).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "id": id, "status": "starting" })),
    ))
}

pub async fn list_deployments(State(state): State<AppState>) -> Json<Value> {
    let deployments = state.center.deployments();
    Json(json!({
        "deployments": deployments,
        "total": deployments.len(),
        "summary": state.center.pipeline_summary(),
    }))
}

pub async fn get_deployment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.deployment(&id)?)))
}
