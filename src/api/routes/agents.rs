use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::models::{AgentEtaRequest, AgentProgressRequest, AgentStatusRequest};
use crate::api::AppState;
use crate::errors::CoreError;

pub async fn list_agents(State(state): State<AppState>) -> Json<Value> {
    let agents = state.center.agents().await;
    Json(json!({ "agents": agents, "total": agents.len() }))
}

pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.agent(&id).await?)))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AgentStatusRequest>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.set_agent_status(&id, req.status).await?)))
}

pub async fn set_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AgentProgressRequest>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.set_agent_progress(&id, req.progress).await?)))
}

pub async fn set_eta(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AgentEtaRequest>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.set_agent_eta(&id, req.estimated_completion).await?)))
}
