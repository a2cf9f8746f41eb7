use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use crate::api::models::{AssignTaskRequest, ListQuery};
use crate::api::AppState;
use crate::coordination::{NewMilestone, NewTask, TaskUpdate};
use crate::errors::CoreError;

pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<NewTask>,
) -> Result<(StatusCode, Json<Value>), CoreError> {
    let task = state.center.create_task(req).await?;
    Ok((StatusCode::CREATED, Json(json!(task))))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let tasks = state.center.tasks(query.status, query.assignee.as_deref()).await;
    Json(json!({ "tasks": tasks, "total": tasks.len() }))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.get_task(&id).await?)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TaskUpdate>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.update_task(&id, req).await?)))
}

pub async fn assign_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignTaskRequest>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.assign_task(&id, &req.agent_id).await?)))
}

pub async fn create_milestone(
    State(state): State<AppState>,
    Json(req): Json<NewMilestone>,
) -> Result<(StatusCode, Json<Value>), CoreError> {
    let milestone = state.center.create_milestone(req).await?;
    Ok((StatusCode::CREATED, Json(json!(milestone))))
}

pub async fn list_milestones(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "milestones": state.center.milestones().await }))
}
