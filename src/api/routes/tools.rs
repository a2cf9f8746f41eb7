use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::models::{ExecuteToolRequest, ListQuery};
use crate::api::AppState;
use crate::errors::CoreError;

pub async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let tools = state.center.tools(query.category.as_deref()).await;
    Json(json!({
        "tools": tools,
        "total": tools.len(),
        "stats": state.center.tool_stats().await,
    }))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "categories": state.center.tool_categories() }))
}

pub async fn get_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.tool(&id).await?)))
}

pub async fn execute_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ExecuteToolRequest>,
) -> Result<Json<Value>, CoreError> {
    let execution = state.center.execute_tool(&id, req.params, req.priority).await?;
    Ok(Json(json!(execution)))
}

pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    Json(json!({
        "active": state.center.active_executions(),
        "history": state.center.executions(Some(query.limit.unwrap_or(50))).await,
    }))
}

pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.execution(&id).await?)))
}
