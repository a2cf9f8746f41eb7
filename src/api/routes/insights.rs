use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::models::ListQuery;
use crate::api::AppState;
use crate::errors::CoreError;

pub async fn list_metrics(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "metrics": state.center.metrics().await }))
}

pub async fn get_metric(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, CoreError> {
    Ok(Json(json!(state.center.metric(&name).await?)))
}

pub async fn list_blockers(State(state): State<AppState>) -> Json<Value> {
    let blockers = state.center.blockers().await;
    Json(json!({ "blockers": blockers, "total": blockers.len() }))
}

pub async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    Json(json!({ "activity": state.center.activity(Some(query.limit.unwrap_or(100))).await }))
}
