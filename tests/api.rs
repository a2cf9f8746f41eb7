use axum::http::StatusCode;
use axum::body::Body;
use http_body_util::BodyExt;
use tower::ServiceExt;
use serde_json::{json, Value};
use command_center::api::{build_router, AppState};
use command_center::config::CenterConfig;
use command_center::simulation::ScriptedPolicy;
use command_center::pipeline::StageName;
use command_center::CommandCenter;
use std::sync::Arc;

async fn create_test_state(policy: ScriptedPolicy) -> AppState {
    let mut config = CenterConfig::default();
    config.executor.enabled = false;
    config.simulation.time_scale = 0.0;
    config.tools.disabled = vec!["tool-005".to_string()];
    let center = CommandCenter::builder(config)
        .policy(Arc::new(policy))
        .build()
        .await
        .unwrap();
    AppState::new(Arc::new(center)).with_token(None)
}

fn app(state: &AppState) -> axum::Router {
    build_router(state.clone())
}

fn make_request(method: &str, uri: &str, body: Option<Value>) -> axum::http::Request<Body> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    match body {
        Some(b) => builder.body(Body::from(serde_json::to_string(&b).unwrap())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::http::Response<Body>) -> Value {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        panic!("Empty response body. Status: {}, Headers: {:?}", parts.status, parts.headers);
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("JSON parse error: {}. Body: {:?}", e, String::from_utf8_lossy(&bytes)))
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("GET", "/api/health", None);
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["executor"], "disconnected");
}

#[tokio::test]
async fn test_list_and_get_agents() {
    let state = create_test_state(ScriptedPolicy::passing()).await;

    let response = app(&state).oneshot(make_request("GET", "/api/agents", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["total"], 8);
    assert_eq!(body["agents"][0]["id"], "david-database");

    let response = app(&state).oneshot(make_request("GET", "/api/agents/ghost", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["type"], "NotFound");
}

#[tokio::test]
async fn test_set_agent_status() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("PUT", "/api/agents/maya-viral/status", Some(json!({"status": "coordinating"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "coordinating");
}

#[tokio::test]
async fn test_deploy_and_wait() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("POST", "/api/deployments", Some(json!({"environment": "production", "wait": true})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["stages"].as_array().unwrap().len(), 5);
    let id = body["id"].as_str().unwrap().to_string();

    let response = app(&state).oneshot(make_request("GET", &format!("/api/deployments/{}", id), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&state).oneshot(make_request("GET", "/api/deployments", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["summary"]["completed"], 1);
}

#[tokio::test]
async fn test_failed_deploy_is_unprocessable() {
    let state = create_test_state(ScriptedPolicy::passing().with_failing_stage(StageName::Build)).await;
    let req = make_request("POST", "/api/deployments", Some(json!({"wait": true})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["type"], "StageFailed");
}

#[tokio::test]
async fn test_background_deploy_accepted() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("POST", "/api/deployments", Some(json!({"environment": "staging"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response_json(response).await;
    assert!(body["id"].as_str().unwrap().starts_with("deploy-"));
}

#[tokio::test]
async fn test_execute_tool() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("POST", "/api/tools/tool-001/execute", Some(json!({"params": {"template": "service"}, "priority": "high"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["path"], "local");
    assert_eq!(body["result"]["tool_id"], "tool-001");
    let exec_id = body["id"].as_str().unwrap().to_string();

    let response = app(&state).oneshot(make_request("GET", &format!("/api/executions/{}", exec_id), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&state).oneshot(make_request("GET", "/api/tools/tool-001", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["execution_count"], 1);
}

#[tokio::test]
async fn test_tool_errors() {
    let state = create_test_state(ScriptedPolicy::passing()).await;

    let req = make_request("POST", "/api/tools/tool-005/execute", Some(json!({})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let req = make_request("POST", "/api/tools/tool-404/execute", Some(json!({})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tool_catalog_filters() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let response = app(&state).oneshot(make_request("GET", "/api/tools?category=security", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["stats"]["disabled"], 1);

    let response = app(&state).oneshot(make_request("GET", "/api/tools/categories", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["categories"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_command_validation_failure() {
    let state = create_test_state(ScriptedPolicy::passing().with_rule_failure_every(1)).await;
    let req = make_request("POST", "/api/commands/parallel-build/execute", Some(json!({})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["type"], "ValidationFailed");

    let response = app(&state).oneshot(make_request("GET", "/api/rules", None)).await.unwrap();
    let body = response_json(response).await;
    let rule = body["rules"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == "parallel-dependency-check")
        .unwrap()
        .clone();
    assert_eq!(rule["violations"], 1);
}

#[tokio::test]
async fn test_command_execution() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("POST", "/api/commands/recursive-analysis/execute", Some(json!({"params": {"depth": 2}})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["result"]["iterations"], 3);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let state = create_test_state(ScriptedPolicy::passing()).await;

    let req = make_request("POST", "/api/tasks", Some(json!({"title": "Write onboarding guide", "assignee": "olivia-docs"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = response_json(response).await;
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["status"], "pending");

    let req = make_request("PATCH", &format!("/api/tasks/{}", id), Some(json!({"status": "completed"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&state).oneshot(make_request("GET", "/api/agents/olivia-docs", None)).await.unwrap();
    let agent = response_json(response).await;
    assert_eq!(agent["progress"], 100.0);

    let response = app(&state).oneshot(make_request("GET", "/api/tasks?status=completed", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["total"], 1);

    let response = app(&state).oneshot(make_request("GET", "/api/activity", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["activity"][0]["kind"], "task-updated");
}

#[tokio::test]
async fn test_assign_task_to_unknown_agent() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("POST", "/api/tasks", Some(json!({"title": "Orphan"})));
    let task = response_json(app(&state).oneshot(req).await.unwrap()).await;
    let id = task["id"].as_str().unwrap();

    let req = make_request("POST", &format!("/api/tasks/{}/assign", id), Some(json!({"agent_id": "nobody"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_and_blockers() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    state.center.set_agent_status("jack-powerline-viz", command_center::agents::AgentStatus::Active).await.unwrap();
    state.center.recompute_metrics(chrono::Utc::now().date_naive()).await;

    let response = app(&state).oneshot(make_request("GET", "/api/blockers", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["blockers"][0]["severity"], "medium");
    assert_eq!(body["blockers"][0]["kind"], "low-progress");

    let response = app(&state).oneshot(make_request("GET", "/api/metrics/active_blockers", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["value"], 1.0);

    let response = app(&state).oneshot(make_request("GET", "/api/metrics/unknown", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_status() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let response = app(&state).oneshot(make_request("GET", "/api/status", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["project"], "PowerLine");
    assert_eq!(body["agents"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_token_required_when_configured() {
    let state = create_test_state(ScriptedPolicy::passing()).await.with_token(Some("s3cret".into()));

    let response = app(&state).oneshot(make_request("GET", "/api/agents", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let req = axum::http::Request::builder()
        .uri("/api/agents")
        .header("Authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays open
    let response = app(&state).oneshot(make_request("GET", "/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_past_eta_becomes_overdue_blocker() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let yesterday = chrono::Utc::now().date_naive() - chrono::Duration::days(1);

    let req = make_request(
        "PUT",
        "/api/agents/kelly-enrollment/eta",
        Some(json!({"estimated_completion": yesterday.to_string()})),
    );
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["estimated_completion"], yesterday.to_string());

    state.center.recompute_metrics(chrono::Utc::now().date_naive()).await;
    let response = app(&state).oneshot(make_request("GET", "/api/blockers", None)).await.unwrap();
    let body = response_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["blockers"][0]["kind"], "overdue");
    assert_eq!(body["blockers"][0]["severity"], "high");

    let req = make_request("PUT", "/api/agents/kelly-enrollment/eta", Some(json!({"estimated_completion": null})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    state.center.recompute_metrics(chrono::Utc::now().date_naive()).await;
    assert!(state.center.blockers().await.is_empty());
}

#[tokio::test]
async fn test_blank_task_title_is_bad_request() {
    let state = create_test_state(ScriptedPolicy::passing()).await;
    let req = make_request("POST", "/api/tasks", Some(json!({"title": ""})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["type"], "InvalidInput");
}
