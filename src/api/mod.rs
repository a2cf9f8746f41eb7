pub mod auth;
pub mod errors;
pub mod models;
pub mod routes;

use std::sync::Arc;
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::coordination::CommandCenter;

#[derive(Clone)]
pub struct AppState {
    pub center: Arc<CommandCenter>,
    /// Bearer token required on `/api` routes other than health.
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(center: Arc<CommandCenter>) -> Self {
        Self {
            center,
            api_token: std::env::var(auth::TOKEN_ENV).ok(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/status", get(routes::health::project_status))
        .route("/api/agents", get(routes::agents::list_agents))
        .route("/api/agents/:id", get(routes::agents::get_agent))
        .route("/api/agents/:id/status", put(routes::agents::set_status))
        .route("/api/agents/:id/progress", put(routes::agents::set_progress))
        .route("/api/agents/:id/eta", put(routes::agents::set_eta))
        .route(
            "/api/deployments",
            post(routes::deployments::create_deployment).get(routes::deployments::list_deployments),
        )
        .route("/api/deployments/:id", get(routes::deployments::get_deployment))
        .route("/api/tools", get(routes::tools::list_tools))
        .route("/api/tools/categories", get(routes::tools::list_categories))
        .route("/api/tools/:id", get(routes::tools::get_tool))
        .route("/api/tools/:id/execute", post(routes::tools::execute_tool))
        .route("/api/executions", get(routes::tools::list_executions))
        .route("/api/executions/:id", get(routes::tools::get_execution))
        .route("/api/commands", get(routes::commands::list_commands))
        .route("/api/commands/:id/execute", post(routes::commands::execute_command))
        .route("/api/rules", get(routes::commands::list_rules))
        .route("/api/tasks", post(routes::tasks::create_task).get(routes::tasks::list_tasks))
        .route("/api/tasks/:id", get(routes::tasks::get_task).patch(routes::tasks::update_task))
        .route("/api/tasks/:id/assign", post(routes::tasks::assign_task))
        .route(
            "/api/milestones",
            post(routes::tasks::create_milestone).get(routes::tasks::list_milestones),
        )
        .route("/api/metrics", get(routes::insights::list_metrics))
        .route("/api/metrics/:name", get(routes::insights::get_metric))
        .route("/api/blockers", get(routes::insights::list_blockers))
        .route("/api/activity", get(routes::insights::list_activity))
        .route("/api/events", get(routes::events::stream_events))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::api_auth_middleware));

    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
