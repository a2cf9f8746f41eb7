use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use crate::agents::AgentStatus;
use crate::coordination::TaskStatus;
use crate::pipeline::DeploymentConfig;
use crate::tools::Priority;

#[derive(Deserialize)]
pub struct DeployRequest {
    #[serde(flatten)]
    pub config: DeploymentConfig,
    /// Run to completion before responding instead of returning the id at once.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Deserialize)]
pub struct ExecuteToolRequest {
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Deserialize)]
pub struct ExecuteCommandRequest {
    #[serde(default)]
    pub params: Value,
}

#[derive(Deserialize)]
pub struct AssignTaskRequest {
    pub agent_id: String,
}

#[derive(Deserialize)]
pub struct AgentStatusRequest {
    pub status: AgentStatus,
}

#[derive(Deserialize)]
pub struct AgentProgressRequest {
    pub progress: f64,
}

#[derive(Deserialize)]
pub struct AgentEtaRequest {
    pub estimated_completion: Option<NaiveDate>,
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
}
