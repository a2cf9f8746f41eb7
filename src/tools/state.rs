use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::errors::CoreError;
use super::catalog::{CategoryInfo, ToolInfo};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Available,
    Busy,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryMetadata {
    pub category_name: String,
    pub description: String,
    pub base_duration_ms: u64,
}

impl From<&CategoryInfo> for CategoryMetadata {
    fn from(info: &CategoryInfo) -> Self {
        Self {
            category_name: info.name.to_string(),
            description: info.description.to_string(),
            base_duration_ms: info.base_duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub status: ToolStatus,
    pub execution_count: u64,
    pub avg_duration_ms: f64,
    pub active_executions: u32,
    pub last_executed: Option<DateTime<Utc>>,
    pub metadata: Option<CategoryMetadata>,
}

impl Tool {
    pub fn from_info(info: &ToolInfo) -> Self {
        Self {
            id: info.id.to_string(),
            name: info.name.to_string(),
            category: info.category.to_string(),
            description: info.description.to_string(),
            status: ToolStatus::Available,
            execution_count: 0,
            avg_duration_ms: 0.0,
            active_executions: 0,
            last_executed: None,
            metadata: super::catalog::get_category(info.category).map(CategoryMetadata::from),
        }
    }

    /// Count one finished execution and fold its duration into the average.
    pub(crate) fn record_execution(&mut self, duration_ms: u64) {
        self.execution_count += 1;
        self.avg_duration_ms = incremental_mean(self.avg_duration_ms, self.execution_count, duration_ms as f64);
        self.last_executed = Some(Utc::now());
    }
}

/// `(avg * (n - 1) + value) / n` for the n-th sample.
pub fn incremental_mean(avg: f64, n: u64, value: f64) -> f64 {
    if n == 0 {
        return avg;
    }
    let n = n as f64;
    (avg * (n - 1.0) + value) / n
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl std::str::FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(CoreError::InvalidInput(format!("Unknown priority: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPath {
    Remote,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub tool_id: String,
    pub params: Value,
    pub priority: Priority,
    pub status: ExecutionStatus,
    /// Non-decreasing while running.
    pub progress: u8,
    pub path: Option<ExecutionPath>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl Execution {
    pub fn new(id: String, tool_id: &str, params: Value, priority: Priority) -> Self {
        Self {
            id,
            tool_id: tool_id.to_string(),
            params,
            priority,
            status: ExecutionStatus::Running,
            progress: 0,
            path: None,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            result: None,
            error: None,
        }
    }

    /// Raise progress; lower values are ignored.
    pub(crate) fn advance(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    Connected,
    Disconnected,
}
