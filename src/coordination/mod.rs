pub mod blockers;
pub mod facade;
pub mod metrics;
pub mod progress;
pub mod scheduler;
pub mod tasks;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use crate::agents::Agent;
use crate::pipeline::PipelineSummary;
use crate::tools::BrokerStats;

pub use blockers::{Blocker, BlockerKind, Severity};
pub use facade::{CommandCenter, CommandCenterBuilder};
pub use metrics::{Metric, MetricStore, Trend};
pub use scheduler::Scheduler;
pub use tasks::{ActivityEntry, Milestone, NewMilestone, NewTask, Task, TaskStatus, TaskUpdate};

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        Self {
            total: tasks.len(),
            pending: count(TaskStatus::Pending),
            in_progress: count(TaskStatus::InProgress),
            completed: count(TaskStatus::Completed),
            blocked: count(TaskStatus::Blocked),
        }
    }
}

/// Full snapshot published on every status broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStatus {
    pub project: String,
    pub launch_date: NaiveDate,
    pub days_to_launch: i64,
    pub generated_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub overall_progress: f64,
    pub task_completion_rate: f64,
    pub velocity: Option<f64>,
    pub agents: Vec<Agent>,
    pub blockers: Vec<Blocker>,
    pub pipeline: PipelineSummary,
    pub tools: BrokerStats,
    pub tasks: TaskCounts,
}
