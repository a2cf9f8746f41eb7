use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use crate::agents::{Agent, AgentStatus};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BlockerKind {
    LowProgress,
    Overdue,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Blocker {
    pub kind: BlockerKind,
    pub agent_id: String,
    pub severity: Severity,
    pub reason: String,
    pub detected_at: DateTime<Utc>,
}

/// Derive blockers from agent state alone.
///
/// An active agent below `progress_threshold` is a medium `low-progress`
/// blocker; an unfinished agent past its estimated completion is a high
/// `overdue` blocker. When both hold only the overdue blocker is reported.
pub fn detect_blockers(
    agents: &[Agent],
    today: NaiveDate,
    progress_threshold: f64,
    detected_at: DateTime<Utc>,
) -> Vec<Blocker> {
    agents
        .iter()
        .filter_map(|agent| {
            let overdue = agent
                .estimated_completion
                .filter(|eta| *eta < today && agent.progress < 100.0);

            if let Some(eta) = overdue {
                return Some(Blocker {
                    kind: BlockerKind::Overdue,
                    agent_id: agent.id.clone(),
                    severity: Severity::High,
                    reason: format!(
                        "{} was due {} and is at {:.0}%",
                        agent.name, eta, agent.progress
                    ),
                    detected_at,
                });
            }

            if agent.progress < progress_threshold && agent.status == AgentStatus::Active {
                return Some(Blocker {
                    kind: BlockerKind::LowProgress,
                    agent_id: agent.id.clone(),
                    severity: Severity::Medium,
                    reason: format!("{} is active at only {:.0}%", agent.name, agent.progress),
                    detected_at,
                });
            }

            None
        })
        .collect()
}
