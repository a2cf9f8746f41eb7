use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use crate::agents::AgentStatus;
use crate::coordination::blockers::Blocker;
use crate::coordination::metrics::Trend;
use crate::coordination::ProjectStatus;
use crate::pipeline::state::{DeploymentStatus, StageName, StageRecord};
use crate::tools::ConnectivityState;

/// Notifications published by the core for external observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum CoreEvent {
    /// An agent's fresh performance score fell below the health threshold
    HealthWarning {
        agent_id: String,
        score: f64,
        threshold: f64,
        at: DateTime<Utc>,
    },
    /// Fleet-wide performance aggregate
    PerformanceSnapshot {
        mean_score: f64,
        total_requests: u64,
        total_errors: u64,
        at: DateTime<Utc>,
    },
    /// An agent changed lifecycle status
    AgentStatusChanged {
        agent_id: String,
        status: AgentStatus,
    },
    DeploymentStarted {
        deployment_id: String,
        environment: String,
    },
    /// One pipeline stage finished, successfully or not
    StageCompleted {
        deployment_id: String,
        stage: StageName,
        record: StageRecord,
    },
    DeploymentFinished {
        deployment_id: String,
        status: DeploymentStatus,
        error: Option<String>,
    },
    /// Interim progress of a locally simulated tool run
    ToolProgress {
        execution_id: String,
        tool_id: String,
        progress: u8,
    },
    ToolExecuted {
        execution_id: String,
        tool_id: String,
        duration_ms: u64,
        remote: bool,
    },
    ToolFailed {
        execution_id: String,
        tool_id: String,
        error: String,
    },
    /// Edge-triggered change of the remote executor's reachability
    BrokerConnectivity {
        state: ConnectivityState,
        at: DateTime<Utc>,
    },
    CommandExecuted {
        command_id: String,
        duration_ms: u64,
    },
    ValidationFailed {
        command_id: String,
        rule_id: String,
    },
    TaskActivity {
        task_id: String,
        kind: String,
        message: String,
    },
    MetricUpdated {
        name: String,
        value: f64,
        trend: Trend,
    },
    BlockersDetected {
        blockers: Vec<Blocker>,
    },
    /// Periodic full snapshot
    ProjectStatus {
        status: Box<ProjectStatus>,
    },
}

impl CoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HealthWarning { .. } => "health-warning",
            Self::PerformanceSnapshot { .. } => "performance-snapshot",
            Self::AgentStatusChanged { .. } => "agent-status-changed",
            Self::DeploymentStarted { .. } => "deployment-started",
            Self::StageCompleted { .. } => "stage-completed",
            Self::DeploymentFinished { .. } => "deployment-finished",
            Self::ToolProgress { .. } => "tool-progress",
            Self::ToolExecuted { .. } => "tool-executed",
            Self::ToolFailed { .. } => "tool-failed",
            Self::BrokerConnectivity { .. } => "broker-connectivity",
            Self::CommandExecuted { .. } => "command-executed",
            Self::ValidationFailed { .. } => "validation-failed",
            Self::TaskActivity { .. } => "task-activity",
            Self::MetricUpdated { .. } => "metric-updated",
            Self::BlockersDetected { .. } => "blockers-detected",
            Self::ProjectStatus { .. } => "project-status",
        }
    }
}

/// Bounded publish/subscribe channel shared by every component.
///
/// Subscribers receive events in publish order. A subscriber that falls more
/// than `capacity` events behind observes `RecvError::Lagged` and skips ahead;
/// publishers never block.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: CoreEvent) {
        // No subscribers is not an error
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_delivered_in_publish_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        for i in 0..3 {
            bus.publish(CoreEvent::CommandExecuted {
                command_id: format!("cmd-{}", i),
                duration_ms: i,
            });
        }
        for i in 0..3 {
            match rx.recv().await.unwrap() {
                CoreEvent::CommandExecuted { command_id, .. } => {
                    assert_eq!(command_id, format!("cmd-{}", i));
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_instead_of_blocking() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.publish(CoreEvent::CommandExecuted { command_id: format!("cmd-{}", i), duration_ms: 0 });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(CoreEvent::ValidationFailed { command_id: "c".into(), rule_id: "r".into() });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serializes_with_kebab_tag() {
        let event = CoreEvent::ToolProgress {
            execution_id: "exec-1".into(),
            tool_id: "tool-001".into(),
            progress: 40,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "tool-progress");
        assert_eq!(event.name(), "tool-progress");
    }
}
