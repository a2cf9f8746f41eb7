use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use crate::config::AgentSpec;
use crate::errors::CoreError;
use crate::events::{CoreEvent, EventBus};
use crate::simulation::SimulationPolicy;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Ready,
    Active,
    Monitoring,
    Coordinating,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Monitoring => "monitoring",
            Self::Coordinating => "coordinating",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "active" => Ok(Self::Active),
            "monitoring" => Ok(Self::Monitoring),
            "coordinating" => Ok(Self::Coordinating),
            "error" => Ok(Self::Error),
            other => Err(CoreError::InvalidInput(format!("Unknown agent status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMetrics {
    pub uptime_secs: u64,
    pub requests: u64,
    pub errors: u64,
    /// Always within [0, 100].
    pub performance: f64,
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self {
            uptime_secs: 0,
            requests: 0,
            errors: 0,
            performance: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    pub capabilities: Vec<String>,
    pub status: AgentStatus,
    pub last_activity: DateTime<Utc>,
    pub metrics: AgentMetrics,
    pub progress: f64,
    pub estimated_completion: Option<NaiveDate>,
}

impl Agent {
    pub fn from_spec(spec: &AgentSpec) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            role: spec.role.clone(),
            capabilities: spec.capabilities.clone(),
            status: AgentStatus::Ready,
            last_activity: Utc::now(),
            metrics: AgentMetrics::default(),
            progress: clamp_pct(spec.progress.unwrap_or(0.0)),
            estimated_completion: spec.estimated_completion,
        }
    }

    /// Advance `last_activity` without ever moving it backwards.
    pub(crate) fn touch(&mut self) {
        let now = Utc::now();
        if now > self.last_activity {
            self.last_activity = now;
        }
    }
}

pub(crate) fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Owns the fleet roster. Agents are never removed.
pub struct AgentRegistry {
    pub(super) agents: RwLock<HashMap<String, Agent>>,
    pub(super) bus: EventBus,
    pub(super) policy: Arc<dyn SimulationPolicy>,
    pub(super) health_threshold: f64,
}

impl AgentRegistry {
    pub fn new(bus: EventBus, policy: Arc<dyn SimulationPolicy>, health_threshold: f64) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            bus,
            policy,
            health_threshold,
        }
    }

    pub async fn from_specs(
        specs: &[AgentSpec],
        bus: EventBus,
        policy: Arc<dyn SimulationPolicy>,
        health_threshold: f64,
    ) -> Self {
        let registry = Self::new(bus, policy, health_threshold);
        for spec in specs {
            registry.register(spec).await;
        }
        info!(agents = specs.len(), "Agent registry initialized");
        registry
    }

    /// Insert or overwrite an agent by id.
    pub async fn register(&self, spec: &AgentSpec) -> Agent {
        let agent = Agent::from_spec(spec);
        let mut agents = self.agents.write().await;
        if agents.insert(agent.id.clone(), agent.clone()).is_some() {
            debug!(agent = %agent.id, "Agent re-registered");
        }
        agent
    }

    pub async fn get(&self, id: &str) -> Result<Agent, CoreError> {
        self.agents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("agent", id))
    }

    /// Snapshot of every agent, sorted by id.
    pub async fn list_all(&self) -> Vec<Agent> {
        let mut all: Vec<Agent> = self.agents.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    /// Unknown ids signal `NotFound` rather than being ignored.
    pub async fn set_status(&self, id: &str, status: AgentStatus) -> Result<Agent, CoreError> {
        let updated = {
            let mut agents = self.agents.write().await;
            let agent = agents
                .get_mut(id)
                .ok_or_else(|| CoreError::not_found("agent", id))?;
            agent.status = status;
            agent.touch();
            agent.clone()
        };
        debug!(agent = %id, status = %status, "Agent status updated");
        self.bus.publish(CoreEvent::AgentStatusChanged {
            agent_id: id.to_string(),
            status,
        });
        Ok(updated)
    }

    pub async fn set_progress(&self, id: &str, progress: f64) -> Result<Agent, CoreError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("agent", id))?;
        agent.progress = clamp_pct(progress);
        agent.touch();
        Ok(agent.clone())
    }

    /// `None` clears the estimate.
    pub async fn set_estimated_completion(
        &self,
        id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Agent, CoreError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("agent", id))?;
        agent.estimated_completion = date;
        agent.touch();
        Ok(agent.clone())
    }

    /// Count one handled request against an agent.
    pub async fn record_request(&self, id: &str, ok: bool) -> Result<(), CoreError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("agent", id))?;
        agent.metrics.requests += 1;
        if !ok {
            agent.metrics.errors += 1;
        }
        agent.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::ScriptedPolicy;

    fn registry() -> AgentRegistry {
        AgentRegistry::new(EventBus::new(16), Arc::new(ScriptedPolicy::passing()), 50.0)
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let reg = registry();
        reg.register(&AgentSpec::new("iris-devops", "Iris", "DevOps", &["ci-cd"])).await;
        let agent = reg.get("iris-devops").await.unwrap();
        assert_eq!(agent.role, "DevOps");
        assert_eq!(agent.status, AgentStatus::Ready);
        assert_eq!(agent.metrics.performance, 100.0);
    }

    #[tokio::test]
    async fn test_reregister_overwrites() {
        let reg = registry();
        reg.register(&AgentSpec::new("a", "A", "old", &[])).await;
        reg.register(&AgentSpec::new("a", "A", "new", &[])).await;
        assert_eq!(reg.len().await, 1);
        assert_eq!(reg.get("a").await.unwrap().role, "new");
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let reg = registry();
        assert!(matches!(reg.get("ghost").await, Err(CoreError::NotFound { kind: "agent", .. })));
    }

    #[tokio::test]
    async fn test_set_status_updates_activity_and_publishes() {
        let reg = registry();
        let mut rx = reg.bus.subscribe();
        let before = reg.register(&AgentSpec::new("a", "A", "r", &[])).await;
        let after = reg.set_status("a", AgentStatus::Active).await.unwrap();
        assert_eq!(after.status, AgentStatus::Active);
        assert!(after.last_activity >= before.last_activity);
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoreEvent::AgentStatusChanged { status: AgentStatus::Active, .. }
        ));
    }

    #[tokio::test]
    async fn test_set_status_unknown_is_not_found() {
        let reg = registry();
        assert!(reg.set_status("ghost", AgentStatus::Error).await.is_err());
    }

    #[tokio::test]
    async fn test_progress_is_clamped() {
        let reg = registry();
        reg.register(&AgentSpec::new("a", "A", "r", &[])).await;
        assert_eq!(reg.set_progress("a", 140.0).await.unwrap().progress, 100.0);
        assert_eq!(reg.set_progress("a", -3.0).await.unwrap().progress, 0.0);
    }

    #[tokio::test]
    async fn test_list_all_sorted_and_read_only() {
        let reg = registry();
        reg.register(&AgentSpec::new("b", "B", "r", &[])).await;
        reg.register(&AgentSpec::new("a", "A", "r", &[])).await;
        let first = reg.list_all().await;
        let second = reg.list_all().await;
        assert_eq!(first.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(first[0].last_activity, second[0].last_activity);
    }

    #[tokio::test]
    async fn test_record_request_counts_errors() {
        let reg = registry();
        reg.register(&AgentSpec::new("a", "A", "r", &[])).await;
        reg.record_request("a", true).await.unwrap();
        reg.record_request("a", false).await.unwrap();
        let agent = reg.get("a").await.unwrap();
        assert_eq!(agent.metrics.requests, 2);
        assert_eq!(agent.metrics.errors, 1);
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [AgentStatus::Ready, AgentStatus::Active, AgentStatus::Monitoring, AgentStatus::Coordinating, AgentStatus::Error] {
            assert_eq!(status.as_str().parse::<AgentStatus>().unwrap(), status);
        }
        assert!("sleeping".parse::<AgentStatus>().is_err());
    }
}
