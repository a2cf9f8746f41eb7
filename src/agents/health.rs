use std::time::Duration;
use chrono::Utc;
use serde::Serialize;
use crate::events::CoreEvent;
use super::registry::{clamp_pct, AgentRegistry};
use tracing::{debug, warn};

/// Score assigned to one agent by a health tick.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReading {
    pub agent_id: String,
    pub score: f64,
    pub healthy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSnapshot {
    pub mean_score: f64,
    pub total_requests: u64,
    pub total_errors: u64,
}

impl AgentRegistry {
    /// Assign every agent a fresh performance score and publish a
    /// `health-warning` for each score below the threshold.
    pub async fn health_tick(&self) -> Vec<HealthReading> {
        let now = Utc::now();
        let readings: Vec<HealthReading> = {
            let mut agents = self.agents.write().await;
            let mut readings: Vec<HealthReading> = agents
                .values_mut()
                .map(|agent| {
                    let score = clamp_pct(self.policy.performance_score(&agent.id));
                    agent.metrics.performance = score;
                    HealthReading {
                        agent_id: agent.id.clone(),
                        score,
                        healthy: score >= self.health_threshold,
                    }
                })
                .collect();
            readings.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
            readings
        };

        for reading in readings.iter().filter(|r| !r.healthy) {
            warn!(agent = %reading.agent_id, score = reading.score, "Agent health below threshold");
            self.bus.publish(CoreEvent::HealthWarning {
                agent_id: reading.agent_id.clone(),
                score: reading.score,
                threshold: self.health_threshold,
                at: now,
            });
        }
        debug!(agents = readings.len(), "Health tick complete");
        readings
    }

    /// Advance uptime by `elapsed` and publish a fleet-wide aggregate.
    pub async fn performance_tick(&self, elapsed: Duration) -> PerformanceSnapshot {
        let snapshot = {
            let mut agents = self.agents.write().await;
            let mut total_score = 0.0;
            let mut total_requests = 0;
            let mut total_errors = 0;
            for agent in agents.values_mut() {
                agent.metrics.uptime_secs += elapsed.as_secs();
                total_score += agent.metrics.performance;
                total_requests += agent.metrics.requests;
                total_errors += agent.metrics.errors;
            }
            let mean_score = if agents.is_empty() {
                0.0
            } else {
                total_score / agents.len() as f64
            };
            PerformanceSnapshot { mean_score, total_requests, total_errors }
        };

        self.bus.publish(CoreEvent::PerformanceSnapshot {
            mean_score: snapshot.mean_score,
            total_requests: snapshot.total_requests,
            total_errors: snapshot.total_errors,
            at: Utc::now(),
        });
        snapshot
    }
}
