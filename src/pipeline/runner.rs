use std::sync::Arc;
use async_trait::async_trait;
use crate::simulation::{simulate_work, SimulationPolicy};
use super::phase::stage_definition;
use super::state::{DeploymentConfig, StageName, StageOutcome};

/// Executes one pipeline stage. Implementations must not panic; a failing
/// stage is reported through `StageOutcome::success`.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run_stage(
        &self,
        stage: StageName,
        deployment_id: &str,
        config: &DeploymentConfig,
    ) -> StageOutcome;
}

/// Simulates each stage with its base duration, policy jitter and a policy
/// decided outcome.
pub struct SimulatedStageRunner {
    policy: Arc<dyn SimulationPolicy>,
    time_scale: f64,
}

impl SimulatedStageRunner {
    pub fn new(policy: Arc<dyn SimulationPolicy>, time_scale: f64) -> Self {
        Self { policy, time_scale }
    }
}

#[async_trait]
impl StageRunner for SimulatedStageRunner {
    async fn run_stage(
        &self,
        stage: StageName,
        _deployment_id: &str,
        config: &DeploymentConfig,
    ) -> StageOutcome {
        let def = stage_definition(stage);
        let duration_ms = (def.base_duration_ms as f64 * self.policy.jitter()).round() as u64;
        simulate_work(duration_ms, self.time_scale).await;

        let success = self.policy.stage_succeeds(stage);
        let details = if success {
            match stage {
                StageName::Validate => format!("Configuration validated for {}", config.environment),
                StageName::Build => format!(
                    "Built release {}",
                    config.version.as_deref().unwrap_or("latest")
                ),
                StageName::Test => "All test suites passed".to_string(),
                StageName::Deploy => format!("Rolled out to {}", config.environment),
                StageName::Monitor => "Health signals nominal".to_string(),
            }
        } else {
            format!("{} stage reported failure", def.display_name)
        };

        StageOutcome { success, duration_ms, details }
    }
}
