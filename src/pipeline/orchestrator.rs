use std::sync::Arc;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;
use crate::agents::{AgentRegistry, AgentStatus};
use crate::errors::CoreError;
use crate::events::{CoreEvent, EventBus};
use super::metrics::compute_summary;
use super::runner::StageRunner;
use super::state::*;
use tracing::{info, warn, error};

/// Deployments in flight and whether any of them failed since the reporting
/// agent last went idle.
#[derive(Debug, Default)]
struct Reporting {
    in_flight: usize,
    failed: bool,
}

/// Drives deployments through the fixed stage sequence.
///
/// Every deployment carries its own stage cursor and is driven by exactly one
/// spawned task. State transitions go through the map's per-entry lock, so at
/// most one transition is in flight per deployment.
///
/// The reporting agent is `active` while any deployment runs. When the last
/// one finishes it becomes `error` if a deployment failed during that busy
/// period and `ready` otherwise; an `error` holds until the next deployment
/// starts.
pub struct PipelineEngine {
    deployments: DashMap<String, Deployment>,
    runner: Arc<dyn StageRunner>,
    registry: Arc<AgentRegistry>,
    reporting_agent: Option<String>,
    reporting: Mutex<Reporting>,
    bus: EventBus,
}

impl PipelineEngine {
    pub fn new(
        runner: Arc<dyn StageRunner>,
        registry: Arc<AgentRegistry>,
        reporting_agent: Option<String>,
        bus: EventBus,
    ) -> Self {
        Self {
            deployments: DashMap::new(),
            runner,
            registry,
            reporting_agent,
            reporting: Mutex::new(Reporting::default()),
            bus,
        }
    }

    /// Create a deployment and run it to a terminal state.
    ///
    /// A failing stage ends the deployment and is returned as `StageFailed`;
    /// the failed deployment stays queryable through [`PipelineEngine::get`].
    /// Dropping the returned future does not stop the deployment.
    pub async fn deploy(self: &Arc<Self>, config: DeploymentConfig) -> Result<Deployment, CoreError> {
        let id = self.create(config);
        self.spawn_drive(id)
            .await
            .map_err(|e| CoreError::Internal(format!("Deployment task failed: {}", e)))?
    }

    /// Create a deployment and run it in the background, returning its id at once.
    pub fn start(self: &Arc<Self>, config: DeploymentConfig) -> String {
        let id = self.create(config);
        // Outcome is recorded and published by `drive`
        drop(self.spawn_drive(id.clone()));
        id
    }

    fn spawn_drive(self: &Arc<Self>, id: String) -> JoinHandle<Result<Deployment, CoreError>> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.drive(&id).await })
    }

    fn create(&self, config: DeploymentConfig) -> String {
        let id = format!("deploy-{}", Uuid::new_v4());
        self.deployments.insert(id.clone(), Deployment::new(id.clone(), config));
        id
    }

    async fn drive(&self, id: &str) -> Result<Deployment, CoreError> {
        let config = self.transition(id, |d| {
            d.status = DeploymentStatus::Running;
            Ok(d.config.clone())
        })?;

        info!(deployment_id = %id, environment = %config.environment, "Deployment started");
        self.bus.publish(CoreEvent::DeploymentStarted {
            deployment_id: id.to_string(),
            environment: config.environment.clone(),
        });
        self.begin_report().await;

        let result = self.run_stages(id, &config).await;
        self.end_report(result.is_err()).await;

        // Published after the reporting agent settles
        if let Ok(d) = self.get(id) {
            if d.status.is_terminal() {
                self.bus.publish(CoreEvent::DeploymentFinished {
                    deployment_id: id.to_string(),
                    status: d.status,
                    error: d.error,
                });
            }
        }
        result
    }

    async fn run_stages(&self, id: &str, config: &DeploymentConfig) -> Result<Deployment, CoreError> {
        for stage in StageName::ORDER {
            self.transition(id, |d| {
                d.current_stage = Some(stage);
                Ok(())
            })?;

            let outcome = self.runner.run_stage(stage, id, config).await;
            let record = StageRecord {
                name: stage,
                status: if outcome.success { StageStatus::Completed } else { StageStatus::Failed },
                duration_ms: outcome.duration_ms,
                details: outcome.details.clone(),
                finished_at: Utc::now(),
            };

            self.transition(id, |d| d.push_stage(record.clone()))?;
            self.bus.publish(CoreEvent::StageCompleted {
                deployment_id: id.to_string(),
                stage,
                record,
            });

            if !outcome.success {
                let message = format!("Stage {} failed: {}", stage, outcome.details);
                self.finish(id, DeploymentStatus::Failed, Some(message))?;
                error!(deployment_id = %id, stage = %stage, details = %outcome.details, "Deployment failed");
                return Err(CoreError::StageFailed {
                    deployment_id: id.to_string(),
                    stage: stage.to_string(),
                    details: outcome.details,
                });
            }

            info!(deployment_id = %id, stage = %stage, duration_ms = outcome.duration_ms, "Stage completed");
        }

        let done = self.finish(id, DeploymentStatus::Completed, None)?;
        info!(deployment_id = %id, duration_ms = done.total_duration_ms(), "Deployment completed");
        Ok(done)
    }

    fn finish(
        &self,
        id: &str,
        status: DeploymentStatus,
        error: Option<String>,
    ) -> Result<Deployment, CoreError> {
        self.transition(id, |d| {
            d.status = status;
            d.current_stage = None;
            d.error = error;
            d.finished_at = Some(Utc::now());
            Ok(d.clone())
        })
    }

    /// Apply one mutation under the deployment's entry lock.
    fn transition<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Deployment) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut entry = self
            .deployments
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("deployment", id))?;
        f(entry.value_mut())
    }

    async fn begin_report(&self) {
        let mut reporting = self.reporting.lock().await;
        if reporting.in_flight == 0 {
            reporting.failed = false;
            self.report(AgentStatus::Active).await;
        }
        reporting.in_flight += 1;
    }

    async fn end_report(&self, failed: bool) {
        let mut reporting = self.reporting.lock().await;
        reporting.in_flight = reporting.in_flight.saturating_sub(1);
        reporting.failed |= failed;
        if reporting.in_flight == 0 {
            let status = if reporting.failed { AgentStatus::Error } else { AgentStatus::Ready };
            self.report(status).await;
        }
    }

    async fn report(&self, status: AgentStatus) {
        if let Some(agent) = &self.reporting_agent {
            if let Err(e) = self.registry.set_status(agent, status).await {
                warn!(agent = %agent, error = %e, "Could not report pipeline status");
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<Deployment, CoreError> {
        self.deployments
            .get(id)
            .map(|d| d.value().clone())
            .ok_or_else(|| CoreError::not_found("deployment", id))
    }

    /// All deployments, oldest first.
    pub fn list(&self) -> Vec<Deployment> {
        let mut all: Vec<Deployment> = self.deployments.iter().map(|d| d.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub fn summary(&self) -> PipelineSummary {
        compute_summary(&self.list())
    }
}
