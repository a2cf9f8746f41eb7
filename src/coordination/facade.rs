use std::sync::Arc;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use crate::agents::{Agent, AgentRegistry, AgentStatus};
use crate::commands::{Command, CommandEngine, CommandOutcome, ValidationRule};
use crate::config::{validate_conflicts, CenterConfig};
use crate::errors::CoreError;
use crate::events::{CoreEvent, EventBus};
use crate::pipeline::{
    Deployment, DeploymentConfig, PipelineEngine, PipelineSummary, SimulatedStageRunner, StageRunner,
};
use crate::simulation::{RandomPolicy, SimulationPolicy};
use crate::tools::{
    BrokerStats, CategorySummary, Execution, HttpExecutor, Priority, RemoteExecutor, Tool, ToolBroker,
};
use super::blockers::{detect_blockers, Blocker};
use super::metrics::{self, Metric, MetricStore};
use super::progress;
use super::tasks::*;
use super::{ProjectStatus, TaskCounts};
use tracing::{debug, info, warn};

/// Assembles a [`CommandCenter`], with optional overrides for the pieces
/// tests need to control.
pub struct CommandCenterBuilder {
    config: CenterConfig,
    policy: Option<Arc<dyn SimulationPolicy>>,
    runner: Option<Arc<dyn StageRunner>>,
    executor: Option<Arc<dyn RemoteExecutor>>,
}

impl CommandCenterBuilder {
    pub fn policy(mut self, policy: Arc<dyn SimulationPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn stage_runner(mut self, runner: Arc<dyn StageRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn RemoteExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub async fn build(self) -> Result<CommandCenter, CoreError> {
        let config = self.config;
        validate_conflicts(&config)?;

        let bus = EventBus::new(config.limits.event_capacity);
        let time_scale = config.simulation.time_scale;
        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(RandomPolicy::from_config(&config.simulation)));

        let registry = Arc::new(
            AgentRegistry::from_specs(
                &config.agent_specs(),
                bus.clone(),
                policy.clone(),
                config.project.health_threshold,
            )
            .await,
        );

        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(SimulatedStageRunner::new(policy.clone(), time_scale)));
        let pipeline = Arc::new(PipelineEngine::new(
            runner,
            registry.clone(),
            config.pipeline.reporting_agent.clone(),
            bus.clone(),
        ));

        let mut broker = ToolBroker::new(
            policy.clone(),
            time_scale,
            config.limits.execution_history_cap,
            bus.clone(),
        )
        .with_disabled(&config.tools.disabled);
        let executor = match self.executor {
            Some(executor) => Some(executor),
            None if config.executor.enabled => {
                Some(Arc::new(HttpExecutor::new(&config.executor)) as Arc<dyn RemoteExecutor>)
            }
            None => None,
        };
        if let Some(executor) = executor {
            broker = broker.with_remote(executor);
        }

        let commands = CommandEngine::new(
            &config.command_specs(),
            &config.rule_specs(),
            policy,
            time_scale,
            bus.clone(),
        )?;

        info!(
            project = %config.project.name,
            agents = registry.len().await,
            commands = commands.list_commands().await.len(),
            "Command center initialized"
        );

        Ok(CommandCenter {
            book: RwLock::new(TaskBook::new(config.limits.activity_log_cap)),
            metrics: MetricStore::new(config.limits.metric_history_cap),
            blockers: RwLock::new(Vec::new()),
            started_at: Utc::now(),
            broker: Arc::new(broker),
            config,
            bus,
            registry,
            pipeline,
            commands,
        })
    }
}

/// Single entry point for callers. Owns every component and derives project
/// metrics from their state; metrics never feed back into components.
pub struct CommandCenter {
    config: CenterConfig,
    bus: EventBus,
    registry: Arc<AgentRegistry>,
    pipeline: Arc<PipelineEngine>,
    broker: Arc<ToolBroker>,
    commands: CommandEngine,
    book: RwLock<TaskBook>,
    metrics: MetricStore,
    blockers: RwLock<Vec<Blocker>>,
    started_at: DateTime<Utc>,
}

impl CommandCenter {
    pub fn builder(config: CenterConfig) -> CommandCenterBuilder {
        CommandCenterBuilder {
            config,
            policy: None,
            runner: None,
            executor: None,
        }
    }

    pub async fn from_config(config: CenterConfig) -> Result<Self, CoreError> {
        Self::builder(config).build().await
    }

    pub fn config(&self) -> &CenterConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.bus.subscribe()
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn broker(&self) -> &Arc<ToolBroker> {
        &self.broker
    }

    /// Cancel in-flight local tool simulations.
    pub fn shutdown(&self) {
        self.broker.shutdown();
    }

    // Mutations

    pub async fn deploy(&self, config: DeploymentConfig) -> Result<Deployment, CoreError> {
        let environment = config.environment.clone();
        let result = self.pipeline.deploy(config).await;
        let message = match &result {
            Ok(d) => format!("Deployment to {} completed in {} ms", environment, d.total_duration_ms()),
            Err(e) => format!("Deployment to {} failed: {}", environment, e),
        };
        let subject = match &result {
            Ok(d) => d.id.clone(),
            Err(CoreError::StageFailed { deployment_id, .. }) => deployment_id.clone(),
            Err(_) => environment,
        };
        self.book.write().await.log("deployment", &subject, message);
        result
    }

    pub async fn start_deployment(&self, config: DeploymentConfig) -> String {
        let environment = config.environment.clone();
        let id = self.pipeline.start(config);
        self.book
            .write()
            .await
            .log("deployment", &id, format!("Deployment to {} started", environment));
        id
    }

    /// Run a tool. A string `agent_id` in `params` attributes the run to that
    /// agent's request counters.
    pub async fn execute_tool(&self, tool_id: &str, params: Value, priority: Priority) -> Result<Execution, CoreError> {
        let agent_id = params.get("agent_id").and_then(Value::as_str).map(str::to_string);
        let result = self.broker.execute(tool_id, params, priority).await;

        if let Some(agent_id) = agent_id {
            if let Err(e) = self.registry.record_request(&agent_id, result.is_ok()).await {
                warn!(agent = %agent_id, error = %e, "Tool run attributed to unknown agent");
            }
        }
        if let Ok(exec) = &result {
            self.book
                .write()
                .await
                .log("tool", &exec.id, format!("Ran {} via {:?}", tool_id, exec.path));
        }
        result
    }

    pub async fn execute_command(&self, command_id: &str, params: Value) -> Result<CommandOutcome, CoreError> {
        self.commands.execute(command_id, params).await
    }

    pub async fn create_task(&self, new: NewTask) -> Result<Task, CoreError> {
        if let Some(agent_id) = &new.assignee {
            self.registry.get(agent_id).await?;
        }
        let (task, entry) = {
            let mut book = self.book.write().await;
            let task = book.create_task(new)?;
            (task, book.last_activity().cloned())
        };
        self.publish_activity(entry);
        self.sync_agent_progress(task.assignee.as_deref()).await;
        Ok(task)
    }

    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, CoreError> {
        let (task, entry) = {
            let mut book = self.book.write().await;
            let task = book.update_task(id, update)?;
            (task, book.last_activity().cloned())
        };
        self.publish_activity(entry);
        self.sync_agent_progress(task.assignee.as_deref()).await;
        Ok(task)
    }

    /// Reassign a task. Both the previous and the new assignee get their
    /// progress recomputed.
    pub async fn assign_task(&self, id: &str, agent_id: &str) -> Result<Task, CoreError> {
        self.registry.get(agent_id).await?;
        let (task, previous, entry) = {
            let mut book = self.book.write().await;
            let (task, previous) = book.assign_task(id, agent_id)?;
            (task, previous, book.last_activity().cloned())
        };
        self.publish_activity(entry);
        if previous.as_deref() != Some(agent_id) {
            self.sync_agent_progress(previous.as_deref()).await;
        }
        self.sync_agent_progress(Some(agent_id)).await;
        Ok(task)
    }

    pub async fn create_milestone(&self, new: NewMilestone) -> Result<Milestone, CoreError> {
        let (milestone, entry) = {
            let mut book = self.book.write().await;
            let milestone = book.create_milestone(new)?;
            (milestone, book.last_activity().cloned())
        };
        self.publish_activity(entry);
        Ok(milestone)
    }

    pub async fn set_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<Agent, CoreError> {
        self.registry.set_status(agent_id, status).await
    }

    pub async fn set_agent_progress(&self, agent_id: &str, progress: f64) -> Result<Agent, CoreError> {
        self.registry.set_progress(agent_id, progress).await
    }

    /// Set or clear an agent's estimated completion date. A date in the past
    /// on an unfinished agent surfaces as an overdue blocker on the next
    /// metrics tick.
    pub async fn set_agent_eta(&self, agent_id: &str, eta: Option<NaiveDate>) -> Result<Agent, CoreError> {
        self.registry.set_estimated_completion(agent_id, eta).await
    }

    async fn sync_agent_progress(&self, agent_id: Option<&str>) {
        let Some(agent_id) = agent_id else { return };
        let progress = self.book.read().await.agent_progress(agent_id);
        if let Some(progress) = progress {
            match self.registry.set_progress(agent_id, progress).await {
                Ok(_) => debug!(agent = %agent_id, progress, "Agent progress recomputed from tasks"),
                Err(e) => warn!(agent = %agent_id, error = %e, "Could not update agent progress"),
            }
        }
    }

    fn publish_activity(&self, entry: Option<ActivityEntry>) {
        if let Some(entry) = entry {
            self.bus.publish(CoreEvent::TaskActivity {
                task_id: entry.subject_id,
                kind: entry.kind,
                message: entry.message,
            });
        }
    }

    // Queries

    pub async fn agents(&self) -> Vec<Agent> {
        self.registry.list_all().await
    }

    pub async fn agent(&self, id: &str) -> Result<Agent, CoreError> {
        self.registry.get(id).await
    }

    pub fn deployments(&self) -> Vec<Deployment> {
        self.pipeline.list()
    }

    pub fn deployment(&self, id: &str) -> Result<Deployment, CoreError> {
        self.pipeline.get(id)
    }

    pub fn pipeline_summary(&self) -> PipelineSummary {
        self.pipeline.summary()
    }

    pub async fn tools(&self, category: Option<&str>) -> Vec<Tool> {
        self.broker.list_tools(category).await
    }

    pub async fn tool(&self, id: &str) -> Result<Tool, CoreError> {
        self.broker.get_tool(id).await
    }

    pub fn tool_categories(&self) -> Vec<CategorySummary> {
        self.broker.categories()
    }

    pub async fn tool_stats(&self) -> BrokerStats {
        self.broker.stats().await
    }

    pub async fn executions(&self, limit: Option<usize>) -> Vec<Execution> {
        self.broker.history(limit).await
    }

    pub fn active_executions(&self) -> Vec<Execution> {
        self.broker.active_executions()
    }

    pub async fn execution(&self, id: &str) -> Result<Execution, CoreError> {
        self.broker.get_execution(id).await
    }

    pub async fn commands(&self) -> Vec<Command> {
        self.commands.list_commands().await
    }

    pub async fn rules(&self) -> Vec<ValidationRule> {
        self.commands.list_rules().await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, CoreError> {
        self.book.read().await.get_task(id)
    }

    pub async fn tasks(&self, status: Option<TaskStatus>, assignee: Option<&str>) -> Vec<Task> {
        self.book.read().await.list_tasks(status, assignee)
    }

    pub async fn milestones(&self) -> Vec<Milestone> {
        self.book.read().await.list_milestones()
    }

    pub async fn activity(&self, limit: Option<usize>) -> Vec<ActivityEntry> {
        self.book.read().await.activity(limit)
    }

    pub async fn metrics(&self) -> Vec<Metric> {
        self.metrics.all().await
    }

    pub async fn metric(&self, name: &str) -> Result<Metric, CoreError> {
        self.metrics
            .get(name)
            .await
            .ok_or_else(|| CoreError::not_found("metric", name))
    }

    pub async fn blockers(&self) -> Vec<Blocker> {
        self.blockers.read().await.clone()
    }

    // Derived state

    /// One metrics tick: progress, completion rate, days to launch and
    /// blockers, all derived from current component state.
    pub async fn recompute_metrics(&self, today: NaiveDate) -> Vec<Metric> {
        let agents = self.registry.list_all().await;
        let completion_rate = self.book.read().await.completion_rate();
        let blockers = detect_blockers(
            &agents,
            today,
            self.config.project.blocker_progress_threshold,
            Utc::now(),
        );

        let values = [
            (metrics::OVERALL_PROGRESS, progress::overall_progress(&agents)),
            (metrics::TASK_COMPLETION_RATE, completion_rate),
            (
                metrics::TIME_TO_LAUNCH,
                progress::time_to_launch(today, self.config.project.launch_date) as f64,
            ),
            (metrics::ACTIVE_BLOCKERS, blockers.len() as f64),
        ];

        let mut updated = Vec::with_capacity(values.len());
        for (name, value) in values {
            let metric = self.metrics.record(name, value).await;
            self.bus.publish(CoreEvent::MetricUpdated {
                name: metric.name.clone(),
                value: metric.value,
                trend: metric.trend,
            });
            updated.push(metric);
        }

        if !blockers.is_empty() {
            debug!(count = blockers.len(), "Blockers detected");
        }
        *self.blockers.write().await = blockers.clone();
        self.bus.publish(CoreEvent::BlockersDetected { blockers });
        updated
    }

    /// Tasks completed over the trailing window, per day.
    pub async fn compute_velocity(&self, now: DateTime<Utc>) -> Metric {
        let window = self.config.project.velocity_window_days;
        let since = now - ChronoDuration::days(window as i64);
        let completed = self.book.read().await.completed_since(since);
        let metric = self
            .metrics
            .record(metrics::VELOCITY, progress::velocity(completed, window))
            .await;
        self.bus.publish(CoreEvent::MetricUpdated {
            name: metric.name.clone(),
            value: metric.value,
            trend: metric.trend,
        });
        metric
    }

    pub async fn project_status(&self) -> ProjectStatus {
        let now = Utc::now();
        let today = now.date_naive();
        let agents = self.registry.list_all().await;
        let (task_counts, completion_rate) = {
            let book = self.book.read().await;
            let tasks = book.list_tasks(None, None);
            (TaskCounts::from_tasks(&tasks), book.completion_rate())
        };

        ProjectStatus {
            project: self.config.project.name.clone(),
            launch_date: self.config.project.launch_date,
            days_to_launch: progress::time_to_launch(today, self.config.project.launch_date),
            generated_at: now,
            uptime_secs: (now - self.started_at).num_seconds().max(0) as u64,
            overall_progress: progress::overall_progress(&agents),
            task_completion_rate: completion_rate,
            velocity: self.metrics.value(metrics::VELOCITY).await,
            agents,
            blockers: self.blockers.read().await.clone(),
            pipeline: self.pipeline.summary(),
            tools: self.broker.stats().await,
            tasks: task_counts,
        }
    }

    pub async fn broadcast_status(&self) {
        let status = self.project_status().await;
        self.bus.publish(CoreEvent::ProjectStatus { status: Box::new(status) });
    }
}
