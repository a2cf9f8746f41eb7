use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use crate::errors::CoreError;
use crate::events::{CoreEvent, EventBus};
use crate::simulation::{simulate_work, SimulationPolicy};
use super::catalog::{self, CATEGORIES, TOOLS};
use super::delegate::{RemoteExecutor, RemoteRequest};
use super::state::*;
use tracing::{debug, info, warn};

/// Number of interim progress notifications for a local run.
pub const PROGRESS_STEPS: u64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_duration_ms: u64,
    pub tool_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BrokerStats {
    pub total_tools: usize,
    pub available: usize,
    pub busy: usize,
    pub disabled: usize,
    pub active_executions: usize,
    pub total_executions: u64,
    pub connectivity: ConnectivityState,
}

struct RunOutcome {
    path: ExecutionPath,
    duration_ms: u64,
    result: Result<Value, String>,
}

/// Dispatches catalog tools to the remote executor when it is reachable and
/// simulates them locally otherwise.
pub struct ToolBroker {
    tools: RwLock<HashMap<String, Tool>>,
    active: DashMap<String, Execution>,
    history: RwLock<VecDeque<Execution>>,
    history_cap: usize,
    remote: Option<Arc<dyn RemoteExecutor>>,
    connectivity: RwLock<ConnectivityState>,
    policy: Arc<dyn SimulationPolicy>,
    time_scale: f64,
    bus: EventBus,
    cancel: CancellationToken,
}

impl ToolBroker {
    pub fn new(policy: Arc<dyn SimulationPolicy>, time_scale: f64, history_cap: usize, bus: EventBus) -> Self {
        let tools = TOOLS
            .iter()
            .map(|info| (info.id.to_string(), Tool::from_info(info)))
            .collect();
        Self {
            tools: RwLock::new(tools),
            active: DashMap::new(),
            history: RwLock::new(VecDeque::new()),
            history_cap: history_cap.max(1),
            remote: None,
            connectivity: RwLock::new(ConnectivityState::Disconnected),
            policy,
            time_scale,
            bus,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteExecutor>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Mark tools as disabled. Unknown ids are ignored.
    pub fn with_disabled(mut self, ids: &[String]) -> Self {
        let tools = self.tools.get_mut();
        for id in ids {
            if let Some(tool) = tools.get_mut(id) {
                tool.status = ToolStatus::Disabled;
            }
        }
        self
    }

    /// Cancel every in-flight local simulation.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn connectivity(&self) -> ConnectivityState {
        *self.connectivity.read().await
    }

    /// Probe the remote executor. A change of state is logged and published once.
    pub async fn probe_connectivity(&self) -> ConnectivityState {
        let state = match &self.remote {
            Some(remote) => match remote.health().await {
                Ok(()) => ConnectivityState::Connected,
                Err(e) => {
                    debug!(url = %remote.base_url(), error = %e, "Executor health probe failed");
                    ConnectivityState::Disconnected
                }
            },
            None => ConnectivityState::Disconnected,
        };

        let mut current = self.connectivity.write().await;
        if *current != state {
            *current = state;
            info!(state = ?state, "Executor connectivity changed");
            self.bus.publish(CoreEvent::BrokerConnectivity { state, at: Utc::now() });
        }
        state
    }

    /// Run one tool to completion.
    ///
    /// Remote delegation is attempted only while connected; any remote failure
    /// falls back to a local simulation of the same execution. The run lives
    /// on its own task, so a caller that stops waiting does not strand the
    /// execution in the active set.
    pub async fn execute(self: &Arc<Self>, tool_id: &str, params: Value, priority: Priority) -> Result<Execution, CoreError> {
        let broker = Arc::clone(self);
        let tool_id = tool_id.to_string();
        tokio::spawn(async move { broker.run_execution(&tool_id, params, priority).await })
            .await
            .map_err(|e| CoreError::Internal(format!("Tool execution task failed: {}", e)))?
    }

    async fn run_execution(&self, tool_id: &str, params: Value, priority: Priority) -> Result<Execution, CoreError> {
        let tool = self.claim(tool_id).await?;
        let execution_id = format!("exec-{}", Uuid::new_v4());
        self.active.insert(
            execution_id.clone(),
            Execution::new(execution_id.clone(), tool_id, params.clone(), priority),
        );
        info!(execution_id = %execution_id, tool_id = %tool_id, priority = ?priority, "Tool execution started");

        let outcome = match self.run_remote(&tool, &execution_id, &params, priority).await {
            Some(outcome) => outcome,
            None => self.run_local(&tool, &execution_id).await,
        };

        self.settle(&tool, &execution_id, outcome).await
    }

    /// Check availability and count the execution as active on the tool.
    async fn claim(&self, tool_id: &str) -> Result<Tool, CoreError> {
        let mut tools = self.tools.write().await;
        let tool = tools
            .get_mut(tool_id)
            .ok_or_else(|| CoreError::not_found("tool", tool_id))?;
        if tool.status == ToolStatus::Disabled {
            return Err(CoreError::ToolDisabled(tool_id.to_string()));
        }
        tool.active_executions += 1;
        tool.status = ToolStatus::Busy;
        Ok(tool.clone())
    }

    async fn run_remote(
        &self,
        tool: &Tool,
        execution_id: &str,
        params: &Value,
        priority: Priority,
    ) -> Option<RunOutcome> {
        let remote = self.remote.as_ref()?;
        if self.connectivity().await != ConnectivityState::Connected {
            return None;
        }

        let request = RemoteRequest {
            execution_id: execution_id.to_string(),
            tool_id: tool.id.clone(),
            tool_name: tool.name.clone(),
            category: tool.category.clone(),
            params: params.clone(),
            priority,
        };
        let started = Instant::now();
        match tokio::time::timeout(remote.execution_timeout(), remote.execute(&request)).await {
            Ok(Ok(result)) => Some(RunOutcome {
                path: ExecutionPath::Remote,
                duration_ms: started.elapsed().as_millis() as u64,
                result: Ok(result),
            }),
            Ok(Err(e)) => {
                warn!(execution_id = %execution_id, error = %e, "Remote execution failed, simulating locally");
                None
            }
            Err(_) => {
                warn!(execution_id = %execution_id, "Remote execution timed out, simulating locally");
                None
            }
        }
    }

    async fn run_local(&self, tool: &Tool, execution_id: &str) -> RunOutcome {
        let base = catalog::base_duration_ms(&tool.category);
        let duration_ms = (base as f64 * self.policy.jitter()).round().max(0.0) as u64;
        let step_ms = duration_ms / PROGRESS_STEPS;

        for step in 1..=PROGRESS_STEPS {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return RunOutcome {
                        path: ExecutionPath::Local,
                        duration_ms: step_ms * (step - 1),
                        result: Err("Execution cancelled".to_string()),
                    };
                }
                _ = simulate_work(step_ms, self.time_scale) => {}
            }

            let progress = (step * 100 / PROGRESS_STEPS) as u8;
            if let Some(mut exec) = self.active.get_mut(execution_id) {
                exec.advance(progress);
            }
            self.bus.publish(CoreEvent::ToolProgress {
                execution_id: execution_id.to_string(),
                tool_id: tool.id.clone(),
                progress,
            });
        }

        let result = if self.policy.tool_succeeds(&tool.id) {
            Ok(simulated_result(tool, duration_ms))
        } else {
            Err(format!("{} reported failure", tool.name))
        };
        RunOutcome { path: ExecutionPath::Local, duration_ms, result }
    }

    /// Move the execution into history and release the tool.
    async fn settle(&self, tool: &Tool, execution_id: &str, outcome: RunOutcome) -> Result<Execution, CoreError> {
        let mut exec = self
            .active
            .remove(execution_id)
            .map(|(_, e)| e)
            .ok_or_else(|| CoreError::Internal(format!("Execution {} vanished", execution_id)))?;

        exec.path = Some(outcome.path);
        exec.duration_ms = Some(outcome.duration_ms);
        exec.completed_at = Some(Utc::now());
        match &outcome.result {
            Ok(result) => {
                exec.status = ExecutionStatus::Completed;
                exec.advance(100);
                exec.result = Some(result.clone());
            }
            Err(reason) => {
                exec.status = ExecutionStatus::Failed;
                exec.error = Some(reason.clone());
            }
        }

        {
            let mut tools = self.tools.write().await;
            if let Some(t) = tools.get_mut(&tool.id) {
                t.active_executions = t.active_executions.saturating_sub(1);
                if t.active_executions == 0 && t.status == ToolStatus::Busy {
                    t.status = ToolStatus::Available;
                }
                if outcome.result.is_ok() {
                    t.record_execution(outcome.duration_ms);
                }
            }
        }

        {
            let mut history = self.history.write().await;
            history.push_back(exec.clone());
            while history.len() > self.history_cap {
                history.pop_front();
            }
        }

        match outcome.result {
            Ok(_) => {
                info!(
                    execution_id = %execution_id,
                    tool_id = %tool.id,
                    duration_ms = outcome.duration_ms,
                    path = ?outcome.path,
                    "Tool execution completed"
                );
                self.bus.publish(CoreEvent::ToolExecuted {
                    execution_id: execution_id.to_string(),
                    tool_id: tool.id.clone(),
                    duration_ms: outcome.duration_ms,
                    remote: outcome.path == ExecutionPath::Remote,
                });
                Ok(exec)
            }
            Err(reason) => {
                warn!(execution_id = %execution_id, tool_id = %tool.id, reason = %reason, "Tool execution failed");
                self.bus.publish(CoreEvent::ToolFailed {
                    execution_id: execution_id.to_string(),
                    tool_id: tool.id.clone(),
                    error: reason.clone(),
                });
                Err(CoreError::ExecutionFailed {
                    execution_id: execution_id.to_string(),
                    tool_id: tool.id.clone(),
                    reason,
                })
            }
        }
    }

    pub async fn get_tool(&self, id: &str) -> Result<Tool, CoreError> {
        self.tools
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("tool", id))
    }

    /// Tools sorted by id, optionally restricted to one category.
    pub async fn list_tools(&self, category: Option<&str>) -> Vec<Tool> {
        let tools = self.tools.read().await;
        let mut list: Vec<Tool> = tools
            .values()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn categories(&self) -> Vec<CategorySummary> {
        CATEGORIES
            .iter()
            .map(|c| CategorySummary {
                id: c.id.to_string(),
                name: c.name.to_string(),
                description: c.description.to_string(),
                base_duration_ms: c.base_duration_ms,
                tool_count: TOOLS.iter().filter(|t| t.category == c.id).count(),
            })
            .collect()
    }

    /// Look up a running or finished execution.
    pub async fn get_execution(&self, id: &str) -> Result<Execution, CoreError> {
        if let Some(exec) = self.active.get(id) {
            return Ok(exec.value().clone());
        }
        self.history
            .read()
            .await
            .iter()
            .rev()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("execution", id))
    }

    pub fn active_executions(&self) -> Vec<Execution> {
        let mut list: Vec<Execution> = self.active.iter().map(|e| e.value().clone()).collect();
        list.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        list
    }

    /// Finished executions, newest first.
    pub async fn history(&self, limit: Option<usize>) -> Vec<Execution> {
        let history = self.history.read().await;
        history
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> BrokerStats {
        let tools = self.tools.read().await;
        let count = |status: ToolStatus| tools.values().filter(|t| t.status == status).count();
        BrokerStats {
            total_tools: tools.len(),
            available: count(ToolStatus::Available),
            busy: count(ToolStatus::Busy),
            disabled: count(ToolStatus::Disabled),
            active_executions: self.active.len(),
            total_executions: tools.values().map(|t| t.execution_count).sum(),
            connectivity: *self.connectivity.read().await,
        }
    }
}

fn simulated_result(tool: &Tool, duration_ms: u64) -> Value {
    json!({
        "tool_id": tool.id,
        "tool_name": tool.name,
        "category": tool.category,
        "status": "success",
        "output": format!("{} completed successfully", tool.name),
        "metrics": {
            "duration_ms": duration_ms,
            "simulated": true,
        },
    })
}
