use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use crate::config::{CommandSpec, RuleSpec};
use crate::errors::CoreError;
use crate::events::{CoreEvent, EventBus};
use crate::simulation::{simulate_work, SimulationPolicy};
use crate::tools::state::incremental_mean;
use super::rules::ValidationRule;
use super::CommandType;
use tracing::{info, warn};

/// Recursion depth applied when a recursive command does not ask for one.
const DEFAULT_DEPTH: u64 = 3;
const MAX_DEPTH: u64 = 10;
const DEFAULT_WORKERS: u64 = 4;

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct CommandStats {
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    pub avg_duration_ms: f64,
    pub last_executed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Command {
    pub id: String,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub category: String,
    pub description: String,
    pub stats: CommandStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub command_id: String,
    pub command_type: CommandType,
    pub duration_ms: u64,
    pub rules_checked: usize,
    pub result: Value,
}

pub struct CommandEngine {
    commands: RwLock<HashMap<String, Command>>,
    rules: RwLock<Vec<ValidationRule>>,
    policy: Arc<dyn SimulationPolicy>,
    time_scale: f64,
    bus: EventBus,
}

impl CommandEngine {
    pub fn new(
        commands: &[CommandSpec],
        rules: &[RuleSpec],
        policy: Arc<dyn SimulationPolicy>,
        time_scale: f64,
        bus: EventBus,
    ) -> Result<Self, CoreError> {
        let mut catalog = HashMap::new();
        for spec in commands {
            let command = Command {
                id: spec.id.clone(),
                command_type: spec.command_type.parse()?,
                category: spec.category.clone(),
                description: spec.description.clone(),
                stats: CommandStats::default(),
            };
            catalog.insert(spec.id.clone(), command);
        }

        // Validation checks rules in id order
        let mut rules: Vec<ValidationRule> = rules.iter().map(ValidationRule::from_spec).collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Self {
            commands: RwLock::new(catalog),
            rules: RwLock::new(rules),
            policy,
            time_scale,
            bus,
        })
    }

    /// Validate, then run one command through its typed executor.
    pub async fn execute(&self, command_id: &str, params: Value) -> Result<CommandOutcome, CoreError> {
        let command = self.get(command_id).await?;

        let rules_checked = match self.validate(&command).await {
            Ok(n) => n,
            Err(e) => {
                self.record(command_id, None).await;
                return Err(e);
            }
        };

        let duration_ms = self.policy.command_delay_ms(command.command_type);
        simulate_work(duration_ms, self.time_scale).await;
        let result = run_executor(&command, &params);

        self.record(command_id, Some(duration_ms)).await;
        info!(command_id = %command_id, command_type = %command.command_type, duration_ms, "Command executed");
        self.bus.publish(CoreEvent::CommandExecuted {
            command_id: command_id.to_string(),
            duration_ms,
        });

        Ok(CommandOutcome {
            command_id: command_id.to_string(),
            command_type: command.command_type,
            duration_ms,
            rules_checked,
            result,
        })
    }

    /// Check every active rule for the command's type. The first failing rule
    /// records a violation and aborts.
    async fn validate(&self, command: &Command) -> Result<usize, CoreError> {
        let mut rules = self.rules.write().await;
        let mut checked = 0;
        for rule in rules.iter_mut().filter(|r| r.active && r.applies_to(command.command_type)) {
            checked += 1;
            if !self.policy.rule_passes(&rule.id) {
                rule.violations += 1;
                warn!(command_id = %command.id, rule_id = %rule.id, violations = rule.violations, "Validation failed");
                self.bus.publish(CoreEvent::ValidationFailed {
                    command_id: command.id.clone(),
                    rule_id: rule.id.clone(),
                });
                return Err(CoreError::ValidationFailed {
                    command_id: command.id.clone(),
                    rule_id: rule.id.clone(),
                });
            }
        }
        Ok(checked)
    }

    /// `None` records a failed run.
    async fn record(&self, command_id: &str, duration_ms: Option<u64>) {
        let mut commands = self.commands.write().await;
        if let Some(command) = commands.get_mut(command_id) {
            let stats = &mut command.stats;
            stats.executions += 1;
            stats.last_executed = Some(Utc::now());
            match duration_ms {
                Some(d) => {
                    stats.successes += 1;
                    stats.avg_duration_ms = incremental_mean(stats.avg_duration_ms, stats.successes, d as f64);
                }
                None => stats.failures += 1,
            }
        }
    }

    pub async fn get(&self, command_id: &str) -> Result<Command, CoreError> {
        self.commands
            .read()
            .await
            .get(command_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("command", command_id))
    }

    pub async fn list_commands(&self) -> Vec<Command> {
        let mut list: Vec<Command> = self.commands.read().await.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Rules sorted by id.
    pub async fn list_rules(&self) -> Vec<ValidationRule> {
        self.rules.read().await.clone()
    }

    pub async fn get_rule(&self, rule_id: &str) -> Result<ValidationRule, CoreError> {
        self.rules
            .read()
            .await
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("rule", rule_id))
    }
}

fn param_u64(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

fn run_executor(command: &Command, params: &Value) -> Value {
    match command.command_type {
        CommandType::Parallel => {
            let workers = param_u64(params, "workers").unwrap_or(DEFAULT_WORKERS).max(1);
            json!({
                "type": "parallel",
                "command_id": command.id,
                "workers": workers,
                "completed": workers,
            })
        }
        CommandType::Recursive => {
            let depth = param_u64(params, "depth").unwrap_or(DEFAULT_DEPTH).min(MAX_DEPTH);
            json!({
                "type": "recursive",
                "command_id": command.id,
                "depth": depth,
                "iterations": (1u64 << depth) - 1,
            })
        }
        CommandType::Persistent => {
            let key = params
                .get("state_key")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}-state", command.id));
            json!({
                "type": "persistent",
                "command_id": command.id,
                "state_key": key,
                "persisted": true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_commands, default_rules};
    use crate::simulation::ScriptedPolicy;

    fn engine(policy: Arc<dyn SimulationPolicy>, rules: &[RuleSpec], bus: EventBus) -> CommandEngine {
        CommandEngine::new(&default_commands(), rules, policy, 0.0, bus).unwrap()
    }

    #[tokio::test]
    async fn test_exact_violation_count() {
        let bus = EventBus::new(512);
        let policy = Arc::new(ScriptedPolicy::passing().with_rule_failure_every(10));
        let rules = vec![RuleSpec::new("parallel-resource-limit", "limit")];
        let engine = engine(policy.clone(), &rules, bus);

        let mut failures = 0;
        for _ in 0..120 {
            if let Err(CoreError::ValidationFailed { rule_id, .. }) =
                engine.execute("parallel-build", Value::Null).await
            {
                assert_eq!(rule_id, "parallel-resource-limit");
                failures += 1;
            }
        }

        assert_eq!(failures, 12);
        assert_eq!(policy.rule_checks(), 120);
        assert_eq!(engine.get_rule("parallel-resource-limit").await.unwrap().violations, 12);

        let stats = engine.get("parallel-build").await.unwrap().stats;
        assert_eq!(stats.executions, 120);
        assert_eq!(stats.successes, 108);
        assert_eq!(stats.failures, 12);
    }

    #[tokio::test]
    async fn test_only_matching_active_rules_are_checked() {
        let bus = EventBus::new(16);
        let policy = Arc::new(ScriptedPolicy::passing());
        let mut rules = default_rules();
        rules.push(RuleSpec { active: false, ..RuleSpec::new("recursive-breadth-limit", "off") });
        let engine = engine(policy.clone(), &rules, bus);

        let outcome = engine.execute("recursive-analysis", json!({"depth": 4})).await.unwrap();
        assert_eq!(outcome.rules_checked, 1);
        assert_eq!(outcome.result["iterations"], 15);
        assert_eq!(policy.rule_checks(), 1);

        let outcome = engine.execute("parallel-test", Value::Null).await.unwrap();
        assert_eq!(outcome.rules_checked, 2);
    }

    #[tokio::test]
    async fn test_validation_failure_publishes_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let policy = Arc::new(ScriptedPolicy::passing().with_rule_failure_every(1));
        let engine = engine(policy, &default_rules(), bus.clone());

        assert!(engine.execute("persistent-sync", Value::Null).await.is_err());
        match rx.try_recv().unwrap() {
            CoreEvent::ValidationFailed { command_id, rule_id } => {
                assert_eq!(command_id, "persistent-sync");
                assert_eq!(rule_id, "persistent-state-consistency");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_successful_command_updates_stats() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut policy = ScriptedPolicy::passing();
        policy.command_delay_ms = 400;
        let engine = engine(Arc::new(policy), &default_rules(), bus.clone());

        let outcome = engine.execute("persistent-monitor", json!({"state_key": "watch"})).await.unwrap();
        assert_eq!(outcome.result["state_key"], "watch");
        assert_eq!(outcome.duration_ms, 400);

        let stats = engine.get("persistent-monitor").await.unwrap().stats;
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.avg_duration_ms, 400.0);
        assert!(matches!(rx.try_recv().unwrap(), CoreEvent::CommandExecuted { duration_ms: 400, .. }));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let engine = engine(Arc::new(ScriptedPolicy::passing()), &[], EventBus::new(4));
        assert!(matches!(
            engine.execute("nope", Value::Null).await,
            Err(CoreError::NotFound { kind: "command", .. })
        ));
    }

    #[test]
    fn test_unknown_type_rejected_at_load() {
        let specs = vec![CommandSpec::new("batch-x", "batch", "ops", "")];
        let result = CommandEngine::new(&specs, &[], Arc::new(ScriptedPolicy::passing()), 0.0, EventBus::new(4));
        assert!(matches!(result, Err(CoreError::UnknownCommandType(_))));
    }

    #[tokio::test]
    async fn test_rules_checked_in_id_order() {
        let bus = EventBus::new(16);
        let policy = Arc::new(ScriptedPolicy::passing().with_rule_failure_every(1));
        let rules = vec![
            RuleSpec::new("parallel-resource-limit", "limit"),
            RuleSpec::new("parallel-dependency-check", "deps"),
        ];
        let engine = engine(policy.clone(), &rules, bus);

        let ids: Vec<String> = engine.list_rules().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["parallel-dependency-check", "parallel-resource-limit"]);

        match engine.execute("parallel-build", Value::Null).await {
            Err(CoreError::ValidationFailed { rule_id, .. }) => assert_eq!(rule_id, "parallel-dependency-check"),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(policy.rule_checks(), 1);
        assert_eq!(engine.get_rule("parallel-resource-limit").await.unwrap().violations, 0);
    }

    #[tokio::test]
    async fn test_catalog_sorted() {
        let engine = engine(Arc::new(ScriptedPolicy::passing()), &default_rules(), EventBus::new(4));
        let ids: Vec<String> = engine.list_commands().await.into_iter().map(|c| c.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(engine.list_rules().await.len(), 4);
    }
}
