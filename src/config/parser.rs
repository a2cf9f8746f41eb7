use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use regex::Regex;
use crate::commands::CommandType;
use crate::errors::CoreError;
use crate::tools::catalog;
use super::types::CenterConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("static id pattern")
});

pub async fn parse_config(path: &Path) -> Result<CenterConfig, CoreError> {
    if !path.exists() {
        return Err(CoreError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(CoreError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<CenterConfig, CoreError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    // An empty document is a valid config
    if yaml.is_null() {
        return Ok(CenterConfig::default());
    }

    validate_schema(&yaml)?;

    let config: CenterConfig = serde_yaml::from_value(yaml)?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), CoreError> {
    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| CoreError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| CoreError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory: typed parsing and semantic checks below are authoritative
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
pub fn validate_conflicts(config: &CenterConfig) -> Result<(), CoreError> {
    let agents = config.agent_specs();
    let mut seen = HashSet::new();
    for agent in &agents {
        if !ID_PATTERN.is_match(&agent.id) {
            return Err(CoreError::Config(format!(
                "Agent id '{}' must be lowercase alphanumeric with dashes",
                agent.id
            )));
        }
        if !seen.insert(agent.id.as_str()) {
            return Err(CoreError::Config(format!("Duplicate agent id '{}'", agent.id)));
        }
        if let Some(progress) = agent.progress {
            if !(0.0..=100.0).contains(&progress) {
                return Err(CoreError::Config(format!(
                    "Agent '{}' progress {} is outside 0-100",
                    agent.id, progress
                )));
            }
        }
    }

    if let Some(reporting) = &config.pipeline.reporting_agent {
        if !agents.iter().any(|a| &a.id == reporting) {
            warn!(agent = %reporting, "Pipeline reporting agent is not in the roster");
        }
    }

    for tool_id in &config.tools.disabled {
        if catalog::get_tool(tool_id).is_none() {
            warn!(tool = %tool_id, "Disabled tool is not in the catalog");
        }
    }

    if let Some(commands) = &config.commands {
        let mut seen = HashSet::new();
        for command in commands {
            command.command_type.parse::<CommandType>()?;
            if !seen.insert(command.id.as_str()) {
                return Err(CoreError::Config(format!("Duplicate command id '{}'", command.id)));
            }
        }
    }

    if let Some(rules) = &config.rules {
        let mut seen = HashSet::new();
        for rule in rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(CoreError::Config(format!("Duplicate rule id '{}'", rule.id)));
            }
            if CommandType::for_rule(&rule.id).is_none() {
                warn!(rule = %rule.id, "Rule id has no command type prefix and will never run");
            }
        }
    }

    let schedule = &config.schedule;
    let intervals = [
        ("health_secs", schedule.health_secs),
        ("performance_secs", schedule.performance_secs),
        ("connectivity_secs", schedule.connectivity_secs),
        ("metrics_secs", schedule.metrics_secs),
        ("velocity_secs", schedule.velocity_secs),
        ("status_broadcast_secs", schedule.status_broadcast_secs),
    ];
    for (name, secs) in intervals {
        if secs == 0 {
            return Err(CoreError::Config(format!("schedule.{} must be at least 1", name)));
        }
    }

    let limits = &config.limits;
    if limits.metric_history_cap == 0
        || limits.activity_log_cap == 0
        || limits.execution_history_cap == 0
        || limits.event_capacity == 0
    {
        return Err(CoreError::Config("limits must all be at least 1".into()));
    }

    let sim = &config.simulation;
    if !sim.time_scale.is_finite() || sim.time_scale < 0.0 {
        return Err(CoreError::Config(
            "simulation.time_scale must be a finite, non-negative number".into(),
        ));
    }
    for (name, rate) in [
        ("rule_pass_rate", sim.rule_pass_rate),
        ("stage_failure_rate", sim.stage_failure_rate),
        ("tool_failure_rate", sim.tool_failure_rate),
    ] {
        if !(0.0..=1.0).contains(&rate) {
            return Err(CoreError::Config(format!("simulation.{} must be within 0-1", name)));
        }
    }

    let project = &config.project;
    for (name, threshold) in [
        ("health_threshold", project.health_threshold),
        ("blocker_progress_threshold", project.blocker_progress_threshold),
    ] {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(CoreError::Config(format!("project.{} must be within 0-100", name)));
        }
    }

    if config.project.velocity_window_days == 0 {
        return Err(CoreError::Config("project.velocity_window_days must be at least 1".into()));
    }

    Ok(())
}
