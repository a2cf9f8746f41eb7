use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CenterConfig {
    pub agents: Option<Vec<AgentSpec>>,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub tools: ToolSettings,
    pub commands: Option<Vec<CommandSpec>>,
    pub rules: Option<Vec<RuleSpec>>,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl CenterConfig {
    /// Configured roster, or the built-in eight-agent fleet.
    pub fn agent_specs(&self) -> Vec<AgentSpec> {
        self.agents.clone().unwrap_or_else(default_roster)
    }

    pub fn command_specs(&self) -> Vec<CommandSpec> {
        self.commands.clone().unwrap_or_else(default_commands)
    }

    pub fn rule_specs(&self) -> Vec<RuleSpec> {
        self.rules.clone().unwrap_or_else(default_rules)
    }
}

/// Declared shape of one fleet member.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AgentSpec {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub estimated_completion: Option<NaiveDate>,
}

impl AgentSpec {
    pub fn new(id: &str, name: &str, role: &str, capabilities: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            progress: None,
            estimated_completion: None,
        }
    }
}

pub fn default_roster() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new("david-database", "David", "Database Architect", &["mongodb", "schema-design", "data-modeling"]),
        AgentSpec::new("elena-backend-api", "Elena", "Backend API", &["rest-api", "integration", "authentication"]),
        AgentSpec::new("grace-ai-integration", "Grace", "AI Integration", &["memory-systems", "llm-integration"]),
        AgentSpec::new("iris-devops", "Iris", "DevOps", &["ci-cd", "deployment", "monitoring"]),
        AgentSpec::new("jack-powerline-viz", "Jack", "PowerLine Visualization", &["visualization", "tree-rendering"]),
        AgentSpec::new("kelly-enrollment", "Kelly", "Enrollment Flow", &["forms", "onboarding"]),
        AgentSpec::new("maya-viral", "Maya", "Viral Features", &["sharing", "growth"]),
        AgentSpec::new("olivia-docs", "Olivia", "Documentation", &["technical-writing", "guides"]),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Delegation is attempted only when enabled and the last probe succeeded.
    pub enabled: bool,
    pub base_url: String,
    pub health_timeout_ms: u64,
    pub execution_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8090".to_string(),
            health_timeout_ms: 2_000,
            execution_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub reporting_agent: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            reporting_agent: Some("iris-devops".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ToolSettings {
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CommandSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub command_type: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RuleSpec {
    pub id: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl CommandSpec {
    pub fn new(id: &str, command_type: &str, category: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            command_type: command_type.to_string(),
            category: category.to_string(),
            description: description.to_string(),
        }
    }
}

impl RuleSpec {
    pub fn new(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            active: true,
        }
    }
}

pub fn default_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("parallel-build", "parallel", "development", "Build every service concurrently"),
        CommandSpec::new("parallel-test", "parallel", "quality", "Run all test suites side by side"),
        CommandSpec::new("recursive-analysis", "recursive", "analytics", "Walk the dependency graph and score each node"),
        CommandSpec::new("recursive-refactor", "recursive", "development", "Apply a refactor until no call sites remain"),
        CommandSpec::new("persistent-monitor", "persistent", "infrastructure", "Keep a watch session open across restarts"),
        CommandSpec::new("persistent-sync", "persistent", "integration", "Checkpoint partner sync state"),
    ]
}

pub fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new("parallel-resource-limit", "Concurrent workers stay within the fleet budget"),
        RuleSpec::new("parallel-dependency-check", "No two branches write the same artifact"),
        RuleSpec::new("recursive-depth-limit", "Recursion depth stays bounded"),
        RuleSpec::new("persistent-state-consistency", "Checkpointed state matches the live state"),
    ]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub launch_date: NaiveDate,
    pub velocity_window_days: u32,
    pub health_threshold: f64,
    pub blocker_progress_threshold: f64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "PowerLine".to_string(),
            launch_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap_or_default(),
            velocity_window_days: 7,
            health_threshold: 50.0,
            blocker_progress_threshold: 50.0,
        }
    }
}

/// Periodic task intervals, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub health_secs: u64,
    pub performance_secs: u64,
    pub connectivity_secs: u64,
    pub metrics_secs: u64,
    pub velocity_secs: u64,
    pub status_broadcast_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            health_secs: 30,
            performance_secs: 60,
            connectivity_secs: 10,
            metrics_secs: 5,
            velocity_secs: 60,
            status_broadcast_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub activity_log_cap: usize,
    pub metric_history_cap: usize,
    pub execution_history_cap: usize,
    pub event_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            activity_log_cap: 1000,
            metric_history_cap: 100,
            execution_history_cap: 1000,
            event_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Multiplier applied to every simulated sleep. `0.0` makes simulated work instant.
    pub time_scale: f64,
    pub rule_pass_rate: f64,
    pub stage_failure_rate: f64,
    pub tool_failure_rate: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            rule_pass_rate: 0.9,
            stage_failure_rate: 0.0,
            tool_failure_rate: 0.0,
            seed: None,
        }
    }
}
