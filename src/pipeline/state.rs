use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Starting,
    Running,
    Completed,
    Failed,
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Validate,
    Build,
    Test,
    Deploy,
    Monitor,
}

impl StageName {
    /// Fixed execution order of every deployment.
    pub const ORDER: [StageName; 5] = [
        StageName::Validate,
        StageName::Build,
        StageName::Test,
        StageName::Deploy,
        StageName::Monitor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Build => "build",
            Self::Test => "test",
            Self::Deploy => "deploy",
            Self::Monitor => "monitor",
        }
    }

    pub fn position(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<StageName> {
        Self::ORDER.get(self.position() + 1).copied()
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| CoreError::UnknownStage(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Failed,
}

/// What a stage runner reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub success: bool,
    pub duration_ms: u64,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageRecord {
    pub name: StageName,
    pub status: StageStatus,
    pub duration_ms: u64,
    pub details: String,
    pub finished_at: DateTime<Utc>,
}

/// Input a deployment is created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

fn default_environment() -> String {
    "staging".to_string()
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            version: None,
            branch: None,
            requested_by: None,
            params: serde_json::Map::new(),
        }
    }
}

impl DeploymentConfig {
    pub fn for_environment(environment: &str) -> Self {
        Self {
            environment: environment.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub config: DeploymentConfig,
    pub status: DeploymentStatus,
    /// Per-deployment cursor; `None` before the first stage and after the last.
    pub current_stage: Option<StageName>,
    pub stages: Vec<StageRecord>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Deployment {
    pub fn new(id: String, config: DeploymentConfig) -> Self {
        Self {
            id,
            config,
            status: DeploymentStatus::Starting,
            current_stage: None,
            stages: Vec::new(),
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.duration_ms).sum()
    }

    /// The stage that failed, if the deployment failed.
    pub fn failed_stage(&self) -> Option<StageName> {
        self.stages
            .last()
            .filter(|s| s.status == StageStatus::Failed)
            .map(|s| s.name)
    }

    /// Append a stage outcome. The stage must be the next one in the fixed
    /// order and the deployment must not be terminal.
    pub(crate) fn push_stage(&mut self, record: StageRecord) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::Internal(format!(
                "Deployment {} is already {}",
                self.id, self.status
            )));
        }
        let expected = StageName::ORDER.get(self.stages.len()).copied();
        if expected != Some(record.name) {
            return Err(CoreError::Internal(format!(
                "Deployment {} expected stage {:?}, got {}",
                self.id, expected, record.name
            )));
        }
        self.stages.push(record);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PipelineSummary {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub mean_duration_ms: f64,
}
