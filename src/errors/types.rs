use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Command {command_id} rejected by validation rule {rule_id}")]
    ValidationFailed { command_id: String, rule_id: String },

    #[error("Deployment {deployment_id} failed at stage {stage}: {details}")]
    StageFailed {
        deployment_id: String,
        stage: String,
        details: String,
    },

    #[error("Remote executor unavailable: {0}")]
    DelegationUnavailable(String),

    #[error("Unknown pipeline stage: {0}")]
    UnknownStage(String),

    #[error("Unknown command type: {0}")]
    UnknownCommandType(String),

    #[error("Tool is disabled: {0}")]
    ToolDisabled(String),

    #[error("Execution {execution_id} of {tool_id} failed: {reason}")]
    ExecutionFailed {
        execution_id: String,
        tool_id: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller-supplied value was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }
}
