use super::types::CoreError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Whether the error reaches the caller. Delegation failures are absorbed
    /// by the local fallback and never do.
    pub surfaced: bool,
}

impl CoreError {
    /// Classify this error for logging and for the caller-facing mapping.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            CoreError::DelegationUnavailable(_) => ErrorClassification {
                error_type: "DelegationUnavailable",
                surfaced: false,
            },

            CoreError::NotFound { .. } => ErrorClassification {
                error_type: "NotFound",
                surfaced: true,
            },
            CoreError::ValidationFailed { .. } => ErrorClassification {
                error_type: "ValidationFailed",
                surfaced: true,
            },
            CoreError::StageFailed { .. } => ErrorClassification {
                error_type: "StageFailed",
                surfaced: true,
            },
            CoreError::UnknownStage(_) => ErrorClassification {
                error_type: "UnknownStage",
                surfaced: true,
            },
            CoreError::UnknownCommandType(_) => ErrorClassification {
                error_type: "UnknownCommandType",
                surfaced: true,
            },
            CoreError::ToolDisabled(_) => ErrorClassification {
                error_type: "ToolDisabled",
                surfaced: true,
            },
            CoreError::ExecutionFailed { .. } => ErrorClassification {
                error_type: "ExecutionFailed",
                surfaced: true,
            },
            CoreError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                surfaced: true,
            },
            CoreError::InvalidInput(_) => ErrorClassification {
                error_type: "InvalidInput",
                surfaced: true,
            },
            CoreError::Io(_) => ErrorClassification {
                error_type: "IoError",
                surfaced: true,
            },
            CoreError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                surfaced: true,
            },
            CoreError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                surfaced: true,
            },
            CoreError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                surfaced: true,
            },
        }
    }

    /// True for errors that end a single operation because of bad input or
    /// configuration rather than a runtime outcome.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownStage(_)
                | CoreError::UnknownCommandType(_)
                | CoreError::Config(_)
                | CoreError::InvalidInput(_)
        )
    }
}
