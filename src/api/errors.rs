use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use crate::errors::CoreError;
use tracing::{error, warn};

impl CoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_programmer_error() => StatusCode::BAD_REQUEST,
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::ValidationFailed { .. } | CoreError::StageFailed { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CoreError::ToolDisabled(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let classification = self.classify();
        if status.is_server_error() {
            error!(
                error_type = classification.error_type,
                surfaced = classification.surfaced,
                error = %self,
                "Request failed"
            );
        } else {
            warn!(
                error_type = classification.error_type,
                surfaced = classification.surfaced,
                error = %self,
                "Request rejected"
            );
        }

        (
            status,
            Json(json!({
                "error": self.to_string(),
                "type": classification.error_type,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(CoreError::not_found("agent", "x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            CoreError::ValidationFailed { command_id: "c".into(), rule_id: "r".into() }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(CoreError::UnknownStage("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CoreError::ToolDisabled("tool-004".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(CoreError::InvalidInput("empty".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CoreError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
