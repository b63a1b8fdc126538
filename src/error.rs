//! Application error taxonomy and outbound error bodies
//!
//! Every failure that can reach an HTTP response is mapped to a stable
//! machine-readable code plus a sanitized message: secret-looking
//! substrings are scrubbed and long messages truncated before they can
//! leave the process.

use crate::catalog::UnknownAlgorithm;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::trace::TraceError;
use crate::tutor::TutorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for algoscope operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Trace generation failed: {0}")]
    Trace(#[from] TraceError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Tutor error: {0}")]
    Tutor(#[from] TutorError),

    #[error("{0}")]
    UnknownAlgorithm(#[from] UnknownAlgorithm),

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("LLM provider error: {message}")]
    Llm { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// JSON error body returned on every failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Trace(TraceError::InvalidInput { .. }) => "invalid_input",
            AppError::Trace(TraceError::LimitExceeded { .. }) => "limit_exceeded",
            AppError::Trace(TraceError::StepBudgetExceeded { .. }) => "step_budget_exceeded",
            AppError::Session(SessionError::InvalidSessionId { .. })
            | AppError::Tutor(TutorError::Session(SessionError::InvalidSessionId { .. })) => {
                "invalid_session"
            }
            AppError::Session(SessionError::EmptyMessage)
            | AppError::Tutor(TutorError::Session(SessionError::EmptyMessage))
            | AppError::Tutor(TutorError::EmptyQuestion) => "invalid_input",
            AppError::UnknownAlgorithm(_) => "unknown_algorithm",
            AppError::SessionNotFound { .. } => "session_not_found",
            AppError::Llm { .. } => "llm_error",
            AppError::Config(_) | AppError::Internal { .. } => "internal",
        }
    }

    /// HTTP status code for the response carrying this error
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Trace(TraceError::InvalidInput { .. })
            | AppError::Trace(TraceError::LimitExceeded { .. })
            | AppError::Session(_)
            | AppError::Tutor(_) => 400,
            AppError::Trace(TraceError::StepBudgetExceeded { .. }) => 422,
            AppError::UnknownAlgorithm(_) | AppError::SessionNotFound { .. } => 404,
            AppError::Llm { .. } => 502,
            AppError::Config(_) | AppError::Internal { .. } => 500,
        }
    }

    /// Converts to the outbound JSON body, sanitizing the message
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: sanitize_error_message(&self.to_string()),
            },
        }
    }

    /// Create LLM error
    pub fn llm_error<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn session_not_found<S: Into<String>>(session_id: S) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }
}

/// Sanitize error messages to prevent sensitive data leakage
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = message.to_string();

    // Remove common secret patterns
    sanitized = regex::Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+")
        .unwrap()
        .replace_all(&sanitized, "${1}=***")
        .to_string();

    // Remove potential file paths that might contain sensitive info
    sanitized =
        regex::Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
            .unwrap()
            .replace_all(&sanitized, "/***REDACTED***/")
            .to_string();

    // Truncate very long messages - ensure total length is <= 500
    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let mut cut = 500 - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(truncate_suffix);
    }

    sanitized
}

/// Result type for application operations
pub type AppResult<T> = Result<T, AppError>;
