use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failure taxonomy surfaced by the API handlers.
///
/// Rate-limit outcomes are not errors; they travel as
/// [`Decision`](crate::ratelimit::Decision) values.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad client input. Rejected before any external call.
    #[error("invalid input: {0}")]
    Validation(String),

    /// No catalog entry matches.
    #[error("not found: {0}")]
    NotFound(String),

    /// A best-match search came back empty.
    #[error("no match for query: {0}")]
    NoMatch(String),

    /// An external collaborator failed or timed out.
    #[error("{dependency} failed: {message}")]
    Dependency {
        dependency: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn dependency(dependency: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Dependency {
            dependency,
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NoMatch(_) | ApiError::Dependency { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Dependency { dependency, message } => {
                tracing::error!(dependency = *dependency, "{}", message);
            }
            other => tracing::debug!("{}", other),
        }
        self.status().into_response()
    }
}
