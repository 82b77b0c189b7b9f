use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;

/// Every failure a handler can return. Domain rule violations are built
/// explicitly by handlers; store failures arrive through `?` on `anyhow`
/// results and are never shown to the caller in detail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request data (400)
    #[error("{0}")]
    Validation(String),

    /// State already exists in an incompatible form (409). `context` carries
    /// whatever the caller needs to resolve it without re-querying.
    #[error("{message}")]
    Conflict { message: String, context: Value },

    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid credential (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not a party to the resource (403)
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    pub fn conflict(message: impl Into<String>, context: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            context,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut body = json!({ "success": false });
        match self {
            Self::Store(e) => {
                error!("Store failure: {:#}", e);
                body["error"] = json!("An internal error occurred");
            }
            Self::Conflict { message, context } => {
                body["error"] = json!(message);
                if let Value::Object(fields) = context {
                    for (key, value) in fields {
                        body[key] = value;
                    }
                }
            }
            other => body["error"] = json!(other.to_string()),
        }

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
