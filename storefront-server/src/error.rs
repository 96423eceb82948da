//! Startup and request error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use storefront_rag::RagError;
use thiserror::Error;
use tracing::warn;

/// Errors that stop the service from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A required environment variable is not set.
    #[error("{0} is not set in the environment")]
    MissingVar(&'static str),

    /// An environment variable holds an unusable value.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Building a collaborator or ingesting the knowledge base failed.
    #[error(transparent)]
    Rag(#[from] RagError),
}

/// JSON body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// The error's textual description.
    pub detail: String,
    /// Stable tag naming the error kind.
    pub kind: String,
}

/// A request-level failure, mapped to a status code and an [`ErrorBody`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was rejected before reaching the pipeline.
    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },

    /// A pipeline stage failed.
    #[error(transparent)]
    Pipeline(#[from] RagError),
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { status, .. } => *status,
            Self::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Pipeline(err) => err.kind(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest { status: rejection.status(), message: rejection.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::InvalidRequest { message, .. } = &self {
            warn!(%status, reason = %message, "rejected chat request");
        }
        let body = ErrorBody { detail: self.to_string(), kind: self.kind().to_string() };
        (status, Json(body)).into_response()
    }
}
