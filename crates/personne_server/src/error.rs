//! Transport-level error mapping.
//!
//! # Responsibility
//! - Map service failures to HTTP statuses and stable error codes.
//! - Render the same codes as GraphQL error extensions.

use async_graphql::ErrorExtensions;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use personne_core::{PersonneServiceError, RepoError};
use serde::Serialize;
use thiserror::Error;

/// Error returned by REST handlers and GraphQL resolvers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] PersonneServiceError),
    #[error("reset requires a valid admin token")]
    Forbidden,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Service(value.into())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    /// Stable machine-readable code shared by REST and GraphQL.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Service(PersonneServiceError::NotFound(_)) => "not_found",
            Self::Service(PersonneServiceError::InvalidInput(_)) => "invalid_input",
            Self::Service(PersonneServiceError::InvalidBirthDate(_)) => "invalid_birth_date",
            Self::Service(PersonneServiceError::TooYoung(_)) => "too_young",
            Self::Service(PersonneServiceError::DuplicatePhone(_)) => "duplicate_phone",
            Self::Service(PersonneServiceError::Repo(_)) | Self::Internal(_) => "internal",
            Self::Forbidden => "forbidden",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(PersonneServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(
                PersonneServiceError::InvalidInput(_)
                | PersonneServiceError::InvalidBirthDate(_)
                | PersonneServiceError::TooYoung(_),
            ) => StatusCode::BAD_REQUEST,
            Self::Service(PersonneServiceError::DuplicatePhone(_)) => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Service(PersonneServiceError::Repo(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message; storage details stay in the logs.
    fn public_message(&self) -> String {
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            error!(
                "event=request_failed module=server status=error error_code={} error={}",
                self.code(),
                self
            );
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Converts into a GraphQL error carrying `extensions.code`.
    pub fn into_graphql(self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.public_message()).extend_with(|_, ext| ext.set("code", code))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
