//! Gateway failures and their HTTP mapping.

use super::types::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const MSG_INVALID_INPUT: &str = "Invalid input data";
pub const MSG_MISSING_EMAIL: &str = "Missing email";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// A required field is missing, empty or holds the `none` sentinel.
    #[error("{0}")]
    InvalidInput(&'static str),

    /// The uniqueness pre-check found an account with the same email.
    #[error("User already exists")]
    AlreadyExists,

    /// No account matches the email given at login.
    #[error("User not found")]
    NotFound,

    /// The identity provider rejected or failed the request.
    #[error("{0}")]
    IdentityProvider(String),

    /// The document store rejected or failed the request.
    #[error("{0}")]
    Store(String),
}

impl GatewayError {
    pub(crate) fn identity(err: &anyhow::Error) -> Self {
        Self::IdentityProvider(format!("{err:#}"))
    }

    pub(crate) fn store(err: &anyhow::Error) -> Self {
        Self::Store(format!("{err:#}"))
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::AlreadyExists => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::UNAUTHORIZED,
            Self::IdentityProvider(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Dependency failures, as opposed to problems with the request itself.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::IdentityProvider(_) | Self::Store(_))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_codes() {
        assert_eq!(
            GatewayError::InvalidInput(MSG_INVALID_INPUT).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GatewayError::AlreadyExists.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::NotFound.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GatewayError::IdentityProvider("EMAIL_EXISTS".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Store("down".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_match_wire_format() {
        assert_eq!(
            GatewayError::InvalidInput(MSG_MISSING_EMAIL).to_string(),
            "Missing email"
        );
        assert_eq!(GatewayError::AlreadyExists.to_string(), "User already exists");
        assert_eq!(GatewayError::NotFound.to_string(), "User not found");
    }

    #[test]
    fn dependency_errors_keep_the_cause_chain() {
        let err = anyhow!("connection refused").context("failed to write users/u1");
        assert_eq!(
            GatewayError::store(&err).to_string(),
            "failed to write users/u1: connection refused"
        );
        assert!(GatewayError::store(&err).is_server_error());
        assert!(!GatewayError::NotFound.is_server_error());
    }
}
