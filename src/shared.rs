use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::SigningConfig;
use crate::session::service::SessionService;
use crate::session::token::TokenService;
use crate::user::{PasswordVerifier, UserLookup};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub token_service: Arc<TokenService>,
    pub session_service: Arc<SessionService>,
}

impl AppState {
    /// Wires the token and session services around one immutable signing config
    pub fn new(
        config: Arc<SigningConfig>,
        users: Arc<dyn UserLookup>,
        verifier: Arc<dyn PasswordVerifier>,
    ) -> Self {
        let token_service = Arc::new(TokenService::new(Arc::clone(&config)));
        let session_service = Arc::new(SessionService::new(
            Arc::clone(&token_service),
            users,
            verifier,
            config,
        ));

        Self {
            token_service,
            session_service,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Malformed authorization header: {0}")]
    MalformedHeader(String),

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token signature mismatch")]
    SignatureMismatch,

    #[error("Expired token")]
    ExpiredToken,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unknown user")]
    UnknownUser,

    #[error("Missing refresh cookie")]
    MissingRefreshCookie,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Signing failure: {0}")]
    SigningFailure(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedHeader(_)
            | AppError::MalformedRequest(_)
            | AppError::MalformedToken(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedAlgorithm(_)
            | AppError::SignatureMismatch
            | AppError::ExpiredToken
            | AppError::InvalidIssuer
            | AppError::InvalidCredentials
            | AppError::UnknownUser
            | AppError::MissingRefreshCookie
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::SigningFailure(_) | AppError::DatabaseError(_) | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side details stay in the logs
        let error_message = if status.is_server_error() {
            error!(error = %self, "Request failed with server error");
            "Internal server error".to_string()
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
