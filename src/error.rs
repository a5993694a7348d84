//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the HTTP API, the
//! resolver layer and the client, along with the HTTP status mapping.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    Guard { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Guard { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Guard { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn guard<S: Into<String>>(code: S, msg: S) -> Self { AppError::Guard { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// A credential was supplied but failed verification. The message matches
    /// what the API has always surfaced for tampered/expired/malformed tokens.
    pub fn invalid_token() -> Self {
        AppError::auth("invalid_token", "Session invalid")
    }

    /// An identity-requiring operation was attempted without a credential.
    /// Distinct from `invalid_token`: anonymous is a legal state, it is the
    /// operation that refuses it.
    pub fn sign_in_required() -> Self {
        AppError::forbidden("sign_in_required", "You must be signed in to do this")
    }

    pub fn depth_exceeded(depth: usize, max: usize) -> Self {
        AppError::Guard {
            code: "depth_exceeded".into(),
            message: format!("query depth {} exceeds maximum {}", depth, max),
        }
    }

    pub fn complexity_exceeded(cost: u64, max: u64) -> Self {
        AppError::Guard {
            code: "complexity_exceeded".into(),
            message: format!("query complexity {} exceeds maximum {}", cost, max),
        }
    }

    /// Map to HTTP status code. Invalid tokens map to 401; an anonymous caller
    /// hitting an identity-requiring operation maps to 403, keeping the
    /// anonymous/invalid distinction visible at the HTTP layer.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Guard { .. } => 400,
            AppError::Internal { .. } => 500,
        }
    }

    /// Message as shown to API clients. Internal errors are suppressed to a
    /// generic string in production so detail never leaks off the server.
    pub fn client_message(&self, production: bool) -> &str {
        match self {
            AppError::Internal { .. } if production => "internal server error",
            _ => self.message(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal { code: "io".into(), message: err.to_string() }
    }
}
