//! Gateway error model.

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of a remote procedure call.
///
/// The split matters for what the user sees: a [`GatewayError::Business`]
/// message was written by the backend for humans and is shown verbatim, all
/// other variants are replaced by a caller-supplied generic message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network failure, timeout, or an HTTP error without a usable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The procedure ran and reported a failure (`success: false`).
    #[error("{0}")]
    Business(String),

    /// The response did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn business(msg: impl Into<String>) -> Self {
        Self::Business(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Message to surface to the user.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            GatewayError::Business(msg) if !msg.trim().is_empty() => msg.clone(),
            _ => fallback.to_string(),
        }
    }
}
