// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Arcanum reading client.

use thiserror::Error;

/// The primary error type used across the gateway, controller, and poller.
#[derive(Debug, Error)]
pub enum ArcanumError {
    /// A client-side precondition was violated. Never sent to the network.
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-success HTTP response or network failure. Carries the operation
    /// name and status code (when one was received) for diagnostics.
    #[error("{}", format_transport(.operation, .status, .message))]
    Transport {
        operation: String,
        status: Option<u16>,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The requested resource does not exist yet. For `get_interpretation`
    /// this is the expected "still generating" signal the poller retries on,
    /// not a terminal failure.
    #[error("{operation}: resource not found")]
    NotFound { operation: String },

    /// The polling budget was exhausted before the interpretation appeared.
    /// Recoverable: the caller may start another polling round.
    #[error("interpretation not available after {attempts} attempts")]
    InterpretationUnavailable { attempts: u32 },

    /// A second draw or follow-up was attempted while one was already in
    /// flight for the same reading/interpretation. Rejected client-side.
    #[error("operation already in flight: {0}")]
    ConcurrentOperation(String),

    /// The session was abandoned while an operation was waiting to retry.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration errors (invalid values, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Render a transport failure, including the HTTP status when one was received.
fn format_transport(operation: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("{operation} failed (HTTP {code}): {message}"),
        None => format!("{operation} failed: {message}"),
    }
}

impl ArcanumError {
    /// Builds a `Transport` error with no underlying source.
    pub fn transport(operation: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            status,
            message: message.into(),
            source: None,
        }
    }

    /// True when this error is the retryable "interpretation not generated
    /// yet" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Duplicates the error, dropping any boxed transport source.
    ///
    /// The source is the only non-clonable payload; everything a caller
    /// matches on (variant, operation, status, message) is preserved. Used
    /// where one failure must be reported to more than one waiter.
    pub fn clone_without_source(&self) -> Self {
        match self {
            Self::Validation(message) => Self::Validation(message.clone()),
            Self::Transport {
                operation,
                status,
                message,
                ..
            } => Self::Transport {
                operation: operation.clone(),
                status: *status,
                message: message.clone(),
                source: None,
            },
            Self::NotFound { operation } => Self::NotFound {
                operation: operation.clone(),
            },
            Self::InterpretationUnavailable { attempts } => {
                Self::InterpretationUnavailable { attempts: *attempts }
            }
            Self::ConcurrentOperation(message) => Self::ConcurrentOperation(message.clone()),
            Self::Cancelled => Self::Cancelled,
            Self::Config(message) => Self::Config(message.clone()),
            Self::Internal(message) => Self::Internal(message.clone()),
        }
    }
}
