//! Error types and the error-reporting collaborator

use thiserror::Error;
use tracing::warn;

/// Reasons a mapping-database line is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("mapping line is empty")]
    Empty,

    #[error("mapping line has no GUID")]
    MissingGuid,

    #[error("mapping line has no name")]
    MissingName,

    #[error("malformed entry '{0}' (expected token:source)")]
    MalformedPair(String),

    #[error("unknown token '{0}'")]
    UnknownToken(String),

    #[error("invalid source '{value}' for token '{token}'")]
    InvalidSource { token: String, value: String },

    #[error("hat mask {0} is not one of 1, 2, 4, 8")]
    InvalidHatMask(u8),

    /// Line is valid but restricted to another platform
    #[error("mapping is for platform '{0}'")]
    PlatformMismatch(String),
}

/// Backend bring-up failures
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend initialization failed: {0}")]
    Init(String),
}

/// Receiver for recoverable problems (unmapped device, bad mapping line)
///
/// The return value reports whether the handler consumed the message; the
/// manager does not branch on it.
pub trait ErrorHandler {
    fn on_error(&mut self, component: &str, message: &str) -> bool;
}

/// Default handler: forwards every report to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn on_error(&mut self, component: &str, message: &str) -> bool {
        warn!(component, "{}", message);
        true
    }
}
