//! Typed errors raised by command handlers.
//!
//! Handlers return `anyhow::Result<()>`. When the error (or anything in its
//! cause chain) is a [`CliError`], the runner uses its [`ErrorKind`] to pick the
//! exit status and message format. Anything else is treated as unexpected.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Classification of a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Cancelled,
    /// User-facing guidance, printed as a plain message.
    Hint,
    /// Argument validation failure, rendered through clap's error path.
    Invalid,
    NotFound,
    ServerError,
    /// The handler gave up waiting on something.
    Timeout,
}

impl ErrorKind {
    /// Stable error code string (e.g. `E_HINT`).
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "E_BADREQUEST",
            ErrorKind::Cancelled => "E_CANCELLED",
            ErrorKind::Hint => "E_HINT",
            ErrorKind::Invalid => "E_INVALID",
            ErrorKind::NotFound => "E_NOTFOUND",
            ErrorKind::ServerError => "E_SERVERERROR",
            ErrorKind::Timeout => "E_TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An error raised by a handler author, carrying a kind, a message and
/// optional structured data.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CliError {
    kind: ErrorKind,
    message: String,
    data: Option<Value>,
    stack: Arc<Backtrace>,
}

impl CliError {
    /// Create an error of the given kind. The backtrace is always captured,
    /// whatever `RUST_BACKTRACE` says; unexpected failures print it.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            stack: Arc::new(Backtrace::force_capture()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn hint(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Hint, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Attach structured data to the error.
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Backtrace captured where the error was constructed.
    pub fn backtrace(&self) -> &Backtrace {
        &self.stack
    }
}
