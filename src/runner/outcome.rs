use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::node::Command;

/// Process exit status for a handler outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Success,
    /// The handler outlived the configured timeout, or raised a timeout error.
    Timeout,
    /// The handler rejected its arguments.
    Invalid,
    /// The handler raised user-facing guidance.
    Hint,
    /// Anything else.
    Unexpected,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Timeout => 1,
            ExitStatus::Invalid => 2,
            ExitStatus::Hint => 3,
            ExitStatus::Unexpected => 4,
        }
    }
}

/// A handler (or its `on_before_handler` hook) failed.
pub struct HandlerFailure {
    pub status: ExitStatus,
    /// Full command line, e.g. `tool db migrate`.
    pub command: String,
    pub node: Arc<Command>,
    pub error: anyhow::Error,
}

impl fmt::Debug for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFailure")
            .field("status", &self.status)
            .field("command", &self.command)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The handler resolved successfully.
    Completed,
    /// clap handled the arguments itself: a usage error, `--help` or `--version`.
    Usage { code: i32 },
    /// The handler did not finish within `limit`.
    TimedOut { limit: Duration, command: String },
    Failed(HandlerFailure),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed => ExitStatus::Success.code(),
            Outcome::Usage { code } => *code,
            Outcome::TimedOut { .. } => ExitStatus::Timeout.code(),
            Outcome::Failed(failure) => failure.status.code(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Completed.exit_code(), 0);
        assert_eq!(Outcome::Usage { code: 2 }.exit_code(), 2);
        assert_eq!(
            Outcome::TimedOut {
                limit: Duration::from_secs(1),
                command: "tool".into(),
            }
            .exit_code(),
            1
        );
        assert_eq!(
            [
                ExitStatus::Invalid,
                ExitStatus::Hint,
                ExitStatus::Unexpected
            ]
            .map(ExitStatus::code),
            [2, 3, 4]
        );
    }

    #[test]
    fn test_help_is_success() {
        assert!(Outcome::Usage { code: 0 }.is_success());
        assert!(!Outcome::Usage { code: 2 }.is_success());
    }
}
