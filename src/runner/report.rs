//! Classification and rendering of handler failures.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::io::{self, Write};
use std::time::Duration;

use crate::error::{CliError, ErrorKind};

use super::outcome::ExitStatus;

/// The first [`CliError`] in the error's cause chain.
pub(crate) fn find_cli_error(error: &anyhow::Error) -> Option<&CliError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CliError>())
}

/// Pick the exit status for a handler error.
pub(crate) fn classify(error: &anyhow::Error) -> ExitStatus {
    match find_cli_error(error).map(CliError::kind) {
        Some(ErrorKind::Invalid) => ExitStatus::Invalid,
        Some(ErrorKind::Hint) => ExitStatus::Hint,
        Some(ErrorKind::Timeout) => ExitStatus::Timeout,
        _ => ExitStatus::Unexpected,
    }
}

/// Render `error` for the user according to `status`.
///
/// `leaf` is the matched command's clap parser; invalid-argument errors go
/// through its own error path so they look like any other usage error.
pub(crate) fn write_failure(
    out: &mut dyn Write,
    status: ExitStatus,
    error: &anyhow::Error,
    leaf: &clap::Command,
    command: &str,
    bug_report_url: &str,
) -> io::Result<()> {
    let message = find_cli_error(error)
        .map(|cli| cli.message().to_string())
        .unwrap_or_else(|| format!("{error:#}"));

    match status {
        ExitStatus::Invalid => {
            let rendered = leaf
                .clone()
                .error(clap::error::ErrorKind::ValueValidation, message)
                .render();
            write!(out, "{rendered}")
        }
        ExitStatus::Hint => writeln!(out, "{message}"),
        ExitStatus::Timeout => writeln!(out, "Command '{command}' timed out: {message}"),
        ExitStatus::Success | ExitStatus::Unexpected => {
            write_unexpected(out, error, command, bug_report_url)
        }
    }
}

fn write_unexpected(
    out: &mut dyn Write,
    error: &anyhow::Error,
    command: &str,
    bug_report_url: &str,
) -> io::Result<()> {
    match find_cli_error(error) {
        Some(cli) => writeln!(out, "Unexpected error in '{command}' [{}]: {error:#}", cli.code())?,
        None => writeln!(out, "Unexpected error in '{command}': {error:#}")?,
    }

    // Plain anyhow errors only carry a trace when RUST_BACKTRACE asked for
    // one; otherwise record where the runner received the failure.
    let boundary;
    let backtrace: &Backtrace = match find_cli_error(error) {
        Some(cli) => cli.backtrace(),
        None if error.backtrace().status() == BacktraceStatus::Captured => error.backtrace(),
        None => {
            boundary = Backtrace::force_capture();
            &boundary
        }
    };
    writeln!(out)?;
    writeln!(out, "Stack trace:")?;
    if backtrace.status() == BacktraceStatus::Captured {
        writeln!(out, "{backtrace}")?;
    } else {
        writeln!(out, "  <unavailable on this platform>")?;
    }

    writeln!(out)?;
    writeln!(out, "This is a bug. Please report it at {bug_report_url}")
}

pub(crate) fn write_timeout(out: &mut dyn Write, command: &str, limit: Duration) -> io::Result<()> {
    writeln!(
        out,
        "Command '{command}' timed out after {}s",
        limit.as_secs_f64()
    )
}
