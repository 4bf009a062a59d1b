//! Top-level driver: compile, parse, dispatch, map the outcome to an exit code.
//!
//! ```text
//! validate root → build root parser → configure tree → clap parse
//!     → resolve dispatch → on_before_handler → handler (with timeout) → Outcome
//! ```

mod outcome;
mod report;

pub use outcome::{ExitStatus, HandlerFailure, Outcome};

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::handler::HandlerContext;
use crate::node::{ConfigureError, Node, TreeNode};
use crate::parser::{HelpFormatter, Parser, ParserError};
use crate::plugin::{run_plugins, HandlerHookContext, HookPayload};

/// Exit code for failures to compile the command tree (`EX_SOFTWARE`).
pub const COMPILE_FAILURE_EXIT_CODE: i32 = 70;

/// Errors that stop a run before a handler is invoked. These are programming
/// errors in the tree, not user errors.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Node '{name}' is attached to a parent and cannot be run as a root")]
    InvalidRoot { name: String },

    #[error("Failed to compile the command tree: {0}")]
    Configure(#[from] ConfigureError),

    #[error("Failed to build the parser: {0}")]
    Parser(#[from] ParserError),

    #[error("Matched command '{path}' has no handler")]
    Dispatch { path: String },

    #[error("Failed to write to the error stream: {0}")]
    Io(#[from] io::Error),
}

/// Drives one invocation of a command tree.
pub struct Runner {
    config: RunnerConfig,
    argv: Option<Vec<OsString>>,
    stderr: Box<dyn Write + Send>,
    handler_timeout: Option<Duration>,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            argv: None,
            stderr: Box::new(io::stderr()),
            handler_timeout: None,
        }
    }

    /// Arguments to parse, program name first. Defaults to the process arguments.
    pub fn argv<I, T>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.argv = Some(argv.into_iter().map(Into::into).collect());
        self
    }

    /// Where failure reports are written. Defaults to stderr.
    pub fn stderr(mut self, writer: impl Write + Send + 'static) -> Self {
        self.stderr = Box::new(writer);
        self
    }

    /// Override the configured handler timeout.
    pub fn handler_timeout(mut self, limit: Duration) -> Self {
        self.handler_timeout = Some(limit);
        self
    }

    fn limit(&self) -> Duration {
        self.handler_timeout
            .unwrap_or_else(|| self.config.handler_timeout())
    }

    /// Compile `root`, parse the arguments and run the matched handler.
    ///
    /// User-facing failures (usage errors, handler errors, timeouts) are
    /// reported on the error stream and returned as an [`Outcome`]; only tree
    /// wiring mistakes come back as [`RunError`].
    ///
    /// A handler that outlives the timeout is detached, not stopped: it keeps
    /// running until the runtime shuts down.
    pub async fn run(mut self, root: impl Into<Node>) -> Result<Outcome, RunError> {
        let root = root.into();
        if root.base().is_attached() {
            return Err(RunError::InvalidRoot {
                name: root.name().to_string(),
            });
        }

        let formatter = self
            .config
            .help_width
            .map(HelpFormatter::new)
            .unwrap_or_else(HelpFormatter::from_terminal);
        let mut parser = Parser::new(root.parser_options(formatter));
        root.configure(&mut parser).await?;
        let mut command = parser.build()?;
        debug!(root = root.name(), "command tree compiled");

        let argv = self
            .argv
            .take()
            .unwrap_or_else(|| std::env::args_os().collect());
        let matches = match command.try_get_matches_from_mut(argv) {
            Ok(matches) => matches,
            Err(err) => {
                if err.use_stderr() {
                    write!(self.stderr, "{}", err.render())?;
                } else {
                    err.print()?;
                }
                return Ok(Outcome::Usage {
                    code: err.exit_code(),
                });
            }
        };

        let (args, dispatch) = parser.resolve(&matches).ok_or_else(|| RunError::Dispatch {
            path: command_line(root.name(), &[]),
        })?;
        let path = args.path().to_vec();
        let invocation = command_line(root.name(), &path);
        let leaf = path
            .iter()
            .try_fold(&command, |cmd, name| cmd.find_subcommand(name))
            .cloned()
            .ok_or_else(|| RunError::Dispatch {
                path: invocation.clone(),
            })?;
        let node = Arc::clone(&dispatch.node);

        let hook = run_plugins(
            &node.base().plugins(),
            HookPayload::BeforeHandler(HandlerHookContext {
                args: &args,
                node: &node,
                parser: &leaf,
                handler: &dispatch.handler,
            }),
        )
        .await;
        if let Err(err) = hook {
            return self.fail(anyhow::Error::new(err), &leaf, &invocation, node);
        }

        let limit = self.limit();
        let ctx = HandlerContext {
            node: Arc::clone(&node),
            parser: leaf.clone(),
            path: std::iter::once(root.name().to_string())
                .chain(path)
                .collect(),
        };
        info!(command = %invocation, "invoking handler");
        let task = tokio::spawn(dispatch.handler.call(args, ctx));

        match tokio::time::timeout(limit, task).await {
            Ok(Ok(Ok(()))) => {
                debug!(command = %invocation, "handler completed");
                Ok(Outcome::Completed)
            }
            Ok(Ok(Err(err))) => self.fail(err, &leaf, &invocation, node),
            Ok(Err(join)) => {
                let err = if join.is_panic() {
                    anyhow::anyhow!("handler panicked")
                } else {
                    anyhow::anyhow!("handler was cancelled")
                };
                self.fail(err, &leaf, &invocation, node)
            }
            Err(_elapsed) => {
                warn!(command = %invocation, ?limit, "handler timed out; leaving it detached");
                report::write_timeout(&mut *self.stderr, &invocation, limit)?;
                Ok(Outcome::TimedOut {
                    limit,
                    command: invocation,
                })
            }
        }
    }

    fn fail(
        &mut self,
        err: anyhow::Error,
        leaf: &clap::Command,
        command: &str,
        node: Arc<crate::node::Command>,
    ) -> Result<Outcome, RunError> {
        let status = report::classify(&err);
        if status == ExitStatus::Unexpected {
            error!(command, error = %format!("{err:#}"), "handler failed unexpectedly");
        } else {
            debug!(command, ?status, "handler failed");
        }

        report::write_failure(
            &mut *self.stderr,
            status,
            &err,
            leaf,
            command,
            &self.config.bug_report_url,
        )?;
        self.stderr.flush()?;

        Ok(Outcome::Failed(HandlerFailure {
            status,
            command: command.to_string(),
            node,
            error: err,
        }))
    }

    /// Run and terminate the process with the outcome's exit code.
    ///
    /// Tree wiring errors are printed and exit with
    /// [`COMPILE_FAILURE_EXIT_CODE`].
    pub async fn run_and_exit(self, root: impl Into<Node>) -> ! {
        let code = match self.run(root).await {
            Ok(outcome) => outcome.exit_code(),
            Err(err) => {
                error!(error = %err, "run aborted");
                eprintln!("error: {err}");
                COMPILE_FAILURE_EXIT_CODE
            }
        };
        std::process::exit(code)
    }
}

/// Run `root` against the process arguments with `config`.
pub async fn run(root: impl Into<Node>, config: RunnerConfig) -> Result<Outcome, RunError> {
    Runner::new(config).run(root).await
}

fn command_line(root: &str, path: &[String]) -> String {
    std::iter::once(root)
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
