//! Declarative command-line applications.
//!
//! Describe a tree of [`App`], [`Category`] and [`Command`] nodes; the
//! [`Runner`] compiles it into a clap parser, dispatches to the matched
//! command's handler and maps the result to an exit code.
//!
//! ```no_run
//! use std::sync::Arc;
//! use structured_cli::{App, Category, CliError, Command, NodeConfig, OptionSpec, Runner, RunnerConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let app = App::new("tool", NodeConfig::new().version("0.1.0"))?;
//! let db = Category::new("db", NodeConfig::new().description("Database tasks"))?;
//! db.add_child(Command::with_config(
//!     "migrate",
//!     NodeConfig::new().option("dry-run", OptionSpec::boolean().alias("n")),
//!     |args, _ctx| async move {
//!         if args.get_bool("dry_run") == Some(true) {
//!             return Err(anyhow::Error::new(CliError::hint("nothing applied in dry-run mode")));
//!         }
//!         Ok(())
//!     },
//! )?)?;
//! app.add_child(Arc::clone(&db))?;
//!
//! Runner::new(RunnerConfig::default()).run_and_exit(app).await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod node;
pub mod options;
pub mod parser;
pub mod plugin;
pub mod runner;

pub use config::{ConfigError, RunnerConfig};
pub use error::{CliError, ErrorKind};
pub use handler::{Handler, HandlerContext, HandlerFuture};
pub use node::{App, Category, Command, ConfigureError, Node, NodeConfig, TreeError, TreeNode};
pub use options::{Action, Arity, OptionSpec, ValueType};
pub use parser::{HelpFormatter, ParsedArgs, Parser};
pub use plugin::{ConfigureContext, HandlerHookContext, HookError, HookEvent, Plugin};
pub use runner::{run, ExitStatus, HandlerFailure, Outcome, RunError, Runner};
