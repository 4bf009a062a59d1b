//! Small database-flavoured CLI built on `structured_cli`.
//!
//! ```text
//! tool [--verbose] db migrate [--dry-run] [--target <name>]
//! tool db rollback <steps>
//! tool db seed
//! tool debug crash
//! tool debug hang
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use structured_cli::logging::Logging;
use structured_cli::{
    App, Category, CliError, Command, HandlerContext, HandlerHookContext, NodeConfig, OptionSpec,
    ParsedArgs, Plugin, Runner, RunnerConfig, TreeError, TreeNode,
};
use tracing::warn;

/// Overrides `handler_timeout_seconds` from the config file.
const TIMEOUT_ENV_VAR: &str = "TOOL_TIMEOUT_SECONDS";

/// Prints the command about to run when `--verbose` is set.
struct Announce;

#[async_trait]
impl Plugin for Announce {
    fn name(&self) -> &str {
        "announce"
    }

    async fn on_before_handler(&self, ctx: &HandlerHookContext<'_>) -> anyhow::Result<()> {
        if ctx.args.get_bool("verbose") == Some(true) {
            eprintln!("running {}", ctx.node.name());
        }
        Ok(())
    }
}

async fn migrate(args: ParsedArgs, _ctx: HandlerContext) -> anyhow::Result<()> {
    let target = args.get_str("target").unwrap_or("latest");
    if args.get_bool("dry_run") == Some(true) {
        println!("Would migrate to {target} (dry run)");
    } else {
        println!("Migrated to {target}");
    }
    Ok(())
}

async fn rollback(args: ParsedArgs, _ctx: HandlerContext) -> anyhow::Result<()> {
    let steps = args.get_i64("steps").unwrap_or(0);
    if steps <= 0 {
        return Err(CliError::invalid(format!("steps must be positive, got {steps}")).into());
    }
    println!("Rolled back {steps} migration(s)");
    Ok(())
}

async fn seed(_args: ParsedArgs, _ctx: HandlerContext) -> anyhow::Result<()> {
    Err(CliError::hint("did you mean `tool db migrate --dry-run`? Seeding needs a migrated schema").into())
}

async fn crash(_args: ParsedArgs, _ctx: HandlerContext) -> anyhow::Result<()> {
    anyhow::bail!("connection pool poisoned")
}

async fn hang(_args: ParsedArgs, _ctx: HandlerContext) -> anyhow::Result<()> {
    std::future::pending::<()>().await;
    Ok(())
}

fn build_app() -> Result<Arc<App>, TreeError> {
    let app = App::new(
        "tool",
        NodeConfig::new()
            .description("Manage the application database.")
            .version(env!("CARGO_PKG_VERSION"))
            .epilog("Set STRUCTURED_CLI_LOG to a file path to write debug logs.")
            .option(
                "verbose",
                OptionSpec::boolean()
                    .alias("v")
                    .description("Print the command before running it"),
            ),
    )?;

    let db = Category::new("db", NodeConfig::new().description("Schema and data tasks"))?;
    db.add_child(Command::with_config(
        "migrate",
        NodeConfig::new()
            .description("Apply pending migrations")
            .option(
                "dry-run",
                OptionSpec::boolean()
                    .alias("n")
                    .description("Show what would change without applying it"),
            )
            .option(
                "target",
                OptionSpec::string()
                    .metavar("NAME")
                    .description("Migration to stop at"),
            )
            .plugin(Announce),
        migrate,
    )?)?;

    let undo = Command::with_config(
        "rollback",
        NodeConfig::new()
            .description("Undo the most recent migrations")
            .plugin(Announce),
        rollback,
    )?;
    undo.add_param(
        "steps",
        OptionSpec::integer()
            .required(true)
            .description("How many migrations to undo"),
    )?;
    db.add_child(undo)?;

    db.add_child(Command::with_config(
        "seed",
        NodeConfig::new().description("Load fixture data"),
        seed,
    )?)?;
    app.add_child(db)?;

    let debug = Category::new("debug", NodeConfig::new().description("Diagnostics"))?;
    debug.add_child(Command::with_config(
        "crash",
        NodeConfig::new().description("Fail with an unexpected error"),
        crash,
    )?)?;
    debug.add_child(Command::with_config(
        "hang",
        NodeConfig::new().description("Never finish"),
        hang,
    )?)?;
    app.add_child(debug)?;

    Ok(app)
}

fn load_config() -> RunnerConfig {
    let mut config = RunnerConfig::discover("tool").unwrap_or_else(|e| {
        eprintln!("Warning: {e}; using defaults");
        RunnerConfig::default()
    });

    if let Ok(value) = std::env::var(TIMEOUT_ENV_VAR) {
        match value.parse::<u64>() {
            Ok(seconds) if seconds > 0 => config.handler_timeout_seconds = seconds,
            _ => warn!(%value, "ignoring invalid {TIMEOUT_ENV_VAR}"),
        }
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Logging::default().default_filter("info,structured_cli=debug").init();

    let app = build_app()?;
    Runner::new(load_config()).run_and_exit(app).await
}
