//! End-to-end runs of a small command tree through the library API.

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::SpyBuffer;
use structured_cli::parser::{ArgSpec, ArgumentSink, Switches};
use structured_cli::plugin::{ConfigureContext, Plugin};
use structured_cli::{
    App, Category, CliError, Command, ExitStatus, NodeConfig, OptionSpec, Outcome, ParsedArgs,
    Runner, RunnerConfig,
};

const BUG_URL: &str = "https://bugs.example.test/tool";

fn config() -> RunnerConfig {
    RunnerConfig {
        bug_report_url: BUG_URL.to_string(),
        help_width: Some(80),
        ..RunnerConfig::default()
    }
}

/// `tool db migrate [--dry-run]` with the given migrate handler.
fn tool_with(migrate: Arc<Command>) -> Arc<App> {
    let app = App::new("tool", NodeConfig::new().version("0.1.0")).unwrap();
    let db = Category::new("db", NodeConfig::new()).unwrap();
    db.add_child(migrate).unwrap();
    app.add_child(db).unwrap();
    app
}

fn dry_run_flag() -> NodeConfig {
    NodeConfig::new().option("dry-run", OptionSpec::boolean())
}

async fn run(app: Arc<App>, stderr: &SpyBuffer) -> Outcome {
    Runner::new(config())
        .argv(["tool", "db", "migrate", "--dry-run"])
        .stderr(stderr.clone())
        .run(app)
        .await
        .expect("tree compiles")
}

#[tokio::test]
async fn test_dry_run_resolves_migrate_handler() {
    let seen: Arc<Mutex<Option<ParsedArgs>>> = Arc::new(Mutex::new(None));
    let record = Arc::clone(&seen);
    let migrate = Command::with_config("migrate", dry_run_flag(), move |args, _ctx| {
        let record = Arc::clone(&record);
        async move {
            *record.lock().unwrap() = Some(args);
            anyhow::Ok(())
        }
    })
    .unwrap();
    let stderr = SpyBuffer::new();

    let outcome = run(tool_with(migrate), &stderr).await;

    assert!(matches!(outcome, Outcome::Completed));
    assert_eq!(outcome.exit_code(), 0);
    let args = seen.lock().unwrap().take().expect("handler ran");
    assert_eq!(args.get_bool("dry_run"), Some(true));
    assert_eq!(args.get_str("tool_command"), Some("db"));
    assert_eq!(args.get_str("db_command"), Some("migrate"));
    assert!(stderr.contents().is_empty());
}

#[tokio::test]
async fn test_invalid_exits_two_without_stack_trace() {
    let migrate = Command::with_config("migrate", dry_run_flag(), |_args, _ctx| async {
        Err::<(), _>(anyhow::Error::new(CliError::invalid("bad flag")))
    })
    .unwrap();
    let stderr = SpyBuffer::new();

    let outcome = run(tool_with(migrate), &stderr).await;

    assert_eq!(outcome.exit_code(), 2);
    let text = stderr.contents();
    assert!(text.contains("bad flag"), "{text}");
    assert!(!text.contains("Stack trace"), "{text}");
}

#[tokio::test]
async fn test_hint_exits_three_with_message() {
    let migrate = Command::with_config("migrate", dry_run_flag(), |_args, _ctx| async {
        Err::<(), _>(anyhow::Error::new(CliError::hint("did you mean --dry-run?")))
    })
    .unwrap();
    let stderr = SpyBuffer::new();

    let outcome = run(tool_with(migrate), &stderr).await;

    assert_eq!(outcome.exit_code(), 3);
    assert_eq!(stderr.contents(), "did you mean --dry-run?\n");
}

#[tokio::test]
async fn test_never_resolving_handler_times_out() {
    let migrate = Command::with_config("migrate", dry_run_flag(), |_args, _ctx| async {
        std::future::pending::<()>().await;
        anyhow::Ok(())
    })
    .unwrap();
    let stderr = SpyBuffer::new();

    let started = Instant::now();
    let outcome = Runner::new(config())
        .handler_timeout(Duration::from_secs(1))
        .argv(["tool", "db", "migrate"])
        .stderr(stderr.clone())
        .run(tool_with(migrate))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(matches!(
        &outcome,
        Outcome::TimedOut { limit, command }
        if *limit == Duration::from_secs(1) && command == "tool db migrate"
    ));
    assert_eq!(outcome.exit_code(), 1);
    assert!(stderr.contents().contains("timed out"));
}

#[tokio::test]
async fn test_unclassified_error_exits_four_with_trace_and_url() {
    let migrate = Command::with_config("migrate", dry_run_flag(), |_args, _ctx| async {
        Err::<(), _>(anyhow::anyhow!("connection reset"))
    })
    .unwrap();
    let stderr = SpyBuffer::new();

    let outcome = run(tool_with(migrate), &stderr).await;

    assert_eq!(outcome.exit_code(), 4);
    match &outcome {
        Outcome::Failed(failure) => {
            assert_eq!(failure.status, ExitStatus::Unexpected);
            assert_eq!(failure.command, "tool db migrate");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let text = stderr.contents();
    assert!(text.contains("connection reset"), "{text}");
    assert!(text.contains("Stack trace:"), "{text}");
    assert!(
        text.contains("structured_cli::") || text.contains("run_scenarios::"),
        "{text}"
    );
    assert!(text.contains(BUG_URL), "{text}");
}

#[tokio::test]
async fn test_server_error_prints_frames_without_backtrace_env() {
    let migrate = Command::with_config("migrate", dry_run_flag(), |_args, _ctx| async {
        Err::<(), _>(anyhow::Error::new(CliError::server_error("upstream down")))
    })
    .unwrap();
    let stderr = SpyBuffer::new();

    let outcome = run(tool_with(migrate), &stderr).await;

    assert_eq!(outcome.exit_code(), 4);
    let text = stderr.contents();
    assert!(text.contains("[E_SERVERERROR]"), "{text}");
    // The trace starts where the handler built the error.
    assert!(text.contains("run_scenarios::"), "{text}");
    assert!(!text.contains("<unavailable"), "{text}");
}

#[tokio::test]
async fn test_same_tree_runs_twice() {
    let migrate = Command::with_config("migrate", dry_run_flag(), |_args, _ctx| async {
        anyhow::Ok(())
    })
    .unwrap();
    let app = tool_with(migrate);

    for _ in 0..2 {
        let outcome = run(Arc::clone(&app), &SpyBuffer::new()).await;
        assert_eq!(outcome.exit_code(), 0);
    }
}

#[tokio::test]
async fn test_params_arrive_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let copy = Command::new("copy", move |args: ParsedArgs, _ctx| {
        let record = Arc::clone(&record);
        async move {
            let mut record = record.lock().unwrap();
            record.push(args.get_str("src").map(str::to_string));
            record.push(args.get_str("dest").map(str::to_string));
            anyhow::Ok(())
        }
    })
    .unwrap()
    .param("src", OptionSpec::string().required(true))
    .unwrap()
    .param("dest", OptionSpec::string())
    .unwrap();

    let outcome = Runner::new(config())
        .argv(["copy", "a.txt"])
        .stderr(SpyBuffer::new())
        .run(copy)
        .await
        .unwrap();

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(*seen.lock().unwrap(), vec![Some("a.txt".to_string()), None]);
}

#[tokio::test]
async fn test_one_letter_option_and_one_letter_alias_do_not_clash() {
    let seen = Arc::new(Mutex::new(None));
    let record = Arc::clone(&seen);
    let go = Command::with_config(
        "go",
        NodeConfig::new()
            .option("v", OptionSpec::boolean())
            .option("verbose", OptionSpec::boolean().alias("v")),
        move |args: ParsedArgs, _ctx| {
            let record = Arc::clone(&record);
            async move {
                *record.lock().unwrap() = Some((args.get_bool("v"), args.get_bool("verbose")));
                anyhow::Ok(())
            }
        },
    )
    .unwrap();

    let outcome = Runner::new(config())
        .argv(["go", "--v"])
        .stderr(SpyBuffer::new())
        .run(go)
        .await
        .unwrap();

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(*seen.lock().unwrap(), Some((Some(true), Some(false))));
}

/// Adds `--trace-id` to whatever node it is attached to.
struct TraceId;

#[async_trait]
impl Plugin for TraceId {
    fn name(&self) -> &str {
        "trace-id"
    }

    async fn on_before_configure(&self, ctx: &mut ConfigureContext<'_>) -> anyhow::Result<()> {
        ctx.parser.add_argument(
            Switches::Flags(vec!["--trace-id".to_string()]),
            ArgSpec::new("trace_id"),
        )?;
        Ok(())
    }
}

#[tokio::test]
async fn test_category_plugin_arguments_survive_a_second_run() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let migrate = Command::new("migrate", move |args: ParsedArgs, _ctx| {
        let record = Arc::clone(&record);
        async move {
            record.lock().unwrap().push(args.get_str("trace_id").map(str::to_string));
            anyhow::Ok(())
        }
    })
    .unwrap();
    let app = App::new("tool", NodeConfig::new()).unwrap();
    let db = Category::new("db", NodeConfig::new().plugin(TraceId)).unwrap();
    db.add_child(migrate).unwrap();
    app.add_child(db).unwrap();

    for _ in 0..2 {
        let stderr = SpyBuffer::new();
        let outcome = Runner::new(config())
            .argv(["tool", "db", "--trace-id", "x", "migrate"])
            .stderr(stderr.clone())
            .run(Arc::clone(&app))
            .await
            .unwrap();
        assert_eq!(outcome.exit_code(), 0, "{}", stderr.contents());
    }

    assert_eq!(*seen.lock().unwrap(), vec![Some("x".to_string()); 2]);
}
