//! Sequential hook runner.

use std::sync::Arc;

use tracing::debug;

use super::{ConfigureContext, HandlerHookContext, HookError, HookEvent, Plugin};

/// Event plus its payload.
pub enum HookPayload<'a> {
    BeforeConfigure(ConfigureContext<'a>),
    BeforeHandler(HandlerHookContext<'a>),
}

impl HookPayload<'_> {
    pub fn event(&self) -> HookEvent {
        match self {
            HookPayload::BeforeConfigure(_) => HookEvent::BeforeConfigure,
            HookPayload::BeforeHandler(_) => HookEvent::BeforeHandler,
        }
    }
}

/// Invoke every plugin's callback for the payload's event, in attachment
/// order, awaiting each before starting the next. The first failure skips
/// the remaining plugins and is returned.
pub async fn run_plugins(
    plugins: &[Arc<dyn Plugin>],
    mut payload: HookPayload<'_>,
) -> Result<(), HookError> {
    let event = payload.event();

    for plugin in plugins {
        debug!(plugin = plugin.name(), %event, "running plugin hook");

        let result = match &mut payload {
            HookPayload::BeforeConfigure(ctx) => plugin.on_before_configure(ctx).await,
            HookPayload::BeforeHandler(ctx) => plugin.on_before_handler(ctx).await,
        };

        result.map_err(|source| HookError {
            plugin: plugin.name().to_string(),
            event,
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Category, Node, NodeConfig, TreeNode};
    use crate::parser::{ArgSpec, ArgumentSink, Parser, ParserOptions, Switches};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Plugin for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn on_before_configure(&self, ctx: &mut ConfigureContext<'_>) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            self.log.lock().push(format!("{}:{}", self.name, ctx.node.name()));
            if self.fail {
                anyhow::bail!("{} refused", self.name);
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<dyn Plugin> {
        Arc::new(Recorder {
            name,
            log: Arc::clone(log),
            fail,
        })
    }

    fn node() -> Node {
        Category::new("db", NodeConfig::new()).unwrap().into()
    }

    #[tokio::test]
    async fn test_plugins_run_in_attachment_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plugins = vec![recorder("p1", &log, false), recorder("p2", &log, false)];
        let node = node();
        let mut parser = Parser::new(ParserOptions::default());

        run_plugins(
            &plugins,
            HookPayload::BeforeConfigure(ConfigureContext {
                node: &node,
                parser: &mut parser,
            }),
        )
        .await
        .unwrap();

        assert_eq!(*log.lock(), vec!["p1:db", "p2:db"]);
    }

    #[tokio::test]
    async fn test_failure_skips_remaining_plugins() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plugins = vec![
            recorder("p1", &log, true),
            recorder("p2", &log, false),
        ];
        let node = node();
        let mut parser = Parser::new(ParserOptions::default());

        let err = run_plugins(
            &plugins,
            HookPayload::BeforeConfigure(ConfigureContext {
                node: &node,
                parser: &mut parser,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.plugin, "p1");
        assert_eq!(err.event, HookEvent::BeforeConfigure);
        assert_eq!(*log.lock(), vec!["p1:db"]);
    }

    struct AddsFlag;

    #[async_trait]
    impl Plugin for AddsFlag {
        fn name(&self) -> &str {
            "adds-flag"
        }

        async fn on_before_configure(&self, ctx: &mut ConfigureContext<'_>) -> anyhow::Result<()> {
            ctx.parser.add_argument(
                Switches::Flags(vec!["--trace-id".into()]),
                ArgSpec::new("trace_id"),
            )?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_plugin_can_mutate_parser() {
        let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(AddsFlag)];
        let node = node();
        let mut parser = Parser::new(ParserOptions::default());

        run_plugins(
            &plugins,
            HookPayload::BeforeConfigure(ConfigureContext {
                node: &node,
                parser: &mut parser,
            }),
        )
        .await
        .unwrap();

        assert!(parser.argument("trace_id").is_some());
    }
}
