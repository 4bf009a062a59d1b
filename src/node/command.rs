//! Leaf nodes bound to a handler.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::base::{param_argument, NodeBase, NodeConfig};
use super::{ConfigureError, Node, TreeError, TreeNode};
use crate::handler::{Handler, HandlerContext};
use crate::options::{OptionError, OptionSpec};
use crate::parser::{ArgumentSink, Dispatch, ParsedArgs, Parser};
use crate::plugin::{run_plugins, ConfigureContext, HookPayload};

/// A leaf action: options, ordered positional parameters and a handler.
pub struct Command {
    base: NodeBase,
    params: RwLock<Vec<(String, OptionSpec)>>,
    handler: Arc<dyn Handler>,
}

impl Command {
    pub fn new<F, Fut>(name: &str, handler: F) -> Result<Arc<Self>, TreeError>
    where
        F: Fn(ParsedArgs, HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::with_config(name, NodeConfig::new(), handler)
    }

    pub fn with_config<F, Fut>(
        name: &str,
        config: NodeConfig,
        handler: F,
    ) -> Result<Arc<Self>, TreeError>
    where
        F: Fn(ParsedArgs, HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_handler(name, config, Arc::new(handler))
    }

    /// Build from a prepared [`Handler`], e.g. a type implementing it directly.
    pub fn from_handler(
        name: &str,
        config: NodeConfig,
        handler: Arc<dyn Handler>,
    ) -> Result<Arc<Self>, TreeError> {
        Ok(Arc::new(Self {
            base: NodeBase::new(name, config)?,
            params: RwLock::new(Vec::new()),
            handler,
        }))
    }

    /// Declare a positional parameter. Parameters are matched in the order
    /// they are declared.
    pub fn add_param(&self, name: &str, spec: OptionSpec) -> Result<(), TreeError> {
        if name.is_empty() {
            return Err(OptionError::EmptyName.into());
        }
        if let Some(warning) = spec.lint(name) {
            warn!(command = self.base.name(), "{warning}");
        }

        let mut params = self.params.write();
        if params.iter().any(|(existing, _)| existing == name) {
            return Err(OptionError::DuplicateParam {
                name: name.to_string(),
            }
            .into());
        }
        params.push((name.to_string(), spec));
        Ok(())
    }

    /// Chaining form of [`Command::add_param`].
    pub fn param(self: Arc<Self>, name: &str, spec: OptionSpec) -> Result<Arc<Self>, TreeError> {
        self.add_param(name, spec)?;
        Ok(self)
    }

    /// Snapshot of the declared parameters, in order.
    pub fn params(&self) -> Vec<(String, OptionSpec)> {
        self.params.read().clone()
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Register this command's groups, options and parameters on `parser`
    /// and bind the handler to it. Plugins run on every call.
    pub async fn configure(self: &Arc<Self>, parser: &mut Parser) -> Result<(), ConfigureError> {
        debug!(command = self.base.name(), "configuring command");

        let node = Node::Command(Arc::clone(self));
        run_plugins(
            &self.base.plugins(),
            HookPayload::BeforeConfigure(ConfigureContext {
                node: &node,
                parser: &mut *parser,
            }),
        )
        .await?;

        self.base.register_options(parser)?;
        for (name, spec) in self.params() {
            let (switches, arg) = param_argument(&name, &spec);
            parser.add_argument(switches, arg)?;
        }

        parser.set_defaults(Dispatch {
            handler: Arc::clone(&self.handler),
            node: Arc::clone(self),
        });
        Ok(())
    }
}

impl TreeNode for Command {
    fn base(&self) -> &NodeBase {
        &self.base
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.base.name())
            .field("params", &*self.params.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Arity, ValueType};
    use crate::parser::{ParserOptions, Switches};

    fn noop(name: &str) -> Arc<Command> {
        Command::new(name, |_args, _ctx| async { anyhow::Ok(()) }).unwrap()
    }

    fn parser(name: &str) -> Parser {
        Parser::new(ParserOptions {
            name: name.to_string(),
            ..ParserOptions::default()
        })
    }

    #[tokio::test]
    async fn test_params_keep_declaration_order_and_arity() {
        let command = noop("copy")
            .param("a", OptionSpec::string())
            .unwrap()
            .param("b", OptionSpec::string().required(true))
            .unwrap();

        let mut p = parser("copy");
        command.configure(&mut p).await.unwrap();

        let positionals: Vec<(&str, Option<Arity>)> = p
            .arguments()
            .iter()
            .filter_map(|argument| match &argument.switches {
                Switches::Positional(name) => Some((name.as_str(), argument.spec.nargs)),
                Switches::Flags(_) => None,
            })
            .collect();
        assert_eq!(positionals, vec![("a", Some(Arity::Optional)), ("b", None)]);
    }

    #[test]
    fn test_duplicate_param_is_rejected() {
        let command = noop("copy");
        command.add_param("src", OptionSpec::string()).unwrap();

        let err = command.add_param("src", OptionSpec::string()).unwrap_err();
        assert_eq!(
            err,
            TreeError::Option(OptionError::DuplicateParam { name: "src".into() })
        );
    }

    #[tokio::test]
    async fn test_groups_register_before_ungrouped_options() {
        let command = Command::with_config(
            "migrate",
            NodeConfig::new()
                .option("dry-run", OptionSpec::boolean().alias("n"))
                .option_group("Target", [("target", OptionSpec::string())]),
            |_args, _ctx| async { anyhow::Ok(()) },
        )
        .unwrap();

        let mut p = parser("migrate");
        command.configure(&mut p).await.unwrap();

        let dests: Vec<&str> = p.arguments().iter().map(|a| a.spec.dest.as_str()).collect();
        assert_eq!(dests, vec!["target", "dry_run"]);
        assert_eq!(p.groups(), ["Target".to_string()].as_slice());
        assert_eq!(p.argument("target").unwrap().group.as_deref(), Some("Target"));
        assert_eq!(
            p.argument("dry_run").unwrap().spec.value_type,
            ValueType::Boolean
        );
    }

    #[tokio::test]
    async fn test_configure_binds_dispatch() {
        let command = noop("migrate");
        let mut p = parser("migrate");
        command.configure(&mut p).await.unwrap();

        let dispatch = p.defaults().expect("dispatch bound");
        assert!(Arc::ptr_eq(&dispatch.node, &command));
        assert_eq!(p.endpoints(), vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_boolean_flag_parses_true() {
        let command = Command::with_config(
            "migrate",
            NodeConfig::new().option("dry-run", OptionSpec::boolean()),
            |_args, _ctx| async { anyhow::Ok(()) },
        )
        .unwrap();

        let mut p = parser("migrate");
        command.configure(&mut p).await.unwrap();

        let args = p.parse_args(["migrate", "--dry-run"]).unwrap();
        assert_eq!(args.get_bool("dry_run"), Some(true));
        let args = p.parse_args(["migrate"]).unwrap();
        assert_eq!(args.get_bool("dry_run"), Some(false));
    }
}
