//! State shared by every node kind.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use tracing::warn;

use super::{App, Category, Node, TreeError};
use crate::options::{Action, OptionRegistry, OptionSpec};
use crate::parser::{ArgSpec, ArgumentSink, Parser, ParserError, Switches};
use crate::plugin::Plugin;

/// Declarative configuration for a new node.
#[derive(Default, Clone)]
pub struct NodeConfig {
    pub description: Option<String>,
    pub version: Option<String>,
    pub epilog: Option<String>,
    pub options: Vec<(String, OptionSpec)>,
    pub option_groups: Vec<(String, Vec<(String, OptionSpec)>)>,
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn epilog(mut self, epilog: impl Into<String>) -> Self {
        self.epilog = Some(epilog.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.options.push((name.into(), spec));
        self
    }

    pub fn option_group<I, S>(mut self, title: impl Into<String>, specs: I) -> Self
    where
        I: IntoIterator<Item = (S, OptionSpec)>,
        S: Into<String>,
    {
        let specs = specs
            .into_iter()
            .map(|(name, spec)| (name.into(), spec))
            .collect();
        self.option_groups.push((title.into(), specs));
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }
}

impl fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConfig")
            .field("description", &self.description)
            .field("version", &self.version)
            .field("epilog", &self.epilog)
            .field("options", &self.options)
            .field("option_groups", &self.option_groups)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Non-owning link from a node to the branch that owns it.
#[derive(Clone)]
pub(crate) enum ParentLink {
    App(Weak<App>),
    Category(Weak<Category>),
}

impl ParentLink {
    fn upgrade(&self) -> Option<Node> {
        match self {
            ParentLink::App(app) => app.upgrade().map(Node::App),
            ParentLink::Category(category) => category.upgrade().map(Node::Category),
        }
    }
}

/// Identity and declared configuration of a node.
pub struct NodeBase {
    name: String,
    description: Option<String>,
    version: Option<String>,
    epilog: Option<String>,
    options: RwLock<OptionRegistry>,
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
    parent: OnceLock<ParentLink>,
}

impl NodeBase {
    pub(crate) fn new(name: &str, config: NodeConfig) -> Result<Self, TreeError> {
        validate_name(name)?;

        let base = Self {
            name: name.to_string(),
            description: config.description,
            version: config.version,
            epilog: config.epilog,
            options: RwLock::new(OptionRegistry::new()),
            plugins: RwLock::new(config.plugins),
            parent: OnceLock::new(),
        };
        for (option, spec) in config.options {
            base.add_option(&option, spec)?;
        }
        for (title, specs) in config.option_groups {
            base.add_option_group(&title, specs)?;
        }
        Ok(base)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn epilog(&self) -> Option<&str> {
        self.epilog.as_deref()
    }

    /// Snapshot of the declared options.
    pub fn options(&self) -> OptionRegistry {
        self.options.read().clone()
    }

    /// Snapshot of the attached plugins, in attachment order.
    pub fn plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.read().clone()
    }

    pub fn add_option(&self, name: &str, spec: OptionSpec) -> Result<(), TreeError> {
        if let Some(warning) = spec.lint(name) {
            warn!(node = %self.name, "{warning}");
        }
        self.options.write().add_option(name, spec)?;
        Ok(())
    }

    pub fn add_option_group(
        &self,
        title: &str,
        specs: Vec<(String, OptionSpec)>,
    ) -> Result<(), TreeError> {
        for (name, spec) in &specs {
            if let Some(warning) = spec.lint(name) {
                warn!(node = %self.name, group = title, "{warning}");
            }
        }
        self.options.write().add_group(title, specs)?;
        Ok(())
    }

    pub fn add_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.plugins.write().push(plugin);
    }

    /// The owning node, if attached and still alive.
    pub fn parent(&self) -> Option<Node> {
        self.parent.get().and_then(ParentLink::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.parent.get().is_some()
    }

    /// Set the parent link. `false` when a parent was already set.
    pub(crate) fn set_parent(&self, link: ParentLink) -> bool {
        self.parent.set(link).is_ok()
    }

    /// Register this node's option groups, then its ungrouped options.
    pub(crate) fn register_options(&self, parser: &mut Parser) -> Result<(), ParserError> {
        let registry = self.options();

        for group in registry.groups() {
            let mut sink = parser.add_argument_group(group.title());
            for (name, spec) in group.options() {
                let (switches, arg) = flag_argument(name, spec);
                sink.add_argument(switches, arg)?;
            }
        }
        for (name, spec) in registry.options() {
            let (switches, arg) = flag_argument(name, spec);
            parser.add_argument(switches, arg)?;
        }
        Ok(())
    }
}

impl fmt::Debug for NodeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBase")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

fn validate_name(name: &str) -> Result<(), TreeError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(TreeError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// `--name` plus `-alias` when one is declared.
pub(crate) fn flag_argument(name: &str, spec: &OptionSpec) -> (Switches, ArgSpec) {
    let mut switches = vec![format!("--{name}")];
    if let Some(alias) = &spec.alias {
        switches.push(format!("-{alias}"));
    }

    let arg = ArgSpec {
        action: spec.effective_action(),
        required: spec.required,
        nargs: spec.arity,
        ..common_spec(name, spec)
    };
    (Switches::Flags(switches), arg)
}

/// Positional parameter: optional unless required, unless it declares its
/// own arity.
pub(crate) fn param_argument(name: &str, spec: &OptionSpec) -> (Switches, ArgSpec) {
    let nargs = spec.arity.or(if spec.required {
        None
    } else {
        Some(crate::options::Arity::Optional)
    });

    let arg = ArgSpec {
        action: spec.action.unwrap_or(Action::Store),
        required: spec.required,
        nargs,
        ..common_spec(name, spec)
    };
    (Switches::Positional(name.to_string()), arg)
}

fn common_spec(name: &str, spec: &OptionSpec) -> ArgSpec {
    ArgSpec {
        value_type: spec.value_type,
        choices: spec.choices.clone(),
        default_value: spec.default_value.clone(),
        metavar: spec.metavar.clone(),
        help: spec.description.clone(),
        ..ArgSpec::new(spec.destination_for(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Arity;

    #[test]
    fn test_name_validation() {
        for good in ["db", "dry-run", "v2_migrate"] {
            assert!(validate_name(good).is_ok(), "{good}");
        }
        for bad in ["", "-db", "db migrate", "db.migrate"] {
            assert!(
                matches!(validate_name(bad), Err(TreeError::InvalidName { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_flag_argument_switches_and_action() {
        let (switches, arg) = flag_argument("dry-run", &OptionSpec::boolean().alias("n"));

        assert_eq!(
            switches,
            Switches::Flags(vec!["--dry-run".to_string(), "-n".to_string()])
        );
        assert_eq!(arg.dest, "dry_run");
        assert_eq!(arg.action, Action::StoreTrue);

        let (_, arg) = flag_argument("target", &OptionSpec::string());
        assert_eq!(arg.action, Action::Store);
        assert_eq!(arg.nargs, None);
    }

    #[test]
    fn test_param_argument_arity() {
        let (_, optional) = param_argument("a", &OptionSpec::string());
        let (_, required) = param_argument("b", &OptionSpec::string().required(true));
        let (_, declared) = param_argument("c", &OptionSpec::string().arity(Arity::Variadic));

        assert_eq!(optional.nargs, Some(Arity::Optional));
        assert_eq!(required.nargs, None);
        assert_eq!(declared.nargs, Some(Arity::Variadic));
    }

    #[test]
    fn test_config_options_are_registered() {
        let base = NodeBase::new(
            "db",
            NodeConfig::new()
                .option("host", OptionSpec::string().group("Connection"))
                .option_group("Connection", [("port", OptionSpec::integer())])
                .option("verbose", OptionSpec::boolean()),
        )
        .unwrap();

        let registry = base.options();
        assert_eq!(registry.group("Connection").unwrap().names(), vec!["host", "port"]);
        assert!(registry.contains("verbose"));
    }

    #[test]
    fn test_duplicate_group_is_rejected() {
        let base = NodeBase::new("db", NodeConfig::new()).unwrap();
        base.add_option_group("Connection", Vec::new()).unwrap();

        let err = base.add_option_group("Connection", Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            TreeError::Option(crate::options::OptionError::DuplicateGroup { .. })
        ));
    }
}
