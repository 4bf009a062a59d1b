//! The command tree: apps, categories and commands.
//!
//! A tree is built bottom-up from [`App`], [`Category`] and [`Command`] nodes
//! and compiled top-down into a [`Parser`] tree by [`Node::configure`]:
//!
//! ```text
//! App "tool"                 tool [--verbose]
//! └── Category "db"    →     └── db                  (tool_command = "db")
//!     ├── Command "migrate"      ├── migrate [--dry-run]   (db_command = "migrate")
//!     └── Command "rollback"     └── rollback <steps>
//! ```
//!
//! Children hold a weak link to their parent, set once when attached.

mod app;
mod base;
mod category;
mod command;
mod error;

pub use app::App;
pub use base::{NodeBase, NodeConfig};
pub use category::Category;
pub use command::Command;
pub use error::{ConfigureError, TreeError};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::options::OptionSpec;
use crate::parser::{HelpFormatter, Parser, ParserOptions};
use crate::plugin::Plugin;

/// Boxed compile future, so categories can recurse into their children.
pub type ConfigureFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ConfigureError>> + Send + 'a>>;

/// Behavior shared by every node kind.
pub trait TreeNode {
    fn base(&self) -> &NodeBase;

    fn name(&self) -> &str {
        self.base().name()
    }

    fn description(&self) -> Option<&str> {
        self.base().description()
    }

    /// Declare a flag. A spec with a `group` is listed under that group.
    fn add_option(&self, name: &str, spec: OptionSpec) -> Result<(), TreeError> {
        self.base().add_option(name, spec)
    }

    fn add_option_group(
        &self,
        title: &str,
        specs: Vec<(String, OptionSpec)>,
    ) -> Result<(), TreeError> {
        self.base().add_option_group(title, specs)
    }

    fn add_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.base().add_plugin(plugin)
    }

    fn parent(&self) -> Option<Node> {
        self.base().parent()
    }
}

/// Any node of the tree.
#[derive(Debug, Clone)]
pub enum Node {
    App(Arc<App>),
    Category(Arc<Category>),
    Command(Arc<Command>),
}

impl Node {
    /// Compile this node onto `parser`.
    pub fn configure<'a>(&'a self, parser: &'a mut Parser) -> ConfigureFuture<'a> {
        match self {
            Node::App(app) => Box::pin(app.configure(parser)),
            Node::Category(category) => Box::pin(category.configure(parser)),
            Node::Command(command) => Box::pin(command.configure(parser)),
        }
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::App(a), Node::App(b)) => Arc::ptr_eq(a, b),
            (Node::Category(a), Node::Category(b)) => Arc::ptr_eq(a, b),
            (Node::Command(a), Node::Command(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Children in declaration order; empty for commands.
    pub fn children(&self) -> Vec<Node> {
        match self {
            Node::App(app) => app.children(),
            Node::Category(category) => category.children(),
            Node::Command(_) => Vec::new(),
        }
    }

    pub fn as_command(&self) -> Option<&Arc<Command>> {
        match self {
            Node::Command(command) => Some(command),
            _ => None,
        }
    }

    /// Options for a root parser compiled from this node.
    pub fn parser_options(&self, formatter: HelpFormatter) -> ParserOptions {
        match self {
            Node::App(app) => app.parser_options(formatter),
            _ => {
                let base = self.base();
                ParserOptions {
                    name: base.name().to_string(),
                    description: base.description().map(str::to_string),
                    epilog: base.epilog().map(str::to_string),
                    version: base.version().map(str::to_string),
                    formatter,
                }
            }
        }
    }
}

impl TreeNode for Node {
    fn base(&self) -> &NodeBase {
        match self {
            Node::App(app) => app.base(),
            Node::Category(category) => category.base(),
            Node::Command(command) => command.base(),
        }
    }
}

impl From<Arc<App>> for Node {
    fn from(app: Arc<App>) -> Self {
        Node::App(app)
    }
}

impl From<Arc<Category>> for Node {
    fn from(category: Arc<Category>) -> Self {
        Node::Category(category)
    }
}

impl From<Arc<Command>> for Node {
    fn from(command: Arc<Command>) -> Self {
        Node::Command(command)
    }
}
