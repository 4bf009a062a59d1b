use std::sync::Arc;

use tracing::debug;

use super::base::{NodeBase, NodeConfig, ParentLink};
use super::category::Branch;
use super::{ConfigureError, Node, TreeError, TreeNode};
use crate::parser::{HelpFormatter, Parser, ParserOptions};

/// Root of a command tree. Compiles exactly like a [`super::Category`]; its
/// version and epilog also describe the root parser.
pub struct App {
    base: NodeBase,
    branch: Branch,
}

impl App {
    pub fn new(name: &str, config: NodeConfig) -> Result<Arc<Self>, TreeError> {
        Ok(Arc::new(Self {
            base: NodeBase::new(name, config)?,
            branch: Branch::default(),
        }))
    }

    pub fn add_child(self: &Arc<Self>, child: impl Into<Node>) -> Result<(), TreeError> {
        let owner = Node::App(Arc::clone(self));
        self.branch
            .attach(&owner, ParentLink::App(Arc::downgrade(self)), child.into())
    }

    pub fn children(&self) -> Vec<Node> {
        self.branch.children()
    }

    pub fn child(&self, name: &str) -> Option<Node> {
        self.branch.child(name)
    }

    pub fn version(&self) -> Option<&str> {
        self.base.version()
    }

    /// Options for the root parser built from this app.
    pub fn parser_options(&self, formatter: HelpFormatter) -> ParserOptions {
        ParserOptions {
            name: self.base.name().to_string(),
            description: self.base.description().map(str::to_string),
            epilog: self.base.epilog().map(str::to_string),
            version: self.base.version().map(str::to_string),
            formatter,
        }
    }

    pub async fn configure(self: &Arc<Self>, parser: &mut Parser) -> Result<(), ConfigureError> {
        debug!(app = self.base.name(), "configuring app");
        let node = Node::App(Arc::clone(self));
        self.branch.configure(&node, parser).await
    }
}

impl TreeNode for App {
    fn base(&self) -> &NodeBase {
        &self.base
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.base.name())
            .field("version", &self.base.version())
            .field("children", &self.children())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Category, Command};

    #[tokio::test]
    async fn test_root_parser_carries_metadata() {
        let app = App::new(
            "tool",
            NodeConfig::new()
                .description("Database tool")
                .version("0.1.0")
                .epilog("See the manual for more."),
        )
        .unwrap();
        let db = Category::new("db", NodeConfig::new()).unwrap();
        db.add_child(Command::new("migrate", |_args, _ctx| async { anyhow::Ok(()) }).unwrap())
            .unwrap();
        app.add_child(Arc::clone(&db)).unwrap();

        let mut parser = Parser::new(app.parser_options(HelpFormatter::default()));
        app.configure(&mut parser).await.unwrap();

        let command = parser.build().unwrap();
        assert_eq!(command.get_version(), Some("0.1.0"));
        assert_eq!(parser.subparsers().unwrap().dest(), "tool_command");

        let args = parser.parse_args(["tool", "db", "migrate"]).unwrap();
        assert_eq!(args.get_str("tool_command"), Some("db"));
        assert_eq!(args.get_str("db_command"), Some("migrate"));
    }
}
