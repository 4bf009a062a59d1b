//! Branch nodes: ordered children compiled into subcommands.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::debug;

use super::base::{NodeBase, NodeConfig, ParentLink};
use super::{ConfigureError, Node, TreeError, TreeNode};
use crate::options::default_destination;
use crate::parser::{Parser, ParserChanges, SubparserOptions};
use crate::plugin::{run_plugins, ConfigureContext, HookError, HookPayload};

/// Children and compile state shared by [`Category`] and [`super::App`].
#[derive(Default)]
pub(crate) struct Branch {
    children: RwLock<Vec<Node>>,
    /// Outcome of the `on_before_configure` hook, computed on first compile,
    /// with whatever the plugins registered on the parser.
    configured: OnceCell<Result<ParserChanges, Arc<HookError>>>,
}

impl Branch {
    pub(crate) fn children(&self) -> Vec<Node> {
        self.children.read().clone()
    }

    pub(crate) fn child(&self, name: &str) -> Option<Node> {
        self.children
            .read()
            .iter()
            .find(|child| child.name() == name)
            .cloned()
    }

    /// Attach `child` under `owner`, linking it back through `link`.
    pub(crate) fn attach(&self, owner: &Node, link: ParentLink, child: Node) -> Result<(), TreeError> {
        let mut ancestor = Some(owner.clone());
        while let Some(node) = ancestor {
            if node.ptr_eq(&child) {
                return Err(TreeError::Cycle {
                    parent: owner.name().to_string(),
                    child: child.name().to_string(),
                });
            }
            ancestor = node.parent();
        }

        let mut children = self.children.write();
        if children.iter().any(|existing| existing.name() == child.name()) {
            return Err(TreeError::DuplicateChild {
                parent: owner.name().to_string(),
                name: child.name().to_string(),
            });
        }
        if !child.base().set_parent(link) {
            let parent = child
                .parent()
                .map(|parent| parent.name().to_string())
                .unwrap_or_default();
            return Err(TreeError::AlreadyAttached {
                child: child.name().to_string(),
                parent,
            });
        }

        debug!(parent = owner.name(), child = child.name(), "attached node");
        children.push(child);
        Ok(())
    }

    /// Compile `node` (the owner of this branch) onto `parser`.
    pub(crate) async fn configure(&self, node: &Node, parser: &mut Parser) -> Result<(), ConfigureError> {
        let base = node.base();

        // Plugins run once per node. Later compiles get the arguments they
        // registered the first time replayed onto the new parser.
        let plugins = base.plugins();
        let mut ran_hook = false;
        let hook = {
            let ran_hook = &mut ran_hook;
            let hook_parser = &mut *parser;
            self.configured
                .get_or_init(|| async move {
                    *ran_hook = true;
                    let mark = hook_parser.checkpoint();
                    let outcome = run_plugins(
                        &plugins,
                        HookPayload::BeforeConfigure(ConfigureContext {
                            node,
                            parser: &mut *hook_parser,
                        }),
                    )
                    .await;
                    match outcome {
                        Ok(()) => Ok(hook_parser.changes_since(mark)),
                        Err(err) => Err(Arc::new(err)),
                    }
                })
                .await
        };
        let changes = match hook {
            Ok(changes) => changes,
            Err(err) => return Err(ConfigureError::Hook(Arc::clone(err))),
        };
        if !ran_hook && !changes.is_empty() {
            debug!(node = base.name(), "replaying plugin arguments");
            parser.apply(changes)?;
        }

        base.register_options(parser)?;

        let dest = format!("{}_command", default_destination(base.name()));
        let formatter = *parser.formatter();
        let subparsers = parser.add_subparsers(&dest, "subcommands")?;

        for child in self.children() {
            debug!(parent = base.name(), child = child.name(), "configuring child");
            let child_parser = subparsers.add_parser(
                child.name(),
                SubparserOptions {
                    description: child.description().map(str::to_string),
                    epilog: child.base().epilog().map(str::to_string),
                    formatter,
                },
            )?;
            child.configure(child_parser).await?;
        }
        Ok(())
    }
}

/// A group of subcommands.
pub struct Category {
    base: NodeBase,
    branch: Branch,
}

impl Category {
    pub fn new(name: &str, config: NodeConfig) -> Result<Arc<Self>, TreeError> {
        Ok(Arc::new(Self {
            base: NodeBase::new(name, config)?,
            branch: Branch::default(),
        }))
    }

    /// Attach a child. A node can be attached once, under a unique name, and
    /// never below itself.
    pub fn add_child(self: &Arc<Self>, child: impl Into<Node>) -> Result<(), TreeError> {
        let owner = Node::Category(Arc::clone(self));
        self.branch
            .attach(&owner, ParentLink::Category(Arc::downgrade(self)), child.into())
    }

    /// Children in declaration order.
    pub fn children(&self) -> Vec<Node> {
        self.branch.children()
    }

    pub fn child(&self, name: &str) -> Option<Node> {
        self.branch.child(name)
    }

    /// Register a subcommand group on `parser` and compile every child into it.
    ///
    /// Plugins run on the first call only; later calls against a fresh parser
    /// rebuild the subcommand tree and replay the first hook outcome.
    pub async fn configure(self: &Arc<Self>, parser: &mut Parser) -> Result<(), ConfigureError> {
        debug!(category = self.base.name(), "configuring category");
        let node = Node::Category(Arc::clone(self));
        self.branch.configure(&node, parser).await
    }
}

impl TreeNode for Category {
    fn base(&self) -> &NodeBase {
        &self.base
    }
}

impl std::fmt::Debug for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("name", &self.base.name())
            .field("children", &self.children())
            .finish()
    }
}
