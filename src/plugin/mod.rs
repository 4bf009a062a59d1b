//! Plugins contribute lifecycle callbacks to nodes.
//!
//! A plugin attached to a node is invoked:
//!
//! - `on_before_configure`: before the node registers anything on its parser.
//!   The plugin may add arguments of its own.
//! - `on_before_handler`: after parsing, before the matched command's handler
//!   runs. Failing here aborts the invocation.
//!
//! Callbacks for one event run strictly one after another in attachment order.

mod hooks;

pub use hooks::{run_plugins, HookPayload};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::handler::Handler;
use crate::node::{Command, Node};
use crate::parser::{ParsedArgs, Parser};

/// Lifecycle events plugins can hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeConfigure,
    BeforeHandler,
}

impl HookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HookEvent::BeforeConfigure => "onBeforeConfigure",
            HookEvent::BeforeHandler => "onBeforeHandler",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for [`Plugin::on_before_configure`].
pub struct ConfigureContext<'a> {
    pub node: &'a Node,
    pub parser: &'a mut Parser,
}

/// Payload for [`Plugin::on_before_handler`].
pub struct HandlerHookContext<'a> {
    pub args: &'a ParsedArgs,
    pub node: &'a Arc<Command>,
    pub parser: &'a clap::Command,
    pub handler: &'a Arc<dyn Handler>,
}

/// A set of lifecycle callbacks. Both callbacks default to doing nothing.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    async fn on_before_configure(&self, _ctx: &mut ConfigureContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_before_handler(&self, _ctx: &HandlerHookContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A plugin callback failed.
#[derive(Debug, Error)]
#[error("Plugin '{plugin}' failed during {event}: {source}")]
pub struct HookError {
    pub plugin: String,
    pub event: HookEvent,
    #[source]
    pub source: anyhow::Error,
}
