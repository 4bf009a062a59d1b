//! Command handlers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::node::Command;
use crate::parser::ParsedArgs;

/// Boxed future returned by a [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Function invoked with the parsed arguments when its command is matched.
///
/// Implemented for any `Fn(ParsedArgs, HandlerContext) -> impl Future`, so
/// `async fn` items and closures returning `async move` blocks both work.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, args: ParsedArgs, ctx: HandlerContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(ParsedArgs, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn call(&self, args: ParsedArgs, ctx: HandlerContext) -> HandlerFuture {
        Box::pin(self(args, ctx))
    }
}

/// Context a handler runs in: the matched command and its compiled parser.
#[derive(Clone)]
pub struct HandlerContext {
    /// The command node the handler belongs to.
    pub node: Arc<Command>,
    /// The leaf's clap command, for printing help or usage.
    pub parser: clap::Command,
    /// Full invocation path, root name first (e.g. `["tool", "db", "migrate"]`).
    pub path: Vec<String>,
}

impl HandlerContext {
    /// `"tool db migrate"`.
    pub fn command_line(&self) -> String {
        self.path.join(" ")
    }

    pub fn print_help(&self) -> std::io::Result<()> {
        self.parser.clone().print_help()
    }

    pub fn render_usage(&self) -> String {
        self.parser.clone().render_usage().to_string()
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
