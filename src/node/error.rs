use std::sync::Arc;

use thiserror::Error;

use crate::options::OptionError;
use crate::parser::ParserError;
use crate::plugin::HookError;

/// Errors raised while wiring a node tree together.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Invalid node name '{name}': expected letters, digits, '_' or '-', not starting with '-'")]
    InvalidName { name: String },

    #[error("Node '{child}' is already attached to '{parent}'")]
    AlreadyAttached { child: String, parent: String },

    #[error("'{parent}' already has a child named '{name}'")]
    DuplicateChild { parent: String, name: String },

    #[error("Attaching '{child}' to '{parent}' would create a cycle")]
    Cycle { parent: String, child: String },

    #[error(transparent)]
    Option(#[from] OptionError),
}

/// Errors raised while compiling a node tree into parsers.
#[derive(Debug, Clone, Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// Shared because a category replays its memoized hook failure on
    /// every later compile.
    #[error(transparent)]
    Hook(Arc<HookError>),
}

impl From<HookError> for ConfigureError {
    fn from(err: HookError) -> Self {
        ConfigureError::Hook(Arc::new(err))
    }
}
