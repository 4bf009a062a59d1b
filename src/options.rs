//! Option and positional-parameter declarations.
//!
//! An [`OptionSpec`] describes one flag or positional parameter the way a
//! caller declares it. [`OptionRegistry`] holds a node's flags, either
//! ungrouped or clustered into titled [`OptionGroup`]s for help output.

use thiserror::Error;

/// Whether a declaration becomes a `--switch` or a positional token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Flag,
    Positional,
}

/// What the parser does when it sees the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Store the given value.
    Store,
    /// Store `true` when present.
    StoreTrue,
    /// Store `false` when present.
    StoreFalse,
    /// Collect every occurrence into a list.
    Append,
    /// Count occurrences (`-vvv`).
    Count,
}

/// Type of the value an argument carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    Boolean,
    Integer,
    Number,
}

/// How many values an argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Zero or one value (`?`).
    Optional,
    /// Exactly `n` values.
    Fixed(usize),
    /// Any number of values (`*`).
    Variadic,
}

/// Declaration of a single option or parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSpec {
    pub alias: Option<String>,
    /// Defaults to [`Action::Store`], or [`Action::StoreTrue`] for booleans.
    pub action: Option<Action>,
    pub value_type: ValueType,
    pub choices: Option<Vec<String>>,
    pub default_value: Option<String>,
    pub required: bool,
    pub description: Option<String>,
    /// Key in the parsed arguments. Defaults to the name with `-` → `_`.
    pub destination: Option<String>,
    pub metavar: Option<String>,
    pub arity: Option<Arity>,
    /// Title of the option group this option is listed under.
    pub group: Option<String>,
}

impl OptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string() -> Self {
        Self::default()
    }

    pub fn boolean() -> Self {
        Self {
            value_type: ValueType::Boolean,
            ..Self::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            value_type: ValueType::Integer,
            ..Self::default()
        }
    }

    pub fn number() -> Self {
        Self {
            value_type: ValueType::Number,
            ..Self::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for choice in choices.into_iter().map(Into::into) {
            if !unique.contains(&choice) {
                unique.push(choice);
            }
        }
        self.choices = Some(unique);
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn group(mut self, title: impl Into<String>) -> Self {
        self.group = Some(title.into());
        self
    }

    /// Action used when none is declared.
    pub fn effective_action(&self) -> Action {
        self.action.unwrap_or(match self.value_type {
            ValueType::Boolean => Action::StoreTrue,
            _ => Action::Store,
        })
    }

    /// Destination key for an option declared under `name`.
    pub fn destination_for(&self, name: &str) -> String {
        self.destination
            .clone()
            .unwrap_or_else(|| default_destination(name))
    }

    /// Configuration warning for this declaration, if any.
    ///
    /// A required option never falls back to its default, so declaring both
    /// is almost always a mistake.
    pub fn lint(&self, name: &str) -> Option<String> {
        let has_default = self
            .default_value
            .as_deref()
            .is_some_and(|value| !value.is_empty());

        (self.required && has_default).then(|| {
            format!("'{name}' is required, so its default value will never be used")
        })
    }
}

/// `dry-run` → `dry_run`.
pub fn default_destination(name: &str) -> String {
    name.replace('-', "_")
}

/// Errors raised while declaring options.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("Option name must not be empty")]
    EmptyName,

    #[error("Option '{name}' is already declared")]
    DuplicateOption { name: String },

    #[error("Option group '{title}' is already declared")]
    DuplicateGroup { title: String },

    #[error("Parameter '{name}' is already declared")]
    DuplicateParam { name: String },
}

/// Titled cluster of options, used for help output only.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionGroup {
    title: String,
    declared: bool,
    options: Vec<(String, OptionSpec)>,
}

impl OptionGroup {
    fn new(title: String, declared: bool) -> Self {
        Self {
            title,
            declared,
            options: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Options in this group. Stored specs no longer carry the group marker.
    pub fn options(&self) -> &[(String, OptionSpec)] {
        &self.options
    }

    pub fn names(&self) -> Vec<&str> {
        self.options.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Per-node storage of flag declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionRegistry {
    options: Vec<(String, OptionSpec)>,
    groups: Vec<OptionGroup>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ungrouped options, in declaration order.
    pub fn options(&self) -> &[(String, OptionSpec)] {
        &self.options
    }

    pub fn groups(&self) -> &[OptionGroup] {
        &self.groups
    }

    pub fn group(&self, title: &str) -> Option<&OptionGroup> {
        self.groups.iter().find(|group| group.title == title)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.iter().any(|(existing, _)| existing == name)
            || self
                .groups
                .iter()
                .any(|group| group.options.iter().any(|(existing, _)| existing == name))
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.groups.iter().all(|group| group.options.is_empty())
    }

    /// Add an option. A spec carrying a group marker is moved into that group,
    /// which is created on first use.
    pub fn add_option(&mut self, name: &str, mut spec: OptionSpec) -> Result<(), OptionError> {
        if name.is_empty() {
            return Err(OptionError::EmptyName);
        }
        if self.contains(name) {
            return Err(OptionError::DuplicateOption {
                name: name.to_string(),
            });
        }

        match spec.group.take() {
            Some(title) => {
                let group = self.group_entry(title);
                group.options.push((name.to_string(), spec));
            }
            None => self.options.push((name.to_string(), spec)),
        }
        Ok(())
    }

    /// Declare a titled group with an initial set of options.
    ///
    /// A group that only exists because an option named it is promoted to a
    /// declared group; declaring the same title twice fails.
    pub fn add_group(
        &mut self,
        title: &str,
        specs: Vec<(String, OptionSpec)>,
    ) -> Result<(), OptionError> {
        if self.group(title).is_some_and(|group| group.declared) {
            return Err(OptionError::DuplicateGroup {
                title: title.to_string(),
            });
        }

        let mut seen: Vec<&str> = Vec::new();
        for (name, _) in &specs {
            if name.is_empty() {
                return Err(OptionError::EmptyName);
            }
            if self.contains(name) || seen.contains(&name.as_str()) {
                return Err(OptionError::DuplicateOption { name: name.clone() });
            }
            seen.push(name);
        }

        self.group_entry(title.to_string()).declared = true;
        for (name, spec) in specs {
            self.add_option(&name, spec.group(title))?;
        }
        Ok(())
    }

    fn group_entry(&mut self, title: String) -> &mut OptionGroup {
        let index = match self.groups.iter().position(|group| group.title == title) {
            Some(index) => index,
            None => {
                self.groups.push(OptionGroup::new(title, false));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }
}
