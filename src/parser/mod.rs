//! Parser adapter over clap's builder API.
//!
//! Nodes compile themselves into a tree of [`Parser`]s:
//!
//! ```text
//! Node tree → configure() → Parser tree → build() → clap::Command
//!                                        ↘ resolve(matches) → ParsedArgs + Dispatch
//! ```
//!
//! The parser records every argument declaration so that, after clap has
//! matched the process arguments, the matches can be flattened back into a
//! single [`ParsedArgs`] mapping and the matched leaf's [`Dispatch`] record.

mod args;
mod formatter;

pub use args::ParsedArgs;
pub use formatter::HelpFormatter;

use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;

use clap::builder::{PossibleValuesParser, ValueParser};
use clap::{Arg, ArgAction, ArgMatches};
use serde_json::Value;
use thiserror::Error;

use crate::handler::Handler;
use crate::node::{Command, TreeNode};
use crate::options::{Action, Arity, OptionKind, ValueType};

/// Errors raised while registering arguments or assembling the clap command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("Argument destination '{dest}' is already registered on '{parser}'")]
    DuplicateArgument { parser: String, dest: String },

    #[error("Switch '{switch}' is already registered on '{parser}'")]
    DuplicateSwitch { parser: String, switch: String },

    #[error("Switch '{switch}' is reserved by the parser")]
    ReservedSwitch { switch: String },

    #[error("Invalid switch '{switch}'")]
    InvalidSwitch { switch: String },

    #[error("Argument on '{parser}' has an empty destination")]
    EmptyDestination { parser: String },

    #[error("Argument '{dest}' has an invalid arity: {reason}")]
    InvalidArity { dest: String, reason: String },

    #[error("Parser '{parser}' already has subcommands")]
    DuplicateSubparsers { parser: String },

    #[error("Subcommand '{name}' is already registered on '{parser}'")]
    DuplicateSubcommand { parser: String, name: String },

    #[error(
        "Positional '{optional}' on '{parser}' is optional but is followed by required positional '{required}'"
    )]
    OptionalBeforeRequired {
        parser: String,
        optional: String,
        required: String,
    },

    #[error("Variadic positional '{dest}' on '{parser}' must be the last positional")]
    VariadicNotLast { parser: String, dest: String },
}

/// Failure of [`Parser::parse_args`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// Usage errors, `--help` and `--version`; clap renders these itself.
    #[error(transparent)]
    Engine(#[from] clap::Error),

    #[error("Matched subcommand is not registered on the parser")]
    Unmatched,
}

/// Switches for a flag, or the name of a positional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Switches {
    /// `["--name", "-n"]`.
    Flags(Vec<String>),
    Positional(String),
}

impl Switches {
    pub fn kind(&self) -> OptionKind {
        match self {
            Switches::Flags(_) => OptionKind::Flag,
            Switches::Positional(_) => OptionKind::Positional,
        }
    }
}

/// What a flag switch turns into on the clap side.
///
/// `--name` is a long switch and `-n` a short one. A single dash in front of
/// several characters (`-dry`) is taken as a long alias, since clap has no
/// multi-character short switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchKey {
    Short(char),
    Long(String),
}

impl SwitchKey {
    /// Classify `switch`, or `None` when it is not a well-formed flag.
    pub fn parse(switch: &str) -> Option<Self> {
        let (dashes, bare) = match switch.strip_prefix("--") {
            Some(bare) => (2, bare),
            None => (1, switch.strip_prefix('-')?),
        };
        let well_formed = !bare.is_empty()
            && !bare.starts_with('-')
            && bare.chars().all(|c| !c.is_whitespace() && c != '=');
        if !well_formed {
            return None;
        }

        let mut chars = bare.chars();
        match (dashes, chars.next(), chars.next()) {
            (1, Some(c), None) => Some(SwitchKey::Short(c)),
            _ => Some(SwitchKey::Long(bare.to_string())),
        }
    }
}

impl fmt::Display for SwitchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchKey::Short(c) => write!(f, "-{c}"),
            SwitchKey::Long(name) => write!(f, "--{name}"),
        }
    }
}

/// Engine-level argument description.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub dest: String,
    pub action: Action,
    pub value_type: ValueType,
    pub choices: Option<Vec<String>>,
    pub default_value: Option<String>,
    pub metavar: Option<String>,
    pub required: bool,
    pub help: Option<String>,
    pub nargs: Option<Arity>,
}

impl ArgSpec {
    pub fn new(dest: impl Into<String>) -> Self {
        Self {
            dest: dest.into(),
            action: Action::Store,
            value_type: ValueType::String,
            choices: None,
            default_value: None,
            metavar: None,
            required: false,
            help: None,
            nargs: None,
        }
    }
}

/// A registered argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub switches: Switches,
    pub spec: ArgSpec,
    /// Title of the argument group it was registered through.
    pub group: Option<String>,
}

impl Argument {
    pub fn kind(&self) -> OptionKind {
        self.switches.kind()
    }

    /// Whether clap will demand this argument.
    pub fn is_required(&self) -> bool {
        match self.switches {
            // A bare positional consumes exactly one token, like argparse.
            Switches::Positional(_) => match self.spec.nargs {
                None | Some(Arity::Fixed(_)) => true,
                Some(Arity::Optional) | Some(Arity::Variadic) => false,
            },
            Switches::Flags(_) => self.spec.required,
        }
    }

    fn storage(&self) -> Storage {
        let scalar = if self.spec.choices.is_some() {
            Scalar::Text
        } else {
            match self.spec.value_type {
                ValueType::Integer => Scalar::Integer,
                ValueType::Number => Scalar::Number,
                ValueType::String | ValueType::Boolean => Scalar::Text,
            }
        };

        match self.spec.action {
            Action::StoreTrue | Action::StoreFalse => Storage::Flag,
            Action::Count => Storage::Count,
            Action::Append => Storage::Many(scalar),
            Action::Store => match self.spec.nargs {
                Some(Arity::Variadic) => Storage::Many(scalar),
                Some(Arity::Fixed(n)) if n > 1 => Storage::Many(scalar),
                _ => Storage::One(scalar),
            },
        }
    }

    /// Clap keys of this argument's switches; empty for positionals.
    pub fn switch_keys(&self) -> Vec<SwitchKey> {
        match &self.switches {
            Switches::Flags(flags) => flags.iter().filter_map(|flag| SwitchKey::parse(flag)).collect(),
            Switches::Positional(_) => Vec::new(),
        }
    }

    fn to_clap(&self) -> Arg {
        let spec = &self.spec;
        let positional = self.kind() == OptionKind::Positional;
        let mut arg = Arg::new(spec.dest.clone());

        match &self.switches {
            Switches::Flags(_) => {
                let (mut has_long, mut has_short) = (false, false);
                for key in self.switch_keys() {
                    arg = match key {
                        SwitchKey::Short(c) if !has_short => {
                            has_short = true;
                            arg.short(c)
                        }
                        SwitchKey::Short(c) => arg.visible_short_alias(c),
                        SwitchKey::Long(name) if !has_long => {
                            has_long = true;
                            arg.long(name)
                        }
                        SwitchKey::Long(name) => arg.visible_alias(name),
                    };
                }
            }
            Switches::Positional(name) => {
                arg = arg.value_name(spec.metavar.clone().unwrap_or_else(|| name.clone()));
            }
        }

        let storage = self.storage();
        arg = match spec.action {
            Action::StoreTrue => arg.action(ArgAction::SetTrue),
            Action::StoreFalse => arg.action(ArgAction::SetFalse),
            Action::Count => arg.action(ArgAction::Count),
            Action::Append => arg.action(ArgAction::Append),
            Action::Store => arg.action(ArgAction::Set),
        };
        if let Storage::One(scalar) | Storage::Many(scalar) = storage {
            arg = arg.value_parser(value_parser(scalar, spec.choices.as_deref()));
            if let Some(default) = &spec.default_value {
                arg = arg.default_value(default.clone());
            }
            if let (Some(metavar), false) = (&spec.metavar, positional) {
                arg = arg.value_name(metavar.clone());
            }
        }

        if let Some(nargs) = spec.nargs {
            arg = match nargs {
                Arity::Optional if positional => arg,
                Arity::Optional => arg.num_args(0..=1),
                Arity::Fixed(n) => arg.num_args(n),
                Arity::Variadic if positional => arg.num_args(1..),
                Arity::Variadic => arg.num_args(0..),
            };
        }

        arg = arg.required(self.is_required());
        // Left to clap, which wraps it inside the help column.
        if let Some(help) = &spec.help {
            arg = arg.help(help.clone());
        }
        if let Some(title) = &self.group {
            arg = arg.help_heading(title.clone());
        }
        arg
    }

    fn extract(&self, matches: &ArgMatches) -> Value {
        let id = self.spec.dest.as_str();
        match self.storage() {
            Storage::Flag => matches
                .try_get_one::<bool>(id)
                .ok()
                .flatten()
                .map(|flag| Value::Bool(*flag))
                .unwrap_or(Value::Null),
            Storage::Count => matches
                .try_get_one::<u8>(id)
                .ok()
                .flatten()
                .map(|count| Value::from(*count))
                .unwrap_or(Value::Null),
            Storage::One(scalar) => one_value(matches, id, scalar).unwrap_or(Value::Null),
            Storage::Many(scalar) => many_values(matches, id, scalar).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Scalar {
    Text,
    Integer,
    Number,
}

#[derive(Debug, Clone, Copy)]
enum Storage {
    Flag,
    Count,
    One(Scalar),
    Many(Scalar),
}

fn value_parser(scalar: Scalar, choices: Option<&[String]>) -> ValueParser {
    match (scalar, choices) {
        (_, Some(choices)) => PossibleValuesParser::new(choices.iter().cloned()).into(),
        (Scalar::Integer, None) => clap::value_parser!(i64).into(),
        (Scalar::Number, None) => clap::value_parser!(f64).into(),
        (Scalar::Text, None) => ValueParser::string(),
    }
}

fn one_value(matches: &ArgMatches, id: &str, scalar: Scalar) -> Option<Value> {
    match scalar {
        Scalar::Text => matches
            .try_get_one::<String>(id)
            .ok()
            .flatten()
            .map(|v| Value::String(v.clone())),
        Scalar::Integer => matches.try_get_one::<i64>(id).ok().flatten().map(|v| Value::from(*v)),
        Scalar::Number => matches.try_get_one::<f64>(id).ok().flatten().map(|v| Value::from(*v)),
    }
}

fn many_values(matches: &ArgMatches, id: &str, scalar: Scalar) -> Option<Value> {
    let values: Vec<Value> = match scalar {
        Scalar::Text => matches
            .try_get_many::<String>(id)
            .ok()
            .flatten()?
            .map(|v| Value::String(v.clone()))
            .collect(),
        Scalar::Integer => matches
            .try_get_many::<i64>(id)
            .ok()
            .flatten()?
            .map(|v| Value::from(*v))
            .collect(),
        Scalar::Number => matches
            .try_get_many::<f64>(id)
            .ok()
            .flatten()?
            .map(|v| Value::from(*v))
            .collect(),
    };
    Some(Value::Array(values))
}

/// Implicit bindings a command sets on its own parser: the handler to run
/// and the command node it belongs to.
#[derive(Clone)]
pub struct Dispatch {
    pub handler: Arc<dyn Handler>,
    pub node: Arc<Command>,
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("node", &self.node.name())
            .finish_non_exhaustive()
    }
}

/// Position in a parser's registration history.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    groups: usize,
    arguments: usize,
}

/// Groups and arguments registered on a parser after a [`Checkpoint`],
/// ready to be applied to another parser.
#[derive(Debug, Clone, Default)]
pub struct ParserChanges {
    groups: Vec<String>,
    arguments: Vec<Argument>,
}

impl ParserChanges {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.arguments.is_empty()
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }
}

/// Options for the root parser.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub name: String,
    pub description: Option<String>,
    pub epilog: Option<String>,
    pub version: Option<String>,
    pub formatter: HelpFormatter,
}

/// Options for a child parser created through [`Subparsers::add_parser`].
#[derive(Debug, Clone, Default)]
pub struct SubparserOptions {
    pub description: Option<String>,
    pub epilog: Option<String>,
    pub formatter: HelpFormatter,
}

/// Subcommand registry of a parser.
#[derive(Debug)]
pub struct Subparsers {
    dest: String,
    title: String,
    owner: String,
    parsers: Vec<Parser>,
}

impl Subparsers {
    pub fn dest(&self) -> &str {
        &self.dest
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn parsers(&self) -> &[Parser] {
        &self.parsers
    }

    /// Register a subcommand and return its parser.
    pub fn add_parser(
        &mut self,
        name: &str,
        options: SubparserOptions,
    ) -> Result<&mut Parser, ParserError> {
        if self.parsers.iter().any(|parser| parser.name == name) {
            return Err(ParserError::DuplicateSubcommand {
                parser: self.owner.clone(),
                name: name.to_string(),
            });
        }

        self.parsers.push(Parser::new(ParserOptions {
            name: name.to_string(),
            description: options.description,
            epilog: options.epilog,
            version: None,
            formatter: options.formatter,
        }));
        let index = self.parsers.len() - 1;
        Ok(&mut self.parsers[index])
    }
}

/// Something arguments can be registered on: a parser or one of its groups.
pub trait ArgumentSink {
    fn add_argument(&mut self, switches: Switches, spec: ArgSpec) -> Result<(), ParserError>;
}

/// Titled argument group; arguments added here are listed under the title.
pub struct ArgumentGroup<'p> {
    parser: &'p mut Parser,
    title: String,
}

impl ArgumentGroup<'_> {
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl ArgumentSink for ArgumentGroup<'_> {
    fn add_argument(&mut self, switches: Switches, spec: ArgSpec) -> Result<(), ParserError> {
        self.parser
            .register(switches, spec, Some(self.title.clone()))
    }
}

/// Compiled parser for one node of the command tree.
#[derive(Debug)]
pub struct Parser {
    name: String,
    description: Option<String>,
    epilog: Option<String>,
    version: Option<String>,
    formatter: HelpFormatter,
    arguments: Vec<Argument>,
    groups: Vec<String>,
    subparsers: Option<Subparsers>,
    defaults: Option<Dispatch>,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            name: options.name,
            description: options.description,
            epilog: options.epilog,
            version: options.version,
            formatter: options.formatter,
            arguments: Vec::new(),
            groups: Vec::new(),
            subparsers: None,
            defaults: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn formatter(&self) -> &HelpFormatter {
        &self.formatter
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn argument(&self, dest: &str) -> Option<&Argument> {
        self.arguments.iter().find(|argument| argument.spec.dest == dest)
    }

    /// Titles of the argument groups, in registration order.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn subparsers(&self) -> Option<&Subparsers> {
        self.subparsers.as_ref()
    }

    pub fn defaults(&self) -> Option<&Dispatch> {
        self.defaults.as_ref()
    }

    pub fn add_argument_group(&mut self, title: &str) -> ArgumentGroup<'_> {
        if !self.groups.iter().any(|existing| existing == title) {
            self.groups.push(title.to_string());
        }
        ArgumentGroup {
            parser: self,
            title: title.to_string(),
        }
    }

    /// Attach a subcommand registry. Each matched subcommand name is recorded
    /// under `dest` in the parsed arguments.
    pub fn add_subparsers(&mut self, dest: &str, title: &str) -> Result<&mut Subparsers, ParserError> {
        if self.subparsers.is_some() {
            return Err(ParserError::DuplicateSubparsers {
                parser: self.name.clone(),
            });
        }
        if self.arguments.iter().any(|argument| argument.spec.dest == dest) {
            return Err(ParserError::DuplicateArgument {
                parser: self.name.clone(),
                dest: dest.to_string(),
            });
        }

        Ok(self.subparsers.insert(Subparsers {
            dest: dest.to_string(),
            title: title.to_string(),
            owner: self.name.clone(),
            parsers: Vec::new(),
        }))
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            groups: self.groups.len(),
            arguments: self.arguments.len(),
        }
    }

    /// Everything registered since `checkpoint`.
    pub fn changes_since(&self, checkpoint: Checkpoint) -> ParserChanges {
        ParserChanges {
            groups: self.groups.get(checkpoint.groups..).unwrap_or_default().to_vec(),
            arguments: self
                .arguments
                .get(checkpoint.arguments..)
                .unwrap_or_default()
                .to_vec(),
        }
    }

    /// Register `changes` as if they had been made on this parser.
    pub fn apply(&mut self, changes: &ParserChanges) -> Result<(), ParserError> {
        for title in &changes.groups {
            self.add_argument_group(title);
        }
        for argument in &changes.arguments {
            self.register(
                argument.switches.clone(),
                argument.spec.clone(),
                argument.group.clone(),
            )?;
        }
        Ok(())
    }

    pub fn set_defaults(&mut self, dispatch: Dispatch) {
        self.defaults = Some(dispatch);
    }

    /// Paths (below this parser) of every parser that carries a dispatch
    /// record, in declaration order.
    pub fn endpoints(&self) -> Vec<Vec<String>> {
        let mut endpoints = Vec::new();
        self.collect_endpoints(&mut Vec::new(), &mut endpoints);
        endpoints
    }

    fn collect_endpoints(&self, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        if self.defaults.is_some() {
            out.push(prefix.clone());
        }
        if let Some(subparsers) = &self.subparsers {
            for child in &subparsers.parsers {
                prefix.push(child.name.clone());
                child.collect_endpoints(prefix, out);
                prefix.pop();
            }
        }
    }

    fn reserved_switches(&self) -> Vec<SwitchKey> {
        let mut reserved = vec![SwitchKey::Long("help".into()), SwitchKey::Short('h')];
        if self.version.is_some() {
            reserved.extend([SwitchKey::Long("version".into()), SwitchKey::Short('V')]);
        }
        reserved
    }

    fn register(
        &mut self,
        switches: Switches,
        spec: ArgSpec,
        group: Option<String>,
    ) -> Result<(), ParserError> {
        if spec.dest.is_empty() {
            return Err(ParserError::EmptyDestination {
                parser: self.name.clone(),
            });
        }
        let dest_taken = self.arguments.iter().any(|argument| argument.spec.dest == spec.dest)
            || self
                .subparsers
                .as_ref()
                .is_some_and(|subparsers| subparsers.dest == spec.dest);
        if dest_taken {
            return Err(ParserError::DuplicateArgument {
                parser: self.name.clone(),
                dest: spec.dest,
            });
        }

        match &switches {
            Switches::Flags(flags) => self.check_switches(flags)?,
            Switches::Positional(name) if name.is_empty() || name.starts_with('-') => {
                return Err(ParserError::InvalidSwitch {
                    switch: name.clone(),
                });
            }
            Switches::Positional(_) => {}
        }
        check_arity(&switches, &spec)?;

        self.arguments.push(Argument {
            switches,
            spec,
            group,
        });
        Ok(())
    }

    fn check_switches(&self, flags: &[String]) -> Result<(), ParserError> {
        if flags.is_empty() {
            return Err(ParserError::InvalidSwitch {
                switch: String::new(),
            });
        }

        let reserved = self.reserved_switches();
        let mut seen: Vec<SwitchKey> = Vec::with_capacity(flags.len());
        for switch in flags {
            let key = SwitchKey::parse(switch).ok_or_else(|| ParserError::InvalidSwitch {
                switch: switch.clone(),
            })?;
            if reserved.contains(&key) {
                return Err(ParserError::ReservedSwitch {
                    switch: switch.clone(),
                });
            }

            // Compare what clap will see: `-v` and `--v` differ, `-dry` and
            // `--dry` do not.
            let taken = seen.contains(&key)
                || self
                    .arguments
                    .iter()
                    .any(|argument| argument.switch_keys().contains(&key));
            if taken {
                return Err(ParserError::DuplicateSwitch {
                    parser: self.name.clone(),
                    switch: key.to_string(),
                });
            }
            seen.push(key);
        }
        Ok(())
    }

    fn check_positionals(&self) -> Result<(), ParserError> {
        let positionals: Vec<&Argument> = self
            .arguments
            .iter()
            .filter(|argument| argument.kind() == OptionKind::Positional)
            .collect();

        let mut first_optional: Option<&Argument> = None;
        for (index, argument) in positionals.iter().enumerate() {
            if argument.spec.nargs == Some(Arity::Variadic) && index + 1 < positionals.len() {
                return Err(ParserError::VariadicNotLast {
                    parser: self.name.clone(),
                    dest: argument.spec.dest.clone(),
                });
            }
            match (argument.is_required(), first_optional) {
                (true, Some(optional)) => {
                    return Err(ParserError::OptionalBeforeRequired {
                        parser: self.name.clone(),
                        optional: optional.spec.dest.clone(),
                        required: argument.spec.dest.clone(),
                    });
                }
                (false, None) => first_optional = Some(argument),
                _ => {}
            }
        }
        Ok(())
    }

    /// Assemble the clap command for this parser and all of its subparsers.
    pub fn build(&self) -> Result<clap::Command, ParserError> {
        self.check_positionals()?;

        let mut command = self.formatter.apply(clap::Command::new(self.name.clone()));
        if let Some(description) = &self.description {
            command = command.about(self.formatter.fill(description));
        }
        if let Some(epilog) = &self.epilog {
            command = command.after_help(self.formatter.fill(epilog));
        }
        if let Some(version) = &self.version {
            command = command.version(version.clone());
        }

        command = command.args(
            self.arguments
                .iter()
                .map(Argument::to_clap),
        );

        if let Some(subparsers) = &self.subparsers {
            command = command
                .subcommand_help_heading(subparsers.title.clone())
                .subcommand_required(true)
                .arg_required_else_help(true);
            for child in &subparsers.parsers {
                command = command.subcommand(child.build()?);
            }
        }
        Ok(command)
    }

    /// Build the clap command and parse `argv` (program name first) into a
    /// flat [`ParsedArgs`].
    pub fn parse_args<I, T>(&self, argv: I) -> Result<ParsedArgs, ParseError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.build()?.try_get_matches_from(argv)?;
        self.flatten(&matches)
            .map(|(args, _)| args)
            .ok_or(ParseError::Unmatched)
    }

    /// Flatten clap's matches into a [`ParsedArgs`] and find the matched
    /// leaf's dispatch record. `None` when the matched parser has no record.
    pub fn resolve(&self, matches: &ArgMatches) -> Option<(ParsedArgs, Dispatch)> {
        let (args, parser) = self.flatten(matches)?;
        let dispatch = parser.defaults.clone()?;
        Some((args, dispatch))
    }

    fn flatten(&self, matches: &ArgMatches) -> Option<(ParsedArgs, &Parser)> {
        let mut args = ParsedArgs::new();
        let mut parser = self;
        let mut matches = matches;

        loop {
            for argument in &parser.arguments {
                args.insert(argument.spec.dest.clone(), argument.extract(matches));
            }

            let Some(subparsers) = &parser.subparsers else {
                break;
            };
            let (name, sub_matches) = matches.subcommand()?;
            args.insert(subparsers.dest.clone(), Value::String(name.to_string()));
            args.push_path(name);
            parser = subparsers.parsers.iter().find(|child| child.name == name)?;
            matches = sub_matches;
        }

        Some((args, parser))
    }
}

impl ArgumentSink for Parser {
    fn add_argument(&mut self, switches: Switches, spec: ArgSpec) -> Result<(), ParserError> {
        self.register(switches, spec, None)
    }
}

fn check_arity(switches: &Switches, spec: &ArgSpec) -> Result<(), ParserError> {
    let invalid = |reason: &str| ParserError::InvalidArity {
        dest: spec.dest.clone(),
        reason: reason.to_string(),
    };

    if spec.nargs == Some(Arity::Fixed(0)) {
        return Err(invalid("a fixed arity must be at least 1"));
    }
    let takes_no_value = matches!(
        spec.action,
        Action::StoreTrue | Action::StoreFalse | Action::Count
    );
    if takes_no_value && spec.nargs.is_some() {
        return Err(invalid("flags that take no value cannot declare an arity"));
    }
    if takes_no_value && matches!(switches, Switches::Positional(_)) {
        return Err(invalid("positionals must store a value"));
    }
    Ok(())
}
