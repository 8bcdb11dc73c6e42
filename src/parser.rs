//! Argument parser interface and the clap-backed adapter.
//!
//! The core only merges option schemas; tokenizing and validation belong to an
//! [`ArgumentParser`]. [`ClapParser`] builds a clap `Command` at runtime from the
//! merged schema. Help and version flags are left to plugins.

use crate::command::{ArgValue, OptionKind, OptionSchema};
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const POSITIONALS: &str = "__positionals";

/// Values produced by a successful parse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedArgs {
    pub values: BTreeMap<String, ArgValue>,
    pub positionals: Vec<String>,
    /// Arguments after `--`, passed through untouched
    pub rest: Vec<String>,
}

/// Why the raw arguments were rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    errors: Vec<String>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("; "))
    }
}

impl std::error::Error for ValidationFailure {}

/// Tokenizes and validates raw arguments against an option schema
pub trait ArgumentParser: Send + Sync {
    fn parse(
        &self,
        command_name: &str,
        options: &BTreeMap<String, OptionSchema>,
        args: &[String],
    ) -> Result<ParsedArgs, ValidationFailure>;

    /// Best-effort values for arguments that failed [`parse`](Self::parse).
    ///
    /// Only boolean flags are recovered, so decorators such as `--help` can still
    /// act on an invocation that is otherwise invalid.
    fn parse_lenient(&self, options: &BTreeMap<String, OptionSchema>, args: &[String]) -> ParsedArgs {
        let (args, rest) = split_rest(args);
        ParsedArgs {
            values: scan_flags(options, args),
            positionals: Vec::new(),
            rest: rest.to_vec(),
        }
    }
}

/// Merge global and command-specific options; command entries shadow globals.
///
/// A command option also claims its short flag: a global using the same short
/// keeps only its long form.
pub fn merge_options(
    global: &BTreeMap<String, OptionSchema>,
    command: &BTreeMap<String, OptionSchema>,
) -> BTreeMap<String, OptionSchema> {
    let claimed: BTreeSet<char> = command.values().filter_map(|schema| schema.short).collect();

    let mut merged = global.clone();
    for schema in merged.values_mut() {
        if schema.short.is_some_and(|short| claimed.contains(&short)) {
            schema.short = None;
        }
    }
    for (name, schema) in command {
        merged.insert(name.clone(), schema.clone());
    }
    merged
}

/// Short flags used by more than one option, with the names sharing each
fn short_collisions(options: &BTreeMap<String, OptionSchema>) -> Vec<(char, Vec<&str>)> {
    let mut owners: BTreeMap<char, Vec<&str>> = BTreeMap::new();
    for (name, schema) in options {
        if let Some(short) = schema.short {
            owners.entry(short).or_default().push(name);
        }
    }
    owners.into_iter().filter(|(_, names)| names.len() > 1).collect()
}

/// Boolean flags present in `args`, by `--name` or by short, including clusters
/// such as `-hv`. Everything else is ignored.
pub fn scan_flags(options: &BTreeMap<String, OptionSchema>, args: &[String]) -> BTreeMap<String, ArgValue> {
    let flags: Vec<(&String, Option<char>)> = options
        .iter()
        .filter(|(_, schema)| schema.kind == OptionKind::Boolean)
        .map(|(name, schema)| (name, schema.short))
        .collect();

    let mut values = BTreeMap::new();
    for arg in args {
        if let Some(long) = arg.strip_prefix("--") {
            if let Some((name, _)) = flags.iter().find(|(name, _)| name.as_str() == long) {
                values.insert((*name).clone(), ArgValue::Bool(true));
            }
        } else if let Some(cluster) = arg.strip_prefix('-') {
            for c in cluster.chars() {
                if let Some((name, _)) = flags.iter().find(|(_, short)| *short == Some(c)) {
                    values.insert((*name).clone(), ArgValue::Bool(true));
                }
            }
        }
    }
    values
}

/// Split raw arguments at the first `--`
pub fn split_rest(args: &[String]) -> (&[String], &[String]) {
    match args.iter().position(|arg| arg == "--") {
        Some(index) => (&args[..index], &args[index + 1..]),
        None => (args, &[]),
    }
}

/// [`ArgumentParser`] backed by clap's builder API
#[derive(Debug, Clone, Copy, Default)]
pub struct ClapParser;

impl ClapParser {
    fn build_command(command_name: &str, options: &BTreeMap<String, OptionSchema>) -> Command {
        let mut command = Command::new(command_name.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true);

        for (name, schema) in options {
            command = command.arg(Self::build_arg(name, schema));
        }

        command.arg(
            Arg::new(POSITIONALS)
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(clap::value_parser!(String)),
        )
    }

    fn build_arg(name: &str, schema: &OptionSchema) -> Arg {
        let mut arg = Arg::new(name.to_string())
            .long(name.to_string())
            .help(schema.description.clone())
            .required(schema.required);

        if let Some(short) = schema.short {
            arg = arg.short(short);
        }

        arg = match &schema.kind {
            OptionKind::Boolean => arg.action(ArgAction::SetTrue),
            OptionKind::String => arg
                .action(Self::value_action(schema))
                .value_parser(clap::value_parser!(String)),
            OptionKind::Number => arg
                .action(ArgAction::Set)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(f64)),
            OptionKind::Choice(choices) => arg
                .action(Self::value_action(schema))
                .value_parser(PossibleValuesParser::new(choices.clone())),
        };

        // clap rejects defaults on flags and on required arguments
        match (&schema.kind, &schema.default) {
            (OptionKind::Boolean, _) | (_, None) => arg,
            (_, Some(_)) if schema.required => arg,
            (_, Some(default)) => arg.default_value(default.clone()),
        }
    }

    fn value_action(schema: &OptionSchema) -> ArgAction {
        if schema.multiple {
            ArgAction::Append
        } else {
            ArgAction::Set
        }
    }

    fn extract(
        matches: &ArgMatches,
        options: &BTreeMap<String, OptionSchema>,
    ) -> BTreeMap<String, ArgValue> {
        let mut values = BTreeMap::new();

        for (name, schema) in options {
            let value = match &schema.kind {
                OptionKind::Boolean => matches.get_flag(name).then_some(ArgValue::Bool(true)),
                OptionKind::Number => matches.get_one::<f64>(name).copied().map(ArgValue::Number),
                OptionKind::String | OptionKind::Choice(_) if schema.multiple => matches
                    .get_many::<String>(name)
                    .map(|items| ArgValue::List(items.cloned().collect())),
                OptionKind::String | OptionKind::Choice(_) => matches
                    .get_one::<String>(name)
                    .cloned()
                    .map(ArgValue::String),
            };
            if let Some(value) = value {
                values.insert(name.clone(), value);
            }
        }

        values
    }
}

impl ArgumentParser for ClapParser {
    fn parse(
        &self,
        command_name: &str,
        options: &BTreeMap<String, OptionSchema>,
        args: &[String],
    ) -> Result<ParsedArgs, ValidationFailure> {
        let collisions = short_collisions(options);
        if !collisions.is_empty() {
            let errors = collisions
                .into_iter()
                .map(|(short, names)| {
                    format!("short flag '-{short}' is shared by {}", names.join(", "))
                })
                .collect();
            return Err(ValidationFailure::new(errors));
        }

        let (args, rest) = split_rest(args);
        let matches = Self::build_command(command_name, options)
            .try_get_matches_from(args)
            .map_err(|err| {
                let rendered = err.to_string();
                let message = rendered
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches("error: ")
                    .to_string();
                ValidationFailure::new(vec![message])
            })?;

        let positionals = matches
            .get_many::<String>(POSITIONALS)
            .map(|items| items.cloned().collect())
            .unwrap_or_default();

        Ok(ParsedArgs {
            values: Self::extract(&matches, options),
            positionals,
            rest: rest.to_vec(),
        })
    }
}
