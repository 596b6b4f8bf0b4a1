// src/core/synth.rs

//! Parser synthesis: turns declared option metadata into `clap` parsers
//! at dispatch time, and wraps the parse result for typed access.
//!
//! Specs are runtime data, so the parsers are built through `clap`'s
//! builder API instead of the derive layer: positionals in declaration
//! order, flags with their declared action, coercion, and default, and
//! the automatic `-h/--help` entry on every command.

use crate::models::{CommandSpec, Opt, OptAction, ValueKind};
use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches};
use std::any::Any;
use std::path::PathBuf;

/// The parsed arguments handed to a handler, read back by option id.
///
/// Ids are the underscore-normalized declaration names: `--opt-arg` is
/// read as `opt_arg`. The requested type must match the option's declared
/// [`ValueKind`]; a mismatch is reported as an error, never a panic.
#[derive(Debug, Clone)]
pub struct CommandArgs {
    matches: ArgMatches,
}

impl CommandArgs {
    pub(crate) fn new(matches: ArgMatches) -> Self {
        Self { matches }
    }

    /// A value known to be present (a required positional, or any option
    /// with a default).
    pub fn get<T>(&self, id: &str) -> Result<T>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        self.get_opt(id)?
            .ok_or_else(|| anyhow!("missing value for argument '{id}'"))
    }

    /// A value that may be absent. `Ok(None)` means the option was neither
    /// supplied nor defaulted.
    pub fn get_opt<T>(&self, id: &str) -> Result<Option<T>>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        self.matches
            .try_get_one::<T>(id)
            .map_err(|err| anyhow!("argument '{id}': {err}"))
            .map(|value| value.cloned())
    }

    /// The state of a [`OptAction::StoreTrue`]/[`OptAction::StoreFalse`]
    /// flag. Unknown ids read as `false`.
    pub fn get_flag(&self, id: &str) -> bool {
        self.matches
            .try_get_one::<bool>(id)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    }

    /// The number of occurrences of an [`OptAction::Count`] flag.
    pub fn get_count(&self, id: &str) -> u8 {
        self.matches
            .try_get_one::<u8>(id)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(0)
    }

    /// Every value of an [`OptAction::Append`] option, in input order.
    pub fn get_all<T>(&self, id: &str) -> Result<Vec<T>>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        match self.matches.try_get_many::<T>(id) {
            Ok(Some(values)) => Ok(values.cloned().collect()),
            Ok(None) => Ok(Vec::new()),
            Err(err) => Err(anyhow!("argument '{id}': {err}")),
        }
    }

    /// Whether the option was supplied or defaulted at all.
    pub fn is_present(&self, id: &str) -> bool {
        self.matches.try_contains_id(id).unwrap_or(false)
    }
}

/// Synthesizes the per-command parser for one spec.
pub(crate) fn command_parser(spec: &CommandSpec) -> clap::Command {
    let mut command = clap::Command::new(spec.name.clone()).no_binary_name(true);
    if let Some(about) = &spec.about {
        command = command.about(about.clone());
    }
    for opt in &spec.options {
        command = command.arg(build_arg(opt));
    }
    command
}

/// Synthesizes the parser for a node's group-level options. `-h` is
/// handled by the node walk itself, so the automatic help flag is off.
pub(crate) fn globals_parser(opts: &[Opt]) -> clap::Command {
    let mut command = clap::Command::new("group options")
        .no_binary_name(true)
        .disable_help_flag(true);
    for opt in opts {
        command = command.arg(build_arg(opt));
    }
    command
}

fn build_arg(opt: &Opt) -> Arg {
    let mut arg = Arg::new(opt.id.clone());

    if opt.positional {
        arg = arg.value_name(opt.display.clone()).required(opt.required);
    } else {
        if opt.display.chars().count() > 1 {
            arg = arg.long(opt.display.clone());
        }
        if let Some(short) = opt.short {
            arg = arg.short(short);
        }
        if opt.required {
            arg = arg.required(true);
        }
    }

    arg = match opt.action {
        OptAction::Store => arg.action(ArgAction::Set),
        OptAction::StoreTrue => arg.action(ArgAction::SetTrue),
        OptAction::StoreFalse => arg.action(ArgAction::SetFalse),
        OptAction::Append => arg.action(ArgAction::Append),
        OptAction::Count => arg.action(ArgAction::Count),
    };

    if opt.takes_value() {
        arg = match opt.kind {
            ValueKind::Str => arg.value_parser(clap::value_parser!(String)),
            ValueKind::Int => arg.value_parser(clap::value_parser!(i64)),
            ValueKind::Float => arg.value_parser(clap::value_parser!(f64)),
            ValueKind::Bool => arg.value_parser(clap::value_parser!(bool)),
            ValueKind::Path => arg.value_parser(clap::value_parser!(PathBuf)),
        };
        if let Some(default) = &opt.default {
            arg = arg.default_value(default.clone());
        }
    }

    if let Some(help) = &opt.help {
        arg = arg.help(help.clone());
    }

    arg
}
