// src/core/group.rs

//! Commands groups: the user-facing trait describing a collection of
//! commands, and the registered entry the dispatcher works with.

use crate::{
    core::{
        command::{Command, Handler},
        synth::CommandArgs,
    },
    models::{CommandSpec, Opt},
};
use anyhow::{Context, Result};
use std::collections::HashSet;
use thiserror::Error;

/// A structural mistake in the declared command set. Raised by
/// `Parser::register`, before anything can be dispatched; never deferred
/// to run time.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Two options on one command share an id.
    #[error("command '{command}': option '{option}' is declared more than once")]
    DuplicateOption {
        /// Display name of the offending command.
        command: String,
        /// Display name of the colliding option.
        option: String,
    },

    /// Two group-level options share an id.
    #[error("group option '{0}' is declared more than once")]
    DuplicateGlobalOption(String),

    /// A command option collides with a group-level option.
    #[error("option '{option}' is declared both group-wide and on command '{command}'")]
    GlobalOptionClash {
        /// Display name of the offending command.
        command: String,
        /// Display name of the colliding option.
        option: String,
    },

    /// Two commands in the selectable namespace share a display name.
    #[error("command '{0}' is declared more than once")]
    DuplicateCommand(String),

    /// A command declared with `Command::new` carries no options.
    #[error("command '{command}' declares no options; mark it with Command::noargs")]
    MissingNoargsMarker {
        /// Display name of the offending command.
        command: String,
    },

    /// A command declared with `Command::noargs` carries options.
    #[error("command '{command}' is marked noargs but declares options")]
    NoargsWithOptions {
        /// Display name of the offending command.
        command: String,
    },

    /// Named and unnamed groups were registered on the same parser.
    #[error("cannot mix named and unnamed command groups in one parser")]
    MixedGroups,

    /// Two groups share a name.
    #[error("group '{0}' is registered more than once")]
    DuplicateGroup(String),
}

/// A collection of commands sharing group-level options and hooks.
///
/// Implementing this trait is the registration step: `commands()` declares
/// every invocable command of the group, and a `Parser` turns the
/// declarations into a dispatchable node. Methods not returned from
/// `commands()` are invisible to the registry.
pub trait Commands {
    /// Declares every command of this group, in registration order.
    fn commands() -> Vec<Command<Self>>
    where
        Self: Sized;

    /// The subcommand name of this group. `Some` makes the group one node
    /// of a nested tree; `None` makes it a flat top-level command set.
    fn group_name(&self) -> Option<&str> {
        None
    }

    /// The group-level help description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Group-level options, shared by every command and parsed at the
    /// parent node before the command selector token.
    fn global_options() -> Vec<Opt>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Copies parsed group-level values into group fields. This is the
    /// documented contract for group flags: the dispatch layer calls it
    /// before `pre_command`, and commands read the fields afterwards.
    fn apply_global_options(&mut self, _globals: &CommandArgs) -> Result<()> {
        Ok(())
    }

    /// Runs after option parsing and before the selected command. Use it
    /// for setup the commands rely on; an error aborts dispatch and
    /// propagates to the caller of `run`.
    fn pre_command(&mut self) -> Result<()> {
        Ok(())
    }
}

// --- REGISTERED GROUP ENTRIES ---

/// The dispatcher's view of a registered group, erased over the concrete
/// group type.
pub(crate) trait GroupNode {
    fn group_name(&self) -> Option<String>;
    fn description(&self) -> Option<String>;
    fn specs(&self) -> Vec<&CommandSpec>;
    fn global_opts(&self) -> &[Opt];
    fn find(&self, token: &str) -> Option<usize>;
    fn dispatch(&mut self, index: usize, globals: &CommandArgs, args: &CommandArgs) -> Result<i32>;
}

/// One registered group: the instance, its validated command list, and
/// its group-level options.
pub(crate) struct GroupEntry<G: Commands> {
    group: G,
    commands: Vec<Command<G>>,
    globals: Vec<Opt>,
}

impl<G: Commands> GroupEntry<G> {
    /// Collects and validates the group's declarations. All structural
    /// checks happen here, exactly once per registration.
    pub(crate) fn register(group: G) -> Result<Self, ConfigurationError> {
        let commands = G::commands();
        let globals = G::global_options();

        let mut global_ids = HashSet::new();
        for opt in &globals {
            if !global_ids.insert(opt.id().to_string()) {
                return Err(ConfigurationError::DuplicateGlobalOption(opt.display_name()));
            }
        }

        let mut names = HashSet::new();
        for command in &commands {
            let spec = command.spec();
            if !names.insert(spec.name().to_string()) {
                return Err(ConfigurationError::DuplicateCommand(spec.name().to_string()));
            }
            validate_command(spec, &globals)?;
        }

        log::debug!(
            "registered group '{}': {} commands, {} group options",
            group.group_name().unwrap_or("<flat>"),
            commands.len(),
            globals.len()
        );

        Ok(Self {
            group,
            commands,
            globals,
        })
    }
}

impl<G: Commands> std::fmt::Debug for GroupEntry<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupEntry")
            .field("commands", &self.commands.len())
            .field("globals", &self.globals.len())
            .finish()
    }
}

/// Checks one command's option list against the group contract.
fn validate_command(spec: &CommandSpec, globals: &[Opt]) -> Result<(), ConfigurationError> {
    if spec.takes_args && spec.options.is_empty() {
        return Err(ConfigurationError::MissingNoargsMarker {
            command: spec.name().to_string(),
        });
    }
    if !spec.takes_args && !spec.options.is_empty() {
        return Err(ConfigurationError::NoargsWithOptions {
            command: spec.name().to_string(),
        });
    }

    let mut ids = HashSet::new();
    for opt in spec.options() {
        if !ids.insert(opt.id().to_string()) {
            return Err(ConfigurationError::DuplicateOption {
                command: spec.name().to_string(),
                option: opt.display_name(),
            });
        }
        if globals.iter().any(|global| global.id() == opt.id()) {
            return Err(ConfigurationError::GlobalOptionClash {
                command: spec.name().to_string(),
                option: opt.display_name(),
            });
        }
    }
    Ok(())
}

impl<G: Commands> GroupNode for GroupEntry<G> {
    fn group_name(&self) -> Option<String> {
        self.group.group_name().map(str::to_string)
    }

    fn description(&self) -> Option<String> {
        self.group.description().map(str::to_string)
    }

    fn specs(&self) -> Vec<&CommandSpec> {
        self.commands.iter().map(Command::spec).collect()
    }

    fn global_opts(&self) -> &[Opt] {
        &self.globals
    }

    fn find(&self, token: &str) -> Option<usize> {
        self.commands
            .iter()
            .position(|command| command.spec().name() == token)
    }

    fn dispatch(&mut self, index: usize, globals: &CommandArgs, args: &CommandArgs) -> Result<i32> {
        let handler: Handler<G> = self
            .commands
            .get(index)
            .map(|command| command.handler)
            .context("command index out of range")?;

        self.group.apply_global_options(globals)?;
        self.group.pre_command()?;
        handler(&mut self.group, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample;

    impl Sample {
        fn hello(&mut self, _args: &CommandArgs) -> Result<i32> {
            Ok(0)
        }
        fn return_non_zero(&mut self, _args: &CommandArgs) -> Result<i32> {
            Ok(1)
        }
    }

    impl Commands for Sample {
        fn commands() -> Vec<Command<Self>> {
            vec![
                Command::new("hello", Self::hello).opt(Opt::new("name")),
                Command::noargs("return_non_zero", Self::return_non_zero),
            ]
        }
    }

    #[test]
    fn test_registry_builds_one_spec_per_command() {
        let entry = GroupEntry::register(Sample).unwrap();
        let names: Vec<&str> = entry.specs().iter().map(|spec| spec.name()).collect();
        assert_eq!(names, ["hello", "return-non-zero"]);
    }

    #[test]
    fn test_registration_is_deterministic() {
        let first = GroupEntry::register(Sample).unwrap();
        let second = GroupEntry::register(Sample).unwrap();
        let names = |entry: &GroupEntry<Sample>| -> Vec<String> {
            entry
                .specs()
                .iter()
                .map(|spec| spec.name().to_string())
                .collect()
        };
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_duplicate_option_is_rejected() {
        struct Broken;
        impl Broken {
            fn hello(&mut self, _args: &CommandArgs) -> Result<i32> {
                Ok(0)
            }
        }
        impl Commands for Broken {
            fn commands() -> Vec<Command<Self>> {
                vec![
                    Command::new("hello", Self::hello)
                        .opt(Opt::new("--count"))
                        .opt(Opt::new("--count")),
                ]
            }
        }

        let err = GroupEntry::register(Broken).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateOption { .. }));
    }

    #[test]
    fn test_missing_noargs_marker_is_rejected() {
        struct Unmarked;
        impl Unmarked {
            fn bare(&mut self, _args: &CommandArgs) -> Result<i32> {
                Ok(0)
            }
        }
        impl Commands for Unmarked {
            fn commands() -> Vec<Command<Self>> {
                vec![Command::new("bare", Self::bare)]
            }
        }

        let err = GroupEntry::register(Unmarked).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingNoargsMarker { .. }));
    }

    #[test]
    fn test_global_option_clash_is_rejected() {
        struct Clashing;
        impl Clashing {
            fn hello(&mut self, _args: &CommandArgs) -> Result<i32> {
                Ok(0)
            }
        }
        impl Commands for Clashing {
            fn commands() -> Vec<Command<Self>> {
                vec![Command::new("hello", Self::hello).opt(Opt::new("--debug"))]
            }
            fn global_options() -> Vec<Opt> {
                vec![Opt::new("--debug")]
            }
        }

        let err = GroupEntry::register(Clashing).unwrap_err();
        assert!(matches!(err, ConfigurationError::GlobalOptionClash { .. }));
    }
}
