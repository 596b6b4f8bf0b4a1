// src/core/command.rs

//! The invocable half of the registry: one declared command is a typed
//! handler function plus the accumulated option declarations.

use crate::{
    core::synth::CommandArgs,
    models::{CommandSpec, Opt},
};
use anyhow::Result;
use std::fmt;

/// The universal handler signature for every command in a group.
///
/// The handler receives its group instance (so group state set by
/// `apply_global_options` or `pre_command` is available) and the parsed
/// arguments. Its `Ok` value becomes the process exit code; errors
/// propagate unchanged to the caller of `Parser::run`.
pub type Handler<G> = fn(&mut G, &CommandArgs) -> Result<i32>;

/// One declared command: display name, help header, ordered options, and
/// the handler to invoke on a match.
///
/// Declarations accumulate through the fluent builder; reading a builder
/// chain top to bottom yields positional arguments in left-to-right call
/// order.
pub struct Command<G> {
    pub(crate) spec: CommandSpec,
    pub(crate) handler: Handler<G>,
}

impl<G> Command<G> {
    /// Declares a command that takes options, added with [`Command::opt`].
    ///
    /// The display name is derived from the method name: leading and
    /// trailing underscores are stripped, inner underscores become
    /// hyphens (`return_non_zero` is selected as `return-non-zero`).
    pub fn new(method: &str, handler: Handler<G>) -> Self {
        Self {
            spec: CommandSpec {
                name: display_name(method),
                about: None,
                options: Vec::new(),
                takes_args: true,
            },
            handler,
        }
    }

    /// Declares a command that explicitly takes no options.
    ///
    /// This marker is required for optionless commands: a command built
    /// with [`Command::new`] and no options is rejected at registration,
    /// so that plain helper methods are never mistaken for commands.
    pub fn noargs(method: &str, handler: Handler<G>) -> Self {
        Self {
            spec: CommandSpec {
                name: display_name(method),
                about: None,
                options: Vec::new(),
                takes_args: false,
            },
            handler,
        }
    }

    /// Sets the help header shown as the command's description.
    pub fn about(mut self, text: impl Into<String>) -> Self {
        self.spec.about = Some(text.into());
        self
    }

    /// Appends one option declaration. Positional order follows the order
    /// of `opt` calls.
    pub fn opt(mut self, opt: Opt) -> Self {
        self.spec.options.push(opt);
        self
    }

    /// The declarative descriptor of this command.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }
}

impl<G> fmt::Debug for Command<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("spec", &self.spec).finish()
    }
}

/// Derives the display name from a method name.
fn display_name(method: &str) -> String {
    method.trim_matches('_').replace('_', "-")
}
