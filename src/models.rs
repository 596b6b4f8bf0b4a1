// src/models.rs

//! Plain data descriptors for declared options and commands.
//!
//! These structures are built once, at registration time, and are never
//! mutated afterwards. Everything the dispatcher does at run time (parser
//! synthesis, help rendering, completion listing) is derived from them.

// --- OPTION DESCRIPTOR ---

/// How the presence of an option on the command line is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptAction {
    /// Store the single value following the flag (or the positional token).
    #[default]
    Store,
    /// Store `true` when the flag is present.
    StoreTrue,
    /// Store `false` when the flag is present.
    StoreFalse,
    /// Collect every occurrence's value into a list.
    Append,
    /// Count the number of occurrences.
    Count,
}

/// The coercion applied to an option's raw token before it reaches the
/// handler. Coercion failures are reported as parse errors, not panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    /// UTF-8 string, no coercion. Read back as `String`.
    #[default]
    Str,
    /// Signed integer. Read back as `i64`.
    Int,
    /// Floating point. Read back as `f64`.
    Float,
    /// Boolean literal (`true`/`false`). Read back as `bool`.
    Bool,
    /// Filesystem path. Read back as `std::path::PathBuf`.
    Path,
}

/// The declaration of a single command-line argument.
///
/// The declaration string decides the argument class, following the usual
/// CLI convention: `--long` flags, `-s` short flags, and bare names as
/// positionals. Dashes inside the name are normalized to underscores for
/// the id the handler reads the value back with, so `--opt-arg` is fetched
/// as `opt_arg`.
///
/// Declaration order on a command is significant: it fixes the
/// left-to-right order of positional arguments.
#[derive(Debug, Clone)]
pub struct Opt {
    pub(crate) id: String,
    pub(crate) display: String,
    pub(crate) short: Option<char>,
    pub(crate) positional: bool,
    pub(crate) action: OptAction,
    pub(crate) kind: ValueKind,
    pub(crate) default: Option<String>,
    pub(crate) help: Option<String>,
    pub(crate) required: bool,
}

impl Opt {
    /// Declares an argument. `"--count"` and `"-c"` declare flags, `"name"`
    /// declares a positional. Positionals are required unless they carry a
    /// default value.
    pub fn new(declaration: &str) -> Self {
        let (display, short, positional) = if let Some(rest) = declaration.strip_prefix("--") {
            (rest.to_string(), None, false)
        } else if let Some(rest) = declaration.strip_prefix('-') {
            (rest.to_string(), rest.chars().next(), false)
        } else {
            (declaration.to_string(), None, true)
        };

        Self {
            id: display.replace('-', "_"),
            display,
            short,
            positional,
            action: OptAction::default(),
            kind: ValueKind::default(),
            default: None,
            help: None,
            required: positional,
        }
    }

    /// Adds a one-letter alias to a long flag (`-c` for `--count`).
    pub fn short(mut self, alias: char) -> Self {
        self.short = Some(alias);
        self
    }

    /// Sets the per-argument help string shown in the command's help table.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Sets the default value, given in its textual form and coerced through
    /// the declared [`ValueKind`]. A positional with a default is no longer
    /// required.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    /// Sets the action kind. Flags default to [`OptAction::Store`].
    pub fn action(mut self, action: OptAction) -> Self {
        self.action = action;
        self
    }

    /// Sets the value coercion. Defaults to [`ValueKind::Str`].
    pub fn value_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Marks the argument as mandatory (or not, for positionals).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// The underscore-normalized id the handler reads this argument with.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The argument as the user types it: `name`, `--count`, or `-d`.
    pub fn display_name(&self) -> String {
        if self.positional {
            self.display.clone()
        } else if self.display.chars().count() == 1 {
            format!("-{}", self.display)
        } else {
            format!("--{}", self.display)
        }
    }

    /// Whether this argument consumes a value token from the command line.
    pub(crate) fn takes_value(&self) -> bool {
        matches!(self.action, OptAction::Store | OptAction::Append)
    }
}

// --- COMMAND DESCRIPTOR ---

/// The declarative half of one registered command: its display name, help
/// header, and ordered option list. The invocable half (the handler fn)
/// lives in `Command<G>` and never leaves its group entry.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub(crate) name: String,
    pub(crate) about: Option<String>,
    pub(crate) options: Vec<Opt>,
    pub(crate) takes_args: bool,
}

impl CommandSpec {
    /// The display name the command is selected with on the command line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The help header, shown as the description in the command's help.
    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// The declared options, in declaration order.
    pub fn options(&self) -> &[Opt] {
        &self.options
    }
}
