// src/core/dispatcher.rs

//! The parser tree and the run-time dispatch cascade.
//!
//! A `Parser` collects registered command groups into either a flat
//! namespace or a one-level tree of named groups, then resolves argv in
//! one pass per node: node-level option tokens first, then the selector
//! token, then the leaf tokens handed to the synthesized command parser.

use crate::{
    constants::{EXIT_PARSE_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR},
    core::{
        completion,
        group::{Commands, ConfigurationError, GroupEntry, GroupNode},
        help,
        synth::{self, CommandArgs},
    },
    models::{CommandSpec, Opt},
};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use std::env;
use std::fmt;
use std::path::Path;

/// The entry point: registered groups plus the program identity.
///
/// Register every group, then hand over control with [`Parser::run`] or
/// [`Parser::run_from_env`]; the returned code is the process exit code.
pub struct Parser {
    prog: String,
    description: Option<String>,
    nodes: Vec<Box<dyn GroupNode>>,
}

/// Outcome of walking one node's leading tokens.
enum NodeScan<'a> {
    /// `-h`/`--help` before any selector.
    Help,
    /// A leading flag that is not a declared node-level option.
    UnknownFlag(String),
    /// Consumed node-level option tokens, and everything from the
    /// selector onwards.
    Split {
        consumed: Vec<String>,
        rest: &'a [String],
    },
}

/// Outcome of parsing leaf tokens against a synthesized command parser.
enum LeafParse {
    /// Help or version was requested and printed; dispatch stops cleanly.
    Help,
    /// The tokens did not parse; the error was printed. Carries the exit
    /// code.
    Failed(i32),
    Parsed(CommandArgs),
}

impl Parser {
    /// Creates an empty parser. The program name defaults to the basename
    /// of the process's argv[0].
    pub fn new() -> Self {
        Self {
            prog: default_prog(),
            description: None,
            nodes: Vec::new(),
        }
    }

    /// Sets the program description shown in the top-level help block.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Overrides the program name used in usage lines and the completion
    /// script.
    pub fn prog(mut self, prog: impl Into<String>) -> Self {
        self.prog = prog.into();
        self
    }

    /// Registers one commands group, validating its declarations and its
    /// coherence with the groups already registered. Every structural
    /// error surfaces here, never at dispatch time.
    pub fn register<G>(&mut self, group: G) -> Result<(), ConfigurationError>
    where
        G: Commands + 'static,
    {
        let entry = GroupEntry::register(group)?;

        let named = entry.group_name().is_some();
        if let Some(first) = self.nodes.first()
            && first.group_name().is_some() != named
        {
            return Err(ConfigurationError::MixedGroups);
        }

        if let Some(name) = entry.group_name() {
            if self
                .nodes
                .iter()
                .any(|node| node.group_name().as_deref() == Some(name.as_str()))
            {
                return Err(ConfigurationError::DuplicateGroup(name));
            }
        } else {
            // Flat mode merges every group into one selectable namespace.
            for spec in entry.specs() {
                if self.nodes.iter().any(|node| node.find(spec.name()).is_some()) {
                    return Err(ConfigurationError::DuplicateCommand(spec.name().to_string()));
                }
            }
        }

        self.nodes.push(Box::new(entry));
        Ok(())
    }

    /// Resolves and runs one command line. Usage problems are reported on
    /// the error stream and returned as exit codes 1 or 2; errors from
    /// hooks and handlers propagate unchanged.
    pub fn run<I, S>(&mut self, argv: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        self.dispatch(&argv)
    }

    /// Like [`Parser::run`], but reads the process argument vector and
    /// takes the program name from argv[0].
    pub fn run_from_env(&mut self) -> Result<i32> {
        let mut args = env::args();
        if let Some(argv0) = args.next()
            && let Some(name) = Path::new(&argv0).file_name().and_then(|name| name.to_str())
        {
            self.prog = name.to_string();
        }
        let argv: Vec<String> = args.collect();
        self.dispatch(&argv)
    }

    fn dispatch(&mut self, argv: &[String]) -> Result<i32> {
        log::debug!("dispatching args: {argv:?}");

        if argv.iter().any(|arg| arg == "--bash-completion-script") {
            print!("{}", completion::completion_script(&self.prog));
            return Ok(EXIT_SUCCESS);
        }
        if argv.first().map(String::as_str) == Some("--bash-completion") {
            println!("{}", self.completion_candidates(argv.get(2).map(String::as_str)).join(" "));
            return Ok(EXIT_SUCCESS);
        }

        if self.nested() {
            self.dispatch_nested(argv)
        } else {
            self.dispatch_flat(argv)
        }
    }

    /// Whether the registered groups form a nested tree. Registration
    /// guarantees the groups are uniformly named or uniformly unnamed.
    fn nested(&self) -> bool {
        self.nodes
            .first()
            .is_some_and(|node| node.group_name().is_some())
    }

    // --- FLAT MODE ---

    fn dispatch_flat(&mut self, argv: &[String]) -> Result<i32> {
        let globals: Vec<Opt> = self
            .nodes
            .iter()
            .flat_map(|node| node.global_opts().iter().cloned())
            .collect();

        let (consumed, rest) = match scan_node_args(argv, &globals) {
            NodeScan::Help => {
                print!("{}", self.flat_help());
                return Ok(EXIT_SUCCESS);
            }
            NodeScan::UnknownFlag(flag) => {
                eprintln!("error: unrecognized option '{flag}'");
                eprint!("{}", self.flat_help());
                return Ok(EXIT_PARSE_ERROR);
            }
            NodeScan::Split { consumed, rest } => (consumed, rest),
        };

        let global_args = match parse_globals(&globals, &consumed) {
            Ok(args) => args,
            Err(code) => return Ok(code),
        };

        let Some(selector) = rest.first() else {
            eprint!("{}", self.flat_help());
            return Ok(EXIT_USAGE_ERROR);
        };

        let located = self
            .nodes
            .iter()
            .enumerate()
            .find_map(|(node_index, node)| {
                node.find(selector).map(|command_index| (node_index, command_index))
            });
        let Some((node_index, command_index)) = located else {
            log::debug!("no command matching '{selector}'");
            eprint!("{}", self.flat_help());
            return Ok(EXIT_USAGE_ERROR);
        };

        self.dispatch_leaf(node_index, command_index, &global_args, rest.get(1..).unwrap_or_default())
    }

    fn flat_help(&self) -> String {
        let names: Vec<String> = self
            .nodes
            .iter()
            .flat_map(|node| {
                node.specs()
                    .into_iter()
                    .map(|spec| spec.name().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        help::node_help(&self.prog, None, self.description.as_deref(), &names)
    }

    // --- NESTED MODE ---

    fn dispatch_nested(&mut self, argv: &[String]) -> Result<i32> {
        // The top level of a nested tree has no options of its own; only
        // `-h` is recognized before the group selector.
        let rest = match scan_node_args(argv, &[]) {
            NodeScan::Help => {
                print!("{}", self.top_help());
                return Ok(EXIT_SUCCESS);
            }
            NodeScan::UnknownFlag(flag) => {
                eprintln!("error: unrecognized option '{flag}'");
                eprint!("{}", self.top_help());
                return Ok(EXIT_PARSE_ERROR);
            }
            NodeScan::Split { rest, .. } => rest,
        };

        let Some(selector) = rest.first() else {
            eprint!("{}", self.top_help());
            return Ok(EXIT_USAGE_ERROR);
        };

        let Some(node_index) = self
            .nodes
            .iter()
            .position(|node| node.group_name().as_deref() == Some(selector.as_str()))
        else {
            log::debug!("no group matching '{selector}'");
            eprint!("{}", self.top_help());
            return Ok(EXIT_USAGE_ERROR);
        };

        self.dispatch_group(node_index, rest.get(1..).unwrap_or_default())
    }

    fn top_help(&self) -> String {
        let names: Vec<String> = self
            .nodes
            .iter()
            .filter_map(|node| node.group_name())
            .collect();
        help::node_help(&self.prog, None, self.description.as_deref(), &names)
    }

    /// One named group node: its own options, then the command selector,
    /// then the leaf.
    fn dispatch_group(&mut self, node_index: usize, argv: &[String]) -> Result<i32> {
        let node = self
            .nodes
            .get(node_index)
            .context("group index out of range")?;
        let group_name = node.group_name();
        let group_help = help::node_help(
            &self.prog,
            group_name.as_deref(),
            node.description().as_deref(),
            &node
                .specs()
                .iter()
                .map(|spec| spec.name().to_string())
                .collect::<Vec<_>>(),
        );
        let globals: Vec<Opt> = node.global_opts().to_vec();

        let (consumed, rest) = match scan_node_args(argv, &globals) {
            NodeScan::Help => {
                print!("{group_help}");
                return Ok(EXIT_SUCCESS);
            }
            NodeScan::UnknownFlag(flag) => {
                eprintln!("error: unrecognized option '{flag}'");
                eprint!("{group_help}");
                return Ok(EXIT_PARSE_ERROR);
            }
            NodeScan::Split { consumed, rest } => (consumed, rest),
        };

        let global_args = match parse_globals(&globals, &consumed) {
            Ok(args) => args,
            Err(code) => return Ok(code),
        };

        let Some(selector) = rest.first() else {
            eprint!("{group_help}");
            return Ok(EXIT_USAGE_ERROR);
        };

        let Some(command_index) = node.find(selector) else {
            log::debug!("no command matching '{selector}' in group {group_name:?}");
            eprint!("{group_help}");
            return Ok(EXIT_USAGE_ERROR);
        };

        self.dispatch_leaf(node_index, command_index, &global_args, rest.get(1..).unwrap_or_default())
    }

    // --- LEAF DISPATCH ---

    fn dispatch_leaf(
        &mut self,
        node_index: usize,
        command_index: usize,
        global_args: &CommandArgs,
        tokens: &[String],
    ) -> Result<i32> {
        let spec: CommandSpec = {
            let node = self
                .nodes
                .get(node_index)
                .context("group index out of range")?;
            node.specs()
                .get(command_index)
                .map(|spec| (*spec).clone())
                .context("command index out of range")?
        };

        let leaf_args = match parse_leaf(&spec, tokens) {
            LeafParse::Help => return Ok(EXIT_SUCCESS),
            LeafParse::Failed(code) => return Ok(code),
            LeafParse::Parsed(args) => args,
        };

        log::debug!("dispatching to command '{}'", spec.name());
        let node = self
            .nodes
            .get_mut(node_index)
            .context("group index out of range")?;
        node.dispatch(command_index, global_args, &leaf_args)
    }

    // --- COMPLETION ---

    /// Candidates for the word following `--bash-completion <prog>`: group
    /// names at the top of a nested tree, a group's command names once the
    /// group word is present, command names in flat mode.
    fn completion_candidates(&self, word: Option<&str>) -> Vec<String> {
        if self.nested() {
            if let Some(word) = word
                && let Some(node) = self
                    .nodes
                    .iter()
                    .find(|node| node.group_name().as_deref() == Some(word))
            {
                return node
                    .specs()
                    .iter()
                    .map(|spec| spec.name().to_string())
                    .collect();
            }
            self.nodes
                .iter()
                .filter_map(|node| node.group_name())
                .collect()
        } else {
            self.nodes
                .iter()
                .flat_map(|node| {
                    node.specs()
                        .into_iter()
                        .map(|spec| spec.name().to_string())
                        .collect::<Vec<_>>()
                })
                .collect()
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("prog", &self.prog)
            .field("description", &self.description)
            .field("groups", &self.nodes.len())
            .finish()
    }
}

// --- TOKEN WALK HELPERS ---

/// Walks a node's leading tokens: declared node-level options are
/// consumed (with their value, when the option takes one), `-h` stops the
/// walk, and the first bare token becomes the selector.
fn scan_node_args<'a>(tokens: &'a [String], globals: &[Opt]) -> NodeScan<'a> {
    let mut consumed = Vec::new();
    let mut index = 0usize;

    while let Some(token) = tokens.get(index) {
        if token == "-h" || token == "--help" {
            return NodeScan::Help;
        }
        if !token.starts_with('-') || token == "-" {
            return NodeScan::Split {
                consumed,
                rest: tokens.get(index..).unwrap_or_default(),
            };
        }

        match match_global(globals, token) {
            Some(opt) => {
                consumed.push(token.clone());
                if opt.takes_value()
                    && !token.contains('=')
                    && let Some(value) = tokens.get(index + 1)
                    && !value.starts_with('-')
                {
                    consumed.push(value.clone());
                    index += 1;
                }
            }
            None => return NodeScan::UnknownFlag(token.clone()),
        }
        index += 1;
    }

    NodeScan::Split {
        consumed,
        rest: &[],
    }
}

/// Finds the declared node-level option a flag token refers to.
fn match_global<'a>(globals: &'a [Opt], token: &str) -> Option<&'a Opt> {
    if let Some(body) = token.strip_prefix("--") {
        let name = body.split('=').next().unwrap_or(body);
        globals
            .iter()
            .find(|opt| !opt.positional && opt.display == name)
    } else if let Some(body) = token.strip_prefix('-') {
        let mut chars = body.chars();
        let first = chars.next()?;
        if chars.next().is_some() {
            // Combined short flags are not supported at node level.
            return None;
        }
        globals
            .iter()
            .find(|opt| !opt.positional && opt.short == Some(first))
    } else {
        None
    }
}

/// Parses the consumed node-level option tokens. `Err` carries the exit
/// code; the parse error has already been printed.
fn parse_globals(globals: &[Opt], tokens: &[String]) -> Result<CommandArgs, i32> {
    match synth::globals_parser(globals).try_get_matches_from(tokens.iter().cloned()) {
        Ok(matches) => Ok(CommandArgs::new(matches)),
        Err(err) => {
            let _ = err.print();
            Err(EXIT_PARSE_ERROR)
        }
    }
}

/// Parses leaf tokens against the command's synthesized parser. Help and
/// parse errors are printed here; the caller only maps them to codes.
fn parse_leaf(spec: &CommandSpec, tokens: &[String]) -> LeafParse {
    match synth::command_parser(spec).try_get_matches_from(tokens.iter().cloned()) {
        Ok(matches) => LeafParse::Parsed(CommandArgs::new(matches)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            LeafParse::Help
        }
        Err(err) => {
            let _ = err.print();
            LeafParse::Failed(EXIT_PARSE_ERROR)
        }
    }
}

fn default_prog() -> String {
    env::args()
        .next()
        .and_then(|argv0| {
            Path::new(&argv0)
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "prog".to_string())
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::command::Command,
        models::{OptAction, ValueKind},
    };
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn to_argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    /// Shared invocation log, so tests can observe calls after the parser
    /// has taken ownership of the group.
    #[derive(Clone, Default)]
    struct CallLog(Rc<RefCell<Vec<String>>>);

    impl CallLog {
        fn record(&self, entry: impl Into<String>) {
            self.0.borrow_mut().push(entry.into());
        }
        fn entries(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    // --- Flat-mode fixture, mirroring `hello(name, count=1)` ---

    #[derive(Default)]
    struct TestCommands {
        log: CallLog,
        debug: bool,
    }

    impl TestCommands {
        fn with_log(log: &CallLog) -> Self {
            Self {
                log: log.clone(),
                debug: false,
            }
        }

        fn hello(&mut self, args: &CommandArgs) -> Result<i32> {
            let name: String = args.get("name")?;
            let count: i64 = args.get("count")?;
            self.log
                .record(format!("hello {name} x{count} debug={}", self.debug));
            Ok(0)
        }

        fn return_non_zero(&mut self, _args: &CommandArgs) -> Result<i32> {
            self.log.record("return-non-zero");
            Ok(1)
        }

        fn explode(&mut self, _args: &CommandArgs) -> Result<i32> {
            Err(anyhow!("boom"))
        }
    }

    impl Commands for TestCommands {
        fn commands() -> Vec<Command<Self>> {
            vec![
                Command::new("hello", Self::hello)
                    .about("Say hello a number of times")
                    .opt(
                        Opt::new("--count")
                            .value_kind(ValueKind::Int)
                            .default_value("1")
                            .help("Number of hellos"),
                    )
                    .opt(Opt::new("name").help("Your name")),
                Command::noargs("return_non_zero", Self::return_non_zero),
                Command::noargs("explode", Self::explode),
            ]
        }

        fn global_options() -> Vec<Opt> {
            vec![
                Opt::new("--debug")
                    .short('d')
                    .action(OptAction::StoreTrue)
                    .help("Print debug output"),
            ]
        }

        fn apply_global_options(&mut self, globals: &CommandArgs) -> Result<()> {
            self.debug = globals.get_flag("debug");
            Ok(())
        }
    }

    fn flat_parser(log: &CallLog) -> Parser {
        let mut parser = Parser::new().prog("prog").description("Test Application");
        parser.register(TestCommands::with_log(log)).unwrap();
        parser
    }

    // --- Nested-mode fixtures ---

    #[derive(Default)]
    struct TicketCommands {
        log: CallLog,
    }

    impl TicketCommands {
        fn with_log(log: &CallLog) -> Self {
            Self { log: log.clone() }
        }

        fn get(&mut self, args: &CommandArgs) -> Result<i32> {
            let tkt_num: String = args.get("tkt_num")?;
            self.log.record(format!("tickets get {tkt_num}"));
            Ok(0)
        }

        fn list(&mut self, _args: &CommandArgs) -> Result<i32> {
            self.log.record("tickets list");
            Ok(0)
        }
    }

    impl Commands for TicketCommands {
        fn commands() -> Vec<Command<Self>> {
            vec![
                Command::new("get", Self::get)
                    .about("Fetch one ticket")
                    .opt(Opt::new("tkt-num").help("Ticket number")),
                Command::noargs("list", Self::list),
            ]
        }

        fn group_name(&self) -> Option<&str> {
            Some("tickets")
        }

        fn description(&self) -> Option<&str> {
            Some("Operate on tickets.")
        }

        fn pre_command(&mut self) -> Result<()> {
            self.log.record("tickets pre_command");
            Ok(())
        }
    }

    #[derive(Default)]
    struct QueueCommands {
        log: CallLog,
    }

    impl QueueCommands {
        fn with_log(log: &CallLog) -> Self {
            Self { log: log.clone() }
        }

        fn drain(&mut self, _args: &CommandArgs) -> Result<i32> {
            self.log.record("queues drain");
            Ok(0)
        }
    }

    impl Commands for QueueCommands {
        fn commands() -> Vec<Command<Self>> {
            vec![Command::noargs("drain", Self::drain)]
        }

        fn group_name(&self) -> Option<&str> {
            Some("queues")
        }
    }

    fn nested_parser(log: &CallLog) -> Parser {
        let mut parser = Parser::new().prog("prog").description("Ticketing tool");
        parser.register(TicketCommands::with_log(log)).unwrap();
        parser.register(QueueCommands::with_log(log)).unwrap();
        parser
    }

    // --- Flat dispatch ---

    #[test]
    fn test_no_command_is_a_usage_error() {
        init_logger();
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(parser.run(Vec::<String>::new()).unwrap(), EXIT_USAGE_ERROR);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_unknown_command_is_a_usage_error() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(parser.run(to_argv(&["frobnicate"])).unwrap(), EXIT_USAGE_ERROR);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_usage_block_lists_commands_in_registration_order() {
        let log = CallLog::default();
        let parser = flat_parser(&log);
        let rendered = parser.flat_help();

        let hello_at = rendered.find("   hello\n").unwrap();
        let non_zero_at = rendered.find("   return-non-zero\n").unwrap();
        assert!(rendered.starts_with("Usage: prog <command> [-h]\n\n"));
        assert!(rendered.contains("Test Application\n"));
        assert!(hello_at < non_zero_at);
    }

    #[test]
    fn test_hello_dispatches_exactly_once_with_typed_args() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        let code = parser
            .run(to_argv(&["hello", "derrick", "--count", "5"]))
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(log.entries(), ["hello derrick x5 debug=false"]);
    }

    #[test]
    fn test_handler_exit_code_propagates_verbatim() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(parser.run(to_argv(&["return-non-zero"])).unwrap(), 1);
        assert_eq!(log.entries(), ["return-non-zero"]);
    }

    #[test]
    fn test_parser_is_reusable_across_runs() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(parser.run(to_argv(&["hello", "derrick"])).unwrap(), 0);
        assert_eq!(parser.run(to_argv(&["return-non-zero"])).unwrap(), 1);
        assert_eq!(
            log.entries(),
            ["hello derrick x1 debug=false", "return-non-zero"]
        );
    }

    #[test]
    fn test_leaf_help_short_circuits_dispatch() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(parser.run(to_argv(&["hello", "-h"])).unwrap(), EXIT_SUCCESS);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_top_level_help_exits_zero() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(parser.run(to_argv(&["-h"])).unwrap(), EXIT_SUCCESS);
        assert_eq!(parser.run(to_argv(&["--help"])).unwrap(), EXIT_SUCCESS);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_coercion_failure_exits_two_without_dispatch() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        let code = parser
            .run(to_argv(&["hello", "derrick", "--count", "many"]))
            .unwrap();
        assert_eq!(code, EXIT_PARSE_ERROR);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_group_option_reaches_the_group_before_dispatch() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        let code = parser.run(to_argv(&["-d", "hello", "derrick"])).unwrap();
        assert_eq!(code, 0);
        assert_eq!(log.entries(), ["hello derrick x1 debug=true"]);
    }

    #[test]
    fn test_unknown_leading_flag_exits_two() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(
            parser.run(to_argv(&["--bogus", "hello"])).unwrap(),
            EXIT_PARSE_ERROR
        );
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_handler_errors_propagate_to_the_caller() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        let err = parser.run(to_argv(&["explode"])).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    // --- Nested dispatch ---

    #[test]
    fn test_group_without_command_is_a_usage_error() {
        init_logger();
        let log = CallLog::default();
        let mut parser = nested_parser(&log);

        assert_eq!(parser.run(to_argv(&["tickets"])).unwrap(), EXIT_USAGE_ERROR);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_nested_dispatch_runs_pre_command_then_handler() {
        let log = CallLog::default();
        let mut parser = nested_parser(&log);

        let code = parser.run(to_argv(&["tickets", "get", "42"])).unwrap();
        assert_eq!(code, 0);
        assert_eq!(log.entries(), ["tickets pre_command", "tickets get 42"]);
    }

    #[test]
    fn test_sibling_groups_dispatch_independently() {
        let log = CallLog::default();
        let mut parser = nested_parser(&log);

        assert_eq!(parser.run(to_argv(&["queues", "drain"])).unwrap(), 0);
        assert_eq!(log.entries(), ["queues drain"]);
    }

    #[test]
    fn test_unknown_group_is_a_usage_error() {
        let log = CallLog::default();
        let mut parser = nested_parser(&log);

        assert_eq!(parser.run(to_argv(&["users"])).unwrap(), EXIT_USAGE_ERROR);
    }

    #[test]
    fn test_group_help_exits_zero() {
        let log = CallLog::default();
        let mut parser = nested_parser(&log);

        assert_eq!(parser.run(to_argv(&["tickets", "-h"])).unwrap(), EXIT_SUCCESS);
        assert!(log.entries().is_empty());
    }

    // --- Registration coherence ---

    #[test]
    fn test_mixed_groups_are_rejected() {
        let log = CallLog::default();
        let mut parser = Parser::new().prog("prog");
        parser.register(TicketCommands::with_log(&log)).unwrap();

        let err = parser.register(TestCommands::with_log(&log)).unwrap_err();
        assert!(matches!(err, ConfigurationError::MixedGroups));
    }

    #[test]
    fn test_duplicate_group_names_are_rejected() {
        let log = CallLog::default();
        let mut parser = Parser::new().prog("prog");
        parser.register(TicketCommands::with_log(&log)).unwrap();

        let err = parser.register(TicketCommands::with_log(&log)).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateGroup(_)));
    }

    #[test]
    fn test_flat_cross_group_name_collision_is_rejected() {
        let log = CallLog::default();
        let mut parser = Parser::new().prog("prog");
        parser.register(TestCommands::with_log(&log)).unwrap();

        let err = parser.register(TestCommands::with_log(&log)).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateCommand(_)));
    }

    // --- Completion ---

    #[test]
    fn test_completion_candidates_flat() {
        let log = CallLog::default();
        let parser = flat_parser(&log);

        assert_eq!(
            parser.completion_candidates(None),
            ["hello", "return-non-zero", "explode"]
        );
    }

    #[test]
    fn test_completion_candidates_nested() {
        let log = CallLog::default();
        let parser = nested_parser(&log);

        assert_eq!(parser.completion_candidates(None), ["tickets", "queues"]);
        assert_eq!(parser.completion_candidates(Some("tickets")), ["get", "list"]);
        assert_eq!(
            parser.completion_candidates(Some("nonsense")),
            ["tickets", "queues"]
        );
    }

    #[test]
    fn test_completion_requests_exit_zero() {
        let log = CallLog::default();
        let mut parser = flat_parser(&log);

        assert_eq!(
            parser.run(to_argv(&["--bash-completion", "prog"])).unwrap(),
            EXIT_SUCCESS
        );
        assert_eq!(
            parser.run(to_argv(&["--bash-completion-script"])).unwrap(),
            EXIT_SUCCESS
        );
        assert!(log.entries().is_empty());
    }
}
