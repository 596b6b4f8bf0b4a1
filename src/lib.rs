// src/lib.rs

//! Declarative subcommand registration and dispatch.
//!
//! `subcmd` turns a set of handler methods declared on a *commands group*
//! type into a runnable CLI: per-command argument parsers, help text, and
//! a one- or two-level subcommand tree are all derived from the declared
//! metadata. Parsing itself is delegated to `clap`'s builder API; this
//! crate owns the registration model, the tree, and the dispatch rules.
//!
//! ```
//! use anyhow::Result;
//! use subcmd::{Command, CommandArgs, Commands, Opt, Parser, ValueKind};
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Greeter {
//!     fn hello(&mut self, args: &CommandArgs) -> Result<i32> {
//!         let name: String = args.get("name")?;
//!         let count: i64 = args.get("count")?;
//!         for _ in 0..count {
//!             println!("Hello, {name}");
//!         }
//!         Ok(0)
//!     }
//! }
//!
//! impl Commands for Greeter {
//!     fn commands() -> Vec<Command<Self>> {
//!         vec![
//!             Command::new("hello", Self::hello)
//!                 .about("Greet someone")
//!                 .opt(
//!                     Opt::new("--count")
//!                         .value_kind(ValueKind::Int)
//!                         .default_value("1")
//!                         .help("Number of greetings"),
//!                 )
//!                 .opt(Opt::new("name").help("Your name")),
//!         ]
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut parser = Parser::new().prog("demo").description("Demo application");
//! parser.register(Greeter)?;
//!
//! let code = parser.run(["hello", "world"])?;
//! assert_eq!(code, 0);
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod core;
pub mod models;

pub use crate::core::command::{Command, Handler};
pub use crate::core::dispatcher::Parser;
pub use crate::core::group::{Commands, ConfigurationError};
pub use crate::core::synth::CommandArgs;
pub use crate::models::{CommandSpec, Opt, OptAction, ValueKind};
