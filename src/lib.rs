//! Earle: a small scripting language compiled to bytecode and run on
//! cooperatively scheduled threads.

pub mod bytecode;
pub mod compiler;
pub mod error;
pub mod runtime;
pub mod vm;

use lr::{ParserKind, ParsingTable};

pub use error::{CompileError, RuntimeError, SetupError};
pub use runtime::{Invocation, Options, Runtime, ThreadId};
pub use vm::Value;

/// Earle's grammar, in the notation of [`grammar::notation`].
pub static GRAMMAR: &str = include_str!("earle.pg");

pub fn build_table(kind: ParserKind) -> Result<ParsingTable, SetupError> {
  let grammar = grammar::build(GRAMMAR)?;
  Ok(lr::build(&grammar, kind)?)
}
