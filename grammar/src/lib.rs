pub mod lex;
pub mod notation;
pub mod serialize;
mod grammar;
mod terminal;

pub use self::grammar::*;
pub use self::terminal::*;
pub use serialize::DecodeError;

use thiserror::Error;

pub type Map<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;

pub type Set<K> = indexmap::IndexSet<K, fnv::FnvBuildHasher>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
  #[error("line {line}: {message}")]
  Syntax {
    line: usize,
    message: String,
  },
  #[error("undefined symbol `{symbol}` in a rule of `{rule}`")]
  UndefinedSymbol {
    symbol: String,
    rule: String,
  },
  #[error("default symbol `{0}` has no rules")]
  UndefinedDefault(String),
  #[error("missing %start declaration")]
  MissingStart,
  #[error("invalid literal `{literal}`: {message}")]
  InvalidLiteral {
    literal: String,
    message: String,
  },
}

/// Builds a grammar from its textual form. See [`notation`] for the format.
pub fn build(input: &str) -> Result<Grammar, GrammarError> {
  notation::parse_document(input)
}
