use grammar::Grammar;
use thiserror::Error;

pub mod ffn;
pub mod item;
pub mod closure;
pub mod builder;
pub mod table;
pub mod slr;
pub mod clr;
pub mod lalr;
pub mod parse;
pub mod serialize;
pub mod report;

pub use table::{Action, ParsingTable};
pub use parse::{parse, Node, ParseError};
pub use grammar::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
  Slr,
  /// Canonical LR(1), without state merging.
  Clr,
  Lalr,
}

impl ParserKind {
  pub fn from_name(name: &str) -> Option<Self> {
    match name.to_ascii_lowercase().as_str() {
      "slr" => Some(ParserKind::Slr),
      "clr" | "lr" => Some(ParserKind::Clr),
      "lalr" => Some(ParserKind::Lalr),
      _ => None,
    }
  }
}

impl Default for ParserKind {
  fn default() -> Self {
    ParserKind::Lalr
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("default symbol `{symbol}` must have exactly one rule, found {count}")]
  StartRule {
    symbol: String,
    count: usize,
  },
  #[error("grammar is ambiguous: shift-reduce conflict in state {} on {}", .0.state, .0.shift)]
  ShiftReduceConflict(ShiftReduceConflictError),
  #[error("grammar is ambiguous: reduce-reduce conflict in state {} on {}", .0.state, .0.lookahead)]
  ReduceReduceConflict(ReduceReduceConflictError),
  #[error("conflicting shifts in state {state} on {terminal}")]
  ShiftShiftConflict {
    state: usize,
    terminal: String,
  },
  #[error("conflicting gotos in state {state} on {symbol}")]
  GotoConflict {
    state: usize,
    symbol: String,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftReduceConflictError {
  pub state: usize,
  pub state_items: Vec<String>,
  pub shift: String,
  pub reduce: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceReduceConflictError {
  pub state: usize,
  pub state_items: Vec<String>,
  pub lookahead: String,
  pub reduce1: String,
  pub reduce2: String,
}

pub fn build(grammar: &Grammar, kind: ParserKind) -> Result<ParsingTable, Error> {
  match kind {
    ParserKind::Slr => slr::build(grammar),
    ParserKind::Clr => clr::build(grammar),
    ParserKind::Lalr => lalr::build(grammar),
  }
}
