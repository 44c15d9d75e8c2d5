use grammar::lex::LexError;
use grammar::{DecodeError, GrammarError};
use lr::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
  #[error(transparent)]
  Lex(#[from] LexError),
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error("unknown operator `{operator}` at {line}:{column}")]
  UnknownOperator {
    operator: String,
    line: usize,
    column: usize,
  },
  #[error("function `{name}` is already defined (line {line})")]
  DuplicateFunction {
    name: String,
    line: usize,
  },
  #[error("invalid literal `{text}` at {line}:{column}: {message}")]
  InvalidLiteral {
    text: String,
    line: usize,
    column: usize,
    message: String,
  },
  #[error("too many arguments in call to `{name}` (line {line})")]
  TooManyArguments {
    name: String,
    line: usize,
  },
  #[error("unsupported construct `{0}`")]
  Unsupported(String),
}

impl CompileError {
  /// Source position, when the error has one.
  pub fn position(&self) -> Option<(usize, usize)> {
    match self {
      CompileError::Lex(LexError::InvalidChar { line, column, .. })
        | CompileError::Lex(LexError::UnterminatedString { line, column })
        | CompileError::Lex(LexError::InvalidEscape { line, column, .. })
        | CompileError::UnknownOperator { line, column, .. }
        | CompileError::InvalidLiteral { line, column, .. } => Some((*line, *column)),
      CompileError::Parse(err) => Some(err.position()),
      CompileError::DuplicateFunction { line, .. }
        | CompileError::TooManyArguments { line, .. } => Some((*line, 1)),
      CompileError::Unsupported(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
  #[error("unknown opcode {opcode:#04x} at offset {offset}")]
  UnknownOpcode {
    opcode: u8,
    offset: usize,
  },
  #[error("truncated instruction at offset {0}")]
  Truncated(usize),
  #[error("call to undefined function `{name}`{}", at_line(.line))]
  UndefinedFunction {
    name: String,
    line: Option<usize>,
  },
  #[error("`{name}` takes {expected} arguments, got {found}{}", at_line(.line))]
  ArityMismatch {
    name: String,
    expected: usize,
    found: usize,
    line: Option<usize>,
  },
  #[error("calling `{name}` exceeds the maximum call depth of {depth}")]
  CallDepthExceeded {
    name: String,
    depth: usize,
  },
  #[error("undefined variable `{0}`")]
  UndefinedVariable(String),
  #[error("type mismatch: {0}")]
  TypeMismatch(String),
  #[error("unknown operator `{0}`")]
  UnknownOperator(String),
  #[error("operand stack underflow")]
  StackUnderflow,
  #[error("division by zero")]
  DivisionByZero,
}

fn at_line(line: &Option<usize>) -> String {
  match line {
    Some(line) => format!(" at line {}", line),
    None => String::new(),
  }
}

/// Failure to set up a runtime's parsing table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
  #[error(transparent)]
  Grammar(#[from] GrammarError),
  #[error(transparent)]
  Table(#[from] lr::Error),
  #[error("invalid cached table: {0}")]
  Decode(#[from] DecodeError),
}
