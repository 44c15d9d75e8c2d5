use std::fmt::Write;
use std::path::Path;
use crate::{Error, ParseError, ReduceReduceConflictError, ShiftReduceConflictError};

/// Multi-line description of a table construction failure.
pub fn report(err: &Error) -> String {
  match err {
    Error::ShiftReduceConflict(err) => report_sr_conflict(err),
    Error::ReduceReduceConflict(err) => report_rr_conflict(err),
    err => format!("{}\n", err),
  }
}

fn report_rr_conflict(
  err: &ReduceReduceConflictError
) -> String {
  let mut buf = String::new();

  writeln!(&mut buf,
    "reduce-reduce conflict at state {}:\n", err.state
  ).unwrap();

  for item in &err.state_items {
    writeln!(&mut buf,
      "  {}", item,
    ).unwrap();
  }

  writeln!(&mut buf,
    "\nwhich can be reduced by:\n\n  {}\n\nor:\n\n  {}\n\nwhen the lookahead is {}",
    err.reduce1,
    err.reduce2,
    err.lookahead,
  ).unwrap();

  buf
}

fn report_sr_conflict(
  err: &ShiftReduceConflictError
) -> String {
  let mut buf = String::new();

  writeln!(&mut buf,
    "shift-reduce conflict at state {}:\n", err.state
  ).unwrap();

  for item in &err.state_items {
    writeln!(&mut buf,
      "  {}", item,
    ).unwrap();
  }

  writeln!(&mut buf,
    "\nwhich can shift {}\nor reduce by:\n\n  {}",
    err.shift,
    err.reduce,
  ).unwrap();

  buf
}

/// A parse error with the offending source line and a caret under the
/// column.
pub fn report_parse_error(
  path: impl AsRef<Path>,
  input: impl AsRef<str>,
  err: &ParseError,
) -> String {
  let (line, column) = err.position();
  let source = input.as_ref().lines().nth(line.saturating_sub(1)).unwrap_or("");

  let mut buf = String::new();
  writeln!(&mut buf,
    "syntax error at {}:{}:{}",
    path.as_ref().display(),
    line,
    column,
  ).unwrap();
  writeln!(&mut buf, "  {}", source).unwrap();
  writeln!(&mut buf, "  {}^", " ".repeat(column.saturating_sub(1))).unwrap();
  writeln!(&mut buf, "message: {}", err).unwrap();

  buf
}
