//! Binary form of grammars.
//!
//! ```text
//! grammar := default-symbol \0 (symbol-name \0 rule* FF)* \0 \0
//! rule    := element+ FF
//! element := token-type:u8 element-type:u8 value \0
//! ```
//!
//! The empty rule is written as a single `Empty` element.

use thiserror::Error;
use crate::{Element, Grammar, GrammarError, Terminal, TokenType};

pub const END: u8 = 0xFF;

const TERMINAL_ANY: u8 = 0;
const TERMINAL_LITERAL: u8 = 1;
const NON_TERMINAL: u8 = 2;
const EMPTY: u8 = 3;
const END_OF_FILE: u8 = 4;
const EPSILON: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
  #[error("unexpected end of data at offset {0}")]
  UnexpectedEnd(usize),
  #[error("invalid UTF-8 string at offset {0}")]
  InvalidUtf8(usize),
  #[error("invalid {what} tag {tag:#04x} at offset {offset}")]
  InvalidTag {
    what: &'static str,
    tag: u8,
    offset: usize,
  },
  #[error("value {value} out of range at offset {offset}")]
  OutOfRange {
    value: i32,
    offset: usize,
  },
  #[error(transparent)]
  Grammar(#[from] GrammarError),
}

pub fn write_string(buf: &mut Vec<u8>, s: &str) {
  buf.extend_from_slice(s.as_bytes());
  buf.push(0);
}

pub fn write_i32(buf: &mut Vec<u8>, value: i32) {
  buf.extend_from_slice(&value.to_le_bytes());
}

pub fn write_element(buf: &mut Vec<u8>, element: &Element) {
  let (token_type, element_type, value) = match element {
    Element::Terminal(terminal) if terminal.is_eof() => {
      (TokenType::Special, END_OF_FILE, "")
    }
    Element::Terminal(terminal) if terminal.is_epsilon() => {
      (TokenType::Special, EPSILON, "")
    }
    Element::Terminal(terminal) => match terminal.value() {
      Some(value) => (terminal.token_type(), TERMINAL_LITERAL, value),
      None => (terminal.token_type(), TERMINAL_ANY, ""),
    },
    Element::NonTerminal(name) => (TokenType::Special, NON_TERMINAL, name.as_str()),
    Element::Empty => (TokenType::Special, EMPTY, ""),
  };

  buf.push(token_type as u8);
  buf.push(element_type);
  write_string(buf, value);
}

/// Writes the elements of a rule followed by the rule terminator.
pub fn write_rule_elements(buf: &mut Vec<u8>, elements: &[Element]) {
  if elements.is_empty() {
    write_element(buf, &Element::Empty);
  }
  for element in elements {
    write_element(buf, element);
  }
  buf.push(END);
}

pub fn write_grammar(grammar: &Grammar) -> Vec<u8> {
  let mut buf = vec![];
  write_string(&mut buf, grammar.default_symbol());

  for symbol in grammar.symbols() {
    write_string(&mut buf, symbol);
    for &rule in grammar.rules_of(symbol) {
      write_rule_elements(&mut buf, grammar.rule(rule).elements());
    }
    buf.push(END);
  }

  buf.extend_from_slice(&[0, 0]);
  buf
}

pub struct ByteReader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> ByteReader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Self {
      bytes,
      pos: 0,
    }
  }

  pub fn offset(&self) -> usize {
    self.pos
  }

  pub fn is_at_end(&self) -> bool {
    self.pos == self.bytes.len()
  }

  pub fn peek(&self) -> Option<u8> {
    self.bytes.get(self.pos).copied()
  }

  pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
    let byte = self.peek().ok_or(DecodeError::UnexpectedEnd(self.pos))?;
    self.pos += 1;
    Ok(byte)
  }

  pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
    let end = self.pos + 4;
    let bytes = self.bytes.get(self.pos..end)
      .ok_or(DecodeError::UnexpectedEnd(self.bytes.len()))?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    self.pos = end;
    Ok(i32::from_le_bytes(raw))
  }

  /// Reads a non-negative `i32` as an index or count.
  pub fn read_index(&mut self) -> Result<usize, DecodeError> {
    let offset = self.pos;
    let value = self.read_i32()?;
    if value < 0 {
      return Err(DecodeError::OutOfRange { value, offset });
    }
    Ok(value as usize)
  }

  pub fn read_string(&mut self) -> Result<String, DecodeError> {
    let start = self.pos;
    let len = self.bytes[start..]
      .iter()
      .position(|&b| b == 0)
      .ok_or(DecodeError::UnexpectedEnd(self.bytes.len()))?;
    let s = std::str::from_utf8(&self.bytes[start..start + len])
      .map_err(|_| DecodeError::InvalidUtf8(start))?;
    self.pos = start + len + 1;
    Ok(s.to_owned())
  }

  pub fn expect(&mut self, byte: u8, what: &'static str) -> Result<(), DecodeError> {
    let offset = self.pos;
    let tag = self.read_u8()?;
    if tag != byte {
      return Err(DecodeError::InvalidTag { what, tag, offset });
    }
    Ok(())
  }

  pub fn read_element(&mut self) -> Result<Element, DecodeError> {
    let offset = self.pos;
    let raw_type = self.read_u8()?;
    let token_type = TokenType::from_u8(raw_type).ok_or(DecodeError::InvalidTag {
      what: "token type",
      tag: raw_type,
      offset,
    })?;
    let element_offset = self.pos;
    let element_type = self.read_u8()?;
    let value = self.read_string()?;

    Ok(match element_type {
      TERMINAL_ANY => Element::Terminal(Terminal::any(token_type)),
      TERMINAL_LITERAL => Element::Terminal(Terminal::literal(token_type, value)),
      NON_TERMINAL => Element::NonTerminal(value),
      EMPTY => Element::Empty,
      END_OF_FILE => Element::Terminal(Terminal::eof()),
      EPSILON => Element::Terminal(Terminal::epsilon()),
      tag => {
        return Err(DecodeError::InvalidTag {
          what: "element type",
          tag,
          offset: element_offset,
        });
      }
    })
  }

  /// Reads elements up to and including the rule terminator.
  pub fn read_rule_elements(&mut self) -> Result<Vec<Element>, DecodeError> {
    let mut elements = vec![];
    loop {
      match self.peek() {
        Some(END) => {
          self.pos += 1;
          return Ok(elements);
        }
        Some(_) => elements.push(self.read_element()?),
        None => return Err(DecodeError::UnexpectedEnd(self.pos)),
      }
    }
  }
}

pub fn read_grammar(bytes: &[u8]) -> Result<Grammar, DecodeError> {
  let mut reader = ByteReader::new(bytes);
  let mut builder = Grammar::builder(reader.read_string()?);

  loop {
    let symbol = reader.read_string()?;
    if symbol.is_empty() {
      reader.expect(0, "grammar terminator")?;
      break;
    }

    loop {
      match reader.peek() {
        Some(END) => {
          reader.read_u8()?;
          break;
        }
        Some(_) => {
          let elements = reader.read_rule_elements()?;
          builder.rule(symbol.as_str(), elements);
        }
        None => return Err(DecodeError::UnexpectedEnd(reader.offset())),
      }
    }
  }

  Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  static EXPR: &str = r"
%start S
S -> E
E -> E `+` T
  | T
T -> Integer|Identifier
  | `(` E `)`
  | ()
  ";

  #[test]
  fn grammar_round_trip() {
    let grammar = crate::build(EXPR).unwrap();
    let bytes = write_grammar(&grammar);
    let decoded = read_grammar(&bytes).unwrap();

    assert_eq!(decoded.to_string(), grammar.to_string());
    assert_eq!(decoded.terminals(), grammar.terminals());
  }

  #[test]
  fn layout() {
    let grammar = crate::build("%start S\nS -> `if`\n").unwrap();
    let bytes = write_grammar(&grammar);

    assert_eq!(bytes, b"S\0S\0\x01\x01if\0\xff\xff\0\0".to_vec());
  }

  #[test]
  fn truncated() {
    let grammar = crate::build(EXPR).unwrap();
    let bytes = write_grammar(&grammar);

    for len in [0, 3, bytes.len() / 2, bytes.len() - 1] {
      assert!(read_grammar(&bytes[..len]).is_err(), "length {}", len);
    }
  }

  #[test]
  fn invalid_tags() {
    let err = read_grammar(b"S\0S\0\x09\x00\0\xff\xff\0\0").unwrap_err();
    assert_eq!(err, DecodeError::InvalidTag {
      what: "token type",
      tag: 9,
      offset: 4,
    });
  }
}
