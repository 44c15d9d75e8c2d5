//! The Earle tokenizer.

use thiserror::Error;
use crate::TokenType;

pub const KEYWORDS: &[&str] = &["function", "var", "if", "else", "while", "return"];

/// Longest first, so that `==` wins over `=`.
const OPERATORS: &[&str] = &[
  "==", "!=", "<=", ">=", "&&", "||",
  "+", "-", "*", "/", "%", "<", ">", "!", "=",
];

const PUNCTUATION: &str = "(){},;";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
  pub kind: TokenType,
  /// For string literals, the unescaped contents without quotes.
  pub text: String,
  pub line: usize,
  pub column: usize,
}

impl Token {
  pub fn new(kind: TokenType, text: impl Into<String>, line: usize, column: usize) -> Self {
    Self {
      kind,
      text: text.into(),
      line,
      column,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
  #[error("invalid character {ch:?} at {line}:{column}")]
  InvalidChar {
    ch: char,
    line: usize,
    column: usize,
  },
  #[error("unterminated string starting at {line}:{column}")]
  UnterminatedString {
    line: usize,
    column: usize,
  },
  #[error("invalid escape \\{ch} at {line}:{column}")]
  InvalidEscape {
    ch: char,
    line: usize,
    column: usize,
  },
}

pub struct Lexer<'a> {
  input: &'a str,
  pos: usize,
  line: usize,
  column: usize,
  notation: bool,
}

impl<'a> Lexer<'a> {
  pub fn new(input: &'a str) -> Self {
    Self {
      input,
      pos: 0,
      line: 1,
      column: 1,
      notation: false,
    }
  }

  /// Lexer for grammar rule bodies. Besides Earle tokens it yields
  /// `` `literal` `` spans (backticks kept) and `|` as `Special` tokens.
  pub fn notation(input: &'a str) -> Self {
    Self {
      notation: true,
      ..Self::new(input)
    }
  }

  fn rest(&self) -> &'a str {
    &self.input[self.pos..]
  }

  fn peek_char(&self) -> Option<char> {
    self.rest().chars().next()
  }

  fn advance(&mut self) -> Option<char> {
    let c = self.peek_char()?;
    self.pos += c.len_utf8();
    if c == '\n' {
      self.line += 1;
      self.column = 1;
    } else {
      self.column += 1;
    }
    Some(c)
  }

  fn advance_by(&mut self, len: usize) -> &'a str {
    let start = self.pos;
    while self.pos < start + len {
      self.advance();
    }
    &self.input[start..self.pos]
  }

  fn skip_trivia(&mut self) {
    loop {
      match self.peek_char() {
        Some(c) if c.is_whitespace() => {
          self.advance();
        }
        Some('/') if self.rest().starts_with("//") => {
          while let Some(c) = self.advance() {
            if c == '\n' {
              break;
            }
          }
        }
        _ => break,
      }
    }
  }

  fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
    let len = self.rest()
      .char_indices()
      .find(|&(_, c)| !pred(c))
      .map_or(self.rest().len(), |(i, _)| i);
    self.advance_by(len)
  }

  fn lex_number(&mut self, line: usize, column: usize) -> Token {
    let start = self.pos;
    self.take_while(|c| c.is_ascii_digit());

    let mut kind = TokenType::Integer;
    let mut fraction = self.rest().chars();
    if fraction.next() == Some('.') && fraction.next().map_or(false, |c| c.is_ascii_digit()) {
      self.advance();
      self.take_while(|c| c.is_ascii_digit());
      kind = TokenType::Float;
    }

    Token::new(kind, &self.input[start..self.pos], line, column)
  }

  fn lex_quoted(&mut self, line: usize, column: usize) -> Result<Token, LexError> {
    let start = self.pos;
    self.advance();
    self.take_while(|c| c != '`' && c != '\n');
    if self.peek_char() != Some('`') {
      return Err(LexError::UnterminatedString { line, column });
    }
    self.advance();
    Ok(Token::new(TokenType::Special, &self.input[start..self.pos], line, column))
  }

  fn lex_string(&mut self, line: usize, column: usize) -> Result<Token, LexError> {
    self.advance();
    let mut text = String::new();

    loop {
      match self.advance() {
        None | Some('\n') => {
          return Err(LexError::UnterminatedString { line, column });
        }
        Some('"') => break,
        Some('\\') => {
          let (esc_line, esc_column) = (self.line, self.column);
          match self.advance() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('"') => text.push('"'),
            Some('\\') => text.push('\\'),
            Some(ch) => {
              return Err(LexError::InvalidEscape {
                ch,
                line: esc_line,
                column: esc_column,
              });
            }
            None => return Err(LexError::UnterminatedString { line, column }),
          }
        }
        Some(c) => text.push(c),
      }
    }

    Ok(Token::new(TokenType::String, text, line, column))
  }
}

impl<'a> Iterator for Lexer<'a> {
  type Item = Result<Token, LexError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.skip_trivia();

    let c = self.peek_char()?;
    let (line, column) = (self.line, self.column);

    if c.is_ascii_digit() {
      return Some(Ok(self.lex_number(line, column)));
    }

    if c == '"' {
      return Some(self.lex_string(line, column));
    }

    if self.notation {
      match c {
        '`' => return Some(self.lex_quoted(line, column)),
        '|' => {
          let text = self.advance_by(1);
          return Some(Ok(Token::new(TokenType::Special, text, line, column)));
        }
        _ => {}
      }
    }

    if c.is_alphabetic() || c == '_' {
      // symbol names such as `E'` are allowed in grammar notation
      let primes = self.notation;
      let text = self.take_while(|c| c.is_alphanumeric() || c == '_' || (primes && c == '\''));
      let kind = if KEYWORDS.contains(&text) {
        TokenType::Keyword
      } else {
        TokenType::Identifier
      };
      return Some(Ok(Token::new(kind, text, line, column)));
    }

    if let Some(op) = OPERATORS.iter().find(|op| self.rest().starts_with(*op)) {
      let text = self.advance_by(op.len());
      return Some(Ok(Token::new(TokenType::Operator, text, line, column)));
    }

    if PUNCTUATION.contains(c) {
      let text = self.advance_by(c.len_utf8());
      return Some(Ok(Token::new(TokenType::Punctuation, text, line, column)));
    }

    self.advance();
    Some(Err(LexError::InvalidChar { ch: c, line, column }))
  }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
  Lexer::new(input).collect()
}

pub fn tokenize_notation(input: &str) -> Result<Vec<Token>, LexError> {
  Lexer::notation(input).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn kinds(input: &str) -> Vec<(TokenType, String)> {
    tokenize(input).unwrap()
      .into_iter()
      .map(|t| (t.kind, t.text))
      .collect()
  }

  #[test]
  fn statement() {
    assert_eq!(kinds("var a = 1 + 2.5;"), vec![
      (TokenType::Keyword, "var".to_owned()),
      (TokenType::Identifier, "a".to_owned()),
      (TokenType::Operator, "=".to_owned()),
      (TokenType::Integer, "1".to_owned()),
      (TokenType::Operator, "+".to_owned()),
      (TokenType::Float, "2.5".to_owned()),
      (TokenType::Punctuation, ";".to_owned()),
    ]);
  }

  #[test]
  fn longest_operator_wins() {
    assert_eq!(kinds("a==b<=c"), vec![
      (TokenType::Identifier, "a".to_owned()),
      (TokenType::Operator, "==".to_owned()),
      (TokenType::Identifier, "b".to_owned()),
      (TokenType::Operator, "<=".to_owned()),
      (TokenType::Identifier, "c".to_owned()),
    ]);
  }

  #[test]
  fn positions_and_comments() {
    let tokens = tokenize("// header\n  wait(0.1);\n").unwrap();
    assert_eq!(tokens[0], Token::new(TokenType::Identifier, "wait", 2, 3));
    assert_eq!(tokens[2], Token::new(TokenType::Float, "0.1", 2, 8));
  }

  #[test]
  fn string_escapes() {
    let tokens = tokenize(r#""a\"b\n""#).unwrap();
    assert_eq!(tokens, vec![Token::new(TokenType::String, "a\"b\n", 1, 1)]);
  }

  #[test]
  fn notation_tokens() {
    let tokens = tokenize_notation("E' -> `+`T|Integer ()").unwrap();
    let kinds = tokens.iter()
      .map(|t| (t.kind, t.text.as_str()))
      .collect::<Vec<_>>();
    assert_eq!(kinds, vec![
      (TokenType::Identifier, "E'"),
      (TokenType::Operator, "-"),
      (TokenType::Operator, ">"),
      (TokenType::Special, "`+`"),
      (TokenType::Identifier, "T"),
      (TokenType::Special, "|"),
      (TokenType::Identifier, "Integer"),
      (TokenType::Punctuation, "("),
      (TokenType::Punctuation, ")"),
    ]);
    assert_eq!(
      tokenize_notation("`if").unwrap_err(),
      LexError::UnterminatedString { line: 1, column: 1 });
    assert!(tokenize("a|b").is_err());
  }

  #[test]
  fn errors() {
    assert_eq!(
      tokenize("a # b").unwrap_err(),
      LexError::InvalidChar { ch: '#', line: 1, column: 3 });
    assert_eq!(
      tokenize("\"abc").unwrap_err(),
      LexError::UnterminatedString { line: 1, column: 1 });
  }
}
