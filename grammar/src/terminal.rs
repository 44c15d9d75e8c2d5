use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenType {
  Identifier = 0,
  Keyword = 1,
  Integer = 2,
  Float = 3,
  String = 4,
  Operator = 5,
  Punctuation = 6,
  /// Only carried by the epsilon and end-of-file terminals.
  Special = 7,
}

impl TokenType {
  /// Token types a grammar may name. `Special` is not one of them.
  pub const NAMED: [TokenType; 7] = [
    TokenType::Identifier,
    TokenType::Keyword,
    TokenType::Integer,
    TokenType::Float,
    TokenType::String,
    TokenType::Operator,
    TokenType::Punctuation,
  ];

  pub fn name(self) -> &'static str {
    match self {
      TokenType::Identifier => "Identifier",
      TokenType::Keyword => "Keyword",
      TokenType::Integer => "Integer",
      TokenType::Float => "Float",
      TokenType::String => "String",
      TokenType::Operator => "Operator",
      TokenType::Punctuation => "Punctuation",
      TokenType::Special => "Special",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    Self::NAMED.iter().copied().find(|ty| ty.name() == name)
  }

  pub fn from_u8(byte: u8) -> Option<Self> {
    if byte == TokenType::Special as u8 {
      Some(TokenType::Special)
    } else {
      Self::NAMED.get(byte as usize).copied()
    }
  }
}

impl fmt::Display for TokenType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TerminalKind {
  Default,
  Epsilon,
  EndOfFile,
}

/// A terminal symbol.
///
/// Equality is structural. A terminal without a value is a wildcard for its
/// token type; use [`Terminal::matches`] to test a token against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Terminal {
  kind: TerminalKind,
  token_type: TokenType,
  value: Option<String>,
}

impl Terminal {
  pub fn any(token_type: TokenType) -> Self {
    Self {
      kind: TerminalKind::Default,
      token_type,
      value: None,
    }
  }

  pub fn literal(token_type: TokenType, value: impl Into<String>) -> Self {
    Self {
      kind: TerminalKind::Default,
      token_type,
      value: Some(value.into()),
    }
  }

  pub fn epsilon() -> Self {
    Self {
      kind: TerminalKind::Epsilon,
      token_type: TokenType::Special,
      value: None,
    }
  }

  pub fn eof() -> Self {
    Self {
      kind: TerminalKind::EndOfFile,
      token_type: TokenType::Special,
      value: None,
    }
  }

  pub fn kind(&self) -> TerminalKind {
    self.kind
  }

  pub fn token_type(&self) -> TokenType {
    self.token_type
  }

  pub fn value(&self) -> Option<&str> {
    self.value.as_deref()
  }

  pub fn is_epsilon(&self) -> bool {
    self.kind == TerminalKind::Epsilon
  }

  pub fn is_eof(&self) -> bool {
    self.kind == TerminalKind::EndOfFile
  }

  pub fn is_wildcard(&self) -> bool {
    self.kind == TerminalKind::Default && self.value.is_none()
  }

  /// The wildcard terminal of the same token type.
  pub fn wildcard(&self) -> Terminal {
    Terminal {
      kind: self.kind,
      token_type: self.token_type,
      value: None,
    }
  }

  pub fn matches(&self, token_type: TokenType, text: &str) -> bool {
    self.kind == TerminalKind::Default
      && self.token_type == token_type
      && self.value.as_deref().map_or(true, |value| value == text)
  }
}

impl fmt::Display for Terminal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.kind, &self.value) {
      (TerminalKind::EndOfFile, _) => f.write_str("$"),
      (TerminalKind::Epsilon, _) => f.write_str("()"),
      (TerminalKind::Default, Some(value)) => write!(f, "`{}`", value),
      (TerminalKind::Default, None) => f.write_str(self.token_type.name()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wildcard_matches_any_value() {
    let any = Terminal::any(TokenType::Identifier);
    assert!(any.matches(TokenType::Identifier, "foo"));
    assert!(any.matches(TokenType::Identifier, "bar"));
    assert!(!any.matches(TokenType::Keyword, "if"));
  }

  #[test]
  fn literal_matches_exact_value() {
    let kw = Terminal::literal(TokenType::Keyword, "if");
    assert!(kw.matches(TokenType::Keyword, "if"));
    assert!(!kw.matches(TokenType::Keyword, "else"));
    assert_ne!(kw, kw.wildcard());
    assert_eq!(kw.wildcard(), Terminal::any(TokenType::Keyword));
  }

  #[test]
  fn special_terminals_match_nothing() {
    assert!(!Terminal::eof().matches(TokenType::Special, ""));
    assert!(!Terminal::epsilon().matches(TokenType::Special, ""));
    assert_eq!(Terminal::eof().to_string(), "$");
  }

  #[test]
  fn token_type_bytes() {
    for ty in TokenType::NAMED.iter().copied() {
      assert_eq!(TokenType::from_u8(ty as u8), Some(ty));
      assert_eq!(TokenType::from_name(ty.name()), Some(ty));
    }
    assert_eq!(TokenType::from_u8(7), Some(TokenType::Special));
    assert_eq!(TokenType::from_u8(0xff), None);
  }
}
