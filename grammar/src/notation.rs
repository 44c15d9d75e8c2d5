//! The grammar-as-data notation.
//!
//! A rule body is run through the Earle lexer in notation mode and read as a
//! list of elements:
//!
//! - `` `if` `` is a literal terminal; the text between the backticks is
//!   lexed again to find its token type.
//! - a bare name is a token type (`Identifier`, `Integer`, ...) if it names
//!   one, otherwise a non-terminal.
//! - `Integer|Float` is one element slot accepting either token type. The
//!   rule is expanded into one rule per alternative.
//! - `()` is the empty element.
//!
//! A document holds one rule per line:
//!
//! ```text
//! %start Program
//! Program -> Items
//! Items -> Item Items
//!   | ()
//! ```

use std::iter::Peekable;
use std::slice;
use crate::lex::{self, Token};
use crate::{Element, Grammar, GrammarError, Set, Terminal, TokenType};

type Tokens<'t> = Peekable<slice::Iter<'t, Token>>;

/// Parses a rule body, expanding alternations.
pub fn parse_rule(
  name: &str,
  text: &str,
  is_symbol: impl Fn(&str) -> bool,
) -> Result<Vec<Vec<Element>>, GrammarError> {
  let tokens = lex::tokenize_notation(text)
    .map_err(|err| invalid_literal(text.trim(), &err.to_string()))?;
  let mut tokens = tokens.iter().peekable();
  let mut expansions: Vec<Vec<Element>> = vec![vec![]];

  while let Some(token) = tokens.next() {
    let choices = parse_element(name, token, &mut tokens, &is_symbol)?;

    expansions = expansions.into_iter()
      .flat_map(|prefix| {
        choices.iter().map(move |choice| {
          let mut elements = prefix.clone();
          elements.push(choice.clone());
          elements
        })
      })
      .collect();
  }

  Ok(expansions)
}

fn parse_element(
  rule: &str,
  token: &Token,
  tokens: &mut Tokens,
  is_symbol: &impl Fn(&str) -> bool,
) -> Result<Vec<Element>, GrammarError> {
  match (token.kind, token.text.as_str()) {
    (TokenType::Special, "|") => Err(invalid_literal("|", "alternation without a left operand")),
    (TokenType::Special, quoted) => {
      let literal = &quoted[1..quoted.len() - 1];
      parse_literal(literal).map(|terminal| vec![Element::Terminal(terminal)])
    }
    (TokenType::Punctuation, "(") => match tokens.next() {
      Some(close) if close.text == ")" => Ok(vec![Element::Empty]),
      _ => Err(invalid_literal("(", "expected `()`")),
    },
    (TokenType::Identifier | TokenType::Keyword, word) => {
      if tokens.peek().map_or(false, |next| is_bar(next)) {
        return alternation(word, tokens);
      }

      if let Some(ty) = TokenType::from_name(word) {
        Ok(vec![Element::Terminal(Terminal::any(ty))])
      } else if is_symbol(word) {
        Ok(vec![Element::NonTerminal(word.to_owned())])
      } else {
        Err(GrammarError::UndefinedSymbol {
          symbol: word.to_owned(),
          rule: rule.to_owned(),
        })
      }
    }
    (_, text) => Err(invalid_literal(text, "literals must be quoted with backticks")),
  }
}

/// `A|B|...`, starting after `first`.
fn alternation(first: &str, tokens: &mut Tokens) -> Result<Vec<Element>, GrammarError> {
  let mut names = vec![first];
  while tokens.next_if(|next| is_bar(next)).is_some() {
    match tokens.next() {
      Some(name) if name.kind == TokenType::Identifier => names.push(&name.text),
      _ => return Err(invalid_literal(first, "alternation without a right operand")),
    }
  }

  names.into_iter()
    .map(|name| {
      TokenType::from_name(name)
        .map(|ty| Element::Terminal(Terminal::any(ty)))
        .ok_or_else(|| invalid_literal(name, "only token types can be alternated"))
    })
    .collect()
}

fn is_bar(token: &Token) -> bool {
  token.kind == TokenType::Special && token.text == "|"
}

fn parse_literal(literal: &str) -> Result<Terminal, GrammarError> {
  let tokens = lex::tokenize(literal)
    .map_err(|err| invalid_literal(literal, &err.to_string()))?;

  match tokens.as_slice() {
    [token] => Ok(Terminal::literal(token.kind, token.text.clone())),
    _ => Err(invalid_literal(literal, "must be exactly one token")),
  }
}

fn invalid_literal(literal: &str, message: &str) -> GrammarError {
  GrammarError::InvalidLiteral {
    literal: literal.to_owned(),
    message: message.to_owned(),
  }
}

/// Parses a whole grammar document.
pub fn parse_document(input: &str) -> Result<Grammar, GrammarError> {
  let mut start = None;
  let mut lines: Vec<(String, &str)> = vec![];

  for (i, line) in input.lines().enumerate() {
    let line_no = i + 1;
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
      continue;
    }

    if let Some(symbol) = line.strip_prefix("%start") {
      let symbol = symbol.trim();
      if !is_name(symbol) {
        return Err(syntax(line_no, "expected a symbol after %start"));
      }
      start = Some(symbol.to_owned());
    } else if let Some(body) = line.strip_prefix('|') {
      let name = match lines.last() {
        Some((name, _)) => name.clone(),
        None => return Err(syntax(line_no, "alternative without a rule")),
      };
      lines.push((name, body));
    } else if let Some((name, body)) = line.split_once("->") {
      let name = name.trim();
      if !is_name(name) {
        return Err(syntax(line_no, &format!("invalid rule name `{}`", name)));
      }
      lines.push((name.to_owned(), body));
    } else {
      return Err(syntax(line_no, "expected `Name -> elements`"));
    }
  }

  let start = start.ok_or(GrammarError::MissingStart)?;
  let symbols = lines.iter()
    .map(|(name, _)| name.as_str())
    .collect::<Set<_>>();

  let mut builder = Grammar::builder(start);
  for (name, body) in &lines {
    for elements in parse_rule(name, body, |s| symbols.contains(s))? {
      builder.rule(name.as_str(), elements);
    }
  }

  let grammar = builder.build()?;
  log::debug!(
    "grammar: {} symbols, {} rules, {} terminals",
    grammar.symbols().count(),
    grammar.rule_count(),
    grammar.terminals().len());

  Ok(grammar)
}

fn is_name(s: &str) -> bool {
  let mut chars = s.chars();
  chars.next().map_or(false, |c| c.is_alphabetic() || c == '_')
    && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '\'')
}

fn syntax(line: usize, message: &str) -> GrammarError {
  GrammarError::Syntax {
    line,
    message: message.to_owned(),
  }
}
