use std::fmt;
use grammar::{Element, Terminal};
use grammar::lex::Token;
use thiserror::Error;
use crate::{Action, ParsingTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Interior {
    rule: String,
    children: Vec<Node>,
  },
  Leaf(Token),
}

impl Node {
  /// The rule name of an interior node, the token text of a leaf.
  pub fn name(&self) -> &str {
    match self {
      Node::Interior { rule, .. } => rule,
      Node::Leaf(token) => &token.text,
    }
  }

  pub fn children(&self) -> &[Node] {
    match self {
      Node::Interior { children, .. } => children,
      Node::Leaf(_) => &[],
    }
  }

  pub fn token(&self) -> Option<&Token> {
    match self {
      Node::Leaf(token) => Some(token),
      Node::Interior { .. } => None,
    }
  }

  fn agrees_with(&self, element: &Element) -> bool {
    match (self, element) {
      (Node::Leaf(token), Element::Terminal(terminal)) => {
        terminal.matches(token.kind, &token.text)
      }
      (Node::Interior { rule, .. }, Element::NonTerminal(symbol)) => rule == symbol,
      _ => false,
    }
  }
}

/// S-expression form: `(E (T 1) + (T 2))`.
impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Node::Leaf(token) => f.write_str(&token.text),
      Node::Interior { rule, children } => {
        write!(f, "({}", rule)?;
        for child in children {
          write!(f, " {}", child)?;
        }
        f.write_str(")")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("unexpected {} at {line}:{column}, expected one of: {}", found_name(.found), .expected.join(", "))]
  UnexpectedToken {
    /// `None` at end of input.
    found: Option<Token>,
    line: usize,
    column: usize,
    expected: Vec<String>,
  },
  /// The table asked for a reduce the parse stack cannot satisfy.
  #[error("malformed table: state {state} reduces by `{rule}` at {line}:{column}, which does not match the parse stack")]
  MalformedTable {
    state: usize,
    rule: String,
    line: usize,
    column: usize,
  },
}

impl ParseError {
  pub fn position(&self) -> (usize, usize) {
    match self {
      ParseError::UnexpectedToken { line, column, .. }
        | ParseError::MalformedTable { line, column, .. } => (*line, *column),
    }
  }
}

fn found_name(found: &Option<Token>) -> String {
  match found {
    Some(token) => format!("{} `{}`", token.kind, token.text),
    None => "end of file".to_owned(),
  }
}

/// Runs the shift-reduce automaton over `tokens`. Returns the tree rooted at
/// the table's default rule.
pub fn parse<I>(table: &ParsingTable, tokens: I) -> Result<Node, ParseError>
  where I: IntoIterator<Item = Token>
{
  let mut tokens = tokens.into_iter();
  let mut token = tokens.next();
  // last position seen, reported for errors at end of input
  let mut position = (1, 1);
  let mut state = table.initial_state();
  // (state before the entry was pushed, node)
  let mut stack: Vec<(usize, Node)> = vec![];

  loop {
    if let Some(token) = &token {
      position = (token.line, token.column);
    }

    match lookup(table, state, token.as_ref()) {
      Action::Shift(next) => {
        let leaf = match token.take() {
          Some(leaf) => leaf,
          // there is no action on end of input besides reduce
          None => return Err(unexpected(table, state, None, position)),
        };
        log::trace!("shift {:?} `{}` -> {}", leaf.kind, leaf.text, next);
        stack.push((state, Node::Leaf(leaf)));
        state = next;
        token = tokens.next();
      }

      Action::Reduce(slot) => {
        let rule = table.rule(slot);
        let malformed = || ParseError::MalformedTable {
          state,
          rule: rule.to_string(),
          line: position.0,
          column: position.1,
        };

        let base = stack.len().checked_sub(rule.len()).ok_or_else(malformed)?;
        let state0 = stack.get(base).map_or(state, |(state0, _)| *state0);
        let children = stack.drain(base..)
          .map(|(_, node)| node)
          .collect::<Vec<_>>();
        if !children.iter().zip(rule.elements()).all(|(node, element)| node.agrees_with(element)) {
          return Err(malformed());
        }

        log::trace!("reduce {}", rule);
        let node = Node::Interior {
          rule: rule.name().to_owned(),
          children,
        };

        if slot == table.default_rule_index() && stack.is_empty() && token.is_none() {
          return Ok(node);
        }

        state = match table.goto(state0, rule.name()) {
          Some(next) => next,
          None => return Err(unexpected(table, state0, token, position)),
        };
        stack.push((state0, node));
      }

      Action::Error => return Err(unexpected(table, state, token, position)),
    }
  }
}

/// Exact terminal first, then the wildcard of the token's type.
fn lookup(table: &ParsingTable, state: usize, token: Option<&Token>) -> Action {
  match token {
    Some(token) => {
      match table.action(state, &Terminal::literal(token.kind, token.text.as_str())) {
        Action::Error => table.action(state, &Terminal::any(token.kind)),
        action => action,
      }
    }
    None => table.action(state, &Terminal::eof()),
  }
}

fn unexpected(
  table: &ParsingTable,
  state: usize,
  found: Option<Token>,
  position: (usize, usize),
) -> ParseError {
  let (line, column) = found.as_ref()
    .map(|token| (token.line, token.column))
    .unwrap_or(position);

  ParseError::UnexpectedToken {
    found,
    line,
    column,
    expected: table.expected(state),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use grammar::lex::tokenize;
  use pretty_assertions::assert_eq;

  fn table(input: &str) -> ParsingTable {
    crate::build(&grammar::build(input).unwrap(), crate::ParserKind::Slr).unwrap()
  }

  #[test]
  fn left_associative_tree() {
    let table = table(r"
%start S
S -> E
E -> E `+` T
  | T
T -> Integer
    ");

    let tree = parse(&table, tokenize("1 + 2 + 3").unwrap()).unwrap();
    assert_eq!(tree.to_string(), "(S (E (E (E (T 1)) + (T 2)) + (T 3)))");
  }

  #[test]
  fn empty_rules_produce_empty_nodes() {
    let table = table(r"
%start S
S -> L
L -> Integer L
  | ()
    ");

    let tree = parse(&table, tokenize("1 2").unwrap()).unwrap();
    assert_eq!(tree.to_string(), "(S (L 1 (L 2 (L))))");

    let tree = parse(&table, vec![]).unwrap();
    assert_eq!(tree.to_string(), "(S (L))");
  }

  #[test]
  fn literal_wins_over_wildcard() {
    let table = table(r"
%start S
S -> E
E -> Identifier `=` Integer
  | Identifier Operator Identifier
    ");

    let tree = parse(&table, tokenize("a = 1").unwrap()).unwrap();
    assert_eq!(tree.to_string(), "(S (E a = 1))");
    let tree = parse(&table, tokenize("a + b").unwrap()).unwrap();
    assert_eq!(tree.to_string(), "(S (E a + b))");
    assert!(parse(&table, tokenize("a = b").unwrap()).is_err());
  }

  #[test]
  fn dangling_operator_reports_end_of_file() {
    let table = table(r"
%start S
S -> E
E -> E `+` T
  | T
T -> Integer
    ");

    let err = parse(&table, tokenize("1 +").unwrap()).unwrap_err();
    assert_eq!(err, ParseError::UnexpectedToken {
      found: None,
      line: 1,
      column: 3,
      expected: vec!["Integer".to_owned()],
    });
    assert_eq!(err.to_string(), "unexpected end of file at 1:3, expected one of: Integer");
  }

  #[test]
  fn unexpected_token_position() {
    let table = table(r"
%start S
S -> E
E -> E `+` T
  | T
T -> Integer
    ");

    let err = parse(&table, tokenize("1 +\n  + 2").unwrap()).unwrap_err();
    match err {
      ParseError::UnexpectedToken { found: Some(token), line, column, .. } => {
        assert_eq!(token.text, "+");
        assert_eq!((line, column), (2, 3));
      }
      other => panic!("unexpected error {:?}", other),
    }
  }

  #[test]
  fn start_symbol_inside_the_grammar() {
    // accept only once the whole input is consumed
    let table = table(r"
%start S
S -> X
X -> `(` S `)`
  | Integer
    ");

    let tree = parse(&table, tokenize("((1))").unwrap()).unwrap();
    assert_eq!(tree.to_string(), "(S (X ( (S (X ( (S (X 1)) ))) )))");
  }

  #[test]
  fn inconsistent_table_is_an_error() {
    let table = table(r"
%start S
S -> Integer Integer
    ");

    // state 0 reduces by `S -> Integer Integer` before anything was shifted
    let reduce = Action::Reduce(table.default_rule_index());
    let actions = (0..table.state_count())
      .map(|state| {
        let mut row = table.actions(state).clone();
        if state == table.initial_state() {
          for action in row.values_mut() {
            if let Action::Shift(_) = action {
              *action = reduce;
            }
          }
        }
        row
      })
      .collect();
    let gotos = (0..table.state_count()).map(|state| table.gotos(state).clone()).collect();
    let broken = ParsingTable::from_parts(
      table.initial_state(),
      actions,
      gotos,
      table.rules().to_vec(),
      table.default_rule_index());

    let err = parse(&broken, tokenize("1 1").unwrap()).unwrap_err();
    assert!(matches!(err, ParseError::MalformedTable { line: 1, column: 1, .. }), "{:?}", err);
    assert_eq!(err.position(), (1, 1));
  }
}
