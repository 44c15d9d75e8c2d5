use grammar::{Element, Grammar, Map, ProductionRule, RuleId, Terminal};
use crate::{Error, ShiftReduceConflictError, ReduceReduceConflictError};
use crate::ffn::Ffn;
use crate::item::LrItem;
use crate::table::{Action, ParsingTable};
use super::{CanonicalCollection, LrCalculation};

/// Collects actions and gotos, refusing to overwrite a cell with a
/// different entry.
pub struct TableBuilder {
  actions: Vec<Map<Terminal, Action>>,
  gotos: Vec<Map<String, usize>>,
  rules: Vec<ProductionRule>,
  slots: Map<RuleId, usize>,
}

impl TableBuilder {
  /// The start rule takes reduce slot 0.
  pub fn new(grammar: &Grammar, states: usize, start_rule: RuleId) -> Self {
    let mut builder = Self::with_rules(states, vec![]);
    builder.rule_slot(grammar, start_rule);
    builder
  }

  /// A builder whose reduce slots are already known, as when rows of an
  /// existing table are copied.
  pub fn with_rules(states: usize, rules: Vec<ProductionRule>) -> Self {
    Self {
      actions: vec![Map::default(); states],
      gotos: vec![Map::default(); states],
      rules,
      slots: Map::default(),
    }
  }

  pub fn rule_slot(&mut self, grammar: &Grammar, rule: RuleId) -> usize {
    if let Some(&slot) = self.slots.get(&rule) {
      slot
    } else {
      let slot = self.rules.len();
      self.rules.push(grammar.rule(rule).clone());
      self.slots.insert(rule, slot);
      slot
    }
  }

  /// `state_items` renders the state for the error report.
  pub fn set_action<F>(
    &mut self,
    state: usize,
    terminal: Terminal,
    action: Action,
    state_items: F,
  ) -> Result<(), Error>
    where F: FnOnce() -> Vec<String>
  {
    let old = match self.actions[state].get(&terminal) {
      None | Some(Action::Error) => {
        self.actions[state].insert(terminal, action);
        return Ok(());
      }
      Some(&old) if old == action => return Ok(()),
      Some(&old) => old,
    };

    Err(match (old, action) {
      (Action::Shift(_), Action::Reduce(rule)) | (Action::Reduce(rule), Action::Shift(_)) => {
        Error::ShiftReduceConflict(ShiftReduceConflictError {
          state,
          state_items: state_items(),
          shift: terminal.to_string(),
          reduce: self.rules[rule].to_string(),
        })
      }
      (Action::Reduce(rule1), Action::Reduce(rule2)) => {
        Error::ReduceReduceConflict(ReduceReduceConflictError {
          state,
          state_items: state_items(),
          lookahead: terminal.to_string(),
          reduce1: self.rules[rule1].to_string(),
          reduce2: self.rules[rule2].to_string(),
        })
      }
      _ => Error::ShiftShiftConflict {
        state,
        terminal: terminal.to_string(),
      },
    })
  }

  pub fn set_goto(&mut self, state: usize, symbol: &str, target: usize) -> Result<(), Error> {
    match self.gotos[state].get(symbol) {
      Some(&old) if old != target => Err(Error::GotoConflict {
        state,
        symbol: symbol.to_owned(),
      }),
      Some(_) => Ok(()),
      None => {
        self.gotos[state].insert(symbol.to_owned(), target);
        Ok(())
      }
    }
  }

  /// The rule in slot 0 becomes the table's default rule.
  pub fn finish(self, initial_state: usize) -> ParsingTable {
    ParsingTable::from_parts(initial_state, self.actions, self.gotos, self.rules, 0)
  }
}

/// Generates the ACTION and GOTO tables of a canonical collection. Reduce
/// lookaheads come from `T`: FOLLOW sets for SLR, item lookaheads for LR(1).
pub fn gen_table<T: LrCalculation>(
  grammar: &Grammar,
  ffn: &Ffn,
  collection: &CanonicalCollection<T::Item>,
  start_rule: RuleId,
) -> Result<ParsingTable, Error> {
  let mut builder = TableBuilder::new(grammar, collection.len(), start_rule);

  for state in 0..collection.len() {
    let row = collection.goto_row(state);

    for item in collection.items(state) {
      let element = item.next_element(grammar);
      match element {
        Some(Element::Terminal(terminal)) => {
          let target = row[&Element::Terminal(terminal.clone())];
          builder.set_action(
            state,
            terminal.clone(),
            Action::Shift(target),
            || collection.state_items(grammar, state))?;
        }
        Some(Element::NonTerminal(symbol)) => {
          let target = row[&Element::NonTerminal(symbol.clone())];
          builder.set_goto(state, symbol, target)?;
        }
        Some(Element::Empty) => {}
        None => {
          let slot = builder.rule_slot(grammar, item.rule());
          T::reduce_lookaheads(grammar, ffn, item, |lookahead| {
            builder.set_action(
              state,
              grammar.terminal(lookahead).clone(),
              Action::Reduce(slot),
              || collection.state_items(grammar, state))
          })?;
        }
      }
    }
  }

  Ok(builder.finish(0))
}

#[cfg(test)]
mod tests {
  use super::*;
  use grammar::TokenType;
  use pretty_assertions::assert_eq;

  fn grammar() -> Grammar {
    grammar::build(r"
%start S
S -> A
A -> `a`
  | `a` `b`
    ").unwrap()
  }

  #[test]
  fn same_action_twice_is_fine() {
    let grammar = grammar();
    let start = grammar.rules_of("S")[0];
    let mut builder = TableBuilder::new(&grammar, 2, start);
    let a = Terminal::literal(TokenType::Identifier, "a");

    builder.set_action(0, a.clone(), Action::Shift(1), Vec::new).unwrap();
    builder.set_action(0, a.clone(), Action::Shift(1), Vec::new).unwrap();
    builder.set_goto(0, "A", 1).unwrap();
    builder.set_goto(0, "A", 1).unwrap();

    let table = builder.finish(0);
    assert_eq!(table.action(0, &a), Action::Shift(1));
    assert_eq!(table.goto(0, "A"), Some(1));
    assert_eq!(table.default_rule().to_string(), "S -> A");
  }

  #[test]
  fn conflicts() {
    let grammar = grammar();
    let start = grammar.rules_of("S")[0];
    let short = grammar.rules_of("A")[0];
    let long = grammar.rules_of("A")[1];
    let mut builder = TableBuilder::new(&grammar, 2, start);
    let b = Terminal::literal(TokenType::Identifier, "b");
    let slot_short = builder.rule_slot(&grammar, short);
    let slot_long = builder.rule_slot(&grammar, long);

    builder.set_action(1, b.clone(), Action::Shift(0), Vec::new).unwrap();

    let err = builder.set_action(1, b.clone(), Action::Reduce(slot_short), || {
      vec!["A -> `a` .".to_owned()]
    }).unwrap_err();
    assert_eq!(err, Error::ShiftReduceConflict(ShiftReduceConflictError {
      state: 1,
      state_items: vec!["A -> `a` .".to_owned()],
      shift: "`b`".to_owned(),
      reduce: "A -> `a`".to_owned(),
    }));

    let err = builder.set_action(1, b.clone(), Action::Shift(1), Vec::new).unwrap_err();
    assert_eq!(err, Error::ShiftShiftConflict {
      state: 1,
      terminal: "`b`".to_owned(),
    });

    let eof = Terminal::eof();
    builder.set_action(1, eof.clone(), Action::Reduce(slot_short), Vec::new).unwrap();
    let err = builder.set_action(1, eof, Action::Reduce(slot_long), Vec::new).unwrap_err();
    assert!(matches!(err, Error::ReduceReduceConflict(ReduceReduceConflictError {
      state: 1,
      ref reduce1,
      ref reduce2,
      ..
    }) if reduce1 == "A -> `a`" && reduce2 == "A -> `a` `b`"));

    assert_eq!(builder.set_goto(0, "A", 0), Ok(()));
    assert_eq!(builder.set_goto(0, "A", 1), Err(Error::GotoConflict {
      state: 0,
      symbol: "A".to_owned(),
    }));
  }
}
