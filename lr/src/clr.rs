use grammar::{Element, Grammar, RuleId, TerminalId};
use bit_set::BitSet;
use crate::{Error, ParsingTable};
use crate::ffn::Ffn;
use crate::builder::LrCalculation;
use crate::item::{Lr1Item, LrItem};

pub enum ClrCalc {}

impl LrCalculation for ClrCalc {
  type Item = Lr1Item;

  fn start_item(
    start_rule: RuleId,
  ) -> Lr1Item {
    Lr1Item::new(start_rule, 0, Grammar::EOF)
  }

  fn closure_step<F>(
    grammar: &Grammar,
    ffn: &Ffn,
    prev: &Lr1Item,
    mut action: F
  )
    where F: FnMut(Lr1Item)
  {
    let symbol = match prev.next_element(grammar) {
      Some(Element::NonTerminal(symbol)) => symbol,
      _ => return,
    };

    // FIRST of whatever follows the symbol, then the item's own lookahead
    // if all of that can vanish
    let rest = &grammar.rule(prev.rule()).elements()[prev.position() + 1..];
    let mut first = BitSet::new();
    if ffn.first_of(grammar, rest, &mut first) {
      first.insert(prev.lookahead());
    }

    for &rule in grammar.rules_of(symbol) {
      for lookahead in first.iter() {
        action(Lr1Item::new(rule, 0, lookahead));
      }
    }
  }

  fn reduce_lookaheads<F>(
    _grammar: &Grammar,
    _ffn: &Ffn,
    item: &Lr1Item,
    mut action: F,
  ) -> Result<(), Error>
    where F: FnMut(TerminalId) -> Result<(), Error>
  {
    action(item.lookahead())
  }
}

/// Canonical LR(1) table, one state per distinct LR(1) item set.
pub fn build(grammar: &Grammar) -> Result<ParsingTable, Error> {
  let (collection, table) = crate::builder::build::<ClrCalc>(grammar)?;

  log::debug!("LR(1) table: {} states", collection.len());

  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_non_slr_grammar() {
    // the classic assignment grammar: SLR sees a shift-reduce conflict on
    // `=`, LR(1) lookaheads do not
    let grammar = grammar::build(r"
%start Z
Z -> S
S -> L `=` R
  | R
L -> `*` R
  | Identifier
R -> L
    ").unwrap();

    assert!(matches!(
      crate::slr::build(&grammar),
      Err(Error::ShiftReduceConflict(_))));
    assert!(build(&grammar).is_ok());
  }

  #[test]
  fn rejects_lr1_ambiguity() {
    let grammar = grammar::build(r"
%start S
S -> E
E -> E `+` E
  | Integer
    ").unwrap();

    assert!(matches!(build(&grammar), Err(Error::ShiftReduceConflict(_))));
  }
}
