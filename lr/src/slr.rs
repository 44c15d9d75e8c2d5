use grammar::{Element, Grammar, RuleId, TerminalId};
use crate::{Error, ParsingTable};
use crate::ffn::Ffn;
use crate::builder::LrCalculation;
use crate::item::{Lr0Item, LrItem};

pub enum SlrCalc {}

impl LrCalculation for SlrCalc {
  type Item = Lr0Item;

  fn start_item(
    start_rule: RuleId,
  ) -> Lr0Item {
    Lr0Item::new(start_rule, 0)
  }

  fn closure_step<F>(
    grammar: &Grammar,
    _ffn: &Ffn,
    prev: &Lr0Item,
    mut action: F
  )
    where F: FnMut(Lr0Item)
  {
    if let Some(Element::NonTerminal(symbol)) = prev.next_element(grammar) {
      for &rule in grammar.rules_of(symbol) {
        action(Lr0Item::new(rule, 0));
      }
    }
  }

  fn reduce_lookaheads<F>(
    grammar: &Grammar,
    ffn: &Ffn,
    item: &Lr0Item,
    action: F,
  ) -> Result<(), Error>
    where F: FnMut(TerminalId) -> Result<(), Error>
  {
    let name = grammar.rule(item.rule()).name();
    ffn.follow[name].iter().try_for_each(action)
  }
}

pub fn build(grammar: &Grammar) -> Result<ParsingTable, Error> {
  let (collection, table) = crate::builder::build::<SlrCalc>(grammar)?;

  log::debug!("SLR table: {} states", collection.len());

  Ok(table)
}
