use grammar::{Grammar, RuleId, TerminalId};
use crate::Error;
use crate::ffn::Ffn;
use crate::item::LrItem;
use crate::table::ParsingTable;

mod states;
mod tables;

pub use states::{canonical_collection, CanonicalCollection, GotoRow};
pub use tables::{gen_table, TableBuilder};

/// What distinguishes one LR construction from another: the kind of items,
/// how a closure grows and which lookaheads a complete item reduces on.
pub trait LrCalculation {
  type Item: LrItem;

  fn start_item(
    start_rule: RuleId,
  ) -> Self::Item;

  /// Calls `action` with every item directly implied by `prev`.
  fn closure_step<F>(
    grammar: &Grammar,
    ffn: &Ffn,
    prev: &Self::Item,
    action: F,
  )
    where F: FnMut(Self::Item);

  fn reduce_lookaheads<F>(
    grammar: &Grammar,
    ffn: &Ffn,
    item: &Self::Item,
    action: F,
  ) -> Result<(), Error>
    where F: FnMut(TerminalId) -> Result<(), Error>;
}

/// The only rule of the default symbol.
pub fn start_rule(grammar: &Grammar) -> Result<RuleId, Error> {
  match grammar.rules_of(grammar.default_symbol()) {
    [rule] => Ok(*rule),
    rules => Err(Error::StartRule {
      symbol: grammar.default_symbol().to_owned(),
      count: rules.len(),
    }),
  }
}

/// Builds the canonical collection and its table.
pub fn build<T: LrCalculation>(
  grammar: &Grammar,
) -> Result<(CanonicalCollection<T::Item>, ParsingTable), Error> {
  let start = start_rule(grammar)?;
  let ffn = crate::ffn::compute(grammar);
  let collection = canonical_collection::<T>(grammar, &ffn, start);
  let table = gen_table::<T>(grammar, &ffn, &collection, start)?;

  Ok((collection, table))
}
