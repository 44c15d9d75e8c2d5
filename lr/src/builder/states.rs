use std::collections::BTreeSet;
use std::fmt::{self, Write};
use bit_set::BitSet;
use grammar::{Element, Grammar, Map, RuleId};
use itertools::Itertools;
use crate::closure::{Closure, ClosureCache};
use crate::ffn::Ffn;
use crate::item::{ItemStore, Lr0Item, LrItem};
use super::LrCalculation;

/// Transitions out of one state: element -> index of the target state.
pub type GotoRow = Map<Element, usize>;

/// Every state reachable from the start item, in discovery order. State 0
/// holds the start item.
pub struct CanonicalCollection<I> {
  states: Map<Closure<I>, GotoRow>,
  items: ItemStore<I>,
}

pub fn canonical_collection<T: LrCalculation>(
  grammar: &Grammar,
  ffn: &Ffn,
  start_rule: RuleId,
) -> CanonicalCollection<T::Item> {
  let mut cache = ClosureCache::<T>::new(grammar, ffn);
  let start = cache.store(T::start_item(start_rule));

  let mut states = Map::<Closure<T::Item>, GotoRow>::default();
  states.insert(cache.closure_of(start), GotoRow::default());

  let mut next = 0;
  while next < states.len() {
    let closure = match states.get_index(next) {
      Some((closure, _)) => closure.clone(),
      None => break,
    };

    let mut kernels = Map::<Element, BitSet>::default();
    for id in closure.ids() {
      let item = cache.item(id).clone();
      if let Some(element) = item.next_element(grammar) {
        let advanced = cache.store(item.advance());
        kernels.entry(element.clone()).or_default().insert(advanced);
      }
    }

    let mut row = GotoRow::default();
    for (element, kernel) in kernels {
      let target = cache.closure(&kernel);
      let index = match states.get_index_of(&target) {
        Some(index) => index,
        None => states.insert_full(target, GotoRow::default()).0,
      };
      row.insert(element, index);
    }

    if let Some((_, slot)) = states.get_index_mut(next) {
      *slot = row;
    }
    next += 1;
  }

  log::debug!(
    "canonical collection: {} states, {} items, {} memoized closures",
    states.len(),
    cache.items().len(),
    cache.memoized());

  CanonicalCollection {
    states,
    items: cache.into_items(),
  }
}

impl<I: LrItem> CanonicalCollection<I> {
  pub fn len(&self) -> usize {
    self.states.len()
  }

  pub fn is_empty(&self) -> bool {
    self.states.is_empty()
  }

  /// # Panics
  ///
  /// If `state` is out of range.
  pub fn closure(&self, state: usize) -> &Closure<I> {
    match self.states.get_index(state) {
      Some((closure, _)) => closure,
      None => panic!("state {} out of range", state),
    }
  }

  pub fn goto_row(&self, state: usize) -> &GotoRow {
    &self.states[state]
  }

  pub fn items(&self, state: usize) -> impl Iterator<Item = &I> + '_ {
    self.closure(state).ids().map(move |id| self.items.get(id))
  }

  /// The state's items with lookaheads dropped.
  pub fn core(&self, state: usize) -> BTreeSet<Lr0Item> {
    self.items(state).map(|item| item.core()).collect()
  }

  pub fn state_items(&self, grammar: &Grammar, state: usize) -> Vec<String> {
    self.items(state)
      .map(|item| item.to_string(grammar))
      .sorted()
      .collect()
  }

  /// Every state with its sorted items and transitions.
  pub fn fmt_states(&self, grammar: &Grammar, f: &mut impl Write) -> fmt::Result {
    for (state, row) in self.states.values().enumerate() {
      writeln!(f, "State {}", state)?;
      for item in self.state_items(grammar, state) {
        writeln!(f, "  {}", item)?;
      }
      for (element, target) in row {
        writeln!(f, "  {} => {}", element, target)?;
      }
      writeln!(f)?;
    }

    Ok(())
  }

  pub fn to_string(&self, grammar: &Grammar) -> String {
    let mut s = String::new();
    let _ = self.fmt_states(grammar, &mut s);
    s
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builder::start_rule;
  use crate::clr::ClrCalc;
  use crate::slr::SlrCalc;
  use insta::assert_snapshot;

  #[test]
  fn lr0_states() {
    let grammar = grammar::build(r"
%start S
S -> E
E -> `(` E `)`
  | Integer
    ").unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let start = start_rule(&grammar).unwrap();
    let collection = canonical_collection::<SlrCalc>(&grammar, &ffn, start);

    assert_snapshot!(collection.to_string(&grammar).trim_end(), @r###"
    State 0
      E -> . Integer
      E -> . `(` E `)`
      S -> . E
      E => 1
      `(` => 2
      Integer => 3

    State 1
      S -> E .

    State 2
      E -> . Integer
      E -> . `(` E `)`
      E -> `(` . E `)`
      `(` => 2
      Integer => 3
      E => 4

    State 3
      E -> Integer .

    State 4
      E -> `(` E . `)`
      `)` => 5

    State 5
      E -> `(` E `)` .
    "###);
  }

  #[test]
  fn lr1_states_split_by_lookahead() {
    let grammar = grammar::build(r"
%start S
S -> E
E -> `(` E `)`
  | Integer
    ").unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let start = start_rule(&grammar).unwrap();
    let lr0 = canonical_collection::<SlrCalc>(&grammar, &ffn, start);
    let lr1 = canonical_collection::<ClrCalc>(&grammar, &ffn, start);

    assert!(lr1.len() > lr0.len());

    let cores = (0..lr1.len())
      .map(|state| lr1.core(state))
      .collect::<std::collections::HashSet<_>>();
    assert_eq!(cores.len(), lr0.len());
  }

  #[test]
  fn transitions_point_to_known_states() {
    let grammar = grammar::build(include_str!("../../../src/earle.pg")).unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let start = start_rule(&grammar).unwrap();
    let collection = canonical_collection::<SlrCalc>(&grammar, &ffn, start);

    for state in 0..collection.len() {
      for &target in collection.goto_row(state).values() {
        assert!(target < collection.len());
      }
    }
  }
}
