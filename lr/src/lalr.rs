//! LALR(1) tables by merging the states of the canonical LR(1) collection
//! that share a core.
//!
//! Every merged row goes back through [`TableBuilder`], so a merge that
//! puts two different actions into one cell fails the same way the
//! canonical construction would.

use std::collections::BTreeSet;
use grammar::{Grammar, Map};
use crate::{Action, Error, ParsingTable};
use crate::builder::{CanonicalCollection, TableBuilder};
use crate::clr::ClrCalc;
use crate::item::{Lr0Item, Lr1Item};

pub fn build(grammar: &Grammar) -> Result<ParsingTable, Error> {
  let (collection, canonical) = crate::builder::build::<ClrCalc>(grammar)?;
  merge(grammar, &collection, &canonical)
}

fn merge(
  grammar: &Grammar,
  collection: &CanonicalCollection<Lr1Item>,
  canonical: &ParsingTable,
) -> Result<ParsingTable, Error> {
  // core -> canonical states, in order of first appearance
  let mut cores = Map::<BTreeSet<Lr0Item>, Vec<usize>>::default();
  for state in 0..collection.len() {
    cores.entry(collection.core(state)).or_default().push(state);
  }

  let mut representative = vec![0; collection.len()];
  for (merged, (_, states)) in cores.iter().enumerate() {
    for &state in states {
      representative[state] = merged;
    }
  }

  let merged_items = |merged: usize| -> Vec<String> {
    let mut items = cores[merged].iter()
      .flat_map(|&state| collection.state_items(grammar, state))
      .collect::<Vec<_>>();
    items.sort();
    items.dedup();
    items
  };

  let mut builder = TableBuilder::with_rules(cores.len(), canonical.rules().to_vec());

  for state in 0..canonical.state_count() {
    let merged = representative[state];

    for (terminal, &action) in canonical.actions(state) {
      let action = match action {
        Action::Shift(target) => Action::Shift(representative[target]),
        action => action,
      };
      builder.set_action(merged, terminal.clone(), action, || merged_items(merged))?;
    }

    for (symbol, &target) in canonical.gotos(state) {
      builder.set_goto(merged, symbol, representative[target])?;
    }
  }

  log::debug!(
    "LALR: merged {} LR(1) states into {}",
    collection.len(),
    cores.len());

  Ok(builder.finish(representative[canonical.initial_state()]))
}
