//! compute FIRST and FOLLOW sets.
//!
//! Sets hold terminal ids of the grammar. A FIRST set contains
//! [`Grammar::EPSILON`] when its symbol can derive the empty string.

use bit_set::BitSet;
use grammar::{Element, Grammar, Map, Terminal};

#[derive(Debug, Clone, Default)]
pub struct Ffn {
  pub first: Map<String, BitSet>,
  pub follow: Map<String, BitSet>,
  /// Number of full passes each fixpoint took, including the final one
  /// that changed nothing.
  pub first_passes: usize,
  pub follow_passes: usize,
}

pub fn compute(grammar: &Grammar) -> Ffn {
  let (first, first_passes) = compute_first(grammar);
  let (follow, follow_passes) = compute_follow(grammar, &first);

  log::debug!(
    "FIRST converged after {} passes, FOLLOW after {} passes",
    first_passes,
    follow_passes);

  Ffn {
    first,
    follow,
    first_passes,
    follow_passes,
  }
}

impl Ffn {
  /// Adds FIRST of `elements` (without epsilon) to `out`. Returns whether
  /// the whole sequence can vanish.
  pub fn first_of(
    &self,
    grammar: &Grammar,
    elements: &[Element],
    out: &mut BitSet,
  ) -> bool {
    sequence_first(grammar, &self.first, elements, out)
  }

  pub fn first_terminals<'g>(&self, grammar: &'g Grammar, symbol: &str) -> Vec<&'g Terminal> {
    terminals(grammar, self.first.get(symbol))
  }

  pub fn follow_terminals<'g>(&self, grammar: &'g Grammar, symbol: &str) -> Vec<&'g Terminal> {
    terminals(grammar, self.follow.get(symbol))
  }
}

fn terminals<'g>(grammar: &'g Grammar, set: Option<&BitSet>) -> Vec<&'g Terminal> {
  set.map(|set| set.iter().map(|id| grammar.terminal(id)).collect())
    .unwrap_or_default()
}

fn empty_sets(grammar: &Grammar) -> Map<String, BitSet> {
  grammar.symbols()
    .map(|symbol| (symbol.to_owned(), BitSet::new()))
    .collect()
}

fn sequence_first(
  grammar: &Grammar,
  first: &Map<String, BitSet>,
  elements: &[Element],
  out: &mut BitSet,
) -> bool {
  for element in elements {
    match element {
      Element::Terminal(terminal) => {
        out.insert(grammar.terminal_id(terminal));
        return false;
      }
      Element::NonTerminal(symbol) => {
        let symbol_first = &first[symbol.as_str()];
        out.extend(symbol_first.iter().filter(|&t| t != Grammar::EPSILON));
        if !symbol_first.contains(Grammar::EPSILON) {
          return false;
        }
      }
      Element::Empty => {}
    }
  }

  true
}

fn union_changed(set: &mut BitSet, other: &BitSet) -> bool {
  let before = set.len();
  set.union_with(other);
  set.len() != before
}

fn compute_first(grammar: &Grammar) -> (Map<String, BitSet>, usize) {
  let mut first = empty_sets(grammar);
  let mut passes = 0;

  loop {
    passes += 1;
    let mut changed = false;

    for (_, rule) in grammar.rules() {
      let mut rule_first = BitSet::new();
      if sequence_first(grammar, &first, rule.elements(), &mut rule_first) {
        rule_first.insert(Grammar::EPSILON);
      }

      if let Some(set) = first.get_mut(rule.name()) {
        changed |= union_changed(set, &rule_first);
      }
    }

    if !changed {
      break;
    }
  }

  (first, passes)
}

fn compute_follow(
  grammar: &Grammar,
  first: &Map<String, BitSet>,
) -> (Map<String, BitSet>, usize) {
  let mut follow = empty_sets(grammar);
  if let Some(set) = follow.get_mut(grammar.default_symbol()) {
    set.insert(Grammar::EOF);
  }

  let mut passes = 0;

  loop {
    passes += 1;
    let mut changed = false;

    for (_, rule) in grammar.rules() {
      let elements = rule.elements();

      for (i, element) in elements.iter().enumerate() {
        let symbol = match element {
          Element::NonTerminal(symbol) => symbol,
          _ => continue,
        };

        let mut trailing = BitSet::new();
        if sequence_first(grammar, first, &elements[i + 1..], &mut trailing) {
          trailing.union_with(&follow[rule.name()]);
        }

        if let Some(set) = follow.get_mut(symbol.as_str()) {
          changed |= union_changed(set, &trailing);
        }
      }
    }

    if !changed {
      break;
    }
  }

  (follow, passes)
}
