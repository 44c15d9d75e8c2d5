use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use bit_set::BitSet;
use grammar::{Grammar, Map};
use crate::builder::LrCalculation;
use crate::ffn::Ffn;
use crate::item::{ItemStore, LrItem};

/// A set of interned items. Equality and hashing only look at which items
/// are present.
pub struct Closure<I> {
  items: BitSet,
  _marker: PhantomData<I>,
}

impl<I> Closure<I> {
  pub fn from_ids(items: BitSet) -> Self {
    Self {
      items,
      _marker: PhantomData,
    }
  }

  pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
    self.items.iter()
  }

  pub fn contains(&self, id: usize) -> bool {
    self.items.contains(id)
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn as_bits(&self) -> &BitSet {
    &self.items
  }
}

impl<I> Clone for Closure<I> {
  fn clone(&self) -> Self {
    Self::from_ids(self.items.clone())
  }
}

impl<I> PartialEq for Closure<I> {
  fn eq(&self, other: &Self) -> bool {
    self.items == other.items
  }
}

impl<I> Eq for Closure<I> {}

impl<I> Hash for Closure<I> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.items.hash(state);
  }
}

impl<I> fmt::Debug for Closure<I> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.items.iter()).finish()
  }
}

/// Computes closures, memoizing the closure of every single seed item.
pub struct ClosureCache<'g, T: LrCalculation> {
  grammar: &'g Grammar,
  ffn: &'g Ffn,
  items: ItemStore<T::Item>,
  memo: Map<usize, BitSet>,
}

impl<'g, T: LrCalculation> ClosureCache<'g, T> {
  pub fn new(grammar: &'g Grammar, ffn: &'g Ffn) -> Self {
    Self {
      grammar,
      ffn,
      items: ItemStore::new(),
      memo: Map::default(),
    }
  }

  pub fn store(&mut self, item: T::Item) -> usize {
    self.items.store(item)
  }

  pub fn item(&self, id: usize) -> &T::Item {
    self.items.get(id)
  }

  pub fn items(&self) -> &ItemStore<T::Item> {
    &self.items
  }

  pub fn into_items(self) -> ItemStore<T::Item> {
    self.items
  }

  /// Number of memoized single-item closures.
  pub fn memoized(&self) -> usize {
    self.memo.len()
  }

  /// Closure of a single item.
  pub fn closure_of(&mut self, seed: usize) -> Closure<T::Item> {
    Closure::from_ids(self.seed_closure(seed).clone())
  }

  /// Closure of a set of items: the union of the closures of its members.
  pub fn closure(&mut self, kernel: &BitSet) -> Closure<T::Item> {
    let mut result = BitSet::new();
    for seed in kernel.iter() {
      result.union_with(self.seed_closure(seed));
    }
    Closure::from_ids(result)
  }

  fn seed_closure(&mut self, seed: usize) -> &BitSet {
    if !self.memo.contains_key(&seed) {
      let closure = self.compute(seed);
      self.memo.insert(seed, closure);
    }
    &self.memo[&seed]
  }

  fn compute(&mut self, seed: usize) -> BitSet {
    let mut result = BitSet::new();
    result.insert(seed);
    let mut new = vec![seed];

    while let Some(id) = new.pop() {
      let item = self.items.get(id).clone();
      let items = &mut self.items;

      T::closure_step(self.grammar, self.ffn, &item, |next| {
        let next = items.store(next);
        if result.insert(next) {
          new.push(next);
        }
      });
    }

    result
  }

  pub fn render(&self, closure: &Closure<T::Item>) -> Vec<String> {
    closure.ids()
      .map(|id| self.items.get(id).to_string(self.grammar))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clr::ClrCalc;
  use crate::slr::SlrCalc;
  use crate::item::{Lr0Item, Lr1Item};
  use pretty_assertions::assert_eq;

  static EXPR: &str = r"
%start S
S -> E
E -> E `+` T
  | T
T -> T `*` F
  | F
F -> `(` E `)`
  | Integer
  ";

  #[test]
  fn lr0_closure() {
    let grammar = grammar::build(EXPR).unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let mut cache = ClosureCache::<SlrCalc>::new(&grammar, &ffn);

    let start = cache.store(Lr0Item::new(grammar.rules_of("S")[0], 0));
    let closure = cache.closure_of(start);

    let mut items = cache.render(&closure);
    items.sort();
    assert_eq!(items, vec![
      "E -> . E `+` T",
      "E -> . T",
      "F -> . Integer",
      "F -> . `(` E `)`",
      "S -> . E",
      "T -> . F",
      "T -> . T `*` F",
    ]);
  }

  #[test]
  fn closure_is_idempotent() {
    let grammar = grammar::build(EXPR).unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let mut cache = ClosureCache::<ClrCalc>::new(&grammar, &ffn);

    let start = cache.store(Lr1Item::new(grammar.rules_of("S")[0], 0, Grammar::EOF));
    let once = cache.closure_of(start);
    let twice = cache.closure(once.as_bits());

    assert_eq!(once, twice);
  }

  #[test]
  fn equality_ignores_construction_order() {
    let grammar = grammar::build(EXPR).unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let mut cache = ClosureCache::<SlrCalc>::new(&grammar, &ffn);

    let e = grammar.rules_of("E")[0];
    let f = grammar.rules_of("F")[0];
    let a = cache.store(Lr0Item::new(e, 2));
    let b = cache.store(Lr0Item::new(f, 1));

    let forward = cache.closure(&[a, b].iter().copied().collect());
    let backward = cache.closure(&[b, a].iter().copied().collect());
    let mut separate = cache.closure_of(b).as_bits().clone();
    separate.union_with(cache.closure_of(a).as_bits());

    assert_eq!(forward, backward);
    assert_eq!(forward, Closure::from_ids(separate));
  }

  #[test]
  fn lr1_lookaheads_see_past_nullable_symbols() {
    let grammar = grammar::build(r"
%start S
S -> A B `c`
A -> `a`
B -> `b`
  | ()
    ").unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let mut cache = ClosureCache::<ClrCalc>::new(&grammar, &ffn);

    let start = cache.store(Lr1Item::new(grammar.rules_of("S")[0], 0, Grammar::EOF));
    let closure = cache.closure_of(start);

    let mut items = cache.render(&closure);
    items.sort();
    assert_eq!(items, vec![
      "A -> . `a`, `b`",
      "A -> . `a`, `c`",
      "S -> . A B `c`, $",
    ]);
  }

  #[test]
  fn seeds_are_memoized() {
    let grammar = grammar::build(EXPR).unwrap();
    let ffn = crate::ffn::compute(&grammar);
    let mut cache = ClosureCache::<SlrCalc>::new(&grammar, &ffn);

    let start = cache.store(Lr0Item::new(grammar.rules_of("S")[0], 0));
    cache.closure_of(start);
    let stored = cache.items().len();
    cache.closure_of(start);

    assert_eq!(cache.memoized(), 1);
    assert_eq!(cache.items().len(), stored);
  }
}
