use std::fmt::{self, Debug, Write};
use std::hash::Hash;
use grammar::{Element, Grammar, Map, RuleId, TerminalId};

pub trait LrItem: Eq + Hash + Ord + Clone + Debug {
  fn rule(&self) -> RuleId;
  fn position(&self) -> usize;

  /// The same item with the cursor moved over one element.
  fn advance(&self) -> Self;

  /// The item without its lookahead.
  fn core(&self) -> Lr0Item {
    Lr0Item::new(self.rule(), self.position())
  }

  /// The element right after the cursor, `None` if the item is complete.
  fn next_element<'g>(&self, grammar: &'g Grammar) -> Option<&'g Element> {
    grammar.rule(self.rule()).elements().get(self.position())
  }

  fn fmt(
    &self,
    grammar: &Grammar,
    f: &mut impl Write,
  ) -> fmt::Result;

  fn to_string(
    &self,
    grammar: &Grammar,
  ) -> String {
    let mut s = String::new();
    LrItem::fmt(self, grammar, &mut s).unwrap();
    s
  }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Lr0Item {
  rule: RuleId,
  position: usize,
}

impl Lr0Item {
  pub fn new(rule: RuleId, position: usize) -> Self {
    Self {
      rule,
      position,
    }
  }
}

impl LrItem for Lr0Item {
  fn rule(&self) -> RuleId {
    self.rule
  }

  fn position(&self) -> usize {
    self.position
  }

  fn advance(&self) -> Self {
    Lr0Item {
      position: self.position + 1,
      ..*self
    }
  }

  fn fmt(
    &self,
    grammar: &Grammar,
    f: &mut impl Write,
  ) -> fmt::Result {
    fmt_core(grammar, self.rule, self.position, f)
  }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Lr1Item {
  rule: RuleId,
  position: usize,
  lookahead: TerminalId,
}

impl Lr1Item {
  pub fn new(rule: RuleId, position: usize, lookahead: TerminalId) -> Self {
    Self {
      rule,
      position,
      lookahead,
    }
  }

  pub fn lookahead(&self) -> TerminalId {
    self.lookahead
  }
}

impl LrItem for Lr1Item {
  fn rule(&self) -> RuleId {
    self.rule
  }

  fn position(&self) -> usize {
    self.position
  }

  fn advance(&self) -> Self {
    Lr1Item {
      position: self.position + 1,
      ..*self
    }
  }

  fn fmt(
    &self,
    grammar: &Grammar,
    f: &mut impl Write,
  ) -> fmt::Result {
    fmt_core(grammar, self.rule, self.position, f)?;
    write!(f, ", {}", grammar.terminal(self.lookahead))
  }
}

fn fmt_core(
  grammar: &Grammar,
  rule: RuleId,
  position: usize,
  f: &mut impl Write,
) -> fmt::Result {
  let rule = grammar.rule(rule);
  write!(f, "{} ->", rule.name())?;

  for (i, element) in rule.elements().iter().enumerate() {
    if i == position {
      write!(f, " .")?;
    }
    write!(f, " {}", element)?;
  }

  if position == rule.len() {
    write!(f, " .")?;
  }

  Ok(())
}

/// Interns items so that item sets can be kept as bit sets of ids.
#[derive(Debug, Clone)]
pub struct ItemStore<I> {
  items: Vec<I>,
  ids: Map<I, usize>,
}

impl<I: LrItem> ItemStore<I> {
  pub fn new() -> Self {
    Self {
      items: vec![],
      ids: Map::default(),
    }
  }

  pub fn store(&mut self, item: I) -> usize {
    if let Some(&id) = self.ids.get(&item) {
      id
    } else {
      let id = self.items.len();
      self.items.push(item.clone());
      self.ids.insert(item, id);
      id
    }
  }

  pub fn get(&self, id: usize) -> &I {
    &self.items[id]
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl<I: LrItem> Default for ItemStore<I> {
  fn default() -> Self {
    Self::new()
  }
}
