use std::fmt;
use crate::{GrammarError, Map, Set, Terminal};

/// Index of a terminal in [`Grammar::terminals`].
pub type TerminalId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
  Terminal(Terminal),
  NonTerminal(String),
  Empty,
}

impl fmt::Display for Element {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Element::Terminal(terminal) => write!(f, "{}", terminal),
      Element::NonTerminal(name) => f.write_str(name),
      Element::Empty => f.write_str("()"),
    }
  }
}

/// Identity of a rule inside its grammar. Two textually equal rules of the
/// same grammar have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRule {
  name: String,
  elements: Vec<Element>,
}

impl ProductionRule {
  /// `Element::Empty` is dropped: the empty rule has no elements.
  pub fn new(name: impl Into<String>, elements: Vec<Element>) -> Self {
    Self {
      name: name.into(),
      elements: elements.into_iter()
        .filter(|element| *element != Element::Empty)
        .collect(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn elements(&self) -> &[Element] {
    &self.elements
  }

  pub fn len(&self) -> usize {
    self.elements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }
}

impl fmt::Display for ProductionRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.name)?;
    if self.elements.is_empty() {
      return f.write_str(" ()");
    }
    for element in &self.elements {
      write!(f, " {}", element)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone)]
pub struct Grammar {
  rules: Vec<ProductionRule>,
  symbols: Map<String, Vec<RuleId>>,
  terminals: Set<Terminal>,
  default_symbol: String,
}

impl Grammar {
  pub const EOF: TerminalId = 0;
  pub const EPSILON: TerminalId = 1;

  pub fn builder(default_symbol: impl Into<String>) -> GrammarBuilder {
    GrammarBuilder {
      default_symbol: default_symbol.into(),
      rules: vec![],
    }
  }

  pub fn default_symbol(&self) -> &str {
    &self.default_symbol
  }

  pub fn rule(&self, id: RuleId) -> &ProductionRule {
    &self.rules[id.index()]
  }

  pub fn rules(&self) -> impl Iterator<Item = (RuleId, &ProductionRule)> {
    self.rules.iter()
      .enumerate()
      .map(|(i, rule)| (RuleId(i as u32), rule))
  }

  pub fn rule_count(&self) -> usize {
    self.rules.len()
  }

  /// Symbols in the order of their first rule.
  pub fn symbols(&self) -> impl Iterator<Item = &str> {
    self.symbols.keys().map(|s| s.as_str())
  }

  pub fn rules_of(&self, symbol: &str) -> &[RuleId] {
    self.symbols.get(symbol)
      .map(|rules| rules.as_slice())
      .unwrap_or(&[])
  }

  pub fn is_non_terminal(&self, name: &str) -> bool {
    self.symbols.contains_key(name)
  }

  /// Every terminal used by a rule, preceded by end-of-file and epsilon at
  /// [`Grammar::EOF`] and [`Grammar::EPSILON`].
  pub fn terminals(&self) -> &Set<Terminal> {
    &self.terminals
  }

  pub fn terminal(&self, id: TerminalId) -> &Terminal {
    &self.terminals[id]
  }

  pub fn find_terminal(&self, terminal: &Terminal) -> Option<TerminalId> {
    self.terminals.get_index_of(terminal)
  }

  /// Id of a terminal that appears in one of the grammar's rules.
  ///
  /// # Panics
  ///
  /// If the terminal is foreign to this grammar.
  pub fn terminal_id(&self, terminal: &Terminal) -> TerminalId {
    match self.terminals.get_index_of(terminal) {
      Some(id) => id,
      None => panic!("terminal {} is not part of the grammar", terminal),
    }
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "%start {}", self.default_symbol)?;
    for rule in &self.rules {
      writeln!(f, "{}", rule)?;
    }
    Ok(())
  }
}

pub struct GrammarBuilder {
  default_symbol: String,
  rules: Vec<ProductionRule>,
}

impl GrammarBuilder {
  pub fn rule(&mut self, name: impl Into<String>, elements: Vec<Element>) -> &mut Self {
    self.rules.push(ProductionRule::new(name, elements));
    self
  }

  pub fn push(&mut self, rule: ProductionRule) -> &mut Self {
    self.rules.push(rule);
    self
  }

  pub fn build(&mut self) -> Result<Grammar, GrammarError> {
    let rules = std::mem::take(&mut self.rules);
    let mut symbols = Map::<String, Vec<RuleId>>::default();
    let mut terminals = Set::default();
    terminals.insert(Terminal::eof());
    terminals.insert(Terminal::epsilon());

    for (i, rule) in rules.iter().enumerate() {
      symbols.entry(rule.name.clone())
        .or_default()
        .push(RuleId(i as u32));
    }

    for rule in &rules {
      for element in &rule.elements {
        match element {
          Element::Terminal(terminal) => {
            terminals.insert(terminal.clone());
          }
          Element::NonTerminal(symbol) => {
            if !symbols.contains_key(symbol) {
              return Err(GrammarError::UndefinedSymbol {
                symbol: symbol.clone(),
                rule: rule.name.clone(),
              });
            }
          }
          Element::Empty => {}
        }
      }
    }

    if !symbols.contains_key(&self.default_symbol) {
      return Err(GrammarError::UndefinedDefault(self.default_symbol.clone()));
    }

    Ok(Grammar {
      rules,
      symbols,
      terminals,
      default_symbol: self.default_symbol.clone(),
    })
  }
}
