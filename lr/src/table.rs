use grammar::{Map, ProductionRule, Terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
  #[default]
  Error,
  Shift(usize),
  /// Index into [`ParsingTable::rules`].
  Reduce(usize),
}

/// A shift-reduce table. It owns copies of the rules it reduces by, so it
/// does not borrow the grammar it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsingTable {
  initial_state: usize,
  actions: Vec<Map<Terminal, Action>>,
  gotos: Vec<Map<String, usize>>,
  rules: Vec<ProductionRule>,
  default_rule: usize,
}

impl ParsingTable {
  pub(crate) fn from_parts(
    initial_state: usize,
    actions: Vec<Map<Terminal, Action>>,
    gotos: Vec<Map<String, usize>>,
    rules: Vec<ProductionRule>,
    default_rule: usize,
  ) -> Self {
    debug_assert_eq!(actions.len(), gotos.len());
    Self {
      initial_state,
      actions,
      gotos,
      rules,
      default_rule,
    }
  }

  pub fn initial_state(&self) -> usize {
    self.initial_state
  }

  pub fn state_count(&self) -> usize {
    self.actions.len()
  }

  /// Action on exactly this terminal; no wildcard fallback.
  pub fn action(&self, state: usize, terminal: &Terminal) -> Action {
    self.actions.get(state)
      .and_then(|row| row.get(terminal))
      .copied()
      .unwrap_or_default()
  }

  pub fn goto(&self, state: usize, symbol: &str) -> Option<usize> {
    self.gotos.get(state)?.get(symbol).copied()
  }

  pub fn actions(&self, state: usize) -> &Map<Terminal, Action> {
    &self.actions[state]
  }

  pub fn gotos(&self, state: usize) -> &Map<String, usize> {
    &self.gotos[state]
  }

  pub fn rule(&self, slot: usize) -> &ProductionRule {
    &self.rules[slot]
  }

  pub fn rules(&self) -> &[ProductionRule] {
    &self.rules
  }

  pub fn default_rule_index(&self) -> usize {
    self.default_rule
  }

  pub fn default_rule(&self) -> &ProductionRule {
    &self.rules[self.default_rule]
  }

  /// Terminals with a non-error action in `state`, for error messages.
  pub fn expected(&self, state: usize) -> Vec<String> {
    self.actions.get(state)
      .map(|row| {
        row.iter()
          .filter(|(_, action)| **action != Action::Error)
          .map(|(terminal, _)| terminal.to_string())
          .collect()
      })
      .unwrap_or_default()
  }
}
