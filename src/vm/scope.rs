use std::cell::RefCell;
use std::rc::Rc;
use grammar::Map;
use super::Value;

/// A file's globals are shared by every frame running one of its
/// functions.
pub type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Default)]
pub struct Scope {
  variables: Map<Rc<str>, Value>,
  parent: Option<ScopeRef>,
}

impl Scope {
  /// A file's global scope.
  pub fn root() -> ScopeRef {
    Rc::new(RefCell::new(Scope::default()))
  }

  pub fn child(parent: &ScopeRef) -> ScopeRef {
    Rc::new(RefCell::new(Scope {
      variables: Map::default(),
      parent: Some(Rc::clone(parent)),
    }))
  }

  /// Declaring an existing name in the same scope overwrites it.
  pub fn declare(&mut self, name: &str, value: Value) {
    self.variables.insert(Rc::from(name), value);
  }

  pub fn lookup(&self, name: &str) -> Option<Value> {
    match self.variables.get(name) {
      Some(value) => Some(value.clone()),
      None => self.parent.as_ref().and_then(|parent| parent.borrow().lookup(name)),
    }
  }

  /// Assigns to the innermost binding of `name`. Without one, binds `name`
  /// in the outermost scope.
  pub fn assign(&mut self, name: &str, value: Value) {
    if let Some(slot) = self.variables.get_mut(name) {
      *slot = value;
      return;
    }

    match &self.parent {
      Some(parent) => parent.borrow_mut().assign(name, value),
      None => self.declare(name, value),
    }
  }
}
