mod frame;
mod natives;
mod operators;
mod scope;
mod value;

use std::rc::Rc;
use grammar::Map;
use crate::bytecode::{CompiledFile, Function};

pub use frame::{StackFrame, MAX_CALL_DEPTH};
pub use natives::{Native, NativeFn, NativeResult, Natives, PendingCall};
pub use operators::{BinaryFn, BinaryOperator, Operators, UnaryFn};
pub use scope::{Scope, ScopeRef};
pub use value::Value;

/// A compiled file together with its global variables.
pub struct LoadedFile {
  pub compiled: Rc<CompiledFile>,
  pub globals: ScopeRef,
}

/// Everything a running frame can reach besides its own state.
#[derive(Default)]
pub struct Registry {
  pub operators: Operators,
  pub natives: Natives,
  files: Map<String, Rc<LoadedFile>>,
}

impl Registry {
  /// Registry with the built-in operators and natives.
  pub fn new() -> Self {
    Self {
      operators: Operators::new(),
      natives: Natives::new(),
      files: Map::default(),
    }
  }

  /// Loading a file again replaces its functions and starts it with fresh
  /// globals. Frames already running keep the old ones.
  pub fn load(&mut self, compiled: Rc<CompiledFile>) -> Rc<LoadedFile> {
    let file = Rc::new(LoadedFile {
      compiled,
      globals: Scope::root(),
    });
    self.files.insert(file.compiled.name.clone(), Rc::clone(&file));
    file
  }

  pub fn file(&self, name: &str) -> Option<&Rc<LoadedFile>> {
    self.files.get(name)
  }

  /// Finds a script function, looking in `current_file` before the other
  /// files in load order.
  pub fn function(
    &self,
    name: &str,
    current_file: &str,
  ) -> Option<(Rc<Function>, Rc<LoadedFile>)> {
    let current = self.files.get(current_file).into_iter();
    let others = self.files.values().filter(|file| file.compiled.name != current_file);

    current.chain(others)
      .find_map(|file| {
        file.compiled.function(name).map(|function| (Rc::clone(function), Rc::clone(file)))
      })
  }
}
