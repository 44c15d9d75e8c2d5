use std::mem;
use std::rc::Rc;
use crate::bytecode::{self, Function, Instruction};
use crate::error::RuntimeError;
use super::natives::{NativeResult, PendingCall};
use super::{LoadedFile, Registry, Scope, ScopeRef, Value};

/// Deepest chain of script calls a thread may build.
pub const MAX_CALL_DEPTH: usize = 10_000;

/// Execution state of one thread: the activation of every script call that
/// has not returned yet, innermost last, plus the native call the innermost
/// one is blocked on.
pub struct StackFrame {
  root: Rc<Function>,
  activations: Vec<Activation>,
  pending: Option<Box<dyn PendingCall>>,
  result: Option<Value>,
}

struct Activation {
  function: Rc<Function>,
  cip: usize,
  stack: Vec<Value>,
  scope: ScopeRef,
  /// Enclosing block scopes, innermost last.
  outer_scopes: Vec<ScopeRef>,
}

enum Step {
  Next,
  Call(Activation),
  Suspend(Box<dyn PendingCall>),
  Return(Value),
}

impl StackFrame {
  pub fn new(
    function: Rc<Function>,
    file: Rc<LoadedFile>,
    args: Vec<Value>,
  ) -> Result<Self, RuntimeError> {
    let activation = Activation::new(function, &file, args, None)?;
    Ok(Self::with_root(activation))
  }

  /// Runs the file's top-level statements directly in its global scope.
  pub fn initializer(file: Rc<LoadedFile>) -> Self {
    let function = Rc::clone(&file.compiled.initializer);
    let scope = Rc::clone(&file.globals);
    Self::with_root(Activation::with_scope(function, scope))
  }

  fn with_root(activation: Activation) -> Self {
    Self {
      root: Rc::clone(&activation.function),
      activations: vec![activation],
      pending: None,
      result: None,
    }
  }

  /// The function the thread started in.
  pub fn function(&self) -> &Function {
    &self.root
  }

  pub fn is_finished(&self) -> bool {
    self.result.is_some()
  }

  /// Executes until the root function returns or a native call suspends.
  /// Returns `None` when suspended; calling again resumes where it stopped.
  pub fn run(&mut self, registry: &Registry) -> Result<Option<Value>, RuntimeError> {
    if let Some(value) = &self.result {
      return Ok(Some(value.clone()));
    }

    loop {
      if let Some(call) = &mut self.pending {
        let value = match call.poll() {
          Some(value) => value,
          None => return Ok(None),
        };
        self.pending = None;
        self.current()?.stack.push(value);
      }

      match self.current()?.step(registry)? {
        Step::Next => {}
        Step::Call(callee) => {
          if self.activations.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded {
              name: callee.function.name.clone(),
              depth: MAX_CALL_DEPTH,
            });
          }
          self.activations.push(callee);
        }
        Step::Suspend(call) => {
          log::debug!("{} suspended", self.current()?.function.name);
          self.pending = Some(call);
        }
        Step::Return(value) => {
          self.activations.pop();
          match self.activations.last_mut() {
            Some(caller) => caller.stack.push(value),
            None => {
              self.result = Some(value.clone());
              return Ok(Some(value));
            }
          }
        }
      }
    }
  }

  fn current(&mut self) -> Result<&mut Activation, RuntimeError> {
    self.activations.last_mut().ok_or(RuntimeError::StackUnderflow)
  }
}

impl Activation {
  fn new(
    function: Rc<Function>,
    file: &LoadedFile,
    args: Vec<Value>,
    line: Option<usize>,
  ) -> Result<Self, RuntimeError> {
    if args.len() != function.parameters.len() {
      return Err(RuntimeError::ArityMismatch {
        name: function.name.clone(),
        expected: function.parameters.len(),
        found: args.len(),
        line,
      });
    }

    let scope = Scope::child(&file.globals);
    for (param, arg) in function.parameters.iter().zip(args) {
      scope.borrow_mut().declare(param, arg);
    }
    Ok(Self::with_scope(function, scope))
  }

  fn with_scope(function: Rc<Function>, scope: ScopeRef) -> Self {
    Self {
      function,
      cip: 0,
      stack: vec![],
      scope,
      outer_scopes: vec![],
    }
  }

  fn step(&mut self, registry: &Registry) -> Result<Step, RuntimeError> {
    let function = Rc::clone(&self.function);
    let offset = self.cip;
    if offset >= function.code.len() {
      return Ok(Step::Return(Value::Undefined));
    }

    let (instruction, next) = bytecode::decode(&function.code, offset)?;
    log::trace!("{}::{} {:04} {}", function.file, function.name, offset, instruction);
    self.cip = next;

    match instruction {
      Instruction::Pop => {
        self.pop()?;
      }
      Instruction::PushUndefined => self.stack.push(Value::Undefined),
      Instruction::PushInt(n) => self.stack.push(Value::Int(n)),
      Instruction::PushFloat(x) => self.stack.push(Value::Float(x)),
      Instruction::PushString(s) => self.stack.push(Value::string(s)),
      Instruction::PushRef(name) => self.stack.push(Value::Reference(Rc::from(name))),

      Instruction::Read => {
        let name = self.pop_reference()?;
        let value = self.scope.borrow().lookup(&name)
          .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
        self.stack.push(value);
      }
      Instruction::Write => {
        let value = self.pop()?;
        let name = self.pop_reference()?;
        self.scope.borrow_mut().assign(&name, value.clone());
        self.stack.push(value);
      }
      Instruction::Declare(name) => {
        let value = self.pop()?;
        self.scope.borrow_mut().declare(name, value);
      }

      Instruction::Unary(symbol) => {
        let apply = registry.operators.unary(symbol)
          .ok_or_else(|| RuntimeError::UnknownOperator(symbol.to_owned()))?;
        let operand = self.pop()?;
        self.stack.push(apply(&operand)?);
      }
      Instruction::Binary(symbol) => {
        let op = registry.operators.binary(symbol)
          .ok_or_else(|| RuntimeError::UnknownOperator(symbol.to_owned()))?;
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        self.stack.push((op.apply)(&lhs, &rhs)?);
      }

      Instruction::Jump(target) => self.cip = target,
      Instruction::JumpIfFalse(target) => {
        if !self.pop()?.is_truthy() {
          self.cip = target;
        }
      }
      Instruction::JumpIfFalseKeep(target) => {
        if !self.peek()?.is_truthy() {
          self.cip = target;
        }
      }
      Instruction::JumpIfTrueKeep(target) => {
        if self.peek()?.is_truthy() {
          self.cip = target;
        }
      }

      Instruction::Call { name, argc } => {
        return self.call(registry, name, argc as usize, function.call_line(offset));
      }
      Instruction::Return => {
        return Ok(Step::Return(self.stack.pop().unwrap_or(Value::Undefined)));
      }

      Instruction::EnterScope => {
        let inner = Scope::child(&self.scope);
        let outer = mem::replace(&mut self.scope, inner);
        self.outer_scopes.push(outer);
      }
      Instruction::LeaveScope => {
        if let Some(outer) = self.outer_scopes.pop() {
          self.scope = outer;
        }
      }
    }

    Ok(Step::Next)
  }

  /// Script functions shadow natives of the same name.
  fn call(
    &mut self,
    registry: &Registry,
    name: &str,
    argc: usize,
    line: Option<usize>,
  ) -> Result<Step, RuntimeError> {
    let base = self.stack.len().checked_sub(argc).ok_or(RuntimeError::StackUnderflow)?;
    let args = self.stack.split_off(base);

    if let Some((function, file)) = registry.function(name, &self.function.file) {
      log::debug!("call {}::{}", file.compiled.name, name);
      return Activation::new(function, &file, args, line).map(Step::Call);
    }

    let native = registry.natives.get(name)
      .ok_or_else(|| RuntimeError::UndefinedFunction {
        name: name.to_owned(),
        line,
      })?;
    if let Some(arity) = native.arity {
      if arity != argc {
        return Err(RuntimeError::ArityMismatch {
          name: name.to_owned(),
          expected: arity,
          found: argc,
          line,
        });
      }
    }

    match (native.function)(&args)? {
      NativeResult::Ready(value) => {
        self.stack.push(value);
        Ok(Step::Next)
      }
      NativeResult::Pending(call) => {
        log::debug!("{} waits on {}", self.function.name, name);
        Ok(Step::Suspend(call))
      }
    }
  }

  fn pop(&mut self) -> Result<Value, RuntimeError> {
    self.stack.pop().ok_or(RuntimeError::StackUnderflow)
  }

  fn peek(&self) -> Result<&Value, RuntimeError> {
    self.stack.last().ok_or(RuntimeError::StackUnderflow)
  }

  fn pop_reference(&mut self) -> Result<Rc<str>, RuntimeError> {
    match self.pop()? {
      Value::Reference(name) => Ok(name),
      other => Err(RuntimeError::TypeMismatch(format!(
        "expected a variable reference, found {}", other.type_name()))),
    }
  }
}
