//! Cooperative scheduler over script threads.
//!
//! A thread is a [`StackFrame`]. Each [`Runtime::tick`] resumes the
//! thread at the front of the queue until it finishes or suspends on a
//! pending native call, then moves on.

use std::collections::VecDeque;
use std::rc::Rc;
use grammar::Map;
use lr::{ParserKind, ParsingTable};
use crate::bytecode::CompiledFile;
use crate::compiler;
use crate::error::{CompileError, RuntimeError, SetupError};
use crate::vm::{NativeResult, Registry, StackFrame, Value};

pub type ThreadId = usize;

#[derive(Debug, Clone, Default)]
pub struct Options {
  pub parser_kind: ParserKind,
  /// A table previously produced by [`Runtime::table_bytes`]. Skips table
  /// construction when present.
  pub table: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
  Complete(Value),
  /// Suspended; the thread keeps running on later ticks.
  Pending(ThreadId),
}

struct Thread {
  id: ThreadId,
  frame: StackFrame,
  killed: bool,
}

pub struct Runtime {
  table: ParsingTable,
  registry: Registry,
  threads: VecDeque<Thread>,
  results: Map<ThreadId, Result<Value, RuntimeError>>,
  next_id: ThreadId,
}

impl Runtime {
  pub fn new(options: Options) -> Result<Self, SetupError> {
    let table = match &options.table {
      Some(bytes) => lr::serialize::read_table(bytes)?,
      None => crate::build_table(options.parser_kind)?,
    };
    log::debug!("parsing table has {} states", table.state_count());

    Ok(Self {
      table,
      registry: Registry::new(),
      threads: VecDeque::new(),
      results: Map::default(),
      next_id: 0,
    })
  }

  pub fn table(&self) -> &ParsingTable {
    &self.table
  }

  pub fn table_bytes(&self) -> Vec<u8> {
    lr::serialize::write_table(&self.table)
  }

  pub fn register_native<F>(&mut self, name: &str, arity: Option<usize>, function: F)
    where F: Fn(&[Value]) -> Result<NativeResult, RuntimeError> + 'static
  {
    self.registry.natives.register(name, arity, function);
  }

  /// Compiles and loads a file. Its top-level statements are queued as a
  /// thread and run on the next ticks.
  pub fn compile_file(
    &mut self,
    name: &str,
    source: &str,
  ) -> Result<Rc<CompiledFile>, CompileError> {
    let compiled = Rc::new(compiler::compile_file(
      name, source, &self.table, &self.registry.operators)?);
    let file = self.registry.load(Rc::clone(&compiled));
    let id = self.enqueue(StackFrame::initializer(file));
    log::info!("loaded {} ({} functions), initializer is thread {}",
      name, compiled.functions.len(), id);
    Ok(compiled)
  }

  pub fn file(&self, name: &str) -> Option<Rc<CompiledFile>> {
    self.registry.file(name).map(|file| Rc::clone(&file.compiled))
  }

  pub fn global(&self, file: &str, name: &str) -> Option<Value> {
    self.registry.file(file)?.globals.borrow().lookup(name)
  }

  /// Runs a script function right away. If it suspends, it becomes a thread.
  pub fn invoke(&mut self, function: &str, args: Vec<Value>) -> Result<Invocation, RuntimeError> {
    let mut frame = self.frame(function, args)?;
    match frame.run(&self.registry)? {
      Some(value) => Ok(Invocation::Complete(value)),
      None => Ok(Invocation::Pending(self.enqueue(frame))),
    }
  }

  /// Queues a script function without running it.
  pub fn spawn(&mut self, function: &str, args: Vec<Value>) -> Result<ThreadId, RuntimeError> {
    let frame = self.frame(function, args)?;
    let id = self.enqueue(frame);
    log::info!("spawned {} as thread {}", function, id);
    Ok(id)
  }

  /// Resumes the next thread. Returns `false` when no thread is left.
  pub fn tick(&mut self) -> bool {
    let mut thread = match self.threads.pop_front() {
      Some(thread) => thread,
      None => return false,
    };

    if thread.killed {
      log::debug!("thread {} dropped", thread.id);
      return true;
    }

    match thread.frame.run(&self.registry) {
      Ok(Some(value)) => {
        log::debug!("thread {} finished with {}", thread.id, value);
        self.results.insert(thread.id, Ok(value));
      }
      Ok(None) => self.threads.push_back(thread),
      Err(err) => {
        log::error!("thread {} in {}: {}", thread.id, thread.frame.function().name, err);
        self.results.insert(thread.id, Err(err));
      }
    }
    true
  }

  /// Ticks until every thread has finished. Spins while threads wait.
  pub fn run_until_idle(&mut self) {
    while self.tick() {}
  }

  /// Marks a thread dead. It is dropped the next time it comes up.
  pub fn kill(&mut self, id: ThreadId) -> bool {
    match self.threads.iter_mut().find(|thread| thread.id == id && !thread.killed) {
      Some(thread) => {
        thread.killed = true;
        log::info!("thread {} killed", id);
        true
      }
      None => false,
    }
  }

  pub fn is_alive(&self, id: ThreadId) -> bool {
    self.threads.iter().any(|thread| thread.id == id && !thread.killed)
  }

  /// Outcome of a finished thread that has not been collected yet.
  pub fn result(&self, id: ThreadId) -> Option<&Result<Value, RuntimeError>> {
    self.results.get(&id)
  }

  /// Collects the outcome of a finished thread, forgetting it.
  pub fn take_result(&mut self, id: ThreadId) -> Option<Result<Value, RuntimeError>> {
    self.results.swap_remove(&id)
  }

  fn frame(&self, function: &str, args: Vec<Value>) -> Result<StackFrame, RuntimeError> {
    // no current file, so files are searched in load order
    let (function, file) = self.registry.function(function, "")
      .ok_or_else(|| RuntimeError::UndefinedFunction {
        name: function.to_owned(),
        line: None,
      })?;
    StackFrame::new(function, file, args)
  }

  fn enqueue(&mut self, frame: StackFrame) -> ThreadId {
    let id = self.next_id;
    self.next_id += 1;
    self.threads.push_back(Thread {
      id,
      frame,
      killed: false,
    });
    id
  }
}
