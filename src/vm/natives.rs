//! Host functions callable from scripts. A native either answers at once or
//! hands back a [`PendingCall`] that the calling frame polls on every tick.

use std::rc::Rc;
use std::time::{Duration, Instant};
use grammar::Map;
use crate::error::RuntimeError;
use super::Value;

pub trait PendingCall {
  /// `None` until the call completes. Polling again before then has no
  /// effect.
  fn poll(&mut self) -> Option<Value>;
}

pub enum NativeResult {
  Ready(Value),
  Pending(Box<dyn PendingCall>),
}

pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<NativeResult, RuntimeError>>;

#[derive(Clone)]
pub struct Native {
  /// `None` for variadic natives.
  pub arity: Option<usize>,
  pub function: NativeFn,
}

#[derive(Clone, Default)]
pub struct Natives {
  functions: Map<String, Native>,
}

impl Natives {
  /// Registry with `print` and `wait`.
  pub fn new() -> Self {
    let mut natives = Self::default();
    natives.register("print", None, |args| {
      let line = args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
      log::info!("{}", line);
      Ok(NativeResult::Ready(Value::Undefined))
    });
    natives.register("wait", Some(1), wait);
    natives
  }

  pub fn register<F>(&mut self, name: &str, arity: Option<usize>, function: F)
    where F: Fn(&[Value]) -> Result<NativeResult, RuntimeError> + 'static
  {
    self.functions.insert(name.to_owned(), Native {
      arity,
      function: Rc::new(function),
    });
  }

  pub fn get(&self, name: &str) -> Option<&Native> {
    self.functions.get(name)
  }
}

fn wait(args: &[Value]) -> Result<NativeResult, RuntimeError> {
  let out_of_range = || RuntimeError::TypeMismatch(format!(
    "wait expects a non-negative number of seconds, got {}", args[0]));

  let seconds = args[0].as_f32()
    .filter(|s| *s >= 0.0)
    .ok_or_else(out_of_range)?;
  let until = Duration::try_from_secs_f32(seconds).ok()
    .and_then(|interval| Instant::now().checked_add(interval))
    .ok_or_else(out_of_range)?;

  Ok(NativeResult::Pending(Box::new(Wait {
    until,
  })))
}

struct Wait {
  until: Instant,
}

impl PendingCall for Wait {
  fn poll(&mut self) -> Option<Value> {
    if Instant::now() >= self.until {
      Some(Value::Undefined)
    } else {
      None
    }
  }
}
