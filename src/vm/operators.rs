//! Operator registry. The compiler asks it for binary precedences, the VM
//! for implementations.

use grammar::Map;
use crate::error::RuntimeError;
use super::Value;

pub type UnaryFn = fn(&Value) -> Result<Value, RuntimeError>;
pub type BinaryFn = fn(&Value, &Value) -> Result<Value, RuntimeError>;

#[derive(Debug, Clone, Copy)]
pub struct BinaryOperator {
  /// Higher binds tighter. Operators of equal precedence associate left.
  pub precedence: u8,
  pub apply: BinaryFn,
}

#[derive(Debug, Clone, Default)]
pub struct Operators {
  unary: Map<String, UnaryFn>,
  binary: Map<String, BinaryOperator>,
}

impl Operators {
  /// Registry with the built-in operators.
  pub fn new() -> Self {
    let mut ops = Self::default();

    ops.register_unary("-", negate);
    ops.register_unary("!", not);

    ops.register_binary("||", 1, |a, b| Ok(if a.is_truthy() { a.clone() } else { b.clone() }));
    ops.register_binary("&&", 2, |a, b| Ok(if a.is_truthy() { b.clone() } else { a.clone() }));
    ops.register_binary("==", 3, |a, b| Ok(equals(a, b).into()));
    ops.register_binary("!=", 3, |a, b| Ok((!equals(a, b)).into()));
    ops.register_binary("<", 4, |a, b| compare("<", a, b, |o| o.is_lt()));
    ops.register_binary("<=", 4, |a, b| compare("<=", a, b, |o| o.is_le()));
    ops.register_binary(">", 4, |a, b| compare(">", a, b, |o| o.is_gt()));
    ops.register_binary(">=", 4, |a, b| compare(">=", a, b, |o| o.is_ge()));
    ops.register_binary("+", 5, add);
    ops.register_binary("-", 5, |a, b| {
      arithmetic("-", a, b, |x, y| Ok(x.wrapping_sub(y)), |x, y| x - y)
    });
    ops.register_binary("*", 6, |a, b| {
      arithmetic("*", a, b, |x, y| Ok(x.wrapping_mul(y)), |x, y| x * y)
    });
    ops.register_binary("/", 6, |a, b| {
      arithmetic("/", a, b, |x, y| nonzero(y).map(|y| x.wrapping_div(y)), |x, y| x / y)
    });
    ops.register_binary("%", 6, |a, b| {
      arithmetic("%", a, b, |x, y| nonzero(y).map(|y| x.wrapping_rem(y)), |x, y| x % y)
    });

    ops
  }

  pub fn register_unary(&mut self, symbol: &str, apply: UnaryFn) {
    self.unary.insert(symbol.to_owned(), apply);
  }

  pub fn register_binary(&mut self, symbol: &str, precedence: u8, apply: BinaryFn) {
    self.binary.insert(symbol.to_owned(), BinaryOperator { precedence, apply });
  }

  pub fn unary(&self, symbol: &str) -> Option<UnaryFn> {
    self.unary.get(symbol).copied()
  }

  pub fn binary(&self, symbol: &str) -> Option<&BinaryOperator> {
    self.binary.get(symbol)
  }

  pub fn precedence(&self, symbol: &str) -> Option<u8> {
    self.binary(symbol).map(|op| op.precedence)
  }
}

fn mismatch(op: &str, a: &Value, b: &Value) -> RuntimeError {
  RuntimeError::TypeMismatch(format!(
    "cannot apply `{}` to {} and {}", op, a.type_name(), b.type_name()))
}

fn nonzero(n: i32) -> Result<i32, RuntimeError> {
  if n == 0 {
    Err(RuntimeError::DivisionByZero)
  } else {
    Ok(n)
  }
}

fn negate(a: &Value) -> Result<Value, RuntimeError> {
  match *a {
    Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
    Value::Float(x) => Ok(Value::Float(-x)),
    _ => Err(RuntimeError::TypeMismatch(format!("cannot negate {}", a.type_name()))),
  }
}

fn not(a: &Value) -> Result<Value, RuntimeError> {
  Ok((!a.is_truthy()).into())
}

/// Integers stay integers, anything mixed with a float becomes a float.
fn arithmetic(
  op: &str,
  a: &Value,
  b: &Value,
  int: impl Fn(i32, i32) -> Result<i32, RuntimeError>,
  float: impl Fn(f32, f32) -> f32,
) -> Result<Value, RuntimeError> {
  match (a, b) {
    (Value::Int(x), Value::Int(y)) => int(*x, *y).map(Value::Int),
    _ => match (a.as_f32(), b.as_f32()) {
      (Some(x), Some(y)) => Ok(Value::Float(float(x, y))),
      _ => Err(mismatch(op, a, b)),
    },
  }
}

fn add(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
  match (a, b) {
    (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::string(format!("{}{}", a, b))),
    _ => arithmetic("+", a, b, |x, y| Ok(x.wrapping_add(y)), |x, y| x + y),
  }
}

fn equals(a: &Value, b: &Value) -> bool {
  match (a.as_f32(), b.as_f32()) {
    (Some(x), Some(y)) if !(matches!(a, Value::Int(_)) && matches!(b, Value::Int(_))) => x == y,
    _ => a == b,
  }
}

fn compare(
  op: &str,
  a: &Value,
  b: &Value,
  test: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, RuntimeError> {
  let ordering = match (a, b) {
    (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
    (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
    _ => match (a.as_f32(), b.as_f32()) {
      (Some(x), Some(y)) => x.partial_cmp(&y),
      _ => return Err(mismatch(op, a, b)),
    },
  };

  // NaN compares false both ways
  Ok(ordering.map_or(false, test).into())
}
