use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Undefined,
  Int(i32),
  Float(f32),
  String(Rc<str>),
  /// A variable name, produced for assignment targets and reads.
  Reference(Rc<str>),
}

impl Value {
  pub fn string(s: impl AsRef<str>) -> Self {
    Value::String(Rc::from(s.as_ref()))
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::String(_) => "string",
      Value::Reference(_) => "reference",
    }
  }

  pub fn is_truthy(&self) -> bool {
    match self {
      Value::Undefined => false,
      Value::Int(n) => *n != 0,
      Value::Float(x) => *x != 0.0,
      Value::String(s) => !s.is_empty(),
      Value::Reference(_) => true,
    }
  }

  pub fn as_f32(&self) -> Option<f32> {
    match *self {
      Value::Int(n) => Some(n as f32),
      Value::Float(x) => Some(x),
      _ => None,
    }
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Int(b as i32)
  }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self {
    Value::Int(n)
  }
}

impl From<f32> for Value {
  fn from(x: f32) -> Self {
    Value::Float(x)
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::string(s)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Undefined => f.write_str("undefined"),
      Value::Int(n) => write!(f, "{}", n),
      Value::Float(x) => write!(f, "{}", x),
      Value::String(s) => f.write_str(s),
      Value::Reference(name) => write!(f, "&{}", name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truthiness() {
    assert!(!Value::Undefined.is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(Value::Int(-1).is_truthy());
    assert!(!Value::Float(0.0).is_truthy());
    assert!(!Value::from("").is_truthy());
    assert!(Value::from("0").is_truthy());
  }

  #[test]
  fn display() {
    assert_eq!(Value::Float(2.5).to_string(), "2.5");
    assert_eq!(Value::from("hi").to_string(), "hi");
    assert_eq!(Value::Reference(Rc::from("a")).to_string(), "&a");
  }
}
