//! Earle bytecode.
//!
//! ```text
//! instruction := opcode:u8 operand*
//! int         := i32 little endian
//! float       := f32 little endian
//! str         := utf-8 bytes \0
//! ```
//!
//! Jump targets are absolute offsets into the owning function's code.

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::rc::Rc;
use grammar::Map;
use crate::error::RuntimeError;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  Pop = 0,
  PushUndefined = 1,
  PushInt = 2,
  PushFloat = 3,
  PushString = 4,
  PushRef = 5,
  Read = 6,
  Write = 7,
  Declare = 8,
  Unary = 9,
  Binary = 10,
  Jump = 11,
  JumpIfFalse = 12,
  JumpIfFalseKeep = 13,
  JumpIfTrueKeep = 14,
  Call = 15,
  Return = 16,
  EnterScope = 17,
  LeaveScope = 18,
}

impl Opcode {
  const ALL: [Opcode; 19] = [
    Opcode::Pop,
    Opcode::PushUndefined,
    Opcode::PushInt,
    Opcode::PushFloat,
    Opcode::PushString,
    Opcode::PushRef,
    Opcode::Read,
    Opcode::Write,
    Opcode::Declare,
    Opcode::Unary,
    Opcode::Binary,
    Opcode::Jump,
    Opcode::JumpIfFalse,
    Opcode::JumpIfFalseKeep,
    Opcode::JumpIfTrueKeep,
    Opcode::Call,
    Opcode::Return,
    Opcode::EnterScope,
    Opcode::LeaveScope,
  ];

  pub fn from_u8(byte: u8) -> Option<Self> {
    Self::ALL.get(byte as usize).copied()
  }
}

/// A decoded instruction. Names borrow from the code they were read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction<'a> {
  Pop,
  PushUndefined,
  PushInt(i32),
  PushFloat(f32),
  PushString(&'a str),
  PushRef(&'a str),
  /// Replaces the reference on top of the stack by its value.
  Read,
  /// Pops a value and a reference, assigns, and pushes the value back.
  Write,
  Declare(&'a str),
  Unary(&'a str),
  Binary(&'a str),
  Jump(usize),
  JumpIfFalse(usize),
  /// Jumps without popping the condition; falls through otherwise.
  JumpIfFalseKeep(usize),
  JumpIfTrueKeep(usize),
  Call {
    name: &'a str,
    argc: u8,
  },
  Return,
  EnterScope,
  LeaveScope,
}

impl Instruction<'_> {
  pub fn opcode(&self) -> Opcode {
    match self {
      Instruction::Pop => Opcode::Pop,
      Instruction::PushUndefined => Opcode::PushUndefined,
      Instruction::PushInt(_) => Opcode::PushInt,
      Instruction::PushFloat(_) => Opcode::PushFloat,
      Instruction::PushString(_) => Opcode::PushString,
      Instruction::PushRef(_) => Opcode::PushRef,
      Instruction::Read => Opcode::Read,
      Instruction::Write => Opcode::Write,
      Instruction::Declare(_) => Opcode::Declare,
      Instruction::Unary(_) => Opcode::Unary,
      Instruction::Binary(_) => Opcode::Binary,
      Instruction::Jump(_) => Opcode::Jump,
      Instruction::JumpIfFalse(_) => Opcode::JumpIfFalse,
      Instruction::JumpIfFalseKeep(_) => Opcode::JumpIfFalseKeep,
      Instruction::JumpIfTrueKeep(_) => Opcode::JumpIfTrueKeep,
      Instruction::Call { .. } => Opcode::Call,
      Instruction::Return => Opcode::Return,
      Instruction::EnterScope => Opcode::EnterScope,
      Instruction::LeaveScope => Opcode::LeaveScope,
    }
  }
}

impl fmt::Display for Instruction<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.opcode())?;
    match self {
      Instruction::PushInt(value) => write!(f, " {}", value),
      Instruction::PushFloat(value) => write!(f, " {:?}", value),
      Instruction::PushString(value) => write!(f, " {:?}", value),
      Instruction::PushRef(name)
        | Instruction::Declare(name)
        | Instruction::Unary(name)
        | Instruction::Binary(name) => write!(f, " {}", name),
      Instruction::Jump(target)
        | Instruction::JumpIfFalse(target)
        | Instruction::JumpIfFalseKeep(target)
        | Instruction::JumpIfTrueKeep(target) => write!(f, " {}", target),
      Instruction::Call { name, argc } => write!(f, " {} {}", name, argc),
      _ => Ok(()),
    }
  }
}

/// Decodes the instruction at `offset`, returning it and the offset of the
/// next one.
pub fn decode(code: &[u8], offset: usize) -> Result<(Instruction<'_>, usize), RuntimeError> {
  let mut reader = CodeReader { code, pos: offset };
  let byte = reader.u8()?;
  let opcode = Opcode::from_u8(byte)
    .ok_or(RuntimeError::UnknownOpcode { opcode: byte, offset })?;

  let instruction = match opcode {
    Opcode::Pop => Instruction::Pop,
    Opcode::PushUndefined => Instruction::PushUndefined,
    Opcode::PushInt => Instruction::PushInt(i32::from_le_bytes(reader.array()?)),
    Opcode::PushFloat => Instruction::PushFloat(f32::from_le_bytes(reader.array()?)),
    Opcode::PushString => Instruction::PushString(reader.str()?),
    Opcode::PushRef => Instruction::PushRef(reader.str()?),
    Opcode::Read => Instruction::Read,
    Opcode::Write => Instruction::Write,
    Opcode::Declare => Instruction::Declare(reader.str()?),
    Opcode::Unary => Instruction::Unary(reader.str()?),
    Opcode::Binary => Instruction::Binary(reader.str()?),
    Opcode::Jump => Instruction::Jump(reader.target()?),
    Opcode::JumpIfFalse => Instruction::JumpIfFalse(reader.target()?),
    Opcode::JumpIfFalseKeep => Instruction::JumpIfFalseKeep(reader.target()?),
    Opcode::JumpIfTrueKeep => Instruction::JumpIfTrueKeep(reader.target()?),
    Opcode::Call => {
      let name = reader.str()?;
      let argc = reader.u8()?;
      Instruction::Call { name, argc }
    }
    Opcode::Return => Instruction::Return,
    Opcode::EnterScope => Instruction::EnterScope,
    Opcode::LeaveScope => Instruction::LeaveScope,
  };

  Ok((instruction, reader.pos))
}

struct CodeReader<'a> {
  code: &'a [u8],
  pos: usize,
}

impl<'a> CodeReader<'a> {
  fn u8(&mut self) -> Result<u8, RuntimeError> {
    let byte = *self.code.get(self.pos).ok_or(RuntimeError::Truncated(self.pos))?;
    self.pos += 1;
    Ok(byte)
  }

  fn array(&mut self) -> Result<[u8; 4], RuntimeError> {
    let bytes = self.code.get(self.pos..self.pos + 4)
      .ok_or(RuntimeError::Truncated(self.pos))?;
    self.pos += 4;
    let mut array = [0; 4];
    array.copy_from_slice(bytes);
    Ok(array)
  }

  fn target(&mut self) -> Result<usize, RuntimeError> {
    let offset = self.pos;
    let target = i32::from_le_bytes(self.array()?);
    usize::try_from(target).map_err(|_| RuntimeError::Truncated(offset))
  }

  fn str(&mut self) -> Result<&'a str, RuntimeError> {
    let start = self.pos;
    let rest = &self.code[start.min(self.code.len())..];
    let len = rest.iter().position(|&b| b == 0)
      .ok_or(RuntimeError::Truncated(start))?;
    self.pos += len + 1;
    std::str::from_utf8(&rest[..len]).map_err(|_| RuntimeError::Truncated(start))
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
  pub name: String,
  /// Name of the file the function was compiled from.
  pub file: String,
  pub parameters: Vec<String>,
  pub code: Vec<u8>,
  /// Offset of each `Call` instruction to its source line.
  pub call_lines: BTreeMap<usize, usize>,
}

impl Function {
  pub fn call_line(&self, offset: usize) -> Option<usize> {
    self.call_lines.get(&offset).copied()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFile {
  pub name: String,
  pub functions: Map<String, Rc<Function>>,
  /// The file's top-level statements.
  pub initializer: Rc<Function>,
}

impl CompiledFile {
  pub fn function(&self, name: &str) -> Option<&Rc<Function>> {
    self.functions.get(name)
  }
}

/// Appends encoded instructions to a code buffer.
#[derive(Debug, Default)]
pub struct Assembler {
  code: Vec<u8>,
  call_lines: BTreeMap<usize, usize>,
}

impl Assembler {
  pub fn offset(&self) -> usize {
    self.code.len()
  }

  /// Returns the offset of the emitted instruction.
  pub fn emit(&mut self, instruction: Instruction) -> usize {
    let offset = self.code.len();
    self.code.push(instruction.opcode() as u8);

    match instruction {
      Instruction::PushInt(value) => self.code.extend_from_slice(&value.to_le_bytes()),
      Instruction::PushFloat(value) => self.code.extend_from_slice(&value.to_le_bytes()),
      Instruction::PushString(s)
        | Instruction::PushRef(s)
        | Instruction::Declare(s)
        | Instruction::Unary(s)
        | Instruction::Binary(s) => self.push_str(s),
      Instruction::Jump(target)
        | Instruction::JumpIfFalse(target)
        | Instruction::JumpIfFalseKeep(target)
        | Instruction::JumpIfTrueKeep(target) => self.push_target(target),
      Instruction::Call { name, argc } => {
        self.push_str(name);
        self.code.push(argc);
      }
      _ => {}
    }

    offset
  }

  pub fn emit_call(&mut self, name: &str, argc: u8, line: usize) {
    let offset = self.emit(Instruction::Call { name, argc });
    self.call_lines.insert(offset, line);
  }

  /// Emits a jump with an unresolved target. Returns the position to pass to
  /// [`Assembler::patch`].
  pub fn emit_jump(&mut self, opcode: Opcode) -> usize {
    let instruction = match opcode {
      Opcode::Jump => Instruction::Jump(0),
      Opcode::JumpIfFalse => Instruction::JumpIfFalse(0),
      Opcode::JumpIfFalseKeep => Instruction::JumpIfFalseKeep(0),
      Opcode::JumpIfTrueKeep => Instruction::JumpIfTrueKeep(0),
      _ => panic!("{:?} is not a jump", opcode),
    };
    self.emit(instruction) + 1
  }

  /// Points the jump emitted at `at` to the current offset.
  pub fn patch(&mut self, at: usize) {
    let target = self.offset() as i32;
    self.code[at..at + 4].copy_from_slice(&target.to_le_bytes());
  }

  pub fn finish(self, name: &str, file: &str, parameters: Vec<String>) -> Function {
    Function {
      name: name.to_owned(),
      file: file.to_owned(),
      parameters,
      code: self.code,
      call_lines: self.call_lines,
    }
  }

  fn push_str(&mut self, s: &str) {
    self.code.extend_from_slice(s.as_bytes());
    self.code.push(0);
  }

  fn push_target(&mut self, target: usize) {
    self.code.extend_from_slice(&(target as i32).to_le_bytes());
  }
}

/// One instruction per line, prefixed by its offset.
pub fn disassemble(function: &Function) -> Result<String, RuntimeError> {
  let mut buf = String::new();
  let mut offset = 0;

  while offset < function.code.len() {
    let (instruction, next) = decode(&function.code, offset)?;
    write!(&mut buf, "{:04} {}", offset, instruction).unwrap();
    if let Some(line) = function.call_line(offset) {
      write!(&mut buf, "  ; line {}", line).unwrap();
    }
    buf.push('\n');
    offset = next;
  }

  Ok(buf)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn decode_what_was_emitted() {
    let mut asm = Assembler::default();
    asm.emit(Instruction::PushRef("a"));
    asm.emit(Instruction::PushFloat(0.5));
    asm.emit_call("wait", 1, 3);
    let jump = asm.emit_jump(Opcode::JumpIfFalse);
    asm.emit(Instruction::Write);
    asm.patch(jump);
    let function = asm.finish("f", "a.earle", vec![]);

    let mut offset = 0;
    let mut decoded = vec![];
    while offset < function.code.len() {
      let (instruction, next) = decode(&function.code, offset).unwrap();
      decoded.push(instruction);
      offset = next;
    }

    assert_eq!(decoded, vec![
      Instruction::PushRef("a"),
      Instruction::PushFloat(0.5),
      Instruction::Call { name: "wait", argc: 1 },
      Instruction::JumpIfFalse(function.code.len()),
      Instruction::Write,
    ]);
    assert_eq!(function.call_line(8), Some(3));
  }

  #[test]
  fn malformed_code() {
    assert_eq!(
      decode(&[200], 0),
      Err(RuntimeError::UnknownOpcode { opcode: 200, offset: 0 }));
    assert_eq!(
      decode(&[Opcode::PushInt as u8, 1, 0], 0),
      Err(RuntimeError::Truncated(1)));
    assert_eq!(
      decode(&[Opcode::PushRef as u8, b'a'], 0),
      Err(RuntimeError::Truncated(1)));
  }
}
