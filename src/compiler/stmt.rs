use lr::Node;
use crate::bytecode::{Assembler, Instruction, Opcode};
use crate::error::CompileError;
use super::{child, flatten, token, unsupported, Compiler};

impl Compiler<'_> {
  pub(super) fn statements(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    for statement in flatten(node, &["Statements"]) {
      self.statement(asm, statement)?;
    }
    Ok(())
  }

  pub(super) fn statement(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    let inner = child(node, 0)?;
    match inner.name() {
      "VarStatement" => self.var_statement(asm, inner),
      "IfStatement" => self.if_statement(asm, inner),
      "WhileStatement" => self.while_statement(asm, inner),
      "ReturnStatement" => {
        match inner.children() {
          [_, expr, _] => self.expression(asm, expr)?,
          _ => {
            asm.emit(Instruction::PushUndefined);
          }
        }
        asm.emit(Instruction::Return);
        Ok(())
      }
      "ExpressionStatement" => {
        self.expression(asm, child(inner, 0)?)?;
        asm.emit(Instruction::Pop);
        Ok(())
      }
      "Block" => self.block(asm, inner),
      _ => Err(unsupported(inner)),
    }
  }

  fn block(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    asm.emit(Instruction::EnterScope);
    self.statements(asm, child(node, 1)?)?;
    asm.emit(Instruction::LeaveScope);
    Ok(())
  }

  /// `var name;` declares `undefined`.
  fn var_statement(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    let name = token(child(node, 1)?)?;
    match node.children() {
      [_, _, _, init, _] => self.expression(asm, init)?,
      _ => {
        asm.emit(Instruction::PushUndefined);
      }
    }
    asm.emit(Instruction::Declare(&name.text));
    Ok(())
  }

  fn if_statement(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    self.expression(asm, child(node, 2)?)?;
    let to_else = asm.emit_jump(Opcode::JumpIfFalse);
    self.block(asm, child(node, 4)?)?;

    match child(node, 5)?.children() {
      [] => asm.patch(to_else),
      [_, branch] => {
        let to_end = asm.emit_jump(Opcode::Jump);
        asm.patch(to_else);
        if branch.name() == "IfStatement" {
          self.if_statement(asm, branch)?;
        } else {
          self.block(asm, branch)?;
        }
        asm.patch(to_end);
      }
      _ => return Err(unsupported(node)),
    }
    Ok(())
  }

  fn while_statement(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    let start = asm.offset();
    self.expression(asm, child(node, 2)?)?;
    let to_end = asm.emit_jump(Opcode::JumpIfFalse);
    self.block(asm, child(node, 4)?)?;
    asm.emit(Instruction::Jump(start));
    asm.patch(to_end);
    Ok(())
  }
}
