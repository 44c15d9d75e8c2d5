use grammar::lex::Token;
use grammar::TokenType;
use lr::Node;
use crate::bytecode::{Assembler, Instruction, Opcode};
use crate::error::CompileError;
use super::{flatten, token, unsupported, Compiler};

/// A binary expression after precedence has been resolved.
enum Operand<'n> {
  Unary(&'n Node),
  Binary {
    op: &'n Token,
    lhs: Box<Operand<'n>>,
    rhs: Box<Operand<'n>>,
  },
}

impl Compiler<'_> {
  pub(super) fn expression(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    match node.children() {
      [target, _, value] => {
        asm.emit(Instruction::PushRef(&token(target)?.text));
        self.expression(asm, value)?;
        asm.emit(Instruction::Write);
        Ok(())
      }
      [binary] => {
        let operand = self.resolve_precedence(binary)?;
        self.operand(asm, &operand)
      }
      _ => Err(unsupported(node)),
    }
  }

  /// Shunting-yard over the flat `Unary (Operator Unary)*` sequence. Equal
  /// precedence reduces first, which makes every operator left-associative.
  fn resolve_precedence<'n>(&self, node: &'n Node) -> Result<Operand<'n>, CompileError> {
    let mut parts = flatten(node, &["BinaryTail"]).into_iter();
    let first = parts.next().ok_or_else(|| unsupported(node))?;

    let mut operands = vec![Operand::Unary(first)];
    let mut operators: Vec<(&Token, u8)> = vec![];

    while let Some(op) = parts.next() {
      let op = token(op)?;
      let precedence = self.operators.precedence(&op.text)
        .ok_or_else(|| CompileError::UnknownOperator {
          operator: op.text.clone(),
          line: op.line,
          column: op.column,
        })?;

      while operators.last().map_or(false, |&(_, top)| top >= precedence) {
        reduce(&mut operands, &mut operators).ok_or_else(|| unsupported(node))?;
      }

      operators.push((op, precedence));
      operands.push(Operand::Unary(parts.next().ok_or_else(|| unsupported(node))?));
    }

    while !operators.is_empty() {
      reduce(&mut operands, &mut operators).ok_or_else(|| unsupported(node))?;
    }

    operands.pop().ok_or_else(|| unsupported(node))
  }

  fn operand(&self, asm: &mut Assembler, operand: &Operand) -> Result<(), CompileError> {
    match operand {
      Operand::Unary(node) => self.unary(asm, node),
      Operand::Binary { op, lhs, rhs } => {
        self.operand(asm, lhs)?;
        match op.text.as_str() {
          // short-circuit: a deciding left operand is the result
          "&&" | "||" => {
            let jump = if op.text == "&&" {
              Opcode::JumpIfFalseKeep
            } else {
              Opcode::JumpIfTrueKeep
            };
            let to_end = asm.emit_jump(jump);
            asm.emit(Instruction::Pop);
            self.operand(asm, rhs)?;
            asm.patch(to_end);
          }
          symbol => {
            self.operand(asm, rhs)?;
            asm.emit(Instruction::Binary(symbol));
          }
        }
        Ok(())
      }
    }
  }

  fn unary(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    match node.children() {
      [op, operand] => {
        let op = token(op)?;
        if self.operators.unary(&op.text).is_none() {
          return Err(CompileError::UnknownOperator {
            operator: op.text.clone(),
            line: op.line,
            column: op.column,
          });
        }
        self.unary(asm, operand)?;
        asm.emit(Instruction::Unary(&op.text));
        Ok(())
      }
      [primary] => self.primary(asm, primary),
      _ => Err(unsupported(node)),
    }
  }

  fn primary(&self, asm: &mut Assembler, node: &Node) -> Result<(), CompileError> {
    match node.children() {
      [leaf] => self.literal(asm, token(leaf)?),
      [_, expr, _] => self.expression(asm, expr),
      [name, _, args, _] => {
        let name = token(name)?;
        let args = flatten(args, &["ArgumentList", "ArgumentTail"]);
        let argc = u8::try_from(args.len())
          .map_err(|_| CompileError::TooManyArguments {
            name: name.text.clone(),
            line: name.line,
          })?;

        for arg in args {
          self.expression(asm, arg)?;
        }
        asm.emit_call(&name.text, argc, name.line);
        Ok(())
      }
      _ => Err(unsupported(node)),
    }
  }

  fn literal(&self, asm: &mut Assembler, token: &Token) -> Result<(), CompileError> {
    let invalid = |message: String| CompileError::InvalidLiteral {
      text: token.text.clone(),
      line: token.line,
      column: token.column,
      message,
    };

    match token.kind {
      TokenType::Identifier => {
        asm.emit(Instruction::PushRef(&token.text));
        asm.emit(Instruction::Read);
      }
      TokenType::Integer => {
        let value = token.text.parse::<i32>().map_err(|e| invalid(e.to_string()))?;
        asm.emit(Instruction::PushInt(value));
      }
      TokenType::Float => {
        let value = token.text.parse::<f32>().map_err(|e| invalid(e.to_string()))?;
        asm.emit(Instruction::PushFloat(value));
      }
      TokenType::String => {
        if token.text.contains('\0') {
          return Err(invalid("strings cannot contain NUL".to_owned()));
        }
        asm.emit(Instruction::PushString(&token.text));
      }
      _ => return Err(invalid("not a literal".to_owned())),
    }
    Ok(())
  }
}

fn reduce<'n>(
  operands: &mut Vec<Operand<'n>>,
  operators: &mut Vec<(&'n Token, u8)>,
) -> Option<()> {
  let (op, _) = operators.pop()?;
  let rhs = operands.pop()?;
  let lhs = operands.pop()?;
  operands.push(Operand::Binary {
    op,
    lhs: Box::new(lhs),
    rhs: Box::new(rhs),
  });
  Some(())
}
