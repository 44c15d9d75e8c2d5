//! Lowers Earle parse trees to bytecode.

mod expr;
mod stmt;

use std::rc::Rc;
use grammar::lex::{tokenize, Token};
use grammar::{Map, TokenType};
use lr::{Node, ParsingTable};
use crate::bytecode::{Assembler, CompiledFile, Function, Instruction};
use crate::error::CompileError;
use crate::vm::Operators;

/// Name given to a file's top-level code.
pub const INITIALIZER: &str = "<init>";

pub fn compile_file(
  name: &str,
  source: &str,
  table: &ParsingTable,
  operators: &Operators,
) -> Result<CompiledFile, CompileError> {
  let tokens = tokenize(source)?;
  let tree = lr::parse(table, tokens)?;
  log::debug!("parsed {}", name);

  let compiler = Compiler {
    file: name,
    operators,
  };
  compiler.program(&tree)
}

struct Compiler<'a> {
  file: &'a str,
  operators: &'a Operators,
}

impl Compiler<'_> {
  fn program(&self, tree: &Node) -> Result<CompiledFile, CompileError> {
    let mut functions = Map::default();
    let mut init = Assembler::default();

    for declaration in flatten(child(tree, 0)?, &["Declarations"]) {
      let inner = child(declaration, 0)?;
      if inner.name() == "Function" {
        let (function, line) = self.function(inner)?;
        if functions.contains_key(&function.name) {
          return Err(CompileError::DuplicateFunction {
            name: function.name,
            line,
          });
        }
        functions.insert(function.name.clone(), Rc::new(function));
      } else {
        self.statement(&mut init, inner)?;
      }
    }

    finish_body(&mut init);

    Ok(CompiledFile {
      name: self.file.to_owned(),
      functions,
      initializer: Rc::new(init.finish(INITIALIZER, self.file, vec![])),
    })
  }

  /// `function name ( params ) { body }`. The body runs in the frame's own
  /// scope, so it gets no block scope of its own.
  fn function(&self, node: &Node) -> Result<(Function, usize), CompileError> {
    let name = token(child(node, 1)?)?;
    let parameters = flatten(child(node, 3)?, &["ParameterList", "ParameterTail"])
      .into_iter()
      .map(|param| token(param).map(|t| t.text.clone()))
      .collect::<Result<Vec<_>, _>>()?;

    let mut asm = Assembler::default();
    self.statements(&mut asm, child(child(node, 5)?, 1)?)?;
    finish_body(&mut asm);

    log::debug!("compiled {}::{}", self.file, name.text);
    Ok((asm.finish(&name.text, self.file, parameters), name.line))
  }
}

/// Every body ends with an implicit `return;`.
fn finish_body(asm: &mut Assembler) {
  asm.emit(Instruction::PushUndefined);
  asm.emit(Instruction::Return);
}

/// Items of a right-recursive list such as `Statements -> Statement
/// Statements | ()`. Nodes named in `tails` continue the list; `,`
/// separators are dropped.
fn flatten<'n>(node: &'n Node, tails: &[&str]) -> Vec<&'n Node> {
  let mut items = vec![];
  collect_items(node, tails, &mut items);
  items
}

fn collect_items<'n>(node: &'n Node, tails: &[&str], items: &mut Vec<&'n Node>) {
  for child in node.children() {
    match child {
      Node::Interior { rule, .. } if tails.contains(&rule.as_str()) => {
        collect_items(child, tails, items);
      }
      Node::Leaf(token) if token.kind == TokenType::Punctuation && token.text == "," => {}
      _ => items.push(child),
    }
  }
}

fn child(node: &Node, index: usize) -> Result<&Node, CompileError> {
  node.children().get(index).ok_or_else(|| unsupported(node))
}

fn token(node: &Node) -> Result<&Token, CompileError> {
  node.token().ok_or_else(|| unsupported(node))
}

fn unsupported(node: &Node) -> CompileError {
  CompileError::Unsupported(node.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::disassemble;
  use insta::assert_snapshot;
  use lr::ParserKind;

  fn compile(source: &str) -> Result<CompiledFile, CompileError> {
    let table = crate::build_table(ParserKind::Slr).unwrap();
    compile_file("test.earle", source, &table, &Operators::new())
  }

  #[test]
  fn precedence_and_assignment() {
    let file = compile("a = 1 + 2 * 3 - 4;").unwrap();
    assert_snapshot!(disassemble(&file.initializer).unwrap(), @r###"
    0000 PushRef a
    0003 PushInt 1
    0008 PushInt 2
    0013 PushInt 3
    0018 Binary *
    0021 Binary +
    0024 PushInt 4
    0029 Binary -
    0032 Write
    0033 Pop
    0034 PushUndefined
    0035 Return
    "###);
  }

  #[test]
  fn short_circuit_keeps_the_deciding_operand() {
    let file = compile("x = a || b && c;").unwrap();
    assert_snapshot!(disassemble(&file.initializer).unwrap(), @r###"
    0000 PushRef x
    0003 PushRef a
    0006 Read
    0007 JumpIfTrueKeep 27
    0012 Pop
    0013 PushRef b
    0016 Read
    0017 JumpIfFalseKeep 27
    0022 Pop
    0023 PushRef c
    0026 Read
    0027 Write
    0028 Pop
    0029 PushUndefined
    0030 Return
    "###);
  }

  #[test]
  fn functions_and_calls() {
    let file = compile(r"
function add(a, b) {
  return a + b;
}
print(add(1, 2));
    ").unwrap();

    let add = file.function("add").unwrap();
    assert_eq!(add.parameters, vec!["a".to_owned(), "b".to_owned()]);
    assert_snapshot!(disassemble(add).unwrap(), @r###"
    0000 PushRef a
    0003 Read
    0004 PushRef b
    0007 Read
    0008 Binary +
    0011 Return
    0012 PushUndefined
    0013 Return
    "###);
    assert_snapshot!(disassemble(&file.initializer).unwrap(), @r###"
    0000 PushInt 1
    0005 PushInt 2
    0010 Call add 2  ; line 5
    0016 Call print 1  ; line 5
    0024 Pop
    0025 PushUndefined
    0026 Return
    "###);
  }

  #[test]
  fn control_flow() {
    let file = compile(r"
var i = 0;
while (i < 3) {
  if (i == 1) { i = i + 2; } else { i = i + 1; }
}
    ").unwrap();
    let code = disassemble(&file.initializer).unwrap();

    assert!(code.contains("JumpIfFalse"));
    assert!(code.contains("EnterScope"));
    assert_eq!(code.matches("EnterScope").count(), code.matches("LeaveScope").count());
  }

  #[test]
  fn compile_errors() {
    assert!(matches!(
      compile("function f() {} function f() {}"),
      Err(CompileError::DuplicateFunction { line: 1, .. })));
    assert!(matches!(compile("a = ;"), Err(CompileError::Parse(_))));
    assert!(matches!(compile("a = 1 # 2;"), Err(CompileError::Lex(_))));
    assert!(matches!(
      compile("a = 99999999999;"),
      Err(CompileError::InvalidLiteral { line: 1, column: 5, .. })));
  }

  #[test]
  fn unknown_operator() {
    let table = crate::build_table(ParserKind::Slr).unwrap();
    let mut operators = Operators::default();
    operators.register_binary("+", 1, |a, _| Ok(a.clone()));

    assert_eq!(
      compile_file("t", "a = 1 * 2;", &table, &operators),
      Err(CompileError::UnknownOperator {
        operator: "*".to_owned(),
        line: 1,
        column: 7,
      }));
  }
}
