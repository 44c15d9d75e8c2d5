use earle::bytecode::disassemble;
use earle::vm::MAX_CALL_DEPTH;
use earle::{CompileError, Invocation, Options, Runtime, RuntimeError, Value};
use insta::assert_snapshot;
use lr::{ParseError, ParserKind};
use pretty_assertions::assert_eq;

fn init() {
  let _ = env_logger::builder().is_test(true).try_init();
}

fn load(source: &str) -> Runtime {
  init();
  let mut runtime = Runtime::new(Options::default()).unwrap();
  runtime.compile_file("main.earle", source).unwrap();
  runtime.run_until_idle();
  runtime
}

fn global(runtime: &Runtime, name: &str) -> Option<Value> {
  runtime.global("main.earle", name)
}

#[test]
fn assignment_binds_a_global() {
  let runtime = load("a = 1 + 2;");
  assert_eq!(global(&runtime, "a"), Some(Value::Int(3)));
}

#[test]
fn precedence_and_unary_operators() {
  let runtime = load(r#"
a = 2 + 3 * 4 - 10 / 5;
b = -(2 + 3) * 2;
c = !0 + !5;
d = 7 % 4 == 3 && 1 < 2;
e = "n" + 1 + 2.5;
  "#);

  assert_eq!(global(&runtime, "a"), Some(Value::Int(12)));
  assert_eq!(global(&runtime, "b"), Some(Value::Int(-10)));
  assert_eq!(global(&runtime, "c"), Some(Value::Int(1)));
  assert_eq!(global(&runtime, "d"), Some(Value::Int(1)));
  assert_eq!(global(&runtime, "e"), Some(Value::from("n12.5")));
}

#[test]
fn short_circuit_skips_the_right_operand() {
  let runtime = load(r"
var hits = 0;
function touch() {
  hits = hits + 1;
  return 7;
}
r = 0 && touch();
s = 3 || touch();
t = 1 && touch();
u = 0 || touch();
  ");

  assert_eq!(global(&runtime, "hits"), Some(Value::Int(2)));
  assert_eq!(global(&runtime, "r"), Some(Value::Int(0)));
  assert_eq!(global(&runtime, "s"), Some(Value::Int(3)));
  assert_eq!(global(&runtime, "t"), Some(Value::Int(7)));
  assert_eq!(global(&runtime, "u"), Some(Value::Int(7)));
}

#[test]
fn control_flow_and_recursion() {
  let mut runtime = load(r"
function fib(n) {
  if (n < 2) {
    return n;
  }
  return fib(n - 1) + fib(n - 2);
}

function classify(n) {
  if (n < 0) {
    return -1;
  } else if (n == 0) {
    return 0;
  } else {
    return 1;
  }
}

var total = 0;
var i = 0;
while (i < 5) {
  total = total + i;
  i = i + 1;
}
  ");

  assert_eq!(global(&runtime, "total"), Some(Value::Int(10)));
  assert_eq!(runtime.invoke("fib", vec![Value::Int(10)]), Ok(Invocation::Complete(Value::Int(55))));
  assert_eq!(runtime.invoke("classify", vec![Value::Int(-4)]), Ok(Invocation::Complete(Value::Int(-1))));
  assert_eq!(runtime.invoke("classify", vec![Value::Int(0)]), Ok(Invocation::Complete(Value::Int(0))));
  assert_eq!(runtime.invoke("classify", vec![Value::Int(9)]), Ok(Invocation::Complete(Value::Int(1))));
}

#[test]
fn block_scopes_shadow() {
  let mut runtime = load(r"
var x = 1;
function shadow() {
  var x = 2;
  {
    var x = 3;
  }
  return x;
}
{
  var y = 5;
  x = x + y;
}
  ");

  assert_eq!(runtime.invoke("shadow", vec![]), Ok(Invocation::Complete(Value::Int(2))));
  assert_eq!(global(&runtime, "x"), Some(Value::Int(6)));
  assert_eq!(global(&runtime, "y"), None);
}

#[test]
fn functions_without_return_give_undefined() {
  let mut runtime = load("function nothing() {}");
  assert_eq!(runtime.invoke("nothing", vec![]), Ok(Invocation::Complete(Value::Undefined)));
}

#[test]
fn runtime_errors() {
  let mut runtime = load("var x = 1;\nmissing(x);\nfunction one(a) { return a; }");

  // the initializer was thread 0
  assert_eq!(runtime.result(0), Some(&Err(RuntimeError::UndefinedFunction {
    name: "missing".to_owned(),
    line: Some(2),
  })));
  assert_eq!(runtime.invoke("one", vec![]), Err(RuntimeError::ArityMismatch {
    name: "one".to_owned(),
    expected: 1,
    found: 0,
    line: None,
  }));
  assert_eq!(runtime.invoke("two", vec![]), Err(RuntimeError::UndefinedFunction {
    name: "two".to_owned(),
    line: None,
  }));

  runtime.compile_file("div.earle", "function f() { return 1 / 0; }").unwrap();
  assert_eq!(runtime.invoke("f", vec![]), Err(RuntimeError::DivisionByZero));
}

#[test]
fn deep_recursion_runs_without_host_recursion() {
  let mut runtime = load(r"
function down(n) {
  if (n == 0) {
    return 0;
  }
  return down(n - 1);
}
  ");

  let depth = MAX_CALL_DEPTH as i32 - 1;
  assert_eq!(runtime.invoke("down", vec![Value::Int(depth)]), Ok(Invocation::Complete(Value::Int(0))));
}

#[test]
fn runaway_recursion_is_an_error() {
  let mut runtime = load(r"
function down(n) {
  return down(n - 1);
}
  ");

  assert_eq!(runtime.invoke("down", vec![Value::Int(5000)]), Err(RuntimeError::CallDepthExceeded {
    name: "down".to_owned(),
    depth: MAX_CALL_DEPTH,
  }));
  // the runtime stays usable
  runtime.compile_file("other.earle", "x = 1;").unwrap();
  runtime.run_until_idle();
  assert_eq!(runtime.global("other.earle", "x"), Some(Value::Int(1)));
}

#[test]
fn loop_bytecode() {
  let mut runtime = load(r"
function count(n) {
  var i = 0;
  while (i < n) {
    i = i + 1;
  }
  return i;
}
  ");

  let file = runtime.file("main.earle").unwrap();
  assert_snapshot!(disassemble(file.function("count").unwrap()).unwrap(), @r###"
  0000 PushInt 0
  0005 Declare i
  0008 PushRef i
  0011 Read
  0012 PushRef n
  0015 Read
  0016 Binary <
  0019 JumpIfFalse 48
  0024 EnterScope
  0025 PushRef i
  0028 PushRef i
  0031 Read
  0032 PushInt 1
  0037 Binary +
  0040 Write
  0041 Pop
  0042 LeaveScope
  0043 Jump 8
  0048 PushRef i
  0051 Read
  0052 Return
  0053 PushUndefined
  0054 Return
  "###);
  assert_eq!(runtime.invoke("count", vec![Value::Int(5)]), Ok(Invocation::Complete(Value::Int(5))));
}

#[test]
fn functions_across_files() {
  let mut runtime = load("function helper(x) { return x * 2; }");
  runtime.compile_file("other.earle", "doubled = helper(21);").unwrap();
  runtime.run_until_idle();

  assert_eq!(runtime.global("other.earle", "doubled"), Some(Value::Int(42)));
}

#[test]
fn cached_table_behaves_like_a_built_one() {
  init();
  let built = Runtime::new(Options {
    parser_kind: ParserKind::Slr,
    table: None,
  }).unwrap();

  let mut cached = Runtime::new(Options {
    parser_kind: ParserKind::Slr,
    table: Some(built.table_bytes()),
  }).unwrap();
  assert_eq!(cached.table(), built.table());

  cached.compile_file("main.earle", "function f(a, b) { return a - b; }").unwrap();
  assert_eq!(
    cached.invoke("f", vec![Value::Int(5), Value::Int(8)]),
    Ok(Invocation::Complete(Value::Int(-3))));
}

#[test]
fn corrupt_table_is_rejected() {
  init();
  let result = Runtime::new(Options {
    parser_kind: ParserKind::Lalr,
    table: Some(vec![0, 0, 0]),
  });
  assert!(matches!(result, Err(earle::SetupError::Decode(_))));
}

/// Serialized table whose default rule carries one more copy of its first
/// element, so reducing by it pops more than the parser ever pushed.
fn lengthen_default_rule(mut bytes: Vec<u8>) -> Vec<u8> {
  let default_rule = i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
  let after_nul = |bytes: &[u8], from: usize| {
    from + bytes[from..].iter().position(|&b| b == 0).unwrap() + 1
  };

  // rules start after the header: name \0, elements, 0xff
  let mut pos = 12;
  for slot in 0.. {
    pos = after_nul(&bytes, pos);
    let first = pos;
    while bytes[pos] != 0xff {
      pos = after_nul(&bytes, pos + 2);
    }
    if slot == default_rule {
      let element = bytes[first..after_nul(&bytes, first + 2)].to_vec();
      let tail = bytes.split_off(pos);
      bytes.extend(element);
      bytes.extend(tail);
      return bytes;
    }
    pos += 1;
  }
  unreachable!()
}

#[test]
fn inconsistent_cached_table_fails_the_compile() {
  init();
  let built = Runtime::new(Options::default()).unwrap();
  let mut cached = Runtime::new(Options {
    parser_kind: ParserKind::Lalr,
    table: Some(lengthen_default_rule(built.table_bytes())),
  }).unwrap();

  let result = cached.compile_file("main.earle", "x = 1;");
  assert!(
    matches!(result, Err(CompileError::Parse(ParseError::MalformedTable { .. }))),
    "{:?}", result.err());
}
