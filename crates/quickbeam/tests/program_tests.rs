//! Whole-program tests: complete scripts run through every phase

use std::rc::Rc;

use pretty_assertions::assert_eq;
use quickbeam::*;

fn run_capture(src: &str) -> (Value, Rc<CaptureSink>) {
    let sink = Rc::new(CaptureSink::new());
    let ctx = EvalContext::new().with_output(sink.clone());
    match run_source(src, &ctx) {
        Ok(value) => (value, sink),
        Err(e) => panic!("program failed:\n{}", render(&e, src)),
    }
}

fn printed(src: &str) -> Vec<String> {
    run_capture(src).1.take()
}

// ═══════════════════════════════════════════════════════════════════════
// Fibonacci
// ═══════════════════════════════════════════════════════════════════════

const FIB_RECURSIVE: &str = r#"
function fib1(n) {
  if (copy n) < 2 {
    return n
  }
  return fib1((copy n) - 1) + fib1((copy n) - 2)
}

print fib1(10)
"#;

const FIB_ITERATIVE: &str = r#"
function fib2(var n) {
  var a = 0
  var b = 1
  while (copy n) > 0 {
    let next = (copy a) + (copy b)
    set a = b
    set b = next
    set n = (copy n) - 1
  }
  return a
}

print fib2(10)
print fib2(30)
"#;

#[test]
fn test_recursive_fibonacci() {
    assert_eq!(printed(FIB_RECURSIVE), vec!["55"]);
}

#[test]
fn test_iterative_fibonacci() {
    assert_eq!(printed(FIB_ITERATIVE), vec!["55", "832040"]);
}

// ═══════════════════════════════════════════════════════════════════════
// FizzBuzz
// ═══════════════════════════════════════════════════════════════════════

const FIZZ_BUZZ: &str = r#"
function fizzBuzz(n) {
  var i = 1
  while (copy i) <= (copy n) {
    if ((copy i) % 15) == 0 {
      print "FizzBuzz"
    } else if ((copy i) % 3) == 0 {
      print "Fizz"
    } else if ((copy i) % 5) == 0 {
      print "Buzz"
    } else {
      print copy i
    }
    set i = (copy i) + 1
  }
}

fizzBuzz(15)
"#;

#[test]
fn test_fizz_buzz() {
    let (_, sink) = run_capture(FIZZ_BUZZ);
    assert_eq!(
        sink.joined(","),
        "1,2,Fizz,4,Buzz,Fizz,7,8,Fizz,Buzz,11,Fizz,13,14,FizzBuzz"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Classes
// ═══════════════════════════════════════════════════════════════════════

const EXAMPLE_CLASS: &str = r#"
class Example {
  let name
  constructor(name) {
    set this.name = name
  }
  printName() {
    print copy this.name
    return this
  }
}

let example = Example("quickbeam")
example.printName()
  .printName()
"#;

#[test]
fn test_method_returning_this_chains() {
    let (value, sink) = run_capture(EXAMPLE_CLASS);
    assert_eq!(sink.lines(), vec!["quickbeam", "quickbeam"]);
    assert_eq!(value.to_string(), "Example { name: \"quickbeam\" }");
}

const COUNTER: &str = r#"
class Counter {
  var count
  constructor() {
    set this.count = 0
  }
  mut bump() {
    set this.count = (copy this.count) + 1
  }
  get() {
    return copy this.count
  }
}

let mut c = Counter()
let alias = copy c
c.bump()
c.bump()
print alias.get()
"#;

#[test]
fn test_copies_share_the_instance() {
    assert_eq!(printed(COUNTER), vec!["2"]);
}

#[test]
fn test_mut_method_through_immutable_binding_is_rejected() {
    let src = COUNTER.replace("let mut c", "let c");
    let err = run_source(&src, &EvalContext::new()).unwrap_err();
    assert_eq!(err.code(), "E0203");
}

const LINKED_LIST: &str = r#"
class Node {
  let value
  var mut next
  constructor(value) {
    set this.value = value
  }
}

class List {
  var mut head
  var size
  constructor() {
    set this.size = 0
  }
  mut push(value) {
    let mut node = Node(value)
    set node.next = this.head
    set this.head = node
    set this.size = (copy this.size) + 1
  }
  sum() {
    var total = 0
    var cursor = copy this.head
    while (copy cursor) != nil {
      set total = (copy total) + (copy cursor.value)
      set cursor = copy cursor.next
    }
    return total
  }
}

let mut list = List()
list.push(1)
list.push(2)
list.push(3)
print copy list.size
print list.sum()
"#;

#[test]
fn test_linked_list() {
    assert_eq!(printed(LINKED_LIST), vec!["3", "6"]);
}

// ═══════════════════════════════════════════════════════════════════════
// Objects and Closures
// ═══════════════════════════════════════════════════════════════════════

const OBJECT_LITERAL: &str = r#"
let mut myObject = { x: 1, label: "point" }
set myObject.x = (copy myObject.x) + 41
print copy myObject.x
print myObject
"#;

#[test]
fn test_object_literal_program() {
    assert_eq!(
        printed(OBJECT_LITERAL),
        vec!["42", "{ x: 42, label: \"point\" }"]
    );
}

const COUNTER_CLOSURE: &str = r#"
function makeCounter() {
  var n = 0
  function next() {
    set n = (copy n) + 1
    return copy n
  }
  return next
}

let first = makeCounter()
let second = makeCounter()
first()
first()
print first()
print second()
"#;

#[test]
fn test_closures_keep_separate_state() {
    assert_eq!(printed(COUNTER_CLOSURE), vec!["3", "1"]);
}

// ═══════════════════════════════════════════════════════════════════════
// Limits and Runtime Failures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_runaway_recursion_hits_depth_limit() {
    let src = "function forever(n) {\n  return forever((copy n) + 1)\n}\nforever(0)";
    let ctx = EvalContext::new().with_max_call_depth(50);
    let err = run_source(src, &ctx).unwrap_err();
    assert!(matches!(err, Error::Eval(EvalError::StackOverflow { max: 50, .. })));
}

#[test]
fn test_deep_recursion_within_limit() {
    let src = "function depth(n) {\n  if (copy n) == 0 {\n    return 0\n  }\n  return 1 + depth((copy n) - 1)\n}\nprint depth(500)";
    assert_eq!(printed(src), vec!["500"]);
}

#[test]
fn test_unbound_capture_at_runtime() {
    let src = "show()\nlet later = 1\nfunction show() {\n  print copy later\n}";
    let err = run_source(src, &EvalContext::new()).unwrap_err();
    assert_eq!(err.phase(), "eval");
    assert!(matches!(
        err,
        Error::Eval(EvalError::UnboundName { ref name, .. }) if name == "later"
    ));
}

#[test]
fn test_output_before_failure_is_kept() {
    let sink = Rc::new(CaptureSink::new());
    let ctx = EvalContext::new().with_output(sink.clone());
    let err = run_source("print \"before\"\nprint 1 / 0\nprint \"after\"", &ctx).unwrap_err();
    assert_eq!(err.code(), "E0300");
    assert_eq!(sink.lines(), vec!["before".to_string()]);
}

// ═══════════════════════════════════════════════════════════════════════
// Lists
// ═══════════════════════════════════════════════════════════════════════

const LIST_SUM: &str = r#"
function sum(xs) {
  var total = 0
  var i = 0
  while (copy i) < 4 {
    set total = (copy total) + xs[copy i]
    set i = (copy i) + 1
  }
  return total
}

let mut squares = [0, 0, 0, 0]
var i = 0
while (copy i) < 4 {
  set squares[copy i] = (copy i) * (copy i)
  set i = (copy i) + 1
}
print copy squares
print sum(squares)
"#;

#[test]
fn test_list_program() {
    assert_eq!(printed(LIST_SUM), vec!["[0, 1, 4, 9]", "14"]);
}

// ═══════════════════════════════════════════════════════════════════════
// Layout
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_call_continues_on_next_line() {
    let src = "function id(v) {\n  return v\n}\nprint id\n(7)";
    assert_eq!(printed(src), vec!["7"]);
}

#[test]
fn test_bracket_on_next_line_starts_a_statement() {
    let src = "let xs = [1, 2]\nprint copy xs\n[3]";
    let (value, sink) = run_capture(src);
    assert_eq!(sink.take(), vec!["[1, 2]"]);
    assert_eq!(value.to_string(), "[3]");
}

#[test]
fn test_operator_on_next_line_is_rejected() {
    let err = run_source("print 1\n+ 2", &EvalContext::new()).unwrap_err();
    assert_eq!(err.phase(), "parse");
}

#[test]
fn test_thousands_of_nested_blocks() {
    let depth = 5000;
    let mut src = String::new();
    for _ in 0..depth {
        src.push_str("if true {\n");
    }
    src.push_str("print \"deep\"\n");
    for _ in 0..depth {
        src.push_str("}\n");
    }
    assert_eq!(printed(&src), vec!["deep"]);
}
