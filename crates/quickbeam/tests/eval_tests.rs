//! Evaluator tests: operators, scoping, functions, classes and objects

use std::rc::Rc;

use pretty_assertions::assert_eq;
use quickbeam::*;

fn eval(src: &str) -> Value {
    run_source(src, &EvalContext::new()).unwrap_or_else(|e| panic!("{:?} failed: {}", src, e))
}

fn eval_err(src: &str) -> EvalError {
    match run_source(src, &EvalContext::new()) {
        Err(Error::Eval(e)) => e,
        Err(other) => panic!("expected eval error, got {} error: {}", other.phase(), other),
        Ok(v) => panic!("expected eval error, got {}", v),
    }
}

/// Run `src` and return what it printed.
fn output(src: &str) -> Vec<String> {
    let sink = Rc::new(CaptureSink::new());
    let ctx = EvalContext::new().with_output(sink.clone());
    if let Err(e) = run_source(src, &ctx) {
        panic!("{:?} failed: {}", src, e);
    }
    sink.take()
}

// ═══════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic() {
    assert_eq!(eval("(2 * 3) + 4"), Value::Number(10.0));
    assert_eq!(eval("7 % 3"), Value::Number(1.0));
    assert_eq!(eval("1 / 4"), Value::Number(0.25));
    assert_eq!(eval("-(3 - 5)"), Value::Number(2.0));
}

#[test]
fn test_comparison_and_equality() {
    assert_eq!(eval("3 <= 3"), Value::Bool(true));
    assert_eq!(eval("\"abc\" < \"abd\""), Value::Bool(true));
    assert_eq!(eval("1 == \"1\""), Value::Bool(false));
    assert_eq!(eval("nil == nil"), Value::Bool(true));
    assert_eq!(eval("nil != false"), Value::Bool(true));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("\"quick\" + \"beam\""), Value::string("quickbeam"));
}

#[test]
fn test_logical_operators_short_circuit() {
    let lines = output("function loud() {\n  print \"called\"\n  return true\n}\nprint false and loud()\nprint true or loud()\nprint true and loud()");
    assert_eq!(lines, vec!["false", "true", "called", "true"]);
}

#[test]
fn test_truthiness() {
    assert_eq!(eval("!nil"), Value::Bool(true));
    assert_eq!(eval("!0"), Value::Bool(false));
    assert_eq!(eval("!\"\""), Value::Bool(false));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(eval_err("print 1 / 0"), EvalError::DivisionByZero { .. }));
    assert!(matches!(eval_err("print 1 % 0"), EvalError::DivisionByZero { .. }));
}

#[test]
fn test_type_mismatch_message() {
    let err = eval_err("print \"a\" + 1");
    assert_eq!(
        err.to_string(),
        "type mismatch: cannot apply `+` to `string` and `number`"
    );
    assert!(matches!(eval_err("print -\"a\""), EvalError::TypeMismatch { .. }));
}

// ═══════════════════════════════════════════════════════════════════════
// Statements and Scopes
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_print_formats() {
    let lines = output("print 3\nprint 2.5\nprint \"text\"\nprint nil\nprint true");
    assert_eq!(lines, vec!["3", "2.5", "text", "nil", "true"]);
}

#[test]
fn test_program_value_is_last_expression() {
    assert_eq!(eval("let x = 2\n21 * (copy x)"), Value::Number(42.0));
    assert_eq!(eval("let x = 2"), Value::Nil);
}

#[test]
fn test_block_scope_shadows() {
    let lines = output("let x = 1\nif true {\n  let x = 2\n  print x\n}\nprint x");
    assert_eq!(lines, vec!["2", "1"]);
}

#[test]
fn test_set_reaches_outer_scope() {
    let lines = output("var total = 0\nif true {\n  set total = 5\n}\nprint total");
    assert_eq!(lines, vec!["5"]);
}

#[test]
fn test_else_if_chain() {
    let src = "function grade(n) {\n  if (copy n) > 89 {\n    return \"A\"\n  } else if (copy n) > 79 {\n    return \"B\"\n  } else {\n    return \"C\"\n  }\n}\nprint grade(95)\nprint grade(85)\nprint grade(10)";
    assert_eq!(output(src), vec!["A", "B", "C"]);
}

#[test]
fn test_while_with_break_and_continue() {
    let src = "var i = 0\nwhile true {\n  set i = (copy i) + 1\n  if (copy i) == 2 {\n    continue\n  }\n  if (copy i) > 4 {\n    break\n  }\n  print copy i\n}";
    assert_eq!(output(src), vec!["1", "3", "4"]);
}

#[test]
fn test_return_from_inside_loop() {
    let src = "function first(limit) {\n  var i = 0\n  while true {\n    if (copy i) == (copy limit) {\n      return i\n    }\n    set i = (copy i) + 1\n  }\n}\nprint first(3)";
    assert_eq!(output(src), vec!["3"]);
}

#[test]
fn test_top_level_return_ends_program() {
    let sink = Rc::new(CaptureSink::new());
    let ctx = EvalContext::new().with_output(sink.clone());
    let value = run_source("print 1\nreturn 7\nprint 2", &ctx).unwrap();
    assert_eq!(value, Value::Number(7.0));
    assert_eq!(sink.lines(), vec!["1".to_string()]);
}

// ═══════════════════════════════════════════════════════════════════════
// Functions and Closures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_closure_captures_environment() {
    let src = "function makeGreeter(greeting) {\n  function greet(name) {\n    return (copy greeting) + name\n  }\n  return greet\n}\nlet hello = makeGreeter(\"hello, \")\nprint hello(\"world\")";
    assert_eq!(output(src), vec!["hello, world"]);
}

#[test]
fn test_closure_sees_later_assignment() {
    let src = "var count = 0\nfunction show() {\n  print copy count\n}\nset count = 3\nshow()";
    assert_eq!(output(src), vec!["3"]);
}

#[test]
fn test_function_values_print() {
    assert_eq!(output("function f() {}\nprint f"), vec!["<function f>"]);
    assert_eq!(output("class Thing {}\nprint Thing"), vec!["<class Thing>"]);
}

#[test]
fn test_arity_mismatch() {
    let err = eval_err("function pair(a, b) {}\npair(1)");
    assert_eq!(
        err.to_string(),
        "`pair` takes 2 argument(s) but 1 were supplied"
    );
}

#[test]
fn test_calling_a_number() {
    let err = eval_err("let n = 3\nn()");
    assert_eq!(err.to_string(), "type mismatch: `number` is not callable");
}

#[test]
fn test_stack_overflow_is_reported() {
    let ctx = EvalContext::new().with_max_call_depth(50);
    let err = run_source("function down(n) {\n  return down(n)\n}\ndown(1)", &ctx).unwrap_err();
    assert!(matches!(
        err,
        Error::Eval(EvalError::StackOverflow { max: 50, .. })
    ));
}

#[test]
fn test_hoisted_call_before_captured_binding() {
    let err = eval_err("show()\nlet later = 1\nfunction show() {\n  print copy later\n}");
    assert!(matches!(err, EvalError::UnboundName { ref name, .. } if name == "later"));
}

// ═══════════════════════════════════════════════════════════════════════
// Classes and Objects
// ═══════════════════════════════════════════════════════════════════════

const POINT: &str = "class Point {\n  let x\n  var mut tag\n  constructor(x) {\n    set this.x = x\n    set this.tag = { name: \"origin\" }\n  }\n  getX() {\n    return copy this.x\n  }\n  mut retag(name) {\n    set this.tag.name = name\n  }\n}\n";

#[test]
fn test_constructor_and_method() {
    let src = format!("{}let p = Point(4)\nprint p.getX()", POINT);
    assert_eq!(output(&src), vec!["4"]);
}

#[test]
fn test_instance_display() {
    let src = format!("{}let p = Point(1)\nprint p", POINT);
    assert_eq!(output(&src), vec!["Point { x: 1, tag: { name: \"origin\" } }"]);
}

#[test]
fn test_mut_field_path_write() {
    let src = format!("{}let mut p = Point(1)\np.retag(\"moved\")\nprint copy p.tag.name", POINT);
    assert_eq!(output(&src), vec!["moved"]);
}

#[test]
fn test_let_field_cannot_be_reassigned_after_construction() {
    let src = format!("{}let mut p = Point(1)\nset p.x = 2", POINT);
    let err = eval_err(&src);
    assert!(matches!(
        err,
        EvalError::ImmutableField { ref field, reason: "field is not declared `var`", .. } if field == "x"
    ));
}

#[test]
fn test_nested_write_through_non_mut_field() {
    let src = "class Holder {\n  var inner\n  constructor() {\n    set this.inner = { v: 1 }\n  }\n}\nlet mut h = Holder()\nset h.inner.v = 2";
    let err = eval_err(src);
    assert!(matches!(
        err,
        EvalError::ImmutableField { reason: "field is not declared `mut`", .. }
    ));
}

#[test]
fn test_undeclared_field_on_instance() {
    let src = format!("{}let mut p = Point(1)\nset p.z = 2", POINT);
    assert!(matches!(
        eval_err(&src),
        EvalError::UndefinedField { ref field, ref type_name, .. } if field == "z" && type_name == "Point"
    ));
}

#[test]
fn test_missing_method() {
    let src = format!("{}let p = Point(1)\np.nothing()", POINT);
    assert!(matches!(eval_err(&src), EvalError::UndefinedField { .. }));
}

#[test]
fn test_object_literal_fields() {
    let src = "let mut myObject = { x: 1 }\nset myObject.x = (copy myObject.x) + 1\nset myObject.y = \"new\"\nprint myObject";
    assert_eq!(output(src), vec!["{ x: 2, y: \"new\" }"]);
}

#[test]
fn test_function_stored_in_field_is_called_without_receiver() {
    let src = "function double(n) {\n  return n * 2\n}\nlet tools = { twice: double }\nprint tools.twice(21)";
    assert_eq!(output(src), vec!["42"]);
}

#[test]
fn test_copy_of_object_aliases() {
    let src = "let mut a = { n: 1 }\nlet b = copy a\nset a.n = 5\nprint copy b.n";
    assert_eq!(output(src), vec!["5"]);
}

#[test]
fn test_object_identity_equality() {
    let src = "let a = { n: 1 }\nlet b = copy a\nprint (copy a) == (copy b)\nprint { n: 1 } == { n: 1 }";
    assert_eq!(output(src), vec!["true", "false"]);
}

#[test]
fn test_field_on_nil() {
    let err = eval_err("let n = nil\nprint n.field");
    assert!(matches!(
        err,
        EvalError::UndefinedField { ref type_name, .. } if type_name == "nil"
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// Lists
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_list_literal_and_index() {
    let src = "let xs = [10, \"two\", nil]\nprint xs\nprint xs[1]\nprint xs[0] + 1";
    assert_eq!(output(src), vec!["[10, \"two\", nil]", "two", "11"]);
}

#[test]
fn test_list_element_write() {
    let src = "let mut xs = [1, 2, 3]\nset xs[1] = \"b\"\nprint xs";
    assert_eq!(output(src), vec!["[1, \"b\", 3]"]);
}

#[test]
fn test_nested_list_write_through_field() {
    let src = "let mut grid = { rows: [[0, 0], [0, 0]] }\nset grid.rows[1][0] = 7\nprint copy grid.rows[1]";
    assert_eq!(output(src), vec!["[7, 0]"]);
}

#[test]
fn test_list_concatenation_makes_new_list() {
    let src = "let a = [1]\nlet b = [2, 3]\nlet c = (copy a) + (copy b)\nprint c\nprint a";
    assert_eq!(output(src), vec!["[1, 2, 3]", "[1]"]);
}

#[test]
fn test_index_out_of_range() {
    let err = eval_err("let xs = [1, 2]\nprint xs[2]");
    assert!(matches!(err, EvalError::IndexOutOfRange { len: 2, .. }));
    assert_eq!(err.code(), "E0308");
}

#[test]
fn test_fractional_index_is_out_of_range() {
    let err = eval_err("let mut xs = [1, 2]\nset xs[0.5] = 3");
    assert!(matches!(err, EvalError::IndexOutOfRange { .. }));
}

#[test]
fn test_indexing_a_number() {
    let err = eval_err("let n = 3\nprint n[0]");
    assert!(matches!(err, EvalError::TypeMismatch { ref message, .. } if message.contains("cannot be indexed")));
}

#[test]
fn test_copy_of_list_aliases() {
    let src = "let mut a = [1, 2]\nlet b = copy a\nset a[0] = 9\nprint b\nprint (copy a) == (copy b)\nprint [1] == [1]";
    assert_eq!(output(src), vec!["[9, 2]", "true", "false"]);
}

// ═══════════════════════════════════════════════════════════════════════
// Delete
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_delete_loop_local_each_iteration() {
    let src = "var n = 0\nwhile (copy n) < 2 {\n  let tmp = copy n\n  print tmp\n  delete tmp\n  set n = (copy n) + 1\n}";
    assert_eq!(output(src), vec!["0", "1"]);
}

#[test]
fn test_delete_then_redeclare() {
    let src = "let x = 1\ndelete x\nlet x = 2\nprint x";
    assert_eq!(output(src), vec!["2"]);
}
