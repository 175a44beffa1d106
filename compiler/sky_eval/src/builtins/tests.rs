use pretty_assertions::assert_eq;

use crate::log_sink::{LogRecord, Severity};
use crate::test_helpers::{eval, eval_err, run_logged};
use crate::Value;

fn ints(values: &[i64]) -> Value {
    Value::list(values.iter().copied().map(Value::Int).collect())
}

#[test]
fn len_counts_characters() {
    assert_eq!(eval("len('héllo')"), Value::Int(5));
    assert_eq!(eval("len({'a': 1})"), Value::Int(1));
    assert!(eval_err("len(3)").contains("expected sequence, got int"));
}

#[test]
fn int_parsing() {
    assert_eq!(eval("int(' 42 ')"), Value::Int(42));
    assert_eq!(eval("int('-0x1f', 16)"), Value::Int(-31));
    assert_eq!(eval("int(True)"), Value::Int(1));
    assert!(eval_err("int('x1')").contains("invalid literal"));
    assert!(eval_err("int('1', 99)").contains("invalid base"));
}

#[test]
fn range_forms() {
    assert_eq!(eval("range(3)"), ints(&[0, 1, 2]));
    assert_eq!(eval("range(1, 4)"), ints(&[1, 2, 3]));
    assert_eq!(eval("range(5, 0, -2)"), ints(&[5, 3, 1]));
    assert!(eval_err("range(1, 2, 0)").contains("step must not be zero"));
}

#[test]
fn sorted_with_reverse() {
    assert_eq!(eval("sorted([3, 1, 2], reverse = True)"), ints(&[3, 2, 1]));
    assert!(eval_err("sorted([1, 'a'])").contains("int"));
}

#[test]
fn dict_constructor() {
    assert_eq!(eval("dict([('a', 1)], b = 2)['b']"), Value::Int(2));
    assert_eq!(eval("dict({'a': 1})['a']"), Value::Int(1));
    assert!(eval_err("dict([1])").contains("must be pairs"));
}

#[test]
fn zip_and_enumerate() {
    assert_eq!(
        eval("zip([1, 2, 3], ['a', 'b'])"),
        Value::list(vec![
            Value::tuple(vec![Value::Int(1), Value::string("a")]),
            Value::tuple(vec![Value::Int(2), Value::string("b")]),
        ])
    );
    assert_eq!(
        eval("enumerate(['x'], start = 1)"),
        Value::list(vec![Value::tuple(vec![Value::Int(1), Value::string("x")])])
    );
}

#[test]
fn min_max_any_all() {
    assert_eq!(eval("min([3, 1, 2])"), Value::Int(1));
    assert_eq!(eval("max(3, 7, 5)"), Value::Int(7));
    assert!(eval_err("max([])").contains("empty sequence"));
    assert_eq!(eval("any([0, '', 'x'])"), Value::Bool(true));
    assert_eq!(eval("all([1, []])"), Value::Bool(false));
}

#[test]
fn reflection() {
    assert_eq!(eval("type([])"), Value::string("list"));
    assert_eq!(eval("hasattr(struct(a = 1), 'a')"), Value::Bool(true));
    assert_eq!(eval("hasattr('', 'nope')"), Value::Bool(false));
    assert_eq!(eval("getattr(struct(a = 1), 'b', 'fallback')"), Value::string("fallback"));
    assert!(eval_err("struct(1)").contains("keyword arguments only"));
}

#[test]
fn conversions() {
    assert_eq!(eval("str([1, 'a'])"), Value::string(r#"[1, "a"]"#));
    assert_eq!(eval("repr('a')"), Value::string("\"a\""));
    assert_eq!(eval("bool([])"), Value::Bool(false));
    assert_eq!(eval("tuple([1])"), Value::tuple(vec![Value::Int(1)]));
    assert_eq!(eval("reversed([1, 2])"), ints(&[2, 1]));
}

#[test]
fn print_writes_to_log_sink() {
    let (result, sink) = run_logged("print('a', 1, sep = '-')\n");
    assert!(result.is_ok());
    assert_eq!(
        sink.records(),
        vec![LogRecord {
            severity: Severity::Info,
            message: "a-1".to_string(),
        }]
    );
}
