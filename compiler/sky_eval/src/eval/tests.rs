use pretty_assertions::assert_eq;

use crate::test_helpers::{eval, eval_err, run};
use crate::{EvalErrorKind, Value};

fn get(source: &str, name: &str) -> Value {
    match run(source) {
        Ok(bindings) => bindings.get(name).cloned().unwrap_or(Value::None),
        Err(e) => panic!("run failed: {e}"),
    }
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
    assert_eq!(eval("(1 + 2) * 3"), Value::Int(9));
    assert_eq!(eval("-7 // 2"), Value::Int(-4));
    assert_eq!(eval("-7 % 3"), Value::Int(2));
    assert_eq!(eval("7 % -3"), Value::Int(-2));
}

#[test]
fn integer_overflow_is_an_error() {
    assert!(eval_err("9223372036854775807 + 1").contains("overflow"));
}

#[test]
fn division_by_zero() {
    assert_eq!(eval_err("1 // 0"), "integer division by zero");
    assert_eq!(eval_err("1 % 0"), "integer division by zero");
}

#[test]
fn huge_repetition_is_an_error() {
    assert!(eval_err("'ab' * 9223372036854775807").contains("overflow"));
    assert!(eval_err("[1] * 9223372036854775807").contains("overflow"));
    assert!(eval_err("(1, 2) * 4611686018427387904").contains("overflow"));
    assert_eq!(eval("'' * 9223372036854775807"), Value::string(""));
    assert_eq!(eval("[] * 9223372036854775807"), Value::list(Vec::new()));
}

#[test]
fn short_circuit_returns_operand() {
    assert_eq!(eval("0 or 'x'"), Value::string("x"));
    assert_eq!(eval("'' and undefined_name"), Value::string(""));
}

#[test]
fn membership() {
    assert_eq!(eval("'a' in ['a', 'b']"), Value::Bool(true));
    assert_eq!(eval("'k' not in {'k': 1}"), Value::Bool(false));
    assert_eq!(eval("'ell' in 'hello'"), Value::Bool(true));
}

#[test]
fn string_operations() {
    assert_eq!(eval("'a' + 'b' * 2"), Value::string("abb"));
    assert_eq!(eval("'%s-%d' % ('x', 3)"), Value::string("x-3"));
    assert_eq!(eval("'hello'[1:3]"), Value::string("el"));
    assert_eq!(eval("'hello'[-1]"), Value::string("o"));
}

#[test]
fn list_and_tuple_slicing() {
    assert_eq!(eval("[1, 2, 3][1:]"), Value::list(vec![Value::Int(2), Value::Int(3)]));
    assert_eq!(eval("(1, 2, 3)[:-2]"), Value::tuple(vec![Value::Int(1)]));
    assert_eq!(eval("[1, 2][5:]"), Value::list(Vec::new()));
}

#[test]
fn index_out_of_range() {
    assert!(eval_err("[1][3]").contains("out of range"));
}

#[test]
fn conditional_expression() {
    assert_eq!(eval("'y' if 1 > 2 else 'n'"), Value::string("n"));
}

#[test]
fn list_comprehension_does_not_leak_loop_variable() {
    let source = "xs = [x * 2 for x in [1, 2, 3] if x != 2]\n";
    assert_eq!(
        get(source, "xs"),
        Value::list(vec![Value::Int(2), Value::Int(6)])
    );
    assert!(matches!(run(source), Ok(b) if b.get("x").is_none()));
}

#[test]
fn nested_comprehension() {
    assert_eq!(
        eval("[a + b for a in ['x', 'y'] for b in ['1', '2']]"),
        Value::string_list(&["x1", "x2", "y1", "y2"])
    );
}

#[test]
fn functions_with_defaults_and_kwargs() {
    let source = "
def f(name, srcs = [], *args, **kwargs):
    return [name, len(srcs), len(args), sorted(kwargs.keys())]

r = f('lib', ['a'], 1, 2, visibility = 'PUBLIC')
";
    assert_eq!(
        get(source, "r"),
        Value::list(vec![
            Value::string("lib"),
            Value::Int(1),
            Value::Int(2),
            Value::string_list(&["visibility"]),
        ])
    );
}

#[test]
fn missing_argument_names_function() {
    let err = run("def f(a):\n    pass\nf()\n").err();
    assert!(matches!(err, Some(e) if e.message() == "f: missing required argument 'a'"));
}

#[test]
fn unexpected_keyword() {
    assert!(run("def f(a):\n    pass\nf(1, b = 2)\n").is_err());
}

#[test]
fn closures_capture_enclosing_locals() {
    let source = "
def outer(prefix):
    def inner(x):
        return prefix + x
    return inner

r = outer('lib_')('core')
";
    assert_eq!(get(source, "r"), Value::string("lib_core"));
}

#[test]
fn lambda() {
    assert_eq!(
        eval("sorted(['bb', 'a', 'ccc'], key = lambda s: len(s))"),
        Value::string_list(&["a", "bb", "ccc"])
    );
}

#[test]
fn recursion_is_rejected() {
    let err = run("def f(n):\n    return f(n - 1) if n else 0\nf(3)\n").err();
    assert!(matches!(
        err.map(|e| e.kind),
        Some(EvalErrorKind::Recursion { name }) if name == "f"
    ));
}

#[test]
fn for_loop_break_continue() {
    let source = "
out = []
for i in range(10):
    if i == 1:
        continue
    if i == 4:
        break
    out.append(i)
";
    assert_eq!(
        get(source, "out"),
        Value::list(vec![Value::Int(0), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn tuple_unpacking() {
    let source = "
d = {'a': 1, 'b': 2}
keys = []
for k, v in d.items():
    keys.append(k + str(v))
x, y = 1, 2
";
    assert_eq!(get(source, "keys"), Value::string_list(&["a1", "b2"]));
    assert_eq!(get(source, "y"), Value::Int(2));
}

#[test]
fn unpack_length_mismatch() {
    assert!(run("a, b = [1, 2, 3]\n").is_err());
}

#[test]
fn augmented_assignment_extends_list_in_place() {
    let source = "
a = [1]
b = a
a += [2]
n = 1
n += 2
";
    assert_eq!(get(source, "b"), Value::list(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(get(source, "n"), Value::Int(3));
}

#[test]
fn index_assignment() {
    let source = "
d = {}
d['k'] = 'v'
l = [0, 0]
l[-1] = 5
";
    assert_eq!(eval_dict_get(source), Value::string("v"));
    assert_eq!(get(source, "l"), Value::list(vec![Value::Int(0), Value::Int(5)]));
}

fn eval_dict_get(source: &str) -> Value {
    match get(source, "d") {
        Value::Dict(d) => d.get(&Value::string("k")).ok().flatten().unwrap_or(Value::None),
        other => panic!("expected dict, got {other:?}"),
    }
}

#[test]
fn struct_fields_are_read_only() {
    assert_eq!(eval("struct(a = 1, b = 'x').b"), Value::string("x"));
    assert!(run("s = struct(a = 1)\ns.a = 2\n").is_err());
    assert!(eval_err("struct(a = 1).c").contains("has no attribute 'c'"));
}

#[test]
fn undefined_name_has_location() {
    let err = run("x = 1\ny = missing\n").err();
    let Some(err) = err else {
        panic!("expected error");
    };
    assert_eq!(err.to_string(), "test.sky:2:5: name 'missing' is not defined");
}

#[test]
fn syntax_error_has_location() {
    let err = run("x = (\n").err();
    assert!(matches!(err, Some(e) if matches!(e.kind, EvalErrorKind::Syntax { .. }) && e.location.is_some()));
}

#[test]
fn error_inside_function_records_call_chain() {
    let source = "
def inner():
    return 1 // 0

def outer():
    return inner()

outer()
";
    let Some(err) = run(source).err() else {
        panic!("expected error");
    };
    let names: Vec<_> = err.call_stack.iter().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["inner", "outer"]);
    // Location points at the innermost failing expression.
    assert_eq!(err.location.map(|l| l.line), Some(3));
}

#[test]
fn top_level_values_are_frozen_after_execution() {
    let bindings = match run("xs = [1]\n") {
        Ok(b) => b,
        Err(e) => panic!("{e}"),
    };
    let Some(Value::List(xs)) = bindings.get("xs") else {
        panic!("expected list");
    };
    assert!(xs.is_frozen());
}

#[test]
fn forward_reference_within_module_resolves_at_call_time() {
    let source = "
def a():
    return b()

def b():
    return 'b'

r = a()
";
    assert_eq!(get(source, "r"), Value::string("b"));
}

#[test]
fn return_outside_function() {
    assert!(run("return 1\n").is_err());
}
