use pretty_assertions::assert_eq;

use crate::test_helpers::{eval, eval_err, run};
use crate::Value;

#[test]
fn split_on_whitespace_and_separator() {
    assert_eq!(eval("'  a b\\tc  '.split()"), Value::string_list(&["a", "b", "c"]));
    assert_eq!(eval("'a b c'.split(None, 1)"), Value::string_list(&["a", "b c"]));
    assert_eq!(eval("'a,,b'.split(',')"), Value::string_list(&["a", "", "b"]));
    assert_eq!(eval("'a:b:c'.split(':', 1)"), Value::string_list(&["a", "b:c"]));
    assert!(eval_err("'a'.split('')").contains("empty separator"));
}

#[test]
fn join_requires_strings() {
    assert_eq!(eval("', '.join(['a', 'b'])"), Value::string("a, b"));
    assert!(eval_err("''.join([1])").contains("expected string"));
}

#[test]
fn strip_variants() {
    assert_eq!(eval("'  x '.strip()"), Value::string("x"));
    assert_eq!(eval("'//a/b//'.strip('/')"), Value::string("a/b"));
    assert_eq!(eval("'xxa'.lstrip('x')"), Value::string("a"));
    assert_eq!(eval("'a.go.go'.rstrip('.go')"), Value::string("a"));
}

#[test]
fn replace_and_count() {
    assert_eq!(eval("'aaa'.replace('a', 'b')"), Value::string("bbb"));
    assert_eq!(eval("'aaa'.replace('a', 'b', 2)"), Value::string("bba"));
    assert_eq!(eval("'banana'.count('an')"), Value::Int(2));
}

#[test]
fn find_reports_character_offsets() {
    assert_eq!(eval("'héllo'.find('l')"), Value::Int(2));
    assert_eq!(eval("'hello'.rfind('l')"), Value::Int(3));
    assert_eq!(eval("'hello'.find('z')"), Value::Int(-1));
}

#[test]
fn partition_and_rpartition() {
    assert_eq!(
        eval("'//pkg:rule'.partition(':')"),
        Value::tuple(vec![
            Value::string("//pkg"),
            Value::string(":"),
            Value::string("rule"),
        ])
    );
    assert_eq!(
        eval("'abc'.rpartition(':')"),
        Value::tuple(vec![Value::string(""), Value::string(""), Value::string("abc")])
    );
}

#[test]
fn prefix_and_suffix_checks() {
    assert_eq!(eval("'lib.py'.endswith(('.go', '.py'))"), Value::Bool(true));
    assert_eq!(eval("'lib.py'.startswith('x')"), Value::Bool(false));
    assert_eq!(eval("'{}_{name}'.format(1, name = 'x')"), Value::string("1_x"));
    assert_eq!(eval("'MiXed'.lower() + 'a'.upper()"), Value::string("mixedA"));
}

#[test]
fn list_mutation() {
    let source = "
l = [1, 2, 3]
l.insert(0, 0)
last = l.pop()
l.remove(1)
l.extend([9])
pos = l.index(9)
";
    let bindings = match run(source) {
        Ok(b) => b,
        Err(e) => panic!("{e}"),
    };
    assert_eq!(
        bindings.get("l"),
        Some(&Value::list(vec![Value::Int(0), Value::Int(2), Value::Int(9)]))
    );
    assert_eq!(bindings.get("last"), Some(&Value::Int(3)));
    assert_eq!(bindings.get("pos"), Some(&Value::Int(2)));
}

#[test]
fn list_errors() {
    assert!(eval_err("[].pop()").contains("out of range"));
    assert!(eval_err("[1].remove(2)").contains("not in list"));
}

#[test]
fn dict_methods() {
    let source = "
d = {'a': 1}
got = d.get('missing', 'dflt')
first = d.setdefault('b', 2)
again = d.setdefault('b', 3)
d.update({'c': 3}, e = 5)
popped = d.pop('a')
keys = d.keys()
";
    let bindings = match run(source) {
        Ok(b) => b,
        Err(e) => panic!("{e}"),
    };
    assert_eq!(bindings.get("got"), Some(&Value::string("dflt")));
    assert_eq!(bindings.get("first"), Some(&Value::Int(2)));
    assert_eq!(bindings.get("again"), Some(&Value::Int(2)));
    assert_eq!(bindings.get("popped"), Some(&Value::Int(1)));
    assert_eq!(bindings.get("keys"), Some(&Value::string_list(&["b", "c", "e"])));
}

#[test]
fn dict_pop_missing_without_default() {
    assert!(eval_err("{}.pop('k')").contains("not in dict"));
}
