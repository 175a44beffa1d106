use pretty_assertions::assert_eq;

use super::*;

#[test]
fn intern_and_lookup() {
    let hello = Name::intern("hello");
    let world = Name::intern("world");

    assert_eq!(hello, Name::intern("hello"));
    assert_ne!(hello, world);
    assert_eq!(hello.as_str(), "hello");
    assert_eq!(world.as_str(), "world");
}

#[test]
fn empty_string_is_preinterned() {
    assert_eq!(Name::intern(""), Name::EMPTY);
    assert_eq!(Name::EMPTY.as_str(), "");
}

#[test]
fn names_are_case_sensitive() {
    assert_ne!(Name::intern("config"), Name::intern("CONFIG"));
}

#[test]
fn concurrent_interning_agrees() {
    use std::thread;

    let handles: Vec<_> = (0..4)
        .map(|t| {
            thread::spawn(move || {
                (0..100)
                    .map(|i| {
                        let s = format!("shared_{}", (i + t) % 50);
                        let name = Name::intern(&s);
                        assert_eq!(name.as_str(), s);
                        name
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for name in handle.join().unwrap_or_default() {
            assert_eq!(Name::intern(name.as_str()), name);
        }
    }
}
