#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sky_eval::log_sink::silent_sink;
use sky_eval::GlobalsBuilder;
use sky_graph::{BuildState, Configuration, Package};

use super::*;
use crate::builtins::register_builtins;
use crate::subinclude::SubincludeLoader;

fn pool(size: usize) -> ContextPool {
    let mut builder = GlobalsBuilder::standard();
    register_builtins(&mut builder, &Configuration::default());
    let globals = builder.freeze();
    let loader = Arc::new(SubincludeLoader::new(globals.clone()));
    ContextPool::new(size, globals, loader, silent_sink())
}

fn state() -> Arc<BuildState> {
    Arc::new(BuildState::new(Configuration::default(), "/repo"))
}

#[test]
fn every_context_can_be_checked_out_once() {
    let pool = pool(3);
    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    let c = pool.acquire().unwrap();
    assert_ne!(a.name(), b.name());
    assert_ne!(b.name(), c.name());
    assert_eq!(pool.acquire().err(), Some(PoolError::Exhausted { size: 3 }));

    drop(b);
    assert_eq!(pool.idle(), 1);
    assert!(pool.acquire().is_ok());
}

#[test]
fn an_empty_pool_cannot_hand_out_contexts() {
    let pool = pool(0);
    assert_eq!(pool.acquire().err(), Some(PoolError::Empty));
}

#[test]
fn released_contexts_are_unbound() {
    let pool = pool(1);
    let checkout = pool.acquire().unwrap();
    let bound = checkout.bind(Arc::new(Package::new("a", "/repo/a")), state());
    assert_eq!(bound.package().unwrap().name(), "a");
    drop(bound);

    let checkout = pool.acquire().unwrap();
    assert!(context::current_package(&checkout).is_err());
}

#[test]
fn detached_contexts_are_released_explicitly() {
    let pool = pool(1);
    let thread = pool.acquire().unwrap().detach();
    assert_eq!(pool.idle(), 0);
    assert!(pool.release(thread).is_none());
    assert_eq!(pool.idle(), 1);
}

#[test]
fn release_unbinds_but_keeps_pool_membership() {
    let pool = pool(1);
    let mut thread = pool.acquire().unwrap().detach();
    context::bind(&mut thread, Arc::new(Package::new("b", "/repo/b")), state());
    assert!(pool.release(thread).is_none());

    let checkout = pool.acquire().unwrap();
    assert!(context::current_package(&checkout).is_err());
    assert!(context::build_state(&checkout).is_err());
    let thread = checkout.detach();
    assert!(pool.release(thread).is_none());
    assert_eq!(pool.idle(), 1);
}

#[test]
fn release_rejects_contexts_it_does_not_own() {
    let first = pool(1);
    let second = pool(1);

    let foreign = second.acquire().unwrap().detach();
    let foreign = first.release(foreign).unwrap();
    assert!(second.release(foreign).is_none());

    assert!(first.release(Thread::new("stray")).is_some());
}

#[test]
fn releasing_an_idle_context_twice_is_refused() {
    let pool = pool(2);
    let thread = pool.acquire().unwrap().detach();
    assert!(pool.release(thread).is_none());

    let mut duplicate = Thread::new("duplicate");
    duplicate.set_local(SLOT, Arc::new(PoolSlot { pool: pool.id, index: 0 }));
    assert!(pool.release(duplicate).is_some());
}

#[test]
fn bound_context_registers_rules_in_its_package() {
    let pool = pool(1);
    let package = Arc::new(Package::new("lib", "/repo/lib"));
    let mut bound = pool.acquire().unwrap().bind(Arc::clone(&package), state());
    bound
        .exec_file("lib/BUILD", "build_rule(name = 'x', cmd = 'true')\n")
        .unwrap();
    assert_eq!(package.rule_names(), vec!["x".to_string()]);
}

#[test]
fn workers_each_get_their_own_context() {
    let pool = pool(4);
    let state = state();
    let packages: Vec<_> = (0..4)
        .map(|i| Arc::new(Package::new(format!("p{i}"), format!("/repo/p{i}"))))
        .collect();

    std::thread::scope(|scope| {
        for package in &packages {
            let (pool, state) = (&pool, &state);
            scope.spawn(move || {
                let mut bound = pool.acquire().unwrap().bind(Arc::clone(package), Arc::clone(state));
                bound
                    .exec_file("BUILD", "build_rule(name = package_name() + '_rule')\n")
                    .unwrap();
            });
        }
    });

    assert_eq!(pool.idle(), 4);
    for (i, package) in packages.iter().enumerate() {
        assert_eq!(package.rule_names(), vec![format!("p{i}_rule")]);
    }
}
