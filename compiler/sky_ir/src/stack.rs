//! Stack growth for deep recursion in the parser and evaluator.
//!
//! Deeply nested expressions in a description file recurse once per level in
//! both the parser and the evaluator. Wrap those recursion points with
//! [`ensure_sufficient_stack`] so a pathological file reports an error instead
//! of overflowing a worker thread's stack.

/// Remaining stack below which the stack is grown.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 64 * 1024;

/// Size of each newly allocated stack segment.
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
