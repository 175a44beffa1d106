//! Sky IR - shared vocabulary of the Sky build-description language.
//!
//! - [`Name`]: process-wide interned identifiers
//! - [`Span`] / [`Location`]: byte ranges and resolved positions
//! - [`ast`]: the syntax tree produced by `sky_syntax` and walked by `sky_eval`

pub mod ast;
mod name;
mod span;
mod stack;

pub use name::Name;
pub use span::{Location, Span};
pub use stack::ensure_sufficient_stack;
