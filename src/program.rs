//! Compiled SADL programs and their interpreter.
//!
//! [`compile`] turns an [`crate::lang::Ast`] into a [`Program`]: typed
//! statement lists per phase, with expressions left as AST references and
//! interpreted on demand against a [`crate::search::SearchTree`]. Variable
//! state lives in a per-search [`SearchContext`] rather than anywhere
//! global, so concurrent searches never observe each other.

mod compile;
mod eval;
mod exec;
mod registry;

pub use compile::{compile, Aggregator, Program, Statement};
pub use eval::{evaluate, evaluate_condition};
pub use exec::{run_backpropagation, run_selection_phase, run_statements};
pub use registry::{FunctionRegistry, SearchContext};
