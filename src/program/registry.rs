//! Per-search variable context and the external function registry.
//!
//! Every search invocation gets its own [`SearchContext`] seeded from the
//! program's `Define` defaults; nothing is shared between concurrent
//! searches. External functions are plain closures over the search tree,
//! registered once at startup and handed to the driver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::program::Program;
use crate::search::{NodeIndex, SearchTree};

/// Mutable global-variable table for one search invocation.
#[derive(Debug, Clone)]
pub struct SearchContext {
    globals: HashMap<String, f64>,
}

impl SearchContext {
    /// Seeds the context from a program's `Define` defaults.
    #[must_use]
    pub fn for_program(program: &Program) -> Self {
        Self { globals: program.defaults().clone() }
    }

    /// Read access for the evaluator.
    #[must_use]
    pub fn globals(&self) -> &HashMap<String, f64> {
        &self.globals
    }

    /// Write access for `Set`.
    pub fn globals_mut(&mut self) -> &mut HashMap<String, f64> {
        &mut self.globals
    }
}

type EvalFn<T> = Arc<dyn Fn(&T, NodeIndex) -> f64 + Send + Sync>;

/// Named evaluation functions a program can call through
/// `(ExternalFunction <name>)`.
pub struct FunctionRegistry<T: SearchTree> {
    functions: HashMap<String, EvalFn<T>>,
}

impl<T: SearchTree> FunctionRegistry<T> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { functions: HashMap::new() }
    }

    /// Registers `f` under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&T, NodeIndex) -> f64 + Send + Sync + 'static,
    ) {
        self.functions.insert(name.into(), Arc::new(f));
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EvalFn<T>> {
        self.functions.get(name)
    }

    /// Registered names, unordered.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }
}

impl<T: SearchTree> Default for FunctionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SearchTree> Clone for FunctionRegistry<T> {
    fn clone(&self) -> Self {
        Self { functions: self.functions.clone() }
    }
}

impl<T: SearchTree> fmt::Debug for FunctionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
