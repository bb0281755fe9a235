//! Generic best-first search over an abstract tree.
//!
//! ```text
//!                ┌────────────────────────────┐
//!                │       BestFirstSearch      │
//!                │  select → expand → eval →  │
//!                │        backpropagate       │
//!                └─────┬───────────────┬──────┘
//!                      │               │
//!               Program phases    SearchTree
//!             (compiled SADL)    (GameTree<G>)
//! ```
//!
//! The driver knows nothing about any concrete algorithm; MCTS, PNS, and
//! everything the evolver breeds all run through the same loop.

mod driver;
mod evals;
mod node;

pub use driver::{BestFirstSearch, ProofOutcome, SearchBudget, SearchStats};
pub use evals::standard_functions;
pub use node::{attrs, GameTree, NodeIndex, SearchId, SearchTree};
