//! Genetic programming over SADL search algorithms.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             Evolution Loop               │
//! ├──────────────────────────────────────────┤
//! │  Crossover │ Mutation │ Fitness Gate     │
//! ├──────────────────────────────────────────┤
//! │        Swiss Tournament Ranking          │
//! ├──────────────────────────────────────────┤
//! │   Checkpoint / Resume (text format)      │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Individuals are SADL syntax trees. Variation is type-aware subtree
//! exchange plus numeric jitter; every candidate must recompile and then
//! beat a minimum win rate against the program it descends from before it
//! joins the population. Generations are ranked by a Swiss tournament of
//! budgeted self-play games on the benchmark game.

mod crossover;
mod evolution;
mod fitness;
mod library;
mod matches;
mod mutation;
mod ops;
mod persistence;
mod pool;
mod tournament;

pub use crossover::{crossover, MAX_CROSSOVER_ATTEMPTS};
pub use evolution::{
    evolve, EvolutionConfig, EvolutionError, EvolutionOutcome, EvolveObserver, Individual,
};
pub use fitness::{FitnessGate, GateConfig, BASELINE_ACCEPTANCE_THRESHOLD};
pub use library::{baseline_name, ProgramLibrary};
pub use matches::{play_single_game, GameOutcome, MatchSettings};
pub use mutation::{mutate, MAX_MUTATION_ATTEMPTS};
pub use ops::{OperatorDescriptor, TypeTag, OPERATORS};
pub use persistence::{load_checkpoint, save_checkpoint, Checkpoint, CheckpointError};
pub use pool::TaskPool;
pub use tournament::{create_pairings, run_swiss_tournament, SwissConfig};
