//! SADL: a declarative language for best-first search algorithms, plus a
//! genetic-programming engine that evolves them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       lang                           │
//! │        lexer → parser → AST → pretty-printer         │
//! ├──────────────────────────────────────────────────────┤
//! │                      program                         │
//! │   compiler → statements → expression evaluator       │
//! ├──────────────────────────────────────────────────────┤
//! │                      search                          │
//! │   generic tree · best-first driver · playout evals   │
//! ├──────────────────────────────────────────────────────┤
//! │                    game / gp                         │
//! │   game adapters · crossover · mutation · gate ·      │
//! │   Swiss tournament · evolution · checkpoints         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sadl::game::TicTacToe;
//! use sadl::gp::ProgramLibrary;
//! use sadl::program::compile;
//! use sadl::search::{standard_functions, BestFirstSearch, SearchBudget};
//!
//! let game = TicTacToe;
//! let ast = ProgramLibrary::embedded_only().load("MCTS");
//! let program = Arc::new(compile(&ast)?);
//! let functions = Arc::new(standard_functions(Arc::new(game)));
//!
//! let mut search = BestFirstSearch::new(program, functions).with_seed(1);
//! search.init(&game, 0);
//! let state = sadl::game::Game::initial_state(&game);
//! let action = search.select_action(&game, &state, &SearchBudget::iterations(200))?;
//! assert!(action < 9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod game;
pub mod gp;
pub mod lang;
pub mod program;
pub mod search;

pub use error::{CompileError, EvalError, ParseError, SearchError};
pub use lang::{parse_program, Ast};
pub use program::{compile, Program};
pub use search::{BestFirstSearch, SearchBudget};
