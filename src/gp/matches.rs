//! Playing one budgeted game between two compiled programs.

use std::sync::Arc;

use crate::game::{Game, Seat};
use crate::program::{FunctionRegistry, Program};
use crate::search::{BestFirstSearch, GameTree, SearchBudget};

/// Hard cap on plies, in case two programs shuffle forever on a game that
/// allows it.
const MAX_PLIES: usize = 1000;

/// Per-move budget for self-play games.
#[derive(Debug, Clone, Copy)]
pub struct MatchSettings {
    /// Seconds per move.
    pub max_seconds: f64,
    /// Optional iteration cap per move.
    pub max_iterations: Option<u64>,
}

impl MatchSettings {
    /// A per-move time budget.
    #[must_use]
    pub fn seconds(max_seconds: f64) -> Self {
        Self { max_seconds, max_iterations: None }
    }

    fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_seconds: self.max_seconds,
            max_iterations: self.max_iterations,
            max_depth: None,
        }
    }
}

/// Result of one game from the first program's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// Seat 0's program won.
    FirstWins,
    /// Seat 1's program won.
    SecondWins,
    /// Neither won.
    Draw,
}

/// Plays one game with `first` on seat 0 and `second` on seat 1. A
/// program whose search errors out forfeits on the spot; hitting the ply
/// cap is a draw.
#[must_use]
pub fn play_single_game<G: Game>(
    game: &Arc<G>,
    first: &Arc<Program>,
    second: &Arc<Program>,
    functions: &Arc<FunctionRegistry<GameTree<G>>>,
    settings: &MatchSettings,
    seed: u64,
) -> GameOutcome {
    let mut agents = [
        BestFirstSearch::new(Arc::clone(first), Arc::clone(functions)).with_seed(seed),
        BestFirstSearch::new(Arc::clone(second), Arc::clone(functions))
            .with_seed(seed.wrapping_add(0x9e37_79b9)),
    ];
    agents[0].init(game, 0);
    agents[1].init(game, 1);

    let budget = settings.budget();
    let mut state = game.initial_state();
    let mut plies = 0;

    while !game.is_terminal(&state) {
        if plies >= MAX_PLIES {
            return GameOutcome::Draw;
        }
        let seat: Seat = game.mover(&state);
        match agents[seat].select_action(&**game, &state, &budget) {
            Ok(action) => state = game.apply(&state, &action),
            Err(e) => {
                log::warn!(
                    "`{}` forfeits on seat {seat}: {e}",
                    agents[seat].program().name()
                );
                return if seat == 0 { GameOutcome::SecondWins } else { GameOutcome::FirstWins };
            }
        }
        plies += 1;
    }

    let ranks = game.ranking(&state);
    let first_rank = ranks.first().copied().unwrap_or(2.0);
    let second_rank = ranks.get(1).copied().unwrap_or(2.0);
    if first_rank < second_rank {
        GameOutcome::FirstWins
    } else if second_rank < first_rank {
        GameOutcome::SecondWins
    } else {
        GameOutcome::Draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TicTacToe;
    use crate::gp::library::ProgramLibrary;
    use crate::program::compile;
    use crate::search::standard_functions;

    #[test]
    fn self_play_finishes_with_a_verdict() {
        let game = Arc::new(TicTacToe);
        let library = ProgramLibrary::embedded_only();
        let mcts = Arc::new(compile(&library.load("MCTS")).expect("compile"));
        let functions = Arc::new(standard_functions(Arc::clone(&game)));
        let settings = MatchSettings {
            max_seconds: f64::INFINITY,
            max_iterations: Some(60),
        };
        let outcome = play_single_game(&game, &mcts, &mcts, &functions, &settings, 99);
        // any verdict is fine; the point is that the game terminates
        let _ = outcome;
    }

    #[test]
    fn a_broken_program_forfeits() {
        let game = Arc::new(TicTacToe);
        let library = ProgramLibrary::embedded_only();
        let sane = Arc::new(compile(&library.load("MCTS")).expect("compile"));
        let broken = Arc::new(
            compile(
                &crate::lang::parse_program(
                    "(SearchAlgorithm \"Brokenprog\" \
                       (Selection \"s\" (SelectNode argmax missingAttr)) \
                       (Evaluation (Set value 1)) \
                       (Backpropagation (Set value 1)))",
                )
                .expect("parse"),
            )
            .expect("compile"),
        );
        let functions = Arc::new(standard_functions(Arc::clone(&game)));
        let settings = MatchSettings {
            max_seconds: f64::INFINITY,
            max_iterations: Some(20),
        };
        let outcome = play_single_game(&game, &broken, &sane, &functions, &settings, 7);
        assert_eq!(outcome, GameOutcome::SecondWins);
    }
}
