//! The fitness gate: a candidate must take games off the reference
//! algorithm it descends from before it may join the population.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::gp::library::{baseline_name, ProgramLibrary};
use crate::gp::matches::{play_single_game, GameOutcome, MatchSettings};
use crate::lang::Ast;
use crate::program::{compile, FunctionRegistry};
use crate::search::GameTree;

/// Minimum win rate against the baseline. Deliberately below 0.5: the
/// gate exists to weed out broken programs, not to demand instant
/// superiority, which would strangle diversity early in a run.
pub const BASELINE_ACCEPTANCE_THRESHOLD: f64 = 0.3;

/// Gate parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Games per audition, seats swapping at the halfway point.
    pub games: usize,
    /// Seconds per move.
    pub max_seconds: f64,
    /// Consecutive one-sided baseline wins (with zero candidate wins so
    /// far) that end the audition early.
    pub early_stop_run: usize,
    /// Required win rate.
    pub acceptance_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            games: 10,
            max_seconds: 0.2,
            early_stop_run: 5,
            acceptance_threshold: BASELINE_ACCEPTANCE_THRESHOLD,
        }
    }
}

/// Auditions candidates against their baseline on the benchmark game.
#[derive(Debug)]
pub struct FitnessGate<G: Game> {
    game: Arc<G>,
    functions: Arc<FunctionRegistry<GameTree<G>>>,
    library: Arc<ProgramLibrary>,
    config: GateConfig,
}

impl<G: Game> FitnessGate<G> {
    /// Builds a gate over `game` using `library` to resolve baselines.
    #[must_use]
    pub fn new(
        game: Arc<G>,
        functions: Arc<FunctionRegistry<GameTree<G>>>,
        library: Arc<ProgramLibrary>,
        config: GateConfig,
    ) -> Self {
        Self { game, functions, library, config }
    }

    /// Whether `candidate` earns a population slot. The baseline is the
    /// library program named by the prefix of the candidate's display
    /// name (before the first `x`).
    #[must_use]
    pub fn admits(&self, candidate: &Ast, seed: u64) -> bool {
        let Ok(candidate_program) = compile(candidate) else {
            return false;
        };
        let baseline_ast = self.library.load(baseline_name(candidate_program.name()));
        let Ok(baseline_program) = compile(&baseline_ast) else {
            return false;
        };
        let candidate_program = Arc::new(candidate_program);
        let baseline_program = Arc::new(baseline_program);

        let settings = MatchSettings::seconds(self.config.max_seconds);
        let mut candidate_wins = 0usize;
        let mut baseline_run = 0usize;
        let mut played = 0usize;

        for i in 0..self.config.games {
            let candidate_first = i < self.config.games / 2;
            let (first, second) = if candidate_first {
                (&candidate_program, &baseline_program)
            } else {
                (&baseline_program, &candidate_program)
            };
            let outcome = play_single_game(
                &self.game,
                first,
                second,
                &self.functions,
                &settings,
                seed.wrapping_add(i as u64),
            );
            played += 1;
            let candidate_won = match outcome {
                GameOutcome::FirstWins => candidate_first,
                GameOutcome::SecondWins => !candidate_first,
                GameOutcome::Draw => false,
            };
            if candidate_won {
                candidate_wins += 1;
                baseline_run = 0;
            } else if outcome != GameOutcome::Draw {
                baseline_run += 1;
            }
            if candidate_wins == 0 && baseline_run >= self.config.early_stop_run {
                log::debug!(
                    "gate: `{}` dropped after {played} one-sided games",
                    candidate_program.name()
                );
                return false;
            }
        }

        let rate = candidate_wins as f64 / played as f64;
        let admitted = rate >= self.config.acceptance_threshold;
        log::debug!(
            "gate: `{}` vs `{}`: {candidate_wins}/{played} ({})",
            candidate_program.name(),
            baseline_program.name(),
            if admitted { "admitted" } else { "rejected" },
        );
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TicTacToe;
    use crate::lang::parse_program;
    use crate::search::standard_functions;

    fn gate(config: GateConfig) -> FitnessGate<TicTacToe> {
        let game = Arc::new(TicTacToe);
        let functions = Arc::new(standard_functions(Arc::clone(&game)));
        FitnessGate::new(game, functions, Arc::new(ProgramLibrary::embedded_only()), config)
    }

    #[test]
    fn an_uncompilable_candidate_is_rejected_outright() {
        let gate = gate(GateConfig::default());
        let ast = parse_program(
            "(SearchAlgorithm \"MCTSx1\" (Selection \"s\" (SelectNode best visitCount)))",
        )
        .expect("parse");
        assert!(!gate.admits(&ast, 1));
    }

    #[test]
    fn beating_the_baseline_admits_the_candidate() {
        // the disk override makes the baseline forfeit its first move,
        // so the candidate wins every audition game
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("MCTS.sadl"),
            "(SearchAlgorithm \"MCTS\" \
               (Selection \"s\" (SelectNode argmax nowhere)) \
               (Evaluation (Set value 1)) \
               (Backpropagation (Set value 1)))",
        )
        .expect("write");
        let game = Arc::new(TicTacToe);
        let functions = Arc::new(standard_functions(Arc::clone(&game)));
        let library = Arc::new(ProgramLibrary::with_dir(dir.path().to_path_buf()));
        let config = GateConfig { games: 4, max_seconds: 0.05, ..GateConfig::default() };
        let gate = FitnessGate::new(game, functions, library, config);

        let mut candidate = ProgramLibrary::embedded_only().load("MCTS");
        candidate.set_display_name("MCTSx1");
        assert!(gate.admits(&candidate, 42));
    }

    #[test]
    fn a_forfeiting_candidate_stops_early() {
        let config = GateConfig {
            games: 10,
            max_seconds: 0.05,
            ..GateConfig::default()
        };
        let gate = gate(config);
        let ast = parse_program(
            "(SearchAlgorithm \"MCTSx2\" \
               (Selection \"s\" (SelectNode argmax nowhere)) \
               (Evaluation (Set value 1)) \
               (Backpropagation (Set value 1)))",
        )
        .expect("parse");
        assert!(!gate.admits(&ast, 3));
    }
}
