//! The best-first search driver.
//!
//! One iteration: descend with the program's selection phase until a leaf
//! or terminal node, expand the leaf, run the evaluation phase on it, then
//! backpropagate to the root. The loop stops on a proven/disproven root,
//! an exhausted budget, or a cooperative cancel flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::SearchError;
use crate::game::{Game, Seat};
use crate::program::{
    run_backpropagation, run_selection_phase, run_statements, FunctionRegistry, Program,
    SearchContext,
};
use crate::search::node::{attrs, GameTree, NodeIndex, SearchId, SearchTree};

/// Limits for one `select_action` call. At least one of the limits should
/// be finite or the search only stops on a proof.
#[derive(Debug, Clone, Copy)]
pub struct SearchBudget {
    /// Wall-clock limit in seconds; `f64::INFINITY` disables it.
    pub max_seconds: f64,
    /// Iteration cap.
    pub max_iterations: Option<u64>,
    /// Tree depth beyond which the descent stops expanding (root is
    /// depth 0); `None` leaves depth unbounded.
    pub max_depth: Option<usize>,
}

impl SearchBudget {
    /// A pure time budget.
    #[must_use]
    pub fn seconds(max_seconds: f64) -> Self {
        Self { max_seconds, max_iterations: None, max_depth: None }
    }

    /// A pure iteration budget.
    #[must_use]
    pub fn iterations(max_iterations: u64) -> Self {
        Self {
            max_seconds: f64::INFINITY,
            max_iterations: Some(max_iterations),
            max_depth: None,
        }
    }

    /// Caps the descent depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Why the search settled before its budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofOutcome {
    /// The root's proof number reached zero.
    Proven,
    /// The root's disproof number reached zero.
    Disproven,
}

/// Counters accumulated over one `select_action` call.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Completed select/expand/evaluate/backpropagate iterations.
    pub iterations: u64,
    /// Nodes allocated in the tree.
    pub nodes_created: usize,
    /// Selection steps taken (node visits during descent).
    pub node_visits: u64,
    /// Deepest node touched.
    pub max_depth: usize,
    /// Root visit count at the end of the search.
    pub root_visits: f64,
    /// Wall time spent.
    pub elapsed: Duration,
    /// Set when the root was (dis)proven.
    pub proof: Option<ProofOutcome>,
}

/// A search agent: one compiled program, played for one seat.
#[derive(Debug)]
pub struct BestFirstSearch<G: Game> {
    program: Arc<Program>,
    functions: Arc<FunctionRegistry<GameTree<G>>>,
    seat: Seat,
    rng: SmallRng,
    cancel: Option<Arc<AtomicBool>>,
    last_stats: SearchStats,
}

impl<G: Game> BestFirstSearch<G> {
    /// Creates an agent with a fresh entropy-seeded rng.
    #[must_use]
    pub fn new(
        program: Arc<Program>,
        functions: Arc<FunctionRegistry<GameTree<G>>>,
    ) -> Self {
        Self {
            program,
            functions,
            seat: 0,
            rng: SmallRng::from_entropy(),
            cancel: None,
            last_stats: SearchStats::default(),
        }
    }

    /// Replaces the rng with a seeded one, for reproducible searches.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Installs a cooperative cancel flag, checked once per iteration.
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Fixes the seat the agent searches for.
    pub fn init(&mut self, _game: &G, seat: Seat) {
        self.seat = seat;
    }

    /// The program this agent runs.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Counters from the most recent `select_action`.
    #[must_use]
    pub fn last_stats(&self) -> &SearchStats {
        &self.last_stats
    }

    /// Searches `state` within `budget` and returns the chosen action.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] when the position has no legal actions,
    /// the root never got expanded, or the program raised an evaluation
    /// error (which forfeits the game in self-play).
    pub fn select_action(
        &mut self,
        game: &G,
        state: &G::State,
        budget: &SearchBudget,
    ) -> Result<G::Action, SearchError> {
        if game.legal_actions(state).is_empty() {
            return Err(SearchError::NoLegalActions);
        }

        let started = Instant::now();
        let deadline = if self.budget_is_timed(budget) {
            Some(started + Duration::from_secs_f64(budget.max_seconds))
        } else {
            None
        };

        let id = SearchId(self.rng.gen());
        let mut tree = GameTree::new(game, state.clone(), self.seat, id);
        let mut ctx = SearchContext::for_program(&self.program);
        let mut stats = SearchStats::default();

        loop {
            if let Some(cap) = budget.max_iterations {
                if stats.iterations >= cap {
                    break;
                }
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            if self
                .cancel
                .as_ref()
                .is_some_and(|c| c.load(Ordering::Relaxed))
            {
                log::debug!("search {id:?} cancelled after {} iterations", stats.iterations);
                break;
            }
            let root = tree.root();
            if tree.attr(root, attrs::PROOF_NUMBER) == 0.0 {
                stats.proof = Some(ProofOutcome::Proven);
                break;
            }
            if tree.attr(root, attrs::DISPROOF_NUMBER) == 0.0 {
                stats.proof = Some(ProofOutcome::Disproven);
                break;
            }

            self.run_iteration(game, &mut tree, &mut ctx, budget, &mut stats)?;
            stats.iterations += 1;
        }

        let root = tree.root();
        let chosen = self.pick_final_move(&mut tree, &mut ctx)?;
        let action = match tree.action(chosen) {
            Some(a) => a.clone(),
            // fall back to the root's first child when selection went
            // nowhere (e.g. it stayed on the root)
            None => {
                let first = tree
                    .children(root)
                    .first()
                    .copied()
                    .ok_or(SearchError::NoChildren)?;
                tree.action(first).cloned().ok_or(SearchError::NoChildren)?
            }
        };

        stats.nodes_created = tree.node_count();
        stats.root_visits = tree.attr(root, attrs::VISIT_COUNT);
        stats.elapsed = started.elapsed();
        log::debug!(
            "search {id:?} seat {} done: {} iterations, {} nodes, depth {}, {:?}",
            self.seat,
            stats.iterations,
            stats.nodes_created,
            stats.max_depth,
            stats.elapsed,
        );
        self.last_stats = stats;
        Ok(action)
    }

    fn budget_is_timed(&self, budget: &SearchBudget) -> bool {
        budget.max_seconds.is_finite() && budget.max_seconds > 0.0
    }

    fn run_iteration(
        &mut self,
        game: &G,
        tree: &mut GameTree<G>,
        ctx: &mut SearchContext,
        budget: &SearchBudget,
        stats: &mut SearchStats,
    ) -> Result<(), SearchError> {
        let program = Arc::clone(&self.program);
        let ast = program.ast();
        let mut current = tree.root();

        // descent: follow the selection phase down until a leaf (expanded
        // on the spot), a terminal state, the depth cap, or a selection
        // that cannot advance
        while !game.is_terminal(tree.state(current)) {
            if budget.max_depth.is_some_and(|cap| tree.depth(current) >= cap) {
                break;
            }
            if tree.children(current).is_empty() {
                self.expand(game, tree, current);
                break;
            }
            let next = run_selection_phase(
                program.selection(),
                ast,
                tree,
                current,
                ctx,
                &self.functions,
                &mut self.rng,
            )?;
            if next == current {
                // no statement moved the node (every child may have
                // scored NaN); evaluate here instead of spinning
                break;
            }
            current = next;
            stats.node_visits += 1;
            stats.max_depth = stats.max_depth.max(tree.depth(current));
        }

        current = run_statements(
            program.evaluation(),
            ast,
            tree,
            current,
            ctx,
            &self.functions,
            &mut self.rng,
        )?;

        run_backpropagation(
            program.backpropagation(),
            ast,
            tree,
            current,
            ctx,
            &self.functions,
            &mut self.rng,
        )?;
        Ok(())
    }

    fn expand(&mut self, game: &G, tree: &mut GameTree<G>, node: NodeIndex) {
        let state = tree.state(node).clone();
        for action in game.legal_actions(&state) {
            let next = game.apply(&state, &action);
            tree.add_child(game, node, next, action);
        }
    }

    fn pick_final_move(
        &mut self,
        tree: &mut GameTree<G>,
        ctx: &mut SearchContext,
    ) -> Result<NodeIndex, SearchError> {
        let ast = self.program.ast();
        let root = tree.root();
        let chosen = match self.program.final_move_selection() {
            Some(stmts) => run_statements(
                stmts,
                ast,
                tree,
                root,
                ctx,
                &self.functions,
                &mut self.rng,
            )?,
            None => run_selection_phase(
                self.program.selection(),
                ast,
                tree,
                root,
                ctx,
                &self.functions,
                &mut self.rng,
            )?,
        };
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TicTacToe;
    use crate::gp::ProgramLibrary;
    use crate::program::compile;
    use crate::search::standard_functions;

    fn agent(name: &str, seed: u64) -> BestFirstSearch<TicTacToe> {
        let library = ProgramLibrary::embedded_only();
        let ast = library.load(name);
        let program = Arc::new(compile(&ast).expect("library program compiles"));
        let functions = Arc::new(standard_functions(Arc::new(TicTacToe)));
        BestFirstSearch::new(program, functions).with_seed(seed)
    }

    #[test]
    fn iteration_budget_is_respected_and_visits_add_up() {
        let game = TicTacToe;
        let mut search = agent("MCTS", 11);
        search.init(&game, 0);
        let action = search
            .select_action(&game, &game.initial_state(), &SearchBudget::iterations(200))
            .expect("search");
        assert!(action < 9);
        let stats = search.last_stats();
        assert_eq!(stats.iterations, 200);
        // backpropagation passes through the root exactly once per iteration
        assert_eq!(stats.root_visits, 200.0);
        assert!(stats.nodes_created > 9);
    }

    #[test]
    fn pns_proves_a_forced_win() {
        let game = TicTacToe;
        // X on 0 and 1, O on 3 and 4, X to move: 2 wins on the spot
        let mut state = game.initial_state();
        for m in [0usize, 3, 1, 4] {
            state = game.apply(&state, &m);
        }
        let mut search = agent("PNS", 5);
        search.init(&game, 0);
        let action = search
            .select_action(&game, &state, &SearchBudget::iterations(10_000))
            .expect("search");
        assert_eq!(action, 2);
        let stats = search.last_stats();
        assert_eq!(stats.proof, Some(ProofOutcome::Proven));
        assert!(stats.iterations < 10_000);
    }

    #[test]
    fn a_selection_that_never_advances_still_terminates() {
        let game = TicTacToe;
        // every child scores NaN, so SelectNode never moves off the root
        let src = "(SearchAlgorithm \"Nanwalk\" \
            (Selection \"s\" (SelectNode argmax (sqrt -1))) \
            (Evaluation (Set valueEstimate 0)) \
            (Backpropagation (Set valueEstimate 0)))";
        let ast = crate::lang::parse_program(src).expect("parse");
        let program = Arc::new(compile(&ast).expect("compile"));
        let functions = Arc::new(standard_functions(Arc::new(TicTacToe)));
        let mut search = BestFirstSearch::new(program, functions).with_seed(9);
        search.init(&game, 0);
        let action = search
            .select_action(&game, &game.initial_state(), &SearchBudget::iterations(40))
            .expect("the stuck selection must not hang the iteration");
        assert!(action < 9);
        assert_eq!(search.last_stats().iterations, 40);
    }

    #[test]
    fn depth_cap_limits_the_descent() {
        let game = TicTacToe;
        let mut search = agent("MCTS", 8);
        search.init(&game, 0);
        let budget = SearchBudget::iterations(150).with_max_depth(2);
        search
            .select_action(&game, &game.initial_state(), &budget)
            .expect("search");
        assert!(search.last_stats().max_depth <= 2);
    }

    #[test]
    fn cancel_flag_stops_the_search() {
        let game = TicTacToe;
        let cancel = Arc::new(AtomicBool::new(true));
        let mut search = agent("MCTS", 3).with_cancel(Arc::clone(&cancel));
        search.init(&game, 0);
        // pre-cancelled: zero iterations, but the final move must still
        // come from somewhere, so the root has no children -> error
        let err = search
            .select_action(&game, &game.initial_state(), &SearchBudget::iterations(100))
            .expect_err("cancelled before the root expanded");
        assert!(matches!(err, SearchError::NoChildren));
    }

    #[test]
    fn full_board_has_no_legal_actions() {
        let game = TicTacToe;
        let mut state = game.initial_state();
        for m in [0usize, 1, 2, 4, 7, 3, 5, 8, 6] {
            state = game.apply(&state, &m);
        }
        let mut search = agent("MCTS", 1);
        search.init(&game, 0);
        let err = search
            .select_action(&game, &state, &SearchBudget::iterations(10))
            .expect_err("terminal state");
        assert!(matches!(err, SearchError::NoLegalActions));
    }
}
