//! Bundled external evaluation functions.
//!
//! Programs reach these through `(ExternalFunction <name>)`:
//!
//! - `mctsEval`: utility of the node's state for the searching seat,
//!   estimated by one uniform-random playout (exact at terminal states).
//! - `pnsEval`: 1.0 for a terminal win, 0.0 for any other terminal
//!   outcome, -1.0 when the state is undecided.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::game::{rank_utility, Game};
use crate::program::FunctionRegistry;
use crate::search::node::{GameTree, SearchTree};

/// Longest random playout before calling the position a draw; guards
/// against games that can shuffle forever.
const MAX_PLAYOUT_PLIES: usize = 1000;

/// Builds the standard registry (`mctsEval`, `pnsEval`) for `game`.
#[must_use]
pub fn standard_functions<G: Game>(game: Arc<G>) -> FunctionRegistry<GameTree<G>> {
    let mut registry = FunctionRegistry::new();

    let playout_game = Arc::clone(&game);
    registry.register("mctsEval", move |tree: &GameTree<G>, node| {
        random_playout(&*playout_game, tree.state(node).clone(), tree.seat())
    });

    registry.register("pnsEval", move |tree: &GameTree<G>, node| {
        let state = tree.state(node);
        if !game.is_terminal(state) {
            return -1.0;
        }
        let ranks = game.ranking(state);
        if ranks.get(tree.seat()).copied() == Some(1.0) {
            1.0
        } else {
            0.0
        }
    });

    registry
}

fn random_playout<G: Game>(game: &G, mut state: G::State, seat: usize) -> f64 {
    let mut rng = rand::thread_rng();
    let mut plies = 0;
    while !game.is_terminal(&state) {
        let actions = game.legal_actions(&state);
        let Some(action) = actions.choose(&mut rng) else {
            break;
        };
        state = game.apply(&state, action);
        plies += 1;
        if plies >= MAX_PLAYOUT_PLIES {
            return 0.5;
        }
    }
    let ranks = game.ranking(&state);
    let rank = ranks.get(seat).copied().unwrap_or(2.0);
    rank_utility(rank, game.num_players())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, TicTacToe};
    use crate::search::node::SearchId;
    use crate::search::SearchTree;

    #[test]
    fn pns_eval_reports_terminal_outcomes() {
        let game = Arc::new(TicTacToe);
        let functions = standard_functions(Arc::clone(&game));
        let pns = functions.get("pnsEval").expect("registered");

        let mut state = game.initial_state();
        for m in [0usize, 3, 1, 4, 2] {
            state = game.apply(&state, &m);
        }
        // seat 0 just won
        let winner_tree = GameTree::new(&*game, state.clone(), 0, SearchId(1));
        assert_eq!(pns(&winner_tree, winner_tree.root()), 1.0);
        let loser_tree = GameTree::new(&*game, state, 1, SearchId(2));
        assert_eq!(pns(&loser_tree, loser_tree.root()), 0.0);

        let open_tree = GameTree::new(&*game, game.initial_state(), 0, SearchId(3));
        assert_eq!(pns(&open_tree, open_tree.root()), -1.0);
    }

    #[test]
    fn mcts_eval_stays_in_unit_range() {
        let game = Arc::new(TicTacToe);
        let functions = standard_functions(Arc::clone(&game));
        let mcts = functions.get("mctsEval").expect("registered");
        let tree = GameTree::new(&*game, game.initial_state(), 0, SearchId(4));
        for _ in 0..50 {
            let v = mcts(&tree, tree.root());
            assert!((0.0..=1.0).contains(&v), "playout utility out of range: {v}");
        }
    }
}
