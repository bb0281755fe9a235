//! End-to-end searches through the public API only: the reference
//! programs driving real tic-tac-toe positions.

use std::sync::Arc;

use sadl::game::{Game, TicTacToe};
use sadl::gp::{play_single_game, MatchSettings, ProgramLibrary};
use sadl::program::compile;
use sadl::search::{standard_functions, ProofOutcome};
use sadl::{BestFirstSearch, SearchBudget};

fn agent(name: &str, seed: u64) -> BestFirstSearch<TicTacToe> {
    let library = ProgramLibrary::embedded_only();
    let program = Arc::new(compile(&library.load(name)).expect("library program compiles"));
    let functions = Arc::new(standard_functions(Arc::new(TicTacToe)));
    BestFirstSearch::new(program, functions).with_seed(seed)
}

fn position(moves: &[usize]) -> <TicTacToe as Game>::State {
    let game = TicTacToe;
    let mut state = game.initial_state();
    for &m in moves {
        state = game.apply(&state, &m);
    }
    state
}

#[test]
fn mcts_takes_the_immediate_win() {
    // X on 0 and 4, O on 1 and 2, X to move: 8 completes the diagonal
    let game = TicTacToe;
    let state = position(&[0, 1, 4, 2]);
    let mut search = agent("MCTS", 42);
    search.init(&game, 0);
    let action = search
        .select_action(&game, &state, &SearchBudget::iterations(4000))
        .expect("search");
    assert_eq!(action, 8);
}

#[test]
fn pns_disproves_a_lost_position() {
    // O holds 0, 2 and 4 with 1, 6 and 8 open: whatever X plays, O
    // completes another line
    let game = TicTacToe;
    let state = position(&[3, 0, 5, 2, 7, 4]);
    let mut search = agent("PNS", 17);
    search.init(&game, 0);
    let action = search
        .select_action(&game, &state, &SearchBudget::iterations(10_000))
        .expect("a disproven root still yields a move");
    assert!([1, 6, 8].contains(&action));
    assert_eq!(search.last_stats().proof, Some(ProofOutcome::Disproven));
}

#[test]
fn pn_mcts_proves_a_won_position() {
    let game = TicTacToe;
    // the same immediate win as above
    let state = position(&[0, 1, 4, 2]);
    let mut search = agent("PN-MCTS", 7);
    search.init(&game, 0);
    search
        .select_action(&game, &state, &SearchBudget::iterations(10_000))
        .expect("search");
    assert_eq!(search.last_stats().proof, Some(ProofOutcome::Proven));
}

#[test]
fn reference_programs_survive_a_round_robin() {
    let game = Arc::new(TicTacToe);
    let library = ProgramLibrary::embedded_only();
    let functions = Arc::new(standard_functions(Arc::clone(&game)));
    let settings = MatchSettings {
        max_seconds: f64::INFINITY,
        max_iterations: Some(80),
    };

    let programs: Vec<_> = ProgramLibrary::names()
        .into_iter()
        .map(|name| Arc::new(compile(&library.load(name)).expect(name)))
        .collect();
    for (i, first) in programs.iter().enumerate() {
        for (j, second) in programs.iter().enumerate() {
            if i == j {
                continue;
            }
            let seed = (i * 31 + j) as u64;
            // no verdict is wrong; no game may error or hang
            let _ = play_single_game(&game, first, second, &functions, &settings, seed);
        }
    }
}

#[test]
fn search_stats_account_for_the_work_done() {
    let game = TicTacToe;
    let mut search = agent("MCTS", 5);
    search.init(&game, 0);
    search
        .select_action(&game, &game.initial_state(), &SearchBudget::iterations(300))
        .expect("search");
    let stats = search.last_stats();
    assert_eq!(stats.iterations, 300);
    assert_eq!(stats.root_visits, 300.0);
    assert!(stats.nodes_created >= 10);
    assert!(stats.max_depth >= 2);
    assert!(stats.node_visits >= stats.iterations);
}
