//! Tic-tac-toe, the built-in benchmark game.
//!
//! Small enough that proof-number search can solve it outright, which makes
//! it a useful fixed target for fitness gating and for tests.

use crate::game::{Game, Seat};

/// 3x3 tic-tac-toe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

/// Board state: 9 cells, each empty or owned by a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Seat>; 9],
    to_move: Seat,
}

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

impl Board {
    fn winner(&self) -> Option<Seat> {
        for line in &LINES {
            if let Some(seat) = self.cells[line[0]] {
                if self.cells[line[1]] == Some(seat) && self.cells[line[2]] == Some(seat) {
                    return Some(seat);
                }
            }
        }
        None
    }

    fn full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

impl Game for TicTacToe {
    type State = Board;
    type Action = usize;

    fn num_players(&self) -> usize {
        2
    }

    fn initial_state(&self) -> Board {
        Board { cells: [None; 9], to_move: 0 }
    }

    fn legal_actions(&self, state: &Board) -> Vec<usize> {
        if state.winner().is_some() {
            return Vec::new();
        }
        (0..9).filter(|&i| state.cells[i].is_none()).collect()
    }

    fn apply(&self, state: &Board, action: &usize) -> Board {
        let mut next = state.clone();
        next.cells[*action] = Some(state.to_move);
        next.to_move = 1 - state.to_move;
        next
    }

    fn is_terminal(&self, state: &Board) -> bool {
        state.winner().is_some() || state.full()
    }

    fn ranking(&self, state: &Board) -> Vec<f64> {
        match state.winner() {
            Some(seat) => {
                let mut ranks = vec![2.0; 2];
                ranks[seat] = 1.0;
                ranks
            }
            None => vec![1.5, 1.5],
        }
    }

    fn mover(&self, state: &Board) -> Seat {
        state.to_move
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[usize]) -> Board {
        let game = TicTacToe;
        let mut state = game.initial_state();
        for &m in moves {
            state = game.apply(&state, &m);
        }
        state
    }

    #[test]
    fn fresh_board_has_nine_moves() {
        let game = TicTacToe;
        let state = game.initial_state();
        assert_eq!(game.legal_actions(&state).len(), 9);
        assert!(!game.is_terminal(&state));
        assert_eq!(game.mover(&state), 0);
    }

    #[test]
    fn row_win_ends_the_game() {
        let game = TicTacToe;
        // X: 0 1 2 / O: 3 4
        let state = play(&[0, 3, 1, 4, 2]);
        assert!(game.is_terminal(&state));
        assert_eq!(game.ranking(&state), vec![1.0, 2.0]);
        assert!(game.legal_actions(&state).is_empty());
    }

    #[test]
    fn full_board_without_winner_is_a_draw() {
        let game = TicTacToe;
        let state = play(&[0, 1, 2, 4, 7, 3, 5, 8, 6]);
        assert!(game.is_terminal(&state));
        assert_eq!(game.ranking(&state), vec![1.5, 1.5]);
    }
}
