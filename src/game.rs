//! The game-adapter seam: anything that can tell the driver which actions
//! are legal, how states evolve, and who won can be searched.
//!
//! Rankings are reported per seat with 1.0 the best rank; draws share a
//! rank halfway between the tied places (two-player draw: 1.5 each).

pub mod tictactoe;

use std::fmt::Debug;

pub use tictactoe::TicTacToe;

/// A player's seat index, 0-based.
pub type Seat = usize;

/// A deterministic, perfect-information game.
pub trait Game: Send + Sync + 'static {
    /// Full game state.
    type State: Clone + Debug + Send + Sync;
    /// A move.
    type Action: Clone + Debug + PartialEq + Send + Sync;

    /// Number of seats.
    fn num_players(&self) -> usize;

    /// The starting position.
    fn initial_state(&self) -> Self::State;

    /// Legal actions for the side to move. Empty iff the state is terminal.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Applies an action, returning the successor state.
    fn apply(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Whether the game is over.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Final ranking per seat, 1.0 = first place. Meaningful only at
    /// terminal states.
    fn ranking(&self, state: &Self::State) -> Vec<f64>;

    /// The seat to move.
    fn mover(&self, state: &Self::State) -> Seat;
}

/// Maps a seat's rank to a utility in `[0, 1]` (win 1.0, two-player draw
/// 0.5, loss 0.0).
#[must_use]
pub fn rank_utility(rank: f64, num_players: usize) -> f64 {
    if num_players <= 1 {
        return 1.0;
    }
    let worst = num_players as f64;
    ((worst - rank) / (worst - 1.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_player_utilities() {
        assert!((rank_utility(1.0, 2) - 1.0).abs() < 1e-9);
        assert!((rank_utility(1.5, 2) - 0.5).abs() < 1e-9);
        assert!((rank_utility(2.0, 2) - 0.0).abs() < 1e-9);
    }
}
