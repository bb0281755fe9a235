//! `sadl compare` - head-to-head benchmark between two programs.

use std::sync::Arc;

use rayon::prelude::*;

use sadl::game::TicTacToe;
use sadl::gp::{play_single_game, GameOutcome, MatchSettings};
use sadl::program::compile;
use sadl::search::standard_functions;

use crate::cli::load_program_arg;

/// Runs the compare command.
pub fn execute(
    first: &str,
    second: &str,
    games: usize,
    move_seconds: f64,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ast_a = load_program_arg(first)?;
    let ast_b = load_program_arg(second)?;
    let a = Arc::new(compile(&ast_a)?);
    let b = Arc::new(compile(&ast_b)?);
    let name_a = a.name().to_owned();
    let name_b = b.name().to_owned();

    let game = Arc::new(TicTacToe);
    let functions = Arc::new(standard_functions(Arc::clone(&game)));
    let settings = MatchSettings::seconds(move_seconds);
    let base_seed = seed.unwrap_or_else(rand::random);

    // from a's point of view: 1 win, 0 draw, -1 loss
    let verdicts: Vec<i32> = (0..games)
        .into_par_iter()
        .map(|g| {
            let a_first = g < games / 2;
            let (p, q) = if a_first { (&a, &b) } else { (&b, &a) };
            let outcome = play_single_game(
                &game,
                p,
                q,
                &functions,
                &settings,
                base_seed.wrapping_add(g as u64),
            );
            match (outcome, a_first) {
                (GameOutcome::FirstWins, true) | (GameOutcome::SecondWins, false) => 1,
                (GameOutcome::FirstWins, false) | (GameOutcome::SecondWins, true) => -1,
                (GameOutcome::Draw, _) => 0,
            }
        })
        .collect();

    let wins_a = verdicts.iter().filter(|&&v| v == 1).count();
    let wins_b = verdicts.iter().filter(|&&v| v == -1).count();
    let draws = verdicts.len() - wins_a - wins_b;

    println!("{games} games at {move_seconds}s/move (seed {base_seed})");
    println!("  {name_a:<20} {wins_a:>5} wins");
    println!("  {name_b:<20} {wins_b:>5} wins");
    println!("  {:<20} {draws:>5}", "draws");
    println!(
        "  {name_a} win rate: {:.1}%",
        100.0 * wins_a as f64 / games.max(1) as f64
    );
    Ok(())
}
