//! Swiss tournament ranking of a population.
//!
//! Each round pairs individuals with similar scores who have not met
//! before, plays a fixed number of budgeted games per pairing (seats
//! split), and re-sorts the standings. Odd one out gets a bye worth half
//! a match's games.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::gp::evolution::Individual;
use crate::gp::matches::{play_single_game, GameOutcome, MatchSettings};
use crate::gp::pool::TaskPool;
use crate::program::{compile, FunctionRegistry, Program};
use crate::search::GameTree;

/// Swiss tournament parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwissConfig {
    /// Rounds to play.
    pub rounds: usize,
    /// Games per pairing, seats split halfway.
    pub games_per_match: usize,
    /// Seconds per move.
    pub max_seconds: f64,
    /// Seconds to wait for any single game result before abandoning it.
    pub poll_timeout_secs: u64,
    /// Worker threads.
    pub workers: usize,
}

impl Default for SwissConfig {
    fn default() -> Self {
        Self {
            rounds: 6,
            games_per_match: 50,
            max_seconds: 0.2,
            poll_timeout_secs: 10,
            workers: std::thread::available_parallelism().map_or(4, usize::from),
        }
    }
}

/// Pairs the population for one round. `population` must already be
/// sorted by descending score. Returns index pairs plus the indices that
/// sit the round out with a bye.
///
/// Pairing preference: same score group first, then the closest group by
/// score distance; never an opponent already faced this tournament.
#[must_use]
pub fn create_pairings(population: &[Individual]) -> (Vec<(usize, usize)>, Vec<usize>) {
    let groups = score_groups(population);
    let mut paired = vec![false; population.len()];
    let mut pairs = Vec::new();
    let mut byes = Vec::new();

    for gi in 0..groups.len() {
        for &i in &groups[gi].1 {
            if paired[i] {
                continue;
            }
            paired[i] = true;
            let opponent = find_opponent(population, &groups, gi, i, &paired);
            match opponent {
                Some(j) => {
                    paired[j] = true;
                    pairs.push((i, j));
                }
                None => byes.push(i),
            }
        }
    }
    (pairs, byes)
}

fn score_groups(population: &[Individual]) -> Vec<(f64, Vec<usize>)> {
    let mut groups: Vec<(f64, Vec<usize>)> = Vec::new();
    for (i, ind) in population.iter().enumerate() {
        match groups.last_mut() {
            Some((score, members)) if *score == ind.score => members.push(i),
            _ => groups.push((ind.score, vec![i])),
        }
    }
    groups
}

fn find_opponent(
    population: &[Individual],
    groups: &[(f64, Vec<usize>)],
    home: usize,
    i: usize,
    paired: &[bool],
) -> Option<usize> {
    let fresh = |j: usize| !paired[j] && !population[i].opponents.contains(&population[j].id);

    if let Some(&j) = groups[home].1.iter().find(|&&j| fresh(j)) {
        return Some(j);
    }
    let mut order: Vec<usize> = (0..groups.len()).filter(|&g| g != home).collect();
    order.sort_by(|&a, &b| {
        let da = (groups[a].0 - groups[home].0).abs();
        let db = (groups[b].0 - groups[home].0).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    for g in order {
        if let Some(&j) = groups[g].1.iter().find(|&&j| fresh(j)) {
            return Some(j);
        }
    }
    None
}

/// Runs a full Swiss tournament, leaving the population sorted by final
/// score (descending). Scores and opponent sets are reset first.
pub fn run_swiss_tournament<G: Game>(
    population: &mut Vec<Individual>,
    game: &Arc<G>,
    functions: &Arc<FunctionRegistry<GameTree<G>>>,
    config: &SwissConfig,
    base_seed: u64,
) {
    for ind in population.iter_mut() {
        ind.reset_for_tournament();
    }

    let mut pool: TaskPool<i32> = TaskPool::new(config.workers);
    let settings = MatchSettings::seconds(config.max_seconds);
    let timeout = Duration::from_secs(config.poll_timeout_secs.max(1));

    for round in 0..config.rounds {
        // recompile each round: cheap next to the games, and robust to
        // any uncompilable record that slipped in through a checkpoint
        let programs: Vec<Option<Arc<Program>>> = population
            .iter()
            .map(|ind| compile(&ind.ast).ok().map(Arc::new))
            .collect();

        let playable: Vec<usize> = (0..population.len())
            .filter(|&i| programs[i].is_some())
            .collect();
        let skipped = population.len() - playable.len();
        if skipped > 0 {
            log::warn!("round {round}: {skipped} uncompilable individuals sit out");
        }

        let (pairs, byes) = {
            let view: Vec<Individual> =
                playable.iter().map(|&i| population[i].clone()).collect();
            let (p, b) = create_pairings(&view);
            (
                p.into_iter()
                    .map(|(a, c)| (playable[a], playable[c]))
                    .collect::<Vec<_>>(),
                b.into_iter().map(|a| playable[a]).collect::<Vec<_>>(),
            )
        };

        for (mi, &(i, j)) in pairs.iter().enumerate() {
            let (Some(pi), Some(pj)) = (&programs[i], &programs[j]) else {
                continue;
            };
            let mut tickets = HashSet::new();
            for g in 0..config.games_per_match {
                let first_half = g < config.games_per_match / 2;
                let (a, b) = if first_half {
                    (Arc::clone(pi), Arc::clone(pj))
                } else {
                    (Arc::clone(pj), Arc::clone(pi))
                };
                let game = Arc::clone(game);
                let functions = Arc::clone(functions);
                let seed = base_seed
                    .wrapping_add((round as u64) << 40)
                    .wrapping_add((mi as u64) << 20)
                    .wrapping_add(g as u64);
                tickets.insert(pool.submit(move || {
                    let outcome =
                        play_single_game(&game, &a, &b, &functions, &settings, seed);
                    match (outcome, first_half) {
                        (GameOutcome::FirstWins, true) | (GameOutcome::SecondWins, false) => 1,
                        (GameOutcome::FirstWins, false) | (GameOutcome::SecondWins, true) => -1,
                        (GameOutcome::Draw, _) => 0,
                    }
                }));
            }

            let (wins_i, wins_j) = collect_match(&mut pool, tickets, timeout);

            population[i].score += wins_i as f64;
            population[j].score += wins_j as f64;
            let (id_i, id_j) = (population[i].id, population[j].id);
            population[i].opponents.insert(id_j);
            population[j].opponents.insert(id_i);
        }

        for &i in &byes {
            population[i].score += config.games_per_match as f64 / 2.0;
        }

        population.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        log::info!(
            "round {} done; leader `{}` at {}",
            round + 1,
            population.first().map_or("-", Individual::name),
            population.first().map_or(0.0, |i| i.score),
        );
    }
}

/// Collects one pairing's verdicts. A poll that times out abandons the
/// oldest outstanding game; a timed-out game no longer counts, even if
/// its verdict arrives while later games are still being collected.
fn collect_match(
    pool: &mut TaskPool<i32>,
    mut tickets: HashSet<u64>,
    timeout: Duration,
) -> (usize, usize) {
    let (mut wins_i, mut wins_j) = (0usize, 0usize);
    while !tickets.is_empty() {
        match pool.poll(timeout) {
            Some((ticket, verdict)) => {
                if !tickets.remove(&ticket) {
                    // stale result from an abandoned game
                    continue;
                }
                match verdict {
                    1 => wins_i += 1,
                    -1 => wins_j += 1,
                    _ => {}
                }
            }
            None => {
                if let Some(oldest) = tickets.iter().min().copied() {
                    tickets.remove(&oldest);
                }
                log::warn!("abandoned a game that outran its poll timeout");
            }
        }
    }
    (wins_i, wins_j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TicTacToe;
    use crate::gp::library::ProgramLibrary;
    use crate::search::standard_functions;

    fn individual(id: u64, score: f64) -> Individual {
        let library = ProgramLibrary::embedded_only();
        let mut ind = Individual::new(id, library.load("MCTS"));
        ind.score = score;
        ind
    }

    #[test]
    fn pairing_prefers_the_same_score_group() {
        let population = vec![
            individual(1, 10.0),
            individual(2, 10.0),
            individual(3, 4.0),
            individual(4, 4.0),
        ];
        let (pairs, byes) = create_pairings(&population);
        assert_eq!(pairs, vec![(0, 1), (2, 3)]);
        assert!(byes.is_empty());
    }

    #[test]
    fn no_repeat_opponents_within_a_tournament() {
        let mut population = vec![
            individual(1, 10.0),
            individual(2, 10.0),
            individual(3, 4.0),
            individual(4, 4.0),
        ];
        // 1 and 2 already met, as did 3 and 4
        population[0].opponents.insert(2);
        population[1].opponents.insert(1);
        population[2].opponents.insert(4);
        population[3].opponents.insert(3);
        let (pairs, byes) = create_pairings(&population);
        assert_eq!(pairs, vec![(0, 2), (1, 3)]);
        assert!(byes.is_empty());
    }

    #[test]
    fn odd_population_gets_a_bye() {
        let population = vec![individual(1, 5.0), individual(2, 5.0), individual(3, 1.0)];
        let (pairs, byes) = create_pairings(&population);
        assert_eq!(pairs, vec![(0, 1)]);
        assert_eq!(byes, vec![2]);
    }

    #[test]
    fn exhausted_opponents_mean_a_bye() {
        let mut population = vec![individual(1, 5.0), individual(2, 5.0)];
        population[0].opponents.insert(2);
        population[1].opponents.insert(1);
        let (pairs, byes) = create_pairings(&population);
        assert!(pairs.is_empty());
        assert_eq!(byes, vec![0, 1]);
    }

    #[test]
    fn timed_out_games_never_count_even_when_the_verdict_arrives_late() {
        let mut pool: TaskPool<i32> = TaskPool::new(2);
        let mut tickets = HashSet::new();
        // outruns the poll timeout but still finishes mid-collection
        tickets.insert(pool.submit(|| {
            std::thread::sleep(Duration::from_millis(400));
            1
        }));
        // an instant draw
        tickets.insert(pool.submit(|| 0));
        // far too slow; abandoned outright
        tickets.insert(pool.submit(|| {
            std::thread::sleep(Duration::from_millis(1200));
            -1
        }));
        let wins = collect_match(&mut pool, tickets, Duration::from_millis(250));
        assert_eq!(wins, (0, 0));
    }

    #[test]
    fn a_tiny_tournament_scores_everyone() {
        let game = Arc::new(TicTacToe);
        let functions = Arc::new(standard_functions(Arc::clone(&game)));
        let mut population = vec![individual(1, 0.0), individual(2, 0.0)];
        let config = SwissConfig {
            rounds: 1,
            games_per_match: 2,
            max_seconds: 0.02,
            poll_timeout_secs: 30,
            workers: 2,
        };
        run_swiss_tournament(&mut population, &game, &functions, &config, 77);
        let total: f64 = population.iter().map(|i| i.score).sum();
        // two games were played; wins sum to at most 2
        assert!(total <= 2.0);
        assert!(population[0].score >= population[1].score);
        assert!(population[0].opponents.len() == 1);
    }
}
