//! The generation lifecycle: rank, select, breed, gate, checkpoint.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::gp::crossover::crossover;
use crate::gp::fitness::{FitnessGate, GateConfig};
use crate::gp::library::ProgramLibrary;
use crate::gp::mutation::mutate;
use crate::gp::persistence::{load_checkpoint, save_checkpoint, CheckpointError};
use crate::gp::pool::TaskPool;
use crate::gp::tournament::{run_swiss_tournament, SwissConfig};
use crate::lang::Ast;
use crate::search::standard_functions;

/// One member of the population.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Unique id, monotonically assigned across the whole run.
    pub id: u64,
    /// The program.
    pub ast: Ast,
    /// Current tournament score.
    pub score: f64,
    /// Ids of opponents faced in the current tournament.
    pub opponents: HashSet<u64>,
}

impl Individual {
    /// Wraps a program with a fresh id.
    #[must_use]
    pub fn new(id: u64, ast: Ast) -> Self {
        Self { id, ast, score: 0.0, opponents: HashSet::new() }
    }

    /// The program's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.ast.display_name()
    }

    /// Clears tournament state.
    pub fn reset_for_tournament(&mut self) {
        self.score = 0.0;
        self.opponents.clear();
    }
}

/// Evolution run parameters. Fields omitted from a config file take
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Target population size.
    pub population_size: usize,
    /// Generations to run.
    pub generations: usize,
    /// Probability that an offspring starts from a crossover.
    pub crossover_rate: f64,
    /// Probability that an offspring is then mutated.
    pub mutation_rate: f64,
    /// Fraction of the (growing) next population parents are drawn from.
    pub elite_pool_ratio: f64,
    /// Reference programs re-inserted every generation if lost.
    pub always_include: Vec<String>,
    /// Worker threads for candidate generation.
    pub workers: usize,
    /// Fitness-gate settings.
    pub gate: GateConfig,
    /// Tournament settings.
    pub swiss: SwissConfig,
    /// Checkpoint file, written every generation and used for resume.
    pub checkpoint: PathBuf,
    /// Optional directory of reference-program overrides.
    pub library_dir: Option<PathBuf>,
    /// Seed for the orchestrator rng; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            crossover_rate: 0.95,
            mutation_rate: 0.95,
            elite_pool_ratio: 0.75,
            always_include: vec!["MCTS".to_owned(), "PNS".to_owned()],
            workers: std::thread::available_parallelism().map_or(4, usize::from),
            gate: GateConfig::default(),
            swiss: SwissConfig::default(),
            checkpoint: PathBuf::from("checkpoint.txt"),
            library_dir: None,
            seed: None,
        }
    }
}

/// Callbacks for run progress; `()` ignores everything.
pub trait EvolveObserver {
    /// A generation is about to be ranked and bred.
    fn generation_started(&mut self, _generation: usize, _total: usize) {}
    /// A generation finished; `best` is the current leader.
    fn generation_finished(&mut self, _generation: usize, _best_name: &str, _best_score: f64) {}
}

impl EvolveObserver for () {}

/// What an evolution run produced.
#[derive(Debug)]
pub struct EvolutionOutcome {
    /// Generations actually run (resume shortens this).
    pub generations_run: usize,
    /// Leader of the final ranking.
    pub best: Individual,
}

/// Evolution failures. Game-playing problems are handled inline (a
/// failing program just loses); only infrastructure failures surface.
#[derive(Debug)]
pub enum EvolutionError {
    /// Checkpoint could not be written or resumed from.
    Checkpoint(CheckpointError),
    /// The configuration cannot produce a population.
    EmptyPopulation,
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkpoint(e) => write!(f, "{e}"),
            Self::EmptyPopulation => write!(f, "population size must be at least 1"),
        }
    }
}

impl Error for EvolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Checkpoint(e) => Some(e),
            Self::EmptyPopulation => None,
        }
    }
}

impl From<CheckpointError> for EvolutionError {
    fn from(e: CheckpointError) -> Self {
        Self::Checkpoint(e)
    }
}

/// Runs (or resumes) an evolution and returns the final leader.
///
/// # Errors
///
/// Returns an [`EvolutionError`] on checkpoint problems or a zero-sized
/// population.
pub fn evolve<G: Game>(
    game: &Arc<G>,
    config: &EvolutionConfig,
    observer: &mut dyn EvolveObserver,
) -> Result<EvolutionOutcome, EvolutionError> {
    if config.population_size == 0 {
        return Err(EvolutionError::EmptyPopulation);
    }
    let functions = Arc::new(standard_functions(Arc::clone(game)));
    let library = Arc::new(match &config.library_dir {
        Some(dir) => ProgramLibrary::with_dir(dir.clone()),
        None => ProgramLibrary::embedded_only(),
    });
    let gate = Arc::new(FitnessGate::new(
        Arc::clone(game),
        Arc::clone(&functions),
        Arc::clone(&library),
        config.gate.clone(),
    ));
    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let mut next_id: u64 = 0;

    // resume from the checkpoint when one exists
    let (start_generation, mut population) = if config.checkpoint.exists() {
        let checkpoint = load_checkpoint(&config.checkpoint)?;
        next_id = checkpoint
            .population
            .iter()
            .map(|i| i.id + 1)
            .max()
            .unwrap_or(0);
        log::info!(
            "resuming after generation {} with {} individuals",
            checkpoint.generation,
            checkpoint.population.len()
        );
        (checkpoint.generation + 1, checkpoint.population)
    } else {
        let mut seeds = Vec::new();
        for name in ProgramLibrary::names() {
            seeds.push(Individual::new(alloc(&mut next_id), library.load(name)));
        }
        seeds.truncate(config.population_size);
        (0, seeds)
    };
    if start_generation > 0 {
        // a checkpoint holds the full ranked generation; survivor
        // selection and forced inclusion still have to happen before
        // breeding resumes
        select_survivors(&mut population, config, &library, &mut next_id);
    }

    let mut generations_run = 0;
    for generation in start_generation..config.generations {
        observer.generation_started(generation, config.generations);

        breed_to_target(
            &mut population,
            generation,
            config,
            &gate,
            &library,
            &mut rng,
            &mut next_id,
        );

        run_swiss_tournament(
            &mut population,
            game,
            &functions,
            &config.swiss,
            rng.gen(),
        );

        save_checkpoint(&config.checkpoint, generation, &population)?;

        select_survivors(&mut population, config, &library, &mut next_id);

        generations_run += 1;
        let leader = &population[0];
        observer.generation_finished(generation, leader.name(), leader.score);
        log::info!(
            "generation {generation}: leader `{}` at {}",
            leader.name(),
            leader.score
        );
    }

    let best = population
        .first()
        .cloned()
        .ok_or(EvolutionError::EmptyPopulation)?;
    Ok(EvolutionOutcome { generations_run, best })
}

fn alloc(next_id: &mut u64) -> u64 {
    let id = *next_id;
    *next_id += 1;
    id
}

/// Keeps the top half of a ranked population and re-inserts any
/// allow-listed reference program that fell out.
fn select_survivors(
    population: &mut Vec<Individual>,
    config: &EvolutionConfig,
    library: &ProgramLibrary,
    next_id: &mut u64,
) {
    population.truncate((config.population_size / 2).max(1));
    for name in &config.always_include {
        if !population.iter().any(|i| i.name() == name) {
            population.push(Individual::new(alloc(next_id), library.load(name)));
        }
    }
}

/// Fills the population up to the target size with gated offspring bred
/// from the elite pool. Total attempts are capped at four times the
/// population size; if that cap is hit, the remainder is padded with
/// library programs.
fn breed_to_target<G: Game>(
    population: &mut Vec<Individual>,
    generation: usize,
    config: &EvolutionConfig,
    gate: &Arc<FitnessGate<G>>,
    library: &Arc<ProgramLibrary>,
    rng: &mut SmallRng,
    next_id: &mut u64,
) {
    let target = config.population_size;
    if population.is_empty() {
        population.push(Individual::new(*next_id, library.load("MCTS")));
        *next_id += 1;
    }
    let attempt_cap = 4 * target;
    let mut submitted = 0usize;
    let mut pool: TaskPool<Option<Ast>> = TaskPool::new(config.workers);

    while population.len() < target {
        while pool.has_capacity() && submitted < attempt_cap {
            let offspring_seed: u64 = rng.gen();
            let child = make_offspring(population, generation, config, rng);
            let gate = Arc::clone(gate);
            pool.submit(move || {
                if gate.admits(&child, offspring_seed) {
                    Some(child)
                } else {
                    None
                }
            });
            submitted += 1;
        }

        match pool.poll(Duration::from_secs(60)) {
            Some((_, Some(ast))) => {
                if population.len() < target {
                    population.push(Individual::new(*next_id, ast));
                    *next_id += 1;
                }
            }
            Some((_, None)) => {}
            None => {
                if pool.in_flight() == 0 && submitted >= attempt_cap {
                    break;
                }
            }
        }

        if submitted >= attempt_cap && pool.in_flight() == 0 {
            break;
        }
    }

    if population.len() < target {
        log::warn!(
            "breeding starved after {submitted} attempts; padding {} slots with references",
            target - population.len()
        );
        let names = ProgramLibrary::names();
        let mut i = 0;
        while population.len() < target {
            population.push(Individual::new(
                *next_id,
                library.load(names[i % names.len()]),
            ));
            *next_id += 1;
            i += 1;
        }
    }
}

/// Breeds one candidate: usually a crossover of two elite parents, then
/// usually a mutation, renamed `<parent>x<generation>`.
fn make_offspring(
    population: &[Individual],
    generation: usize,
    config: &EvolutionConfig,
    rng: &mut SmallRng,
) -> Ast {
    let elite = ((population.len() as f64 * config.elite_pool_ratio).ceil() as usize)
        .clamp(1, population.len());
    let a = &population[rng.gen_range(0..elite)];
    let parent_name = a.name().to_owned();

    let mut child = if rng.gen::<f64>() < config.crossover_rate && elite > 1 {
        let b = &population[rng.gen_range(0..elite)];
        crossover(&a.ast, &b.ast, rng)
    } else {
        a.ast.clone()
    };
    if rng.gen::<f64>() < config.mutation_rate {
        if let Some(mutant) = mutate(&child, rng) {
            child = mutant;
        }
    }
    child.set_display_name(format!("{parent_name}x{generation}"));
    child
}
