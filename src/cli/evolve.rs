//! `sadl evolve` - run or resume an evolution.

use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use sadl::game::TicTacToe;
use sadl::gp::{evolve, EvolutionConfig, EvolveObserver};

/// Command-line layer over [`EvolutionConfig`]: an optional JSON config
/// file, with individual flags taking precedence over its fields.
#[derive(Debug)]
pub struct Overrides {
    /// JSON run configuration.
    pub config: Option<PathBuf>,
    /// Population size.
    pub population: Option<usize>,
    /// Generations to run.
    pub generations: Option<usize>,
    /// Checkpoint file.
    pub checkpoint: Option<PathBuf>,
    /// Reference-program override directory.
    pub library: Option<PathBuf>,
    /// Worker threads.
    pub threads: Option<usize>,
    /// Orchestrator seed.
    pub seed: Option<u64>,
    /// Suppress the progress bar.
    pub quiet: bool,
}

struct BarObserver {
    bar: Option<ProgressBar>,
}

impl EvolveObserver for BarObserver {
    fn generation_started(&mut self, generation: usize, total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.set_position(generation as u64);
            bar.set_message(format!("generation {generation}"));
        }
    }

    fn generation_finished(&mut self, generation: usize, best_name: &str, best_score: f64) {
        if let Some(bar) = &self.bar {
            bar.set_position(generation as u64 + 1);
            bar.set_message(format!("best `{best_name}` at {best_score}"));
        }
    }
}

/// Runs the evolve command.
pub fn execute(overrides: Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &overrides.config {
        Some(path) => serde_json::from_str::<EvolutionConfig>(&std::fs::read_to_string(path)?)?,
        None => EvolutionConfig::default(),
    };
    if let Some(population) = overrides.population {
        config.population_size = population;
    }
    if let Some(generations) = overrides.generations {
        config.generations = generations;
    }
    if let Some(checkpoint) = overrides.checkpoint {
        config.checkpoint = checkpoint;
    }
    if let Some(library) = overrides.library {
        config.library_dir = Some(library);
    }
    if let Some(threads) = overrides.threads {
        config.workers = threads;
        config.swiss.workers = threads;
    }
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }

    let bar = if overrides.quiet {
        None
    } else {
        let bar = ProgressBar::new(config.generations as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("=>-"),
        );
        Some(bar)
    };
    let mut observer = BarObserver { bar };

    let outcome = evolve(&Arc::new(TicTacToe), &config, &mut observer)?;

    if let Some(bar) = observer.bar.take() {
        bar.finish_and_clear();
    }
    println!(
        "best after {} generation(s): {} (score {})",
        outcome.generations_run,
        outcome.best.name(),
        outcome.best.score
    );
    println!("{}", outcome.best.ast);
    Ok(())
}
