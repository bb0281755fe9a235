//! SADL command-line interface.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// SADL - evolve and run declarative best-first search algorithms
#[derive(Parser, Debug)]
#[command(name = "sadl")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve a population of search algorithms
    Evolve {
        /// JSON run configuration; flags below override its fields
        #[arg(long)]
        config: Option<std::path::PathBuf>,

        /// Population size (default 50)
        #[arg(short, long)]
        population: Option<usize>,

        /// Generations to run (default 100)
        #[arg(short, long)]
        generations: Option<usize>,

        /// Checkpoint file, also used to resume (default checkpoint.txt)
        #[arg(short, long)]
        checkpoint: Option<std::path::PathBuf>,

        /// Directory of reference-program overrides (<name>.sadl)
        #[arg(short, long)]
        library: Option<std::path::PathBuf>,

        /// Worker threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Parse and compile a SADL file, reporting any problems
    Validate {
        /// SADL source file
        #[arg(required = true)]
        file: std::path::PathBuf,
    },

    /// Pretty-print a SADL file (or an embedded reference program)
    Print {
        /// SADL source file, or a reference name like MCTS
        #[arg(required = true)]
        source: String,
    },

    /// Play two SADL programs against each other
    Compare {
        /// First program (file or reference name)
        #[arg(required = true)]
        first: String,

        /// Second program (file or reference name)
        #[arg(required = true)]
        second: String,

        /// Number of games (seats split evenly)
        #[arg(short, long, default_value = "100")]
        games: usize,

        /// Seconds per move
        #[arg(short = 't', long, default_value = "0.2")]
        move_seconds: f64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Evolve {
            config,
            population,
            generations,
            checkpoint,
            library,
            threads,
            seed,
            quiet,
        } => cli::evolve::execute(cli::evolve::Overrides {
            config,
            population,
            generations,
            checkpoint,
            library,
            threads,
            seed,
            quiet,
        }),

        Commands::Validate { file } => cli::validate::execute(&file),

        Commands::Print { source } => cli::print::execute(&source),

        Commands::Compare {
            first,
            second,
            games,
            move_seconds,
            seed,
        } => cli::compare::execute(&first, &second, games, move_seconds, seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
