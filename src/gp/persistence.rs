//! Text checkpoints: one generation per file, human-readable and
//! hand-editable.
//!
//! ```text
//! === Generation 7 ===
//! Individual 12 "MCTSx3" score=37
//! (SearchAlgorithm
//!   ...)
//! --------
//! Individual 9 "PNS" score=30
//! ...
//! ```
//!
//! Writes go through a temp file and an atomic rename so a crash never
//! leaves a half-written checkpoint behind. On load, records whose SADL
//! fails to parse are skipped with a warning; one corrupt individual must
//! not sink the run.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::gp::evolution::Individual;
use crate::lang::parse_program;

const RECORD_DELIMITER: &str = "--------";

/// A loaded checkpoint: the generation it was written after and the
/// population it held.
#[derive(Debug)]
pub struct Checkpoint {
    /// Completed generation number.
    pub generation: usize,
    /// Surviving records, in file order.
    pub population: Vec<Individual>,
}

/// Checkpoint load failures.
#[derive(Debug)]
pub enum CheckpointError {
    /// Filesystem trouble.
    Io(io::Error),
    /// The header is missing or unreadable.
    Malformed(String),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "checkpoint io error: {e}"),
            Self::Malformed(detail) => write!(f, "malformed checkpoint: {detail}"),
        }
    }
}

impl Error for CheckpointError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Malformed(_) => None,
        }
    }
}

impl From<io::Error> for CheckpointError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Writes the population to `path` atomically.
///
/// # Errors
///
/// Returns any underlying filesystem error.
pub fn save_checkpoint(
    path: &Path,
    generation: usize,
    population: &[Individual],
) -> Result<(), CheckpointError> {
    let mut text = format!("=== Generation {generation} ===\n");
    for ind in population {
        text.push_str(&format!(
            "Individual {} \"{}\" score={}\n{}\n{RECORD_DELIMITER}\n",
            ind.id,
            ind.name(),
            ind.score,
            ind.ast,
        ));
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads a checkpoint back.
///
/// # Errors
///
/// Fails on filesystem errors or a missing header; individual records
/// that do not parse are skipped with a warning instead.
pub fn load_checkpoint(path: &Path) -> Result<Checkpoint, CheckpointError> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines();

    let header = lines
        .next()
        .ok_or_else(|| CheckpointError::Malformed("empty file".to_owned()))?;
    let generation = header
        .strip_prefix("=== Generation ")
        .and_then(|rest| rest.strip_suffix(" ==="))
        .and_then(|n| n.trim().parse::<usize>().ok())
        .ok_or_else(|| CheckpointError::Malformed(format!("bad header `{header}`")))?;

    let mut population = Vec::new();
    let mut record: Vec<&str> = Vec::new();
    for line in lines {
        if line == RECORD_DELIMITER {
            if let Some(ind) = parse_record(&record) {
                population.push(ind);
            }
            record.clear();
        } else {
            record.push(line);
        }
    }
    if !record.iter().all(|l| l.trim().is_empty()) {
        log::warn!("checkpoint ends mid-record; trailing data ignored");
    }

    Ok(Checkpoint { generation, population })
}

fn parse_record(lines: &[&str]) -> Option<Individual> {
    let mut iter = lines.iter();
    let head = iter.next()?;
    let rest = head.strip_prefix("Individual ")?;
    let mut parts = rest.splitn(2, ' ');
    let id: u64 = parts.next()?.parse().ok()?;
    let tail = parts.next()?;
    let score: f64 = tail.rsplit("score=").next()?.parse().ok()?;

    let source: String = iter.copied().collect::<Vec<_>>().join("\n");
    match parse_program(&source) {
        Ok(ast) => {
            let mut ind = Individual::new(id, ast);
            ind.score = score;
            Some(ind)
        }
        Err(e) => {
            log::warn!("skipping checkpoint record {id}: {e}");
            None
        }
    }
}
