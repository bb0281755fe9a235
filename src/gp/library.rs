//! The reference program library: embedded SADL sources for the classic
//! algorithms, optionally overridden by files on disk.
//!
//! Library names must not contain `x`; offspring names are
//! `<ancestor>x<generation>...` and the fitness gate recovers the ancestor
//! by cutting at the first `x`.

use std::path::PathBuf;

use crate::lang::{parse_program, Ast};

/// UCT-style Monte-Carlo tree search.
pub const MCTS: &str = r#"
(SearchAlgorithm "MCTS"
  (Define C 0.6)
  (Define value 0)
  (Selection "UCT"
    (Condition (eq nodeType maxNode)
      (SelectNode argmax (+ valueEstimate (* C (sqrt (/ (log (Parent visitCount)) visitCount))))))
    (Condition (eq nodeType minNode)
      (SelectNode argmin (- valueEstimate (* C (sqrt (/ (log (Parent visitCount)) visitCount)))))))
  (Evaluation
    (Set value (ExternalFunction mctsEval)))
  (Backpropagation
    (Set valueEstimate (/ (+ (* valueEstimate (- visitCount 1)) value) visitCount)))
  (FinalMoveSelection
    (SelectNode argmax visitCount)))
"#;

/// Proof-number search with most-proving-node descent.
pub const PNS: &str = r#"
(SearchAlgorithm "PNS"
  (Define value -1)
  (Selection "MPN"
    (Condition (eq nodeType orNode)
      (SelectNode argmin proofNumber))
    (Condition (eq nodeType andNode)
      (SelectNode argmin disproofNumber)))
  (Evaluation
    (Set value (ExternalFunction pnsEval))
    (Condition (eq value true)
      (Set proofNumber 0)
      (Set disproofNumber inf))
    (Condition (eq value false)
      (Set proofNumber inf)
      (Set disproofNumber 0))
    (Condition (eq value unknown)
      (Set proofNumber 1)
      (Set disproofNumber 1)))
  (Backpropagation
    (Condition (eq nodeType orNode)
      (Set proofNumber (Aggregate min proofNumber))
      (Set disproofNumber (Aggregate sum disproofNumber)))
    (Condition (eq nodeType andNode)
      (Set proofNumber (Aggregate sum proofNumber))
      (Set disproofNumber (Aggregate min disproofNumber))))
  (FinalMoveSelection
    (SelectNode argmin proofNumber)))
"#;

/// UCT biased toward provably winning lines.
pub const PN_MCTS: &str = r#"
(SearchAlgorithm "PN-MCTS"
  (Define C 0.6)
  (Define W 0.3)
  (Define value 0)
  (Define outcome -1)
  (Selection "PN-UCT"
    (Condition (eq nodeType maxNode)
      (SelectNode argmax (+ (+ valueEstimate (* C (sqrt (/ (log (Parent visitCount)) visitCount)))) (/ W (+ proofNumber 1)))))
    (Condition (eq nodeType minNode)
      (SelectNode argmin (- (- valueEstimate (* C (sqrt (/ (log (Parent visitCount)) visitCount)))) (/ W (+ disproofNumber 1))))))
  (Evaluation
    (Set value (ExternalFunction mctsEval))
    (Set outcome (ExternalFunction pnsEval))
    (Condition (eq outcome true)
      (Set proofNumber 0)
      (Set disproofNumber inf))
    (Condition (eq outcome false)
      (Set proofNumber inf)
      (Set disproofNumber 0)))
  (Backpropagation
    (Set valueEstimate (/ (+ (* valueEstimate (- visitCount 1)) value) visitCount))
    (Condition (eq nodeType orNode)
      (Set proofNumber (Aggregate min proofNumber))
      (Set disproofNumber (Aggregate sum disproofNumber)))
    (Condition (eq nodeType andNode)
      (Set proofNumber (Aggregate sum proofNumber))
      (Set disproofNumber (Aggregate min disproofNumber))))
  (FinalMoveSelection
    (SelectNode argmax visitCount)))
"#;

/// Last-resort program when a requested name cannot be loaded at all:
/// uniform descent with playout evaluation.
const FALLBACK: &str = r#"
(SearchAlgorithm "Fallback"
  (Define value 0)
  (Selection "Uniform"
    (SelectNode argmax visitCount))
  (Evaluation
    (Set value (ExternalFunction mctsEval)))
  (Backpropagation
    (Set valueEstimate (/ (+ (* valueEstimate (- visitCount 1)) value) visitCount)))
  (FinalMoveSelection
    (SelectNode argmax visitCount)))
"#;

const EMBEDDED: &[(&str, &str)] = &[("MCTS", MCTS), ("PNS", PNS), ("PN-MCTS", PN_MCTS)];

/// The ancestor name of an (possibly evolved) individual: everything
/// before the first `x` of its display name.
#[must_use]
pub fn baseline_name(name: &str) -> &str {
    name.split('x').next().unwrap_or(name)
}

/// Loads reference programs by name, preferring `<dir>/<name>.sadl` over
/// the embedded copies.
#[derive(Debug, Clone, Default)]
pub struct ProgramLibrary {
    dir: Option<PathBuf>,
}

impl ProgramLibrary {
    /// A library that only serves the embedded programs.
    #[must_use]
    pub fn embedded_only() -> Self {
        Self { dir: None }
    }

    /// A library that checks `dir` for overrides first.
    #[must_use]
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    /// Names of the embedded programs.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        EMBEDDED.iter().map(|&(n, _)| n).collect()
    }

    /// Loads a program by name. Resource problems are recoverable by
    /// design: a missing or unparsable program falls back to the minimal
    /// default, with a warning.
    #[must_use]
    pub fn load(&self, name: &str) -> Ast {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{name}.sadl"));
            match std::fs::read_to_string(&path) {
                Ok(text) => match parse_program(&text) {
                    Ok(ast) => return ast,
                    Err(e) => {
                        log::warn!("ignoring {}: {e}", path.display());
                    }
                },
                Err(_) => {} // fall through to the embedded copy
            }
        }
        if let Some(&(_, src)) = EMBEDDED.iter().find(|&&(n, _)| n == name) {
            match parse_program(src) {
                Ok(ast) => return ast,
                Err(e) => log::warn!("embedded program {name} failed to parse: {e}"),
            }
        } else {
            log::warn!("no reference program named `{name}`, using the fallback");
        }
        parse_program(FALLBACK).expect("fallback program parses")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::compile;

    #[test]
    fn every_embedded_program_parses_and_compiles() {
        for &(name, src) in EMBEDDED {
            let ast = parse_program(src).expect(name);
            let program = compile(&ast).expect(name);
            assert_eq!(program.name(), name);
            assert!(!program.selection().is_empty());
            assert!(!program.evaluation().is_empty());
            assert!(!program.backpropagation().is_empty());
        }
        compile(&parse_program(FALLBACK).expect("fallback")).expect("fallback");
    }

    #[test]
    fn library_names_avoid_the_offspring_separator() {
        for name in ProgramLibrary::names() {
            assert!(!name.contains('x'), "`{name}` would break baseline lookup");
        }
    }

    #[test]
    fn baseline_name_cuts_at_the_first_x() {
        assert_eq!(baseline_name("MCTSx3x7"), "MCTS");
        assert_eq!(baseline_name("PNS"), "PNS");
        assert_eq!(baseline_name("PN-MCTSx12"), "PN-MCTS");
    }

    #[test]
    fn unknown_names_fall_back() {
        let library = ProgramLibrary::embedded_only();
        let ast = library.load("NoSuchAlgorithm");
        assert_eq!(ast.display_name(), "Fallback");
    }

    #[test]
    fn disk_overrides_win() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("MCTS.sadl"),
            "(SearchAlgorithm \"MCTS\" (Selection \"s\" (SelectNode argmax visitCount)) (Evaluation (Set v 1)) (Backpropagation (Set v 1)))",
        )
        .expect("write");
        let library = ProgramLibrary::with_dir(dir.path().to_path_buf());
        let ast = library.load("MCTS");
        // the override is much smaller than the embedded program
        assert!(ast.node_count() < 20);
    }
}
