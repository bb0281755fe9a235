//! Property tests for the SADL pipeline: printing round-trips, and the
//! genetic operators only ever produce compilable programs.

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use sadl::gp::{crossover, mutate, ProgramLibrary};
use sadl::lang::{parse_program, Ast};
use sadl::program::compile;

fn library_ast(which: usize) -> Ast {
    let names = ProgramLibrary::names();
    ProgramLibrary::embedded_only().load(names[which % names.len()])
}

proptest! {
    /// Printing any (possibly mutated) program and parsing it back gives
    /// a structurally identical tree, and printing is a fixpoint.
    #[test]
    fn print_parse_round_trip(which in 0usize..3, seed in any::<u64>()) {
        let ast = library_ast(which);
        let mut rng = SmallRng::seed_from_u64(seed);
        let subject = mutate(&ast, &mut rng).unwrap_or(ast);

        let printed = subject.to_string();
        let reparsed = parse_program(&printed).expect("printed program parses");
        prop_assert!(subject.structurally_eq(subject.root(), &reparsed, reparsed.root()));
        prop_assert_eq!(printed, reparsed.to_string());
    }

    /// Crossover between any two reference programs (already mutated or
    /// not) never yields an uncompilable offspring.
    #[test]
    fn crossover_offspring_compile(
        a in 0usize..3,
        b in 0usize..3,
        seed in any::<u64>(),
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let parent_a = match mutate(&library_ast(a), &mut rng) {
            Some(m) => m,
            None => library_ast(a),
        };
        let parent_b = library_ast(b);
        let child = crossover(&parent_a, &parent_b, &mut rng);
        prop_assert!(compile(&child).is_ok(), "offspring failed to compile:\n{child}");
    }

    /// Mutation either returns a compilable program or declines.
    #[test]
    fn mutants_compile(which in 0usize..3, seed in any::<u64>()) {
        let ast = library_ast(which);
        let mut rng = SmallRng::seed_from_u64(seed);
        if let Some(mutant) = mutate(&ast, &mut rng) {
            prop_assert!(compile(&mutant).is_ok(), "mutant failed to compile:\n{mutant}");
        }
    }

    /// Offspring renaming keeps the baseline recoverable.
    #[test]
    fn baseline_prefix_survives_renaming(which in 0usize..3, generation in 0usize..1000) {
        let mut ast = library_ast(which);
        let original = ast.display_name().to_owned();
        let renamed = format!("{original}x{generation}");
        ast.set_display_name(renamed);
        prop_assert_eq!(sadl::gp::baseline_name(ast.display_name()), original);
    }
}
