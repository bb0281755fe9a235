//! Type-aware subtree crossover.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::gp::ops::{
    is_numeric_literal, operator, AGGREGATES, NODE_TYPES, NUMERIC_VARIABLES, PROOF_VALUES,
};
use crate::lang::{Ast, NodeId};
use crate::program::compile;

/// Attempts before giving up and returning a clone of the first parent.
pub const MAX_CROSSOVER_ATTEMPTS: usize = 30;

/// Crosses `a` with `b`: a random subtree of `a` is replaced by a
/// compatible, structurally different subtree of `b`, and the offspring
/// must recompile. Falls back to a clone of `a` when no valid exchange is
/// found within [`MAX_CROSSOVER_ATTEMPTS`].
#[must_use]
pub fn crossover<R: Rng>(a: &Ast, b: &Ast, rng: &mut R) -> Ast {
    let mut donors: Vec<NodeId> = b.ids().into_iter().filter(|&n| n != b.root()).collect();

    for _ in 0..MAX_CROSSOVER_ATTEMPTS {
        let mut child = a.clone();
        let sites: Vec<NodeId> =
            child.ids().into_iter().filter(|&n| n != child.root()).collect();
        let Some(&site) = sites.choose(rng) else {
            break;
        };
        donors.shuffle(rng);

        let found = donors.iter().copied().find(|&donor| {
            compatible(&child, site, b, donor) && !child.structurally_eq(site, b, donor)
        });
        let Some(donor) = found else {
            continue;
        };

        child.replace(site, &b.subtree(donor));
        if compile(&child).is_ok() {
            return child;
        }
    }

    log::debug!(
        "crossover of `{}` and `{}` found no valid exchange",
        a.display_name(),
        b.display_name()
    );
    a.clone()
}

/// Whether the subtree at `na` may be replaced by the one at `nb`: same
/// tag, interchangeable operators, or joint membership of one leaf
/// category.
fn compatible(a: &Ast, na: NodeId, b: &Ast, nb: NodeId) -> bool {
    let va = a.value(na);
    let vb = b.value(nb);
    if va == vb {
        return true;
    }
    if let (Some(da), Some(db)) = (operator(va), operator(vb)) {
        if da.interchangeable_with(db) {
            return true;
        }
    }
    same_category(va, vb)
}

fn same_category(va: &str, vb: &str) -> bool {
    for set in [AGGREGATES, NODE_TYPES, PROOF_VALUES, NUMERIC_VARIABLES] {
        if set.contains(&va) && set.contains(&vb) {
            return true;
        }
    }
    is_numeric_literal(va) && is_numeric_literal(vb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::library::{MCTS, PNS};
    use crate::lang::parse_program;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn leaf_categories_mix_but_not_across_sets() {
        let src = "(SearchAlgorithm \"A\" (Selection \"s\" (SelectNode argmax proofNumber)))";
        let ast = parse_program(src).expect("parse");
        let pn = ast
            .ids()
            .into_iter()
            .find(|&n| ast.value(n) == "proofNumber")
            .expect("leaf");
        let other = parse_program(
            "(SearchAlgorithm \"B\" (Selection \"s\" (SelectNode argmin visitCount)))",
        )
        .expect("parse");
        let vc = other
            .ids()
            .into_iter()
            .find(|&n| other.value(n) == "visitCount")
            .expect("leaf");
        assert!(compatible(&ast, pn, &other, vc));

        let agg = parse_program(
            "(SearchAlgorithm \"C\" (Backpropagation (Set proofNumber (Aggregate min proofNumber))))",
        )
        .expect("parse");
        let min = agg
            .ids()
            .into_iter()
            .find(|&n| agg.value(n) == "min")
            .expect("leaf");
        assert!(!compatible(&ast, pn, &agg, min));
    }

    #[test]
    fn offspring_always_compile() {
        let a = parse_program(MCTS).expect("mcts");
        let b = parse_program(PNS).expect("pns");
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..200 {
            let child = crossover(&a, &b, &mut rng);
            assert!(compile(&child).is_ok());
        }
    }

    #[test]
    fn no_exchangeable_material_falls_back_to_a_clone() {
        let a = parse_program(
            "(SearchAlgorithm \"A\" (Selection \"s\" (SelectNode argmax visitCount)))",
        )
        .expect("parse");
        // identical apart from the (incompatible) quoted name, so every
        // compatible pair is structurally equal
        let b = parse_program(
            "(SearchAlgorithm \"B\" (Selection \"s\" (SelectNode argmax visitCount)))",
        )
        .expect("parse");
        let mut rng = SmallRng::seed_from_u64(1);
        let child = crossover(&a, &b, &mut rng);
        assert!(child.structurally_eq(child.root(), &a, a.root()));
    }
}
