//! Structural and numeric mutation of SADL trees.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::gp::ops::{
    is_numeric_literal, operator, type_matches, OperatorDescriptor, TypeTag, AGGREGATES,
    NODE_TYPES, NUMERIC_VARIABLES, OPERATORS, PROOF_VALUES,
};
use crate::lang::{Ast, AstKind, NodeId};
use crate::program::compile;

/// Attempts before conceding that the tree resists mutation.
pub const MAX_MUTATION_ATTEMPTS: usize = 30;

/// One uniform roll decides both kinds: structural below this threshold...
const STRUCTURAL_THRESHOLD: f64 = 0.66;
/// ...and numeric below this one, so a low roll applies both.
const NUMERIC_THRESHOLD: f64 = 0.50;

/// Relative spread of the multiplicative numeric noise.
const NOISE_SD: f64 = 0.25;

/// Mutates `ast`. Each attempt clones the tree, rolls for structural
/// and/or numeric mutation, and keeps the result only if it changed
/// something and still compiles. `None` after
/// [`MAX_MUTATION_ATTEMPTS`] failed attempts.
#[must_use]
pub fn mutate<R: Rng>(ast: &Ast, rng: &mut R) -> Option<Ast> {
    for _ in 0..MAX_MUTATION_ATTEMPTS {
        let mut candidate = ast.clone();
        let roll: f64 = rng.gen();
        let mut changed = false;
        if roll < STRUCTURAL_THRESHOLD {
            changed |= mutate_structure(&mut candidate, rng);
        }
        if roll < NUMERIC_THRESHOLD {
            changed |= mutate_numeric(&mut candidate, rng);
        }
        if changed && compile(&candidate).is_ok() {
            return Some(candidate);
        }
    }
    log::debug!("`{}` resisted mutation", ast.display_name());
    None
}

/// Replaces one typed site: category leaves swap within their set, and
/// operator or numeric sites get a freshly grown subtree of the same
/// type.
fn mutate_structure<R: Rng>(ast: &mut Ast, rng: &mut R) -> bool {
    let sites: Vec<NodeId> = ast
        .ids()
        .into_iter()
        .filter(|&n| n != ast.root() && site_type(ast, n).is_some())
        .collect();
    let Some(&site) = sites.choose(rng) else {
        return false;
    };

    let value = ast.value(site).to_owned();
    for set in [AGGREGATES, NODE_TYPES, PROOF_VALUES] {
        if set.contains(&value.as_str()) {
            let others: Vec<&&str> = set.iter().filter(|&&m| m != value).collect();
            if let Some(&&replacement) = others.choose(rng) {
                ast.set_value(site, replacement);
                return true;
            }
            return false;
        }
    }

    let Some(expected) = site_type(ast, site) else {
        return false;
    };
    let echo = leaf_echo(ast, site);
    let replacement = grow(expected, echo.as_deref(), 1, rng);
    ast.replace(site, &replacement);
    true
}

/// Jitters one numeric literal: multiplicative Gaussian noise around 1,
/// or additive noise when the literal is zero (so zero always escapes).
fn mutate_numeric<R: Rng>(ast: &mut Ast, rng: &mut R) -> bool {
    let literals: Vec<NodeId> = ast
        .ids()
        .into_iter()
        .filter(|&n| ast.kind(n) == AstKind::Number)
        .collect();
    let Some(&site) = literals.choose(rng) else {
        return false;
    };
    let old: f64 = ast.value(site).parse().unwrap_or(0.0);
    let noise = Normal::new(0.0, NOISE_SD).expect("constant parameters");
    let new = if old == 0.0 {
        let mut shift = noise.sample(rng);
        let mut guard = 0;
        while shift == 0.0 && guard < 100 {
            shift = noise.sample(rng);
            guard += 1;
        }
        if shift == 0.0 {
            NOISE_SD
        } else {
            shift
        }
    } else {
        old * (1.0 + noise.sample(rng))
    };
    ast.set_value(site, format_literal(new));
    true
}

/// The type a mutated site must preserve, `None` for sites mutation
/// leaves alone (keywords, names, plain variables outside the numeric
/// set).
fn site_type(ast: &Ast, node: NodeId) -> Option<TypeTag> {
    let value = ast.value(node);
    if let Some(desc) = operator(value) {
        return Some(desc.returns);
    }
    if NUMERIC_VARIABLES.contains(&value) || is_numeric_literal(value) {
        return Some(TypeTag::Number);
    }
    if AGGREGATES.contains(&value) || NODE_TYPES.contains(&value) || PROOF_VALUES.contains(&value)
    {
        return Some(TypeTag::Any);
    }
    None
}

/// The original leaf text, kept around so grown subtrees can echo it.
fn leaf_echo(ast: &Ast, node: NodeId) -> Option<String> {
    if ast.children(node).is_empty()
        && (NUMERIC_VARIABLES.contains(&ast.value(node)) || is_numeric_literal(ast.value(node)))
    {
        Some(ast.value(node).to_owned())
    } else {
        None
    }
}

/// Grows a random subtree of the expected type. Nests another operator
/// with probability `0.5 / depth`, may echo the replaced atom, and
/// bottoms out in a literal or variable leaf.
fn grow<R: Rng>(expected: TypeTag, echo: Option<&str>, depth: usize, rng: &mut R) -> Ast {
    if rng.gen::<f64>() < 0.5 / depth as f64 {
        let fitting: Vec<&OperatorDescriptor> = OPERATORS
            .iter()
            .filter(|op| type_matches(expected, op.returns))
            .collect();
        if let Some(op) = fitting.choose(rng) {
            let mut tree = Ast::new(op.name, AstKind::Symbol);
            let root = tree.root();
            for &input in op.inputs {
                let arg = grow(concrete(input), echo, depth + 1, rng);
                graft(&mut tree, root, &arg);
            }
            return tree;
        }
    }

    if depth > 1 && expected == TypeTag::Number && rng.gen::<f64>() < 0.5 {
        if let Some(text) = echo {
            let kind = if is_numeric_literal(text) { AstKind::Number } else { AstKind::Symbol };
            return Ast::new(text, kind);
        }
    }

    match expected {
        TypeTag::Boolean => {
            let text = if rng.gen::<bool>() { "true" } else { "false" };
            Ast::new(text, AstKind::Symbol)
        }
        TypeTag::Node => {
            let name = if rng.gen::<bool>() { "argmax" } else { "argmin" };
            let mut tree = Ast::new(name, AstKind::Symbol);
            let root = tree.root();
            let arg = grow(TypeTag::Number, echo, depth + 1, rng);
            graft(&mut tree, root, &arg);
            tree
        }
        TypeTag::Number | TypeTag::Any => {
            if rng.gen::<bool>() {
                let var = NUMERIC_VARIABLES.choose(rng).copied().unwrap_or("visitCount");
                Ast::new(var, AstKind::Symbol)
            } else {
                Ast::new(format_literal(rng.gen::<f64>() * 3.0), AstKind::Number)
            }
        }
    }
}

/// Attaches a copy of `sub` as the last child of `parent`.
fn graft(tree: &mut Ast, parent: NodeId, sub: &Ast) {
    let top = tree.add_child(parent, sub.value(sub.root()).to_owned(), sub.kind(sub.root()));
    copy_children(tree, top, sub, sub.root());
}

fn copy_children(tree: &mut Ast, dst: NodeId, src: &Ast, src_node: NodeId) {
    for &c in src.children(src_node) {
        let id = tree.add_child(dst, src.value(c).to_owned(), src.kind(c));
        copy_children(tree, id, src, c);
    }
}

fn concrete(tag: TypeTag) -> TypeTag {
    if tag == TypeTag::Any {
        TypeTag::Number
    } else {
        tag
    }
}

/// Plain decimal text for a literal; `f64`'s `Display` never uses
/// exponents, so the lexer always reads it back.
fn format_literal(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "1".to_owned()
    }
}
