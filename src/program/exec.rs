//! Statement execution: `Set`, `Condition`, `SelectNode`, the selection
//! phase, and the backpropagation walk.

use rand::Rng;

use crate::error::EvalError;
use crate::lang::Ast;
use crate::program::compile::{Aggregator, Statement};
use crate::program::eval::{evaluate, evaluate_condition};
use crate::program::registry::{FunctionRegistry, SearchContext};
use crate::search::{attrs, NodeIndex, SearchTree};

/// Runs statements in order at `node`, threading the current node through
/// (a `SelectNode` moves it). Returns the node the last statement left us
/// on.
///
/// # Errors
///
/// Propagates the first [`EvalError`]; the whole search aborts on it.
pub fn run_statements<T: SearchTree, R: Rng>(
    stmts: &[Statement],
    ast: &Ast,
    tree: &mut T,
    node: NodeIndex,
    ctx: &mut SearchContext,
    functions: &FunctionRegistry<T>,
    rng: &mut R,
) -> Result<NodeIndex, EvalError> {
    let mut current = node;
    for stmt in stmts {
        current = run_statement(stmt, ast, tree, current, ctx, functions, rng)?;
    }
    Ok(current)
}

/// Runs a selection phase: statements fire in order, and the first one
/// that actually moves the node ends the phase.
///
/// # Errors
///
/// Propagates the first [`EvalError`].
pub fn run_selection_phase<T: SearchTree, R: Rng>(
    stmts: &[Statement],
    ast: &Ast,
    tree: &mut T,
    node: NodeIndex,
    ctx: &mut SearchContext,
    functions: &FunctionRegistry<T>,
    rng: &mut R,
) -> Result<NodeIndex, EvalError> {
    for stmt in stmts {
        let next = run_statement(stmt, ast, tree, node, ctx, functions, rng)?;
        if next != node {
            return Ok(next);
        }
    }
    Ok(node)
}

/// Walks from `node` to the root. At each node: bump `visitCount`, run the
/// statements, then prune children once a proof or disproof number hits
/// zero at depth greater than 1 (the root and its direct children keep
/// theirs). Returns the last node visited (the root, unless a statement
/// rewired the walk).
///
/// # Errors
///
/// Propagates the first [`EvalError`].
pub fn run_backpropagation<T: SearchTree, R: Rng>(
    stmts: &[Statement],
    ast: &Ast,
    tree: &mut T,
    node: NodeIndex,
    ctx: &mut SearchContext,
    functions: &FunctionRegistry<T>,
    rng: &mut R,
) -> Result<NodeIndex, EvalError> {
    let mut cursor = Some(node);
    let mut last = node;
    while let Some(current) = cursor {
        let visits = tree.attr(current, attrs::VISIT_COUNT);
        tree.set_attr(current, attrs::VISIT_COUNT, visits + 1.0);

        let settled = run_statements(stmts, ast, tree, current, ctx, functions, rng)?;

        if tree.depth(settled) > 1
            && (tree.attr(settled, attrs::PROOF_NUMBER) == 0.0
                || tree.attr(settled, attrs::DISPROOF_NUMBER) == 0.0)
        {
            tree.discard_children(settled);
        }

        last = settled;
        cursor = tree.parent(settled);
    }
    Ok(last)
}

fn run_statement<T: SearchTree, R: Rng>(
    stmt: &Statement,
    ast: &Ast,
    tree: &mut T,
    node: NodeIndex,
    ctx: &mut SearchContext,
    functions: &FunctionRegistry<T>,
    rng: &mut R,
) -> Result<NodeIndex, EvalError> {
    match stmt {
        Statement::Condition { predicate, body } => {
            if evaluate_condition(ast, *predicate, tree, node, ctx.globals(), functions)? {
                run_statements(body, ast, tree, node, ctx, functions, rng)
            } else {
                Ok(node)
            }
        }
        Statement::Set { variable, expr } => {
            let value = evaluate(ast, *expr, tree, node, ctx.globals(), functions)?;
            if ctx.globals().contains_key(variable) {
                ctx.globals_mut().insert(variable.clone(), value);
            } else {
                tree.set_attr(node, variable, value);
            }
            Ok(node)
        }
        Statement::SelectNode { aggregator, expr } => {
            select_node(*aggregator, *expr, ast, tree, node, ctx, functions, rng)
        }
    }
}

/// Argmax/argmin over the node's children, with uniform tie-breaking: the
/// k-th child to tie the best score replaces the incumbent with
/// probability 1/k. NaN scores never win; if every child scores NaN the
/// node stays put.
#[allow(clippy::too_many_arguments)]
fn select_node<T: SearchTree, R: Rng>(
    aggregator: Aggregator,
    expr: crate::lang::NodeId,
    ast: &Ast,
    tree: &mut T,
    node: NodeIndex,
    ctx: &mut SearchContext,
    functions: &FunctionRegistry<T>,
    rng: &mut R,
) -> Result<NodeIndex, EvalError> {
    let children = tree.children(node).to_vec();
    if children.is_empty() {
        return Ok(node);
    }

    let mut best: Option<NodeIndex> = None;
    let mut best_score = 0.0_f64;
    let mut ties = 0_u32;

    for child in children {
        let score = evaluate(ast, expr, &*tree, child, ctx.globals(), functions)?;
        let better = match aggregator {
            Aggregator::ArgMax => score > best_score,
            Aggregator::ArgMin => score < best_score,
        };
        if best.is_none() && !score.is_nan() {
            best = Some(child);
            best_score = score;
            ties = 1;
        } else if better {
            best = Some(child);
            best_score = score;
            ties = 1;
        } else if score == best_score && best.is_some() {
            ties += 1;
            if rng.gen_range(0..ties) == 0 {
                best = Some(child);
            }
        }
    }

    Ok(best.unwrap_or(node))
}
