//! Expression and condition evaluation against a search tree.
//!
//! Everything is a `f64`. An atom that is not a built-in resolves, in
//! order, to a per-search global, the node's attribute, or a numeric
//! literal; anything else is an error, which aborts the search that
//! raised it.

use std::collections::HashMap;

use crate::error::EvalError;
use crate::lang::{Ast, NodeId};
use crate::program::registry::FunctionRegistry;
use crate::search::{NodeIndex, SearchTree};

/// Evaluates `expr` at `node`.
///
/// Division by zero divides by one instead; the proof-number update rules
/// depend on `inf` flowing through arithmetic unchanged.
///
/// # Errors
///
/// Returns an [`EvalError`] for unresolved atoms, `Parent` at the root,
/// unregistered external functions, and malformed operator applications.
pub fn evaluate<T: SearchTree>(
    ast: &Ast,
    expr: NodeId,
    tree: &T,
    node: NodeIndex,
    globals: &HashMap<String, f64>,
    functions: &FunctionRegistry<T>,
) -> Result<f64, EvalError> {
    match ast.value(expr) {
        "+" => {
            let (a, b) = binary(ast, expr, tree, node, globals, functions)?;
            Ok(a + b)
        }
        "-" => {
            let (a, b) = binary(ast, expr, tree, node, globals, functions)?;
            Ok(a - b)
        }
        "*" => {
            let (a, b) = binary(ast, expr, tree, node, globals, functions)?;
            Ok(a * b)
        }
        "/" => {
            let (a, b) = binary(ast, expr, tree, node, globals, functions)?;
            Ok(a / if b == 0.0 { 1.0 } else { b })
        }
        "sqrt" => Ok(unary(ast, expr, tree, node, globals, functions)?.sqrt()),
        "log" => Ok(unary(ast, expr, tree, node, globals, functions)?.ln()),
        "orNode" | "maxNode" => Ok(0.0),
        "andNode" | "minNode" => Ok(1.0),
        "true" => Ok(1.0),
        "false" => Ok(0.0),
        "unknown" => Ok(-1.0),
        "inf" => Ok(f64::INFINITY),
        "numChildren" => Ok(tree.children(node).len() as f64),
        "depth" => Ok(tree.depth(node) as f64),
        "Parent" => {
            let parent = tree.parent(node).ok_or(EvalError::MissingParent)?;
            let inner = first_child(ast, expr)?;
            evaluate(ast, inner, tree, parent, globals, functions)
        }
        "Aggregate" => {
            let op_node = first_child(ast, expr)?;
            let param_node = ast
                .child(expr, 1)
                .ok_or_else(|| EvalError::MalformedExpression("Aggregate".to_owned()))?;
            aggregate(ast.value(op_node), ast.value(param_node), tree, node)
        }
        "ExternalFunction" => {
            let name_node = first_child(ast, expr)?;
            let name = ast.value(name_node);
            let f = functions
                .get(name)
                .ok_or_else(|| EvalError::UnknownFunction(name.to_owned()))?;
            Ok(f(tree, node))
        }
        other => {
            if let Some(&v) = globals.get(other) {
                Ok(v)
            } else if tree.has_attr(node, other) {
                Ok(tree.attr(node, other))
            } else if let Ok(v) = other.parse::<f64>() {
                Ok(v)
            } else {
                Err(EvalError::Unresolved(other.to_owned()))
            }
        }
    }
}

/// Evaluates a boolean condition (`eq`/`neq`/`lt`/`gt`/`lte`/`gte` over
/// expressions, `and`/`or` over conditions).
///
/// # Errors
///
/// Returns an [`EvalError`] for unknown condition tags or failing operand
/// evaluation.
pub fn evaluate_condition<T: SearchTree>(
    ast: &Ast,
    cond: NodeId,
    tree: &T,
    node: NodeIndex,
    globals: &HashMap<String, f64>,
    functions: &FunctionRegistry<T>,
) -> Result<bool, EvalError> {
    match ast.value(cond) {
        "eq" => {
            let (a, b) = binary(ast, cond, tree, node, globals, functions)?;
            Ok(a == b)
        }
        "neq" => {
            let (a, b) = binary(ast, cond, tree, node, globals, functions)?;
            Ok(a != b)
        }
        "lt" => {
            let (a, b) = binary(ast, cond, tree, node, globals, functions)?;
            Ok(a < b)
        }
        "gt" => {
            let (a, b) = binary(ast, cond, tree, node, globals, functions)?;
            Ok(a > b)
        }
        "lte" => {
            let (a, b) = binary(ast, cond, tree, node, globals, functions)?;
            Ok(a <= b)
        }
        "gte" => {
            let (a, b) = binary(ast, cond, tree, node, globals, functions)?;
            Ok(a >= b)
        }
        "and" => {
            let (l, r) = condition_operands(ast, cond)?;
            Ok(evaluate_condition(ast, l, tree, node, globals, functions)?
                && evaluate_condition(ast, r, tree, node, globals, functions)?)
        }
        "or" => {
            let (l, r) = condition_operands(ast, cond)?;
            Ok(evaluate_condition(ast, l, tree, node, globals, functions)?
                || evaluate_condition(ast, r, tree, node, globals, functions)?)
        }
        other => Err(EvalError::UnknownCondition(other.to_owned())),
    }
}

fn aggregate<T: SearchTree>(
    op: &str,
    param: &str,
    tree: &T,
    node: NodeIndex,
) -> Result<f64, EvalError> {
    let children = tree.children(node);
    // a childless node aggregates to its own attribute, which keeps
    // resolved leaves stable after pruning
    if children.is_empty() {
        return Ok(tree.attr(node, param));
    }
    let values = children.iter().map(|&c| tree.attr(c, param));
    let out = match op {
        "min" => values.fold(f64::INFINITY, f64::min),
        "max" => values.fold(f64::NEG_INFINITY, f64::max),
        "sum" => values.sum(),
        "avg" => values.sum::<f64>() / children.len() as f64,
        other => return Err(EvalError::UnknownAggregate(other.to_owned())),
    };
    Ok(out)
}

fn first_child(ast: &Ast, expr: NodeId) -> Result<NodeId, EvalError> {
    ast.child(expr, 0)
        .ok_or_else(|| EvalError::MalformedExpression(ast.value(expr).to_owned()))
}

fn condition_operands(ast: &Ast, cond: NodeId) -> Result<(NodeId, NodeId), EvalError> {
    match (ast.child(cond, 0), ast.child(cond, 1)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::MalformedExpression(ast.value(cond).to_owned())),
    }
}

fn unary<T: SearchTree>(
    ast: &Ast,
    expr: NodeId,
    tree: &T,
    node: NodeIndex,
    globals: &HashMap<String, f64>,
    functions: &FunctionRegistry<T>,
) -> Result<f64, EvalError> {
    let inner = first_child(ast, expr)?;
    evaluate(ast, inner, tree, node, globals, functions)
}

fn binary<T: SearchTree>(
    ast: &Ast,
    expr: NodeId,
    tree: &T,
    node: NodeIndex,
    globals: &HashMap<String, f64>,
    functions: &FunctionRegistry<T>,
) -> Result<(f64, f64), EvalError> {
    let (l, r) = condition_operands(ast, expr)?;
    let a = evaluate(ast, l, tree, node, globals, functions)?;
    let b = evaluate(ast, r, tree, node, globals, functions)?;
    Ok((a, b))
}
