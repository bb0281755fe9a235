//! AST -> [`Program`] compiler.

use std::collections::HashMap;

use crate::error::CompileError;
use crate::lang::{Ast, AstKind, NodeId};

/// How `SelectNode` picks among children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    /// Pick the child maximizing the expression.
    ArgMax,
    /// Pick the child minimizing the expression.
    ArgMin,
}

/// One executable statement. Expressions stay as references into the
/// program's AST and are evaluated on demand.
#[derive(Debug, Clone)]
pub enum Statement {
    /// Run `body` when `predicate` holds at the current node.
    Condition {
        /// Predicate expression.
        predicate: NodeId,
        /// Statements guarded by the predicate.
        body: Vec<Statement>,
    },
    /// Assign an expression to a global (if `Define`d) or node attribute.
    Set {
        /// Target variable name.
        variable: String,
        /// Value expression.
        expr: NodeId,
    },
    /// Move to the child optimizing an expression.
    SelectNode {
        /// Max or min.
        aggregator: Aggregator,
        /// Per-child scoring expression.
        expr: NodeId,
    },
}

/// A compiled search algorithm: its AST plus per-phase statement lists and
/// `Define` defaults.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    ast: Ast,
    defaults: HashMap<String, f64>,
    selection: Vec<Statement>,
    evaluation: Vec<Statement>,
    backpropagation: Vec<Statement>,
    final_move_selection: Option<Vec<Statement>>,
}

impl Program {
    /// The algorithm's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The program's syntax tree.
    #[must_use]
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// `Define`d globals and their defaults.
    #[must_use]
    pub fn defaults(&self) -> &HashMap<String, f64> {
        &self.defaults
    }

    /// Selection-phase statements.
    #[must_use]
    pub fn selection(&self) -> &[Statement] {
        &self.selection
    }

    /// Evaluation-phase statements.
    #[must_use]
    pub fn evaluation(&self) -> &[Statement] {
        &self.evaluation
    }

    /// Backpropagation-phase statements.
    #[must_use]
    pub fn backpropagation(&self) -> &[Statement] {
        &self.backpropagation
    }

    /// Final-move-selection statements; selection is the fallback.
    #[must_use]
    pub fn final_move_selection(&self) -> Option<&[Statement]> {
        self.final_move_selection.as_deref()
    }
}

/// Compiles an AST into a [`Program`]. The AST is cloned into the program
/// so the result owns everything it needs.
///
/// # Errors
///
/// Returns a [`CompileError`] when the tree is not a well-formed
/// `SearchAlgorithm` (unknown components or statements, malformed `Set`,
/// `SelectNode`, or `Define` forms).
pub fn compile(ast: &Ast) -> Result<Program, CompileError> {
    let root = ast.root();
    if ast.value(root) != "SearchAlgorithm" {
        return Err(CompileError::NotSearchAlgorithm(ast.value(root).to_owned()));
    }

    let mut name = None;
    let mut defaults = HashMap::new();
    let mut selection = Vec::new();
    let mut evaluation = Vec::new();
    let mut backpropagation = Vec::new();
    let mut final_move_selection = None;

    for &child in ast.children(root) {
        if ast.kind(child) == AstKind::Name {
            name = Some(ast.value(child).to_owned());
            continue;
        }
        match ast.value(child) {
            "Define" => {
                let (var, value) = compile_define(ast, child)?;
                defaults.insert(var, value);
            }
            "Selection" => selection = compile_statements(ast, child, true)?,
            "Evaluation" => evaluation = compile_statements(ast, child, false)?,
            "Backpropagation" => backpropagation = compile_statements(ast, child, false)?,
            "FinalMoveSelection" => {
                final_move_selection = Some(compile_statements(ast, child, false)?);
            }
            other => return Err(CompileError::UnknownComponent(other.to_owned())),
        }
    }

    let name = name.ok_or(CompileError::MissingName)?;
    Ok(Program {
        name,
        ast: ast.clone(),
        defaults,
        selection,
        evaluation,
        backpropagation,
        final_move_selection,
    })
}

fn compile_define(ast: &Ast, node: NodeId) -> Result<(String, f64), CompileError> {
    let children = ast.children(node);
    let (var, lit) = match (children.first(), children.get(1)) {
        (Some(&v), Some(&l)) => (v, l),
        _ => {
            return Err(CompileError::Malformed {
                tag: "Define".to_owned(),
                detail: "expected a name and a default".to_owned(),
            })
        }
    };
    let variable = ast.value(var).to_owned();
    let value: f64 = ast
        .value(lit)
        .parse()
        .map_err(|_| CompileError::BadDefine(variable.clone()))?;
    Ok((variable, value))
}

fn compile_statements(
    ast: &Ast,
    node: NodeId,
    skip_name: bool,
) -> Result<Vec<Statement>, CompileError> {
    let mut out = Vec::new();
    for &child in ast.children(node) {
        if skip_name && ast.kind(child) == AstKind::Name {
            continue;
        }
        out.push(compile_statement(ast, child)?);
    }
    Ok(out)
}

fn compile_statement(ast: &Ast, node: NodeId) -> Result<Statement, CompileError> {
    match ast.value(node) {
        "Condition" => {
            let predicate = ast.child(node, 0).ok_or_else(|| CompileError::Malformed {
                tag: "Condition".to_owned(),
                detail: "missing predicate".to_owned(),
            })?;
            let mut body = Vec::new();
            for &stmt in &ast.children(node)[1..] {
                body.push(compile_statement(ast, stmt)?);
            }
            Ok(Statement::Condition { predicate, body })
        }
        "Set" => {
            let (var, expr) = match (ast.child(node, 0), ast.child(node, 1)) {
                (Some(v), Some(e)) => (v, e),
                _ => {
                    return Err(CompileError::Malformed {
                        tag: "Set".to_owned(),
                        detail: "expected a variable and an expression".to_owned(),
                    })
                }
            };
            Ok(Statement::Set {
                variable: ast.value(var).to_owned(),
                expr,
            })
        }
        "SelectNode" => {
            let (agg, expr) = match (ast.child(node, 0), ast.child(node, 1)) {
                (Some(a), Some(e)) => (a, e),
                _ => {
                    return Err(CompileError::Malformed {
                        tag: "SelectNode".to_owned(),
                        detail: "expected an aggregator and an expression".to_owned(),
                    })
                }
            };
            let aggregator = match ast.value(agg) {
                "argmax" => Aggregator::ArgMax,
                "argmin" => Aggregator::ArgMin,
                other => return Err(CompileError::BadAggregator(other.to_owned())),
            };
            Ok(Statement::SelectNode { aggregator, expr })
        }
        other => Err(CompileError::UnknownStatement(other.to_owned())),
    }
}
