//! Error types shared across the language, compiler, evaluator, and driver.

use std::error::Error;
use std::fmt;

/// Errors produced while parsing SADL source into an AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A specific token was required but something else was found.
    Expected {
        /// Description of the expected token.
        expected: String,
        /// Text of the token actually found.
        found: String,
    },
    /// A token that cannot start an expression or statement.
    Unexpected {
        /// Where in the grammar the token appeared.
        context: &'static str,
        /// Text of the offending token.
        found: String,
    },
    /// Input ended mid-production.
    UnexpectedEnd,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, found `{found}`")
            }
            Self::Unexpected { context, found } => {
                write!(f, "unexpected token `{found}` in {context}")
            }
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
        }
    }
}

impl Error for ParseError {}

/// Errors produced while compiling an AST into an executable program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The root of the tree is not a `SearchAlgorithm` form.
    NotSearchAlgorithm(String),
    /// The algorithm has no quoted name.
    MissingName,
    /// A top-level form that is not a known component.
    UnknownComponent(String),
    /// A statement tag that is not `Condition`, `Set`, or `SelectNode`.
    UnknownStatement(String),
    /// A malformed statement (wrong child count or shape).
    Malformed {
        /// The statement tag.
        tag: String,
        /// What was wrong with it.
        detail: String,
    },
    /// `SelectNode`'s first argument is not `argmax`/`argmin`.
    BadAggregator(String),
    /// A `Define` whose default is not a numeric literal.
    BadDefine(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSearchAlgorithm(tag) => {
                write!(f, "program root must be SearchAlgorithm, found `{tag}`")
            }
            Self::MissingName => write!(f, "SearchAlgorithm has no quoted name"),
            Self::UnknownComponent(tag) => write!(f, "unknown component `{tag}`"),
            Self::UnknownStatement(tag) => write!(f, "unknown statement `{tag}`"),
            Self::Malformed { tag, detail } => write!(f, "malformed `{tag}`: {detail}"),
            Self::BadAggregator(name) => {
                write!(f, "SelectNode aggregator must be argmax or argmin, found `{name}`")
            }
            Self::BadDefine(name) => {
                write!(f, "Define `{name}` requires a numeric default")
            }
        }
    }
}

impl Error for CompileError {}

/// Errors raised while evaluating expressions against a search tree.
///
/// These are fatal to the search that raised them; in self-play the
/// offending program forfeits the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An atom that is neither a global, a node attribute, nor a number.
    Unresolved(String),
    /// `Parent` evaluated at a node with no parent.
    MissingParent,
    /// `ExternalFunction` named a function nobody registered.
    UnknownFunction(String),
    /// An operator applied to the wrong number of arguments.
    MalformedExpression(String),
    /// A condition tag that is not a known comparison or connective.
    UnknownCondition(String),
    /// An `Aggregate` op outside min/max/sum/avg.
    UnknownAggregate(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved(name) => write!(f, "unresolved expression `{name}`"),
            Self::MissingParent => write!(f, "Parent evaluated at the root"),
            Self::UnknownFunction(name) => write!(f, "unknown external function `{name}`"),
            Self::MalformedExpression(tag) => {
                write!(f, "operator `{tag}` applied to too few arguments")
            }
            Self::UnknownCondition(tag) => write!(f, "unknown condition `{tag}`"),
            Self::UnknownAggregate(op) => write!(f, "unknown aggregate op `{op}`"),
        }
    }
}

impl Error for EvalError {}

/// Errors from the best-first search driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Expression evaluation failed during the search.
    Eval(EvalError),
    /// The root position has no legal actions.
    NoLegalActions,
    /// The search finished without ever expanding the root.
    NoChildren,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eval(e) => write!(f, "evaluation failed: {e}"),
            Self::NoLegalActions => write!(f, "no legal actions at the root"),
            Self::NoChildren => write!(f, "search ended with an unexpanded root"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Eval(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EvalError> for SearchError {
    fn from(e: EvalError) -> Self {
        Self::Eval(e)
    }
}
