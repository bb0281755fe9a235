//! The SADL surface language: lexer, AST, parser, pretty-printer.
//!
//! SADL is a small Lisp-like notation for search algorithms:
//!
//! ```text
//! (SearchAlgorithm "UCT"
//!   (Define C 0.6)
//!   (Selection "UCB1"
//!     (SelectNode argmax (+ valueEstimate (* C (sqrt (/ (log (Parent visitCount)) visitCount))))))
//!   ...)
//! ```
//!
//! The pipeline is `tokenize` -> `Parser` -> [`Ast`]; printing an [`Ast`]
//! with `Display` yields source that parses back to a structurally equal
//! tree, which the genetic operators rely on.

mod ast;
mod parser;
mod token;

pub use ast::{Ast, AstKind, NodeId};
pub use parser::{parse_program, Parser};
pub use token::{tokenize, Token, TokenKind};
