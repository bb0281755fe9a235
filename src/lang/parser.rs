//! Recursive-descent parser from tokens to an [`Ast`].

use crate::error::ParseError;
use crate::lang::ast::{Ast, AstKind, NodeId};
use crate::lang::token::{tokenize, Token, TokenKind};

/// Parses a full SADL program from source text.
///
/// # Errors
///
/// Returns a [`ParseError`] when the source is not a well-formed
/// `(SearchAlgorithm ...)` form.
pub fn parse_program(source: &str) -> Result<Ast, ParseError> {
    let tokens = tokenize(source);
    Parser::new(&tokens).parse()
}

/// Token-stream parser. Most callers want [`parse_program`].
#[derive(Debug)]
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a token stream (ending in a
    /// [`TokenKind::End`] sentinel, as produced by [`tokenize`]).
    #[must_use]
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parses a `(SearchAlgorithm "name" <component>*)` form.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] on any grammar violation.
    pub fn parse(&mut self) -> Result<Ast, ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let kw = self.advance();
        if kw.kind != TokenKind::Symbol || kw.text != "SearchAlgorithm" {
            return Err(ParseError::Expected {
                expected: "`SearchAlgorithm`".to_owned(),
                found: kw.text,
            });
        }
        let mut ast = Ast::new("SearchAlgorithm", AstKind::Symbol);
        let root = ast.root();

        let name = self.expect(TokenKind::Name, "a quoted algorithm name")?;
        ast.add_child(root, name.text, AstKind::Name);

        while self.peek().kind == TokenKind::LParen {
            self.parse_component(&mut ast, root)?;
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(ast)
    }

    fn parse_component(&mut self, ast: &mut Ast, root: NodeId) -> Result<(), ParseError> {
        let tag = self.lookahead_tag()?;
        match tag.as_str() {
            "Define" => self.parse_define(ast, root),
            "Selection" => self.parse_selection(ast, root),
            "Evaluation" | "Backpropagation" | "FinalMoveSelection" => {
                self.parse_statement_block(ast, root, &tag)
            }
            _ => Err(ParseError::Unexpected {
                context: "search algorithm component",
                found: tag,
            }),
        }
    }

    fn parse_define(&mut self, ast: &mut Ast, root: NodeId) -> Result<(), ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        self.advance(); // Define
        let node = ast.add_child(root, "Define", AstKind::Symbol);
        let name = self.expect(TokenKind::Symbol, "a variable name")?;
        ast.add_child(node, name.text, AstKind::Symbol);
        let value = self.expect(TokenKind::Number, "a numeric default")?;
        ast.add_child(node, value.text, AstKind::Number);
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(())
    }

    fn parse_selection(&mut self, ast: &mut Ast, root: NodeId) -> Result<(), ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        self.advance(); // Selection
        let node = ast.add_child(root, "Selection", AstKind::Symbol);
        let name = self.expect(TokenKind::Name, "a quoted selection name")?;
        ast.add_child(node, name.text, AstKind::Name);
        while self.peek().kind == TokenKind::LParen {
            self.parse_statement(ast, node)?;
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(())
    }

    fn parse_statement_block(
        &mut self,
        ast: &mut Ast,
        root: NodeId,
        tag: &str,
    ) -> Result<(), ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        self.advance(); // block tag
        let node = ast.add_child(root, tag, AstKind::Symbol);
        while self.peek().kind == TokenKind::LParen {
            self.parse_statement(ast, node)?;
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(())
    }

    fn parse_statement(&mut self, ast: &mut Ast, parent: NodeId) -> Result<(), ParseError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let tag = self.advance();
        match tag.text.as_str() {
            "Condition" => {
                let node = ast.add_child(parent, "Condition", AstKind::Symbol);
                self.parse_expression(ast, node)?;
                while self.peek().kind == TokenKind::LParen {
                    self.parse_statement(ast, node)?;
                }
            }
            "Set" => {
                let node = ast.add_child(parent, "Set", AstKind::Symbol);
                let name = self.expect(TokenKind::Symbol, "a variable name")?;
                ast.add_child(node, name.text, AstKind::Symbol);
                self.parse_expression(ast, node)?;
            }
            "SelectNode" => {
                let node = ast.add_child(parent, "SelectNode", AstKind::Symbol);
                self.parse_expression(ast, node)?;
                self.parse_expression(ast, node)?;
            }
            _ => {
                return Err(ParseError::Unexpected {
                    context: "statement",
                    found: tag.text,
                })
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(())
    }

    fn parse_expression(&mut self, ast: &mut Ast, parent: NodeId) -> Result<(), ParseError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::LParen => {
                let head = self.advance();
                if head.kind != TokenKind::Symbol {
                    return Err(ParseError::Expected {
                        expected: "an operator symbol".to_owned(),
                        found: head.text,
                    });
                }
                let node = ast.add_child(parent, head.text, AstKind::Symbol);
                while self.peek().kind != TokenKind::RParen {
                    if self.peek().kind == TokenKind::End {
                        return Err(ParseError::UnexpectedEnd);
                    }
                    self.parse_expression(ast, node)?;
                }
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(())
            }
            // `true`/`false` lex as booleans but live as plain symbols in
            // the tree; the evaluator resolves them by name.
            TokenKind::Symbol | TokenKind::Boolean => {
                ast.add_child(parent, tok.text, AstKind::Symbol);
                Ok(())
            }
            TokenKind::Number => {
                ast.add_child(parent, tok.text, AstKind::Number);
                Ok(())
            }
            TokenKind::Name => {
                ast.add_child(parent, tok.text, AstKind::Name);
                Ok(())
            }
            TokenKind::RParen => Err(ParseError::Unexpected {
                context: "expression",
                found: ")".to_owned(),
            }),
            TokenKind::End => Err(ParseError::UnexpectedEnd),
        }
    }

    fn lookahead_tag(&self) -> Result<String, ParseError> {
        self.tokens
            .get(self.pos + 1)
            .filter(|t| t.kind != TokenKind::End)
            .map(|t| t.text.clone())
            .ok_or(ParseError::UnexpectedEnd)
    }

    fn peek(&self) -> &Token {
        // tokenize always appends an End sentinel; a hand-built empty
        // slice still must not panic
        static END: Token = Token { kind: TokenKind::End, text: String::new() };
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .unwrap_or(&END)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        let tok = self.advance();
        if tok.kind == kind {
            Ok(tok)
        } else if tok.kind == TokenKind::End {
            Err(ParseError::UnexpectedEnd)
        } else {
            Err(ParseError::Expected {
                expected: what.to_owned(),
                found: tok.text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = r#"
        (SearchAlgorithm "Demo"
          (Define C 0.6)
          (Selection "UCT"
            (Condition (eq nodeType maxNode)
              (SelectNode argmax (+ valueEstimate C))))
          (Evaluation
            (Set value (ExternalFunction mctsEval)))
          (Backpropagation
            (Set valueEstimate (/ value visitCount)))
          (FinalMoveSelection
            (SelectNode argmax visitCount)))
    "#;

    #[test]
    fn parses_a_full_program() {
        let ast = parse_program(SRC).expect("parse");
        assert_eq!(ast.display_name(), "Demo");
        let tags: Vec<&str> = ast
            .children(ast.root())
            .iter()
            .map(|&c| ast.value(c))
            .collect();
        assert_eq!(
            tags,
            vec![
                "Demo",
                "Define",
                "Selection",
                "Evaluation",
                "Backpropagation",
                "FinalMoveSelection"
            ]
        );
    }

    #[test]
    fn print_then_parse_is_structurally_equal() {
        let ast = parse_program(SRC).expect("parse");
        let printed = ast.to_string();
        let again = parse_program(&printed).expect("reparse");
        assert!(ast.structurally_eq(ast.root(), &again, again.root()));
        assert_eq!(printed, again.to_string());
    }

    #[test]
    fn true_parses_as_a_symbol_atom() {
        let ast = parse_program(
            "(SearchAlgorithm \"T\" (Evaluation (Condition (eq value true) (Set proofNumber 0))))",
        )
        .expect("parse");
        let eval = ast.children(ast.root())[1];
        let cond = ast.children(eval)[0];
        let pred = ast.children(cond)[0];
        let rhs = ast.children(pred)[1];
        assert_eq!(ast.value(rhs), "true");
        assert_eq!(ast.kind(rhs), AstKind::Symbol);
    }

    #[test]
    fn rejects_unknown_components() {
        let err = parse_program("(SearchAlgorithm \"X\" (Expansion))")
            .expect_err("should fail");
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn an_empty_token_stream_is_an_error_not_a_panic() {
        let mut parser = Parser::new(&[]);
        assert!(matches!(parser.parse(), Err(ParseError::UnexpectedEnd)));
    }

    #[test]
    fn rejects_missing_name() {
        let err = parse_program("(SearchAlgorithm (Define C 1))").expect_err("should fail");
        assert!(matches!(err, ParseError::Expected { .. }));
    }
}
