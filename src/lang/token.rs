//! Lexer for SADL source text.

use std::fmt;

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// Identifier or operator symbol.
    Symbol,
    /// Double-quoted string.
    Name,
    /// Numeric literal.
    Number,
    /// `true` / `false`.
    Boolean,
    /// End of input sentinel.
    End,
}

/// A single token with its source text (quotes stripped for names).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The token's text.
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Name => write!(f, "\"{}\"", self.text),
            TokenKind::End => write!(f, "<end>"),
            _ => write!(f, "{}", self.text),
        }
    }
}

/// Splits SADL source into tokens. Lexing never fails: any character that
/// does not start a longer token becomes a one-character symbol.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push(Token::new(TokenKind::LParen, "("));
            i += 1;
        } else if c == ')' {
            tokens.push(Token::new(TokenKind::RParen, ")"));
            i += 1;
        } else if c == '"' {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != '"' {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            if i < chars.len() {
                i += 1; // closing quote
            }
            tokens.push(Token::new(TokenKind::Name, text));
        } else if c.is_ascii_digit()
            || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            if c == '-' {
                i += 1;
            }
            let mut seen_dot = false;
            while i < chars.len() {
                let d = chars[i];
                if d.is_ascii_digit() {
                    i += 1;
                } else if d == '.' && !seen_dot {
                    seen_dot = true;
                    i += 1;
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::new(TokenKind::Number, text));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_')
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let kind = if text == "true" || text == "false" {
                TokenKind::Boolean
            } else {
                TokenKind::Symbol
            };
            tokens.push(Token::new(kind, text));
        } else {
            tokens.push(Token::new(TokenKind::Symbol, c.to_string()));
            i += 1;
        }
    }

    tokens.push(Token::new(TokenKind::End, ""));
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_simple_form() {
        let toks = tokenize("(Define C 0.6)");
        assert_eq!(
            toks.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["(", "Define", "C", "0.6", ")", ""]
        );
        assert_eq!(toks[3].kind, TokenKind::Number);
    }

    #[test]
    fn minus_is_a_number_only_before_a_digit() {
        let toks = tokenize("(- visitCount -1)");
        assert_eq!(toks[1].kind, TokenKind::Symbol);
        assert_eq!(toks[1].text, "-");
        assert_eq!(toks[3].kind, TokenKind::Number);
        assert_eq!(toks[3].text, "-1");
    }

    #[test]
    fn second_dot_terminates_a_number() {
        let toks = tokenize("1.5.2");
        assert_eq!(toks[0].text, "1.5");
        // the stray dot lexes as a one-character symbol
        assert_eq!(toks[1].text, ".");
        assert_eq!(toks[2].text, "2");
    }

    #[test]
    fn booleans_have_their_own_kind() {
        assert_eq!(
            kinds("true false maybe"),
            vec![
                TokenKind::Boolean,
                TokenKind::Boolean,
                TokenKind::Symbol,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn quoted_names_strip_quotes() {
        let toks = tokenize("\"UCT variant\"");
        assert_eq!(toks[0].kind, TokenKind::Name);
        assert_eq!(toks[0].text, "UCT variant");
    }
}
