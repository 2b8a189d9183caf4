//! Recursive descent CSS parser.
//!
//! Parses CSS text into a [`Stylesheet`] rule tree. Uses the logos-based
//! tokenizer from [`crate::css::tokenizer`].
//!
//! Each entry in a node list is classified by looking ahead to the first `{`,
//! `;` or `}` outside parentheses: a `{` opens a rule (or an at-rule block),
//! anything else ends a declaration. The parser is strict about structure:
//! unbalanced braces and declarations without a colon are errors.

use std::ops::Range;

use crate::css::model::*;
use crate::css::tokenizer::{tokenize_spanned, Lexeme, Token};

/// Errors from CSS parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at byte {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("unterminated string starting at byte {position}")]
    UnterminatedString { position: usize },
    /// A `\` that does not start an escape, e.g. before a newline.
    #[error("stray backslash at byte {position}")]
    StrayBackslash { position: usize },
}

/// Parse a CSS string into a [`Stylesheet`].
pub fn parse_css(input: &str) -> Result<Stylesheet, ParseError> {
    let tokens = tokenize_spanned(input)?;
    let mut parser = Parser {
        source: input,
        tokens,
        cursor: 0,
    };
    let nodes = parser.parse_nodes(false)?;
    Ok(Stylesheet { nodes })
}

/// Join the source text of `tokens`, collapsing every gap between two tokens
/// (whitespace or comments) into a single space.
pub(crate) fn join_tokens(source: &str, tokens: &[Lexeme]) -> String {
    let mut out = String::new();
    let mut prev_end: Option<usize> = None;
    for tok in tokens {
        if prev_end.is_some_and(|end| tok.start > end) {
            out.push(' ');
        }
        out.push_str(tok.text(source));
        prev_end = Some(tok.end);
    }
    out
}

/// Recursive descent parser state.
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Lexeme>,
    cursor: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Lexeme> {
        self.tokens.get(self.cursor)
    }

    fn text(&self, range: Range<usize>) -> String {
        join_tokens(self.source, &self.tokens[range])
    }

    fn unexpected(&self, index: usize, message: impl Into<String>) -> ParseError {
        ParseError::UnexpectedToken {
            position: self.tokens[index].start,
            message: message.into(),
        }
    }

    /// Find the index of the first `{`, `;` or `}` at nesting depth zero,
    /// starting at the cursor. Returns `tokens.len()` at end of input.
    fn scan_statement_end(&self) -> usize {
        let mut depth = 0usize;
        for (i, lexeme) in self.tokens.iter().enumerate().skip(self.cursor) {
            match lexeme.token {
                Token::Function | Token::ParenOpen | Token::BracketOpen => depth += 1,
                Token::ParenClose | Token::BracketClose => depth = depth.saturating_sub(1),
                Token::BraceOpen | Token::Semicolon | Token::BraceClose if depth == 0 => {
                    return i;
                }
                _ => {}
            }
        }
        self.tokens.len()
    }

    fn token_at(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).map(|l| l.token)
    }

    /// Parse a node list. When `nested`, the list ends at (and consumes) the
    /// closing `}`; otherwise it ends at end of input.
    fn parse_nodes(&mut self, nested: bool) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        loop {
            match self.peek().map(|l| l.token) {
                None if nested => {
                    return Err(ParseError::UnexpectedEof("expected '}'".into()));
                }
                None => return Ok(nodes),
                Some(Token::BraceClose) if nested => {
                    self.cursor += 1;
                    return Ok(nodes);
                }
                Some(Token::BraceClose) => {
                    return Err(self.unexpected(self.cursor, "unmatched '}'"));
                }
                Some(Token::Semicolon) => {
                    self.cursor += 1;
                }
                Some(Token::AtKeyword) => {
                    nodes.push(Node::AtRule(self.parse_at_rule()?));
                }
                Some(_) => {
                    nodes.push(self.parse_rule_or_declaration()?);
                }
            }
        }
    }

    /// Parse `@name params;` or `@name params { ... }`.
    fn parse_at_rule(&mut self) -> Result<AtRule, ParseError> {
        let keyword = self.tokens[self.cursor];
        let name = keyword.text(self.source)[1..].to_string();
        self.cursor += 1;

        let end = self.scan_statement_end();
        let params = self.text(self.cursor..end);

        let nodes = match self.token_at(end) {
            Some(Token::BraceOpen) => {
                self.cursor = end + 1;
                Some(self.parse_nodes(true)?)
            }
            Some(Token::Semicolon) => {
                self.cursor = end + 1;
                None
            }
            // `}` belongs to the enclosing block.
            _ => {
                self.cursor = end;
                None
            }
        };

        Ok(AtRule {
            name,
            params,
            nodes,
        })
    }

    /// Parse either `selector { ... }` or `property: value [!important]`.
    fn parse_rule_or_declaration(&mut self) -> Result<Node, ParseError> {
        let start = self.cursor;
        let end = self.scan_statement_end();

        if self.token_at(end) == Some(Token::BraceOpen) {
            let selector = self.text(start..end);
            if selector.is_empty() {
                return Err(self.unexpected(end, "expected selector before '{'"));
            }
            self.cursor = end + 1;
            let nodes = self.parse_nodes(true)?;
            return Ok(Node::Rule(Rule { selector, nodes }));
        }

        let declaration = self.parse_declaration(start, end)?;
        self.cursor = match self.token_at(end) {
            Some(Token::Semicolon) => end + 1,
            _ => end,
        };
        Ok(Node::Declaration(declaration))
    }

    /// Parse the tokens in `start..end` as a single declaration.
    fn parse_declaration(&self, start: usize, end: usize) -> Result<Declaration, ParseError> {
        let colon = (start..end)
            .find(|&i| self.tokens[i].token == Token::Colon)
            .ok_or_else(|| self.unexpected(start, "expected ':' in declaration"))?;

        let property = self.text(start..colon);
        if property.is_empty() {
            return Err(self.unexpected(colon, "expected property name"));
        }

        let mut value_end = end;
        let important = value_end > colon + 1 && self.tokens[value_end - 1].token == Token::Important;
        if important {
            value_end -= 1;
        }
        let value = self.text(colon + 1..value_end);

        Ok(Declaration {
            property,
            value,
            important,
        })
    }
}
