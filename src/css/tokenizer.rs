//! logos-based CSS tokenizer.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `url(a.png)` as [`Token::Url`] beats `url(` as Function)
//! 2. For equal length matches, earlier-defined variants win
//!
//! Our ordering ensures:
//! - `--accent` matches [`Token::CustomIdent`], never `Delim` + `Ident`
//! - `var(` matches [`Token::Function`], not `Ident` + `ParenOpen`
//! - `10deg` matches [`Token::Numeric`], not `Numeric` + `Ident`
//!
//! Comments are skipped. Input that matches no pattern becomes a
//! [`Token::Delim`] so that every non-whitespace byte of the source is covered
//! by exactly one token.

use logos::{Lexer, Logos, Skip};

use crate::css::parser::ParseError;

/// CSS token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(subpattern escape = r"\\[0-9a-fA-F]{1,6}[ ]?|\\[^0-9a-fA-F\r\n\f]")]
pub enum Token {
    /// `/* ... */`, consumed by [`block_comment`] and never emitted.
    #[token("/*", block_comment)]
    Comment,

    /// `!important` flag (whitespace allowed after the bang).
    #[regex(r"![ \t\n\r\f]*[iI][mM][pP][oO][rR][tT][aA][nN][tT]")]
    Important,

    /// At-keyword: `@property`, `@import`, `@media`.
    #[regex(r"@-?([a-zA-Z_]|[^\x00-\x7F]|(?&escape))([a-zA-Z0-9_-]|[^\x00-\x7F]|(?&escape))*")]
    AtKeyword,

    /// Hash: `#main`, `#fff`.
    #[regex(r"#([a-zA-Z0-9_-]|[^\x00-\x7F]|(?&escape))+")]
    Hash,

    /// Custom property name: `--accent`, `--a`.
    #[regex(r"--([a-zA-Z0-9_-]|[^\x00-\x7F]|(?&escape))*")]
    CustomIdent,

    /// Unquoted url: `url(a.png)`, `url(https://example.com/x)`.
    #[regex(r#"[uU][rR][lL]\([^)"'\\]*\)"#)]
    Url,

    /// Function opener: `var(`, `calc(`, `url(` before a quoted argument.
    #[regex(r"-?([a-zA-Z_]|[^\x00-\x7F]|(?&escape))([a-zA-Z0-9_-]|[^\x00-\x7F]|(?&escape))*\(")]
    Function,

    /// Identifier: property names, keywords, element names.
    #[regex(r"-?([a-zA-Z_]|[^\x00-\x7F]|(?&escape))([a-zA-Z0-9_-]|[^\x00-\x7F]|(?&escape))*")]
    Ident,

    /// Number, percentage or dimension: `0`, `-1.5`, `50%`, `10deg`.
    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)(%|-?([a-zA-Z_]|[^\x00-\x7F])([a-zA-Z0-9_-]|[^\x00-\x7F])*)?")]
    Numeric,

    /// Double-quoted string literal.
    #[regex(r#""([^"\\\r\n\f]|\\(.|\n|\r|\f))*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'([^'\\\r\n\f]|\\(.|\n|\r|\f))*'")]
    StringLiteralSingle,

    // ── Single-character punctuation ─────────────────────────────────

    /// `{`
    #[token("{")]
    BraceOpen,

    /// `}`
    #[token("}")]
    BraceClose,

    /// `(`
    #[token("(")]
    ParenOpen,

    /// `)`
    #[token(")")]
    ParenClose,

    /// `[`
    #[token("[")]
    BracketOpen,

    /// `]`
    #[token("]")]
    BracketClose,

    /// `:`
    #[token(":")]
    Colon,

    /// `;`
    #[token(";")]
    Semicolon,

    /// `,`
    #[token(",")]
    Comma,

    /// Any other single character: `>`, `+`, `.`, `*`, `/`, `=`.
    Delim,
}

/// Skip a block comment. An unterminated comment swallows the rest of the input.
fn block_comment(lex: &mut Lexer<Token>) -> Skip {
    match lex.remainder().find("*/") {
        Some(end) => lex.bump(end + 2),
        None => lex.bump(lex.remainder().len()),
    }
    Skip
}

/// A token with the byte range it covers in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    /// Byte offset where this token starts in the source.
    pub start: usize,
    /// Byte offset where this token ends in the source.
    pub end: usize,
}

impl Lexeme {
    /// The source text this token covers.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Tokenize input keeping byte spans.
///
/// Unmatched input is reported as [`Token::Delim`]. An unterminated string and
/// a backslash that starts no escape are lexing failures: serializing either
/// back out could change the meaning of the following text.
pub fn tokenize_spanned(input: &str) -> Result<Vec<Lexeme>, ParseError> {
    let mut lexemes = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        let token = match result {
            Ok(token) => token,
            Err(()) if input[span.clone()].starts_with(['"', '\'']) => {
                return Err(ParseError::UnterminatedString {
                    position: span.start,
                });
            }
            Err(()) if input[span.clone()].starts_with('\\') => {
                return Err(ParseError::StrayBackslash {
                    position: span.start,
                });
            }
            Err(()) => Token::Delim,
        };
        lexemes.push(Lexeme {
            token,
            start: span.start,
            end: span.end,
        });
    }
    Ok(lexemes)
}

/// Tokenize a CSS string into a vector of `(Token, String)` pairs.
///
/// Returns an empty vector if the input contains an unterminated string.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    tokenize_spanned(input)
        .map(|lexemes| {
            lexemes
                .into_iter()
                .map(|l| (l.token, l.text(input).to_string()))
                .collect()
        })
        .unwrap_or_default()
}
