//! CSS engine: tokenizer, rule tree, parser, escape decoding.

pub mod escape;
pub mod model;
pub mod parser;
pub mod tokenizer;

pub use model::{AtRule, Declaration, Node, Rule, Stylesheet};
pub use parser::{parse_css, ParseError};
