//! HTML scanning: a strict tokenizer and character reference helpers.

pub mod entities;
pub mod tokenizer;

pub use tokenizer::{tokenize_html, Attribute, HtmlParseError, HtmlToken, StartTag};
