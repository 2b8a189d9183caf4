//! Registered custom property definitions and their extraction from CSS.
//!
//! A definition is read from every `@property <name> { ... }` block whose
//! prelude is a single custom-property name. Browsers ignore any other
//! `@property` block, and so does the extractor (the block is still removed
//! later with the rest). Only the `syntax`, `inherits` and `initial-value`
//! descriptors are recognised; any other descriptor is ignored and a missing
//! one keeps its default.

use serde::{Deserialize, Serialize};

use crate::css::model::{Node, Stylesheet};
use crate::css::parser::{parse_css, ParseError};
use crate::css::tokenizer::{tokenize_spanned, Token};

/// A typed custom property, as declared by `@property` and as handed to the
/// property registry.
///
/// Serializes with the contractual field names `name`, `syntax`, `inherits`
/// and `initialValue`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    pub syntax: String,
    pub inherits: bool,
    pub initial_value: String,
}

impl PropertyDefinition {
    /// Create a definition with default descriptors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the syntax descriptor (builder).
    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = syntax.into();
        self
    }

    /// Set the inherits flag (builder).
    pub fn with_inherits(mut self, inherits: bool) -> Self {
        self.inherits = inherits;
        self
    }

    /// Set the initial value (builder).
    pub fn with_initial_value(mut self, initial_value: impl Into<String>) -> Self {
        self.initial_value = initial_value.into();
        self
    }

    /// Clone this definition under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Parse `css` and extract every declared property in source order.
pub fn extract(css: &str) -> Result<Vec<PropertyDefinition>, ParseError> {
    Ok(extract_from(&parse_css(css)?))
}

/// Extract every declared property from a parsed stylesheet, in source order.
///
/// Repeated declarations of the same name each yield an entry.
pub fn extract_from(sheet: &Stylesheet) -> Vec<PropertyDefinition> {
    let mut properties = Vec::new();

    sheet.walk_at_rules("property", &mut |rule| {
        if !is_custom_property_name(&rule.params) {
            return;
        }
        let mut property = PropertyDefinition::new(rule.params.clone());
        for node in rule.nodes.iter().flatten() {
            let Node::Declaration(decl) = node else {
                continue;
            };
            match decl.property.as_str() {
                // Syntax should always be quoted; drop the quotes.
                "syntax" => property.syntax = decl.value.replace(['"', '\''], ""),
                "inherits" => property.inherits = decl.value == "true",
                "initial-value" => property.initial_value = decl.value.clone(),
                _ => {}
            }
        }
        properties.push(property);
    });

    properties
}

/// `text` is exactly one `--name` token.
fn is_custom_property_name(text: &str) -> bool {
    matches!(
        tokenize_spanned(text).as_deref(),
        Ok([lexeme]) if lexeme.token == Token::CustomIdent && lexeme.end - lexeme.start > 2
    )
}
