//! CSS sanitizer.

use tracing::{trace, warn};

use super::{has_markup_opener, is_external_resource, mentions_remote};
use crate::css::escape::unescape;
use crate::css::model::{Declaration, Node, Stylesheet};
use crate::css::parser::parse_css;

/// Properties that load a resource from their value alone.
const FETCHING_PROPERTIES: &[&str] = &["src", "background-image"];

/// What [`sanitize_stylesheet`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub imports: usize,
    pub property_blocks: usize,
    pub declarations: usize,
    /// Nodes dropped because their text could open or close an HTML tag.
    pub markup: usize,
}

impl SanitizeReport {
    /// Total number of removed nodes.
    pub fn total(&self) -> usize {
        self.imports + self.property_blocks + self.declarations + self.markup
    }
}

/// Parse, sanitize and re-serialize `css`.
///
/// Returns an empty string if `css` does not parse.
pub fn sanitize_css(css: &str) -> String {
    match parse_css(css) {
        Ok(mut sheet) => {
            sanitize_stylesheet(&mut sheet);
            sheet.to_string()
        }
        Err(err) => {
            warn!(error = %err, "css failed to parse; sanitized output is empty");
            String::new()
        }
    }
}

/// Sanitize a parsed stylesheet in place.
///
/// Removes at any depth:
/// - every `@import` rule
/// - every `@property` block (registration only happens through the
///   controlled extraction path)
/// - every declaration whose value fetches an absolute or protocol-relative
///   resource
/// - `src` and `background-image` declarations that mention a remote location
///   in any form
/// - every declaration, rule or at-rule whose own text contains `<` followed
///   by a letter, `/`, `!` or `?` (the output is written into a `<style>`
///   element, where `</style>` would end it); a removed rule takes its body
pub fn sanitize_stylesheet(sheet: &mut Stylesheet) -> SanitizeReport {
    let report = SanitizeReport {
        imports: sheet.remove_at_rules("import"),
        property_blocks: sheet.remove_at_rules("property"),
        declarations: sheet.retain_declarations(&mut |decl| !is_blocked(decl)),
        markup: sheet.retain_nodes(&mut |node| !has_markup(node)),
    };
    if report.total() > 0 {
        trace!(
            imports = report.imports,
            property_blocks = report.property_blocks,
            declarations = report.declarations,
            markup = report.markup,
            "css sanitizer removed nodes"
        );
    }
    report
}

fn has_markup(node: &Node) -> bool {
    match node {
        Node::Declaration(decl) => has_markup_opener(&decl.property) || has_markup_opener(&decl.value),
        Node::Rule(rule) => has_markup_opener(&rule.selector),
        Node::AtRule(at) => has_markup_opener(&at.name) || has_markup_opener(&at.params),
    }
}

fn is_blocked(decl: &Declaration) -> bool {
    if is_external_resource(&decl.value) {
        return true;
    }
    FETCHING_PROPERTIES.iter().any(|p| decl.is_property(p))
        && mentions_remote(&unescape(&decl.value).to_ascii_lowercase())
}
