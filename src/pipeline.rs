//! One render pass, text in and artifact out.
//!
//! Stages run leaf-first and each consumes only the previous stage's output:
//! parse, extract, allocate, rewrite, sanitize. The substitution map is
//! complete before any text is touched.

use tracing::debug;

use crate::allocate::{allocate_all, IdentifierAllocator};
use crate::artifact::ExportArtifact;
use crate::css::parser::{parse_css, ParseError};
use crate::mount::MountError;
use crate::property::{extract_from, PropertyDefinition};
use crate::rewrite::{rewrite_markup, rewrite_stylesheet, MappingError, SubstitutionMap};
use crate::sanitize::{sanitize_definition, sanitize_html, sanitize_stylesheet};

/// Why a render pass produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("css parse error: {0}")]
    Css(#[from] ParseError),
    #[error("invalid substitution mapping: {0}")]
    Mapping(#[from] MappingError),
    #[error("mount failed: {0}")]
    Mount(#[from] MountError),
    #[error("preview is not attached to a host")]
    Detached,
}

/// Run the text stages of a render pass.
///
/// The returned artifact carries sanitized CSS with no `@property` blocks,
/// sanitized markup, and the definitions renamed to their substitutes.
pub fn prepare(css: &str, html: &str, allocator: &dyn IdentifierAllocator) -> Result<ExportArtifact, RenderError> {
    let mut sheet = parse_css(css)?;

    let definitions = extract_from(&sheet);
    let substitutes = allocate_all(&definitions, allocator);
    let map = SubstitutionMap::from_definitions(&definitions, &substitutes)?;

    rewrite_stylesheet(&mut sheet, &map);
    let markup = rewrite_markup(html, &map);

    sanitize_stylesheet(&mut sheet);
    let properties: Vec<PropertyDefinition> = definitions
        .iter()
        .zip(&substitutes)
        .filter_map(|(definition, substitute)| sanitize_definition(&definition.renamed(substitute.as_str())))
        .collect();

    debug!(
        declared = definitions.len(),
        registered = properties.len(),
        "prepared render pass"
    );

    Ok(ExportArtifact {
        css: sheet.to_string(),
        html: sanitize_html(&markup),
        properties,
    })
}
