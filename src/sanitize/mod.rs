//! Fail-closed sanitizers for untrusted CSS and HTML.
//!
//! Both sanitizers parse their input first. If parsing fails they log a
//! warning and return an empty string: partially cleaned output is never
//! emitted. Removing content is the sanitizer doing its job and is only
//! traced, never reported as a failure.
//!
//! Both are idempotent: sanitizing already sanitized output returns it
//! unchanged.

mod allowlist;
mod css;
mod html;

pub use css::{sanitize_css, sanitize_stylesheet, SanitizeReport};
pub use html::sanitize_html;

use tracing::debug;

use crate::css::escape::unescape;
use crate::property::PropertyDefinition;

/// Character substituted for anything outside `[A-Za-z0-9-]` in a name.
pub const PLACEHOLDER: char = '_';

/// CSS functions that make the engine fetch a resource.
const RESOURCE_FUNCTIONS: &[&str] = &["url(", "image-set(", "image(", "cross-fade(", "src("];

/// Replace every character outside ASCII letters, digits and `-` with
/// [`PLACEHOLDER`].
pub fn sanitize_property_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { PLACEHOLDER })
        .collect()
}

/// Returns `true` if `value` calls a resource function with an absolute or
/// protocol-relative target (`http:`, `https:` or a leading `//`).
///
/// The check runs on the escape-decoded, lower-cased text.
pub fn is_external_resource(value: &str) -> bool {
    let decoded = unescape(value).to_ascii_lowercase();
    RESOURCE_FUNCTIONS.iter().any(|f| decoded.contains(f)) && mentions_remote(&decoded)
}

/// Lower-cased `text` names a remote location.
fn mentions_remote(text: &str) -> bool {
    text.contains("http") || text.contains("//")
}

/// `<` followed by something that would open a tag, end tag or comment.
fn has_markup_opener(text: &str) -> bool {
    text.as_bytes()
        .windows(2)
        .any(|w| w[0] == b'<' && (w[1].is_ascii_alphabetic() || matches!(w[1], b'/' | b'!' | b'?')))
}

/// Make a definition safe to register: sanitize its name, and drop it
/// entirely if its initial value would fetch an external resource.
pub fn sanitize_definition(definition: &PropertyDefinition) -> Option<PropertyDefinition> {
    if is_external_resource(&definition.initial_value) {
        debug!(name = %definition.name, "dropping property with external initial value");
        return None;
    }
    Some(definition.renamed(sanitize_property_name(&definition.name)))
}
