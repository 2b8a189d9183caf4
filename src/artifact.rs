//! The export artifact and its validating import.
//!
//! An artifact is the result of one render pass: sanitized CSS, sanitized
//! markup and the renamed property definitions. It travels as JSON:
//!
//! ```json
//! { "css": "...", "html": "...",
//!   "properties": [ { "name": "--p…", "syntax": "<angle>", "inherits": false, "initialValue": "10deg" } ] }
//! ```
//!
//! Imported data is untrusted. [`validate`] checks its shape field by field
//! and reports the first violation as a specific [`ValidationError`];
//! [`import_value`] additionally runs everything through the sanitizers
//! again before it can be rendered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::property::PropertyDefinition;
use crate::sanitize::{sanitize_css, sanitize_definition, sanitize_html};

/// Serializable result of a render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub css: String,
    pub html: String,
    pub properties: Vec<PropertyDefinition>,
}

impl ExportArtifact {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// A copy with both texts and every definition sanitized again.
    /// Definitions whose initial value fetches a resource are dropped.
    pub fn sanitized(&self) -> Self {
        Self {
            css: sanitize_css(&self.css),
            html: sanitize_html(&self.html),
            properties: self.properties.iter().filter_map(sanitize_definition).collect(),
        }
    }
}

/// Why imported data is not an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("artifact must be an object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("artifact is missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("artifact field `{field}` must be {expected}, found {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("property {index} must be an object, found {found}")]
    PropertyNotAnObject { index: usize, found: &'static str },
    #[error("property {index} is missing required field `{field}`")]
    PropertyMissingField { index: usize, field: &'static str },
    #[error("property {index} field `{field}` must be {expected}, found {found}")]
    PropertyTypeMismatch {
        index: usize,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// JSON type name for error messages.
fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const PROPERTY_FIELDS: [(&str, &str); 4] = [
    ("name", "string"),
    ("syntax", "string"),
    ("inherits", "boolean"),
    ("initialValue", "string"),
];

/// Check that `value` has the artifact's shape.
///
/// Order of checks: object; `css`, `html` and `properties` present; `html`
/// and `css` are strings; `properties` is an array; then each property is an
/// object with all four fields of the right types.
pub fn validate(value: &Value) -> Result<(), ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject { found: kind(value) })?;

    for field in ["css", "html", "properties"] {
        if !object.contains_key(field) {
            return Err(ValidationError::MissingField { field });
        }
    }

    for field in ["html", "css"] {
        let found = &object[field];
        if !found.is_string() {
            return Err(ValidationError::TypeMismatch {
                field,
                expected: "string",
                found: kind(found),
            });
        }
    }

    let properties = match &object["properties"] {
        Value::Array(items) => items,
        other => {
            return Err(ValidationError::TypeMismatch {
                field: "properties",
                expected: "array",
                found: kind(other),
            })
        }
    };

    for (index, item) in properties.iter().enumerate() {
        let property = item.as_object().ok_or(ValidationError::PropertyNotAnObject {
            index,
            found: kind(item),
        })?;
        for (field, _) in PROPERTY_FIELDS {
            if !property.contains_key(field) {
                return Err(ValidationError::PropertyMissingField { index, field });
            }
        }
        for (field, expected) in PROPERTY_FIELDS {
            let found = &property[field];
            let ok = match expected {
                "boolean" => found.is_boolean(),
                _ => found.is_string(),
            };
            if !ok {
                return Err(ValidationError::PropertyTypeMismatch {
                    index,
                    field,
                    expected,
                    found: kind(found),
                });
            }
        }
    }

    Ok(())
}

/// Validate untrusted data and turn it into a sanitized artifact.
pub fn import_value(value: Value) -> Result<ExportArtifact, ValidationError> {
    validate(&value)?;
    let artifact: ExportArtifact = serde_json::from_value(value)?;
    Ok(artifact.sanitized())
}

/// Parse, validate and sanitize an artifact from JSON text.
pub fn import_json(json: &str) -> Result<ExportArtifact, ValidationError> {
    import_value(serde_json::from_str(json)?)
}
