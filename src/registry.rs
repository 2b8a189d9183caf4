//! The process-wide property registry and the adapter that feeds it.
//!
//! The registry is append-only: a name, once registered, stays registered
//! for the life of the process and cannot be redefined. It is injected into
//! each preview as a [`PropertyRegistry`] trait object so independent
//! previews can share one instance and tests can record calls.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, error};

use crate::property::PropertyDefinition;

/// Why a registration was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// A property with this exact name already exists. Not a failure for the
    /// adapter: registration is idempotent.
    #[error("property `{0}` is already registered")]
    AlreadyRegistered(String),
    #[error("`{0}` is not a custom property name")]
    InvalidName(String),
    #[error("property `{name}` with syntax `{syntax}` needs an initial value")]
    MissingInitialValue { name: String, syntax: String },
    #[error("registration rejected: {0}")]
    Rejected(String),
}

/// The registration primitive.
pub trait PropertyRegistry {
    /// Register one definition.
    fn register(&self, definition: &PropertyDefinition) -> Result<(), RegistrationError>;

    /// Whether `name` is registered.
    fn is_registered(&self, name: &str) -> bool;
}

// ---------------------------------------------------------------------------
// In-memory registry
// ---------------------------------------------------------------------------

/// A registry held in memory, enforcing the same rules as the browser's
/// `CSS.registerProperty`:
///
/// - the name must start with `--`
/// - a syntax other than the universal `*` requires an initial value
/// - an existing name is refused with [`RegistrationError::AlreadyRegistered`]
///
/// An empty syntax is treated as `*`.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: RefCell<Vec<PropertyDefinition>>,
    by_name: RefCell<HashMap<String, usize>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// The stored definition for `name`.
    pub fn get(&self, name: &str) -> Option<PropertyDefinition> {
        let index = *self.by_name.borrow().get(name)?;
        self.entries.borrow().get(index).cloned()
    }

    /// Every registered definition, in registration order.
    pub fn definitions(&self) -> Vec<PropertyDefinition> {
        self.entries.borrow().clone()
    }
}

impl PropertyRegistry for MemoryRegistry {
    fn register(&self, definition: &PropertyDefinition) -> Result<(), RegistrationError> {
        let name = &definition.name;
        if !name.starts_with("--") || name.len() == 2 {
            return Err(RegistrationError::InvalidName(name.clone()));
        }
        let syntax = definition.syntax.trim();
        if !syntax.is_empty() && syntax != "*" && definition.initial_value.trim().is_empty() {
            return Err(RegistrationError::MissingInitialValue {
                name: name.clone(),
                syntax: syntax.to_string(),
            });
        }
        if self.by_name.borrow().contains_key(name) {
            return Err(RegistrationError::AlreadyRegistered(name.clone()));
        }

        let mut entries = self.entries.borrow_mut();
        self.by_name.borrow_mut().insert(name.clone(), entries.len());
        entries.push(definition.clone());
        Ok(())
    }

    fn is_registered(&self, name: &str) -> bool {
        self.by_name.borrow().contains_key(name)
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Outcome of [`register_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: usize,
    pub already_registered: usize,
    pub failed: usize,
}

/// Register every definition, in order.
///
/// "Already registered" is ignored. Any other failure is logged and the
/// remaining definitions are still attempted.
pub fn register_all(registry: &dyn PropertyRegistry, definitions: &[PropertyDefinition]) -> RegistrationSummary {
    let mut summary = RegistrationSummary::default();

    for definition in definitions {
        match registry.register(definition) {
            Ok(()) => summary.registered += 1,
            Err(RegistrationError::AlreadyRegistered(name)) => {
                debug!(%name, "property already registered");
                summary.already_registered += 1;
            }
            Err(err) => {
                error!(name = %definition.name, error = %err, "failed to register property");
                summary.failed += 1;
            }
        }
    }

    summary
}
