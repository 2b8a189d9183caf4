//! Substitute identifier allocation.
//!
//! Every declared property is registered under a substitute name instead of
//! the author's name, because the property registry is shared by every
//! preview in the process and never forgets a name. Two strategies:
//!
//! - [`ContentAddressedAllocator`] (default): `--p` followed by 128 bits of a
//!   SHA-256 digest over a secret key and the full definition. Identical
//!   definitions share one registry entry across renders and previews;
//!   different definitions never meet in practice. The key is drawn once per
//!   process, so a name cannot be computed ahead of time from outside it.
//! - [`RandomAllocator`]: a fresh v4 UUID (122 random bits) per call, so the
//!   registry grows on every render.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::property::PropertyDefinition;
use crate::sanitize::sanitize_property_name;

/// Key shared by every default [`ContentAddressedAllocator`] in this process.
static PROCESS_KEY: LazyLock<[u8; 16]> = LazyLock::new(|| *Uuid::new_v4().as_bytes());

/// Mints substitute names for property definitions.
pub trait IdentifierAllocator {
    /// Produce a valid custom-property name to register `definition` under.
    fn allocate(&self, definition: &PropertyDefinition) -> String;
}

/// Which allocator a preview uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationStrategy {
    #[default]
    ContentAddressed,
    Random,
}

impl AllocationStrategy {
    /// Build the allocator for this strategy.
    pub fn allocator(self, debug_names: bool) -> Box<dyn IdentifierAllocator> {
        match self {
            AllocationStrategy::ContentAddressed => Box::new(ContentAddressedAllocator::new(debug_names)),
            AllocationStrategy::Random => Box::new(RandomAllocator { debug_names }),
        }
    }
}

/// Derives the substitute from a keyed digest of the whole definition.
#[derive(Debug, Clone, Copy)]
pub struct ContentAddressedAllocator {
    /// Append the sanitized original name for readability.
    pub debug_names: bool,
    key: [u8; 16],
}

impl ContentAddressedAllocator {
    /// An allocator using the process-wide key.
    pub fn new(debug_names: bool) -> Self {
        Self {
            debug_names,
            key: *PROCESS_KEY,
        }
    }

    /// Use `key` instead of the process-wide key (builder). Allocators with
    /// the same key mint the same names.
    pub fn with_key(mut self, key: [u8; 16]) -> Self {
        self.key = key;
        self
    }
}

impl Default for ContentAddressedAllocator {
    fn default() -> Self {
        Self::new(false)
    }
}

impl IdentifierAllocator for ContentAddressedAllocator {
    fn allocate(&self, definition: &PropertyDefinition) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        for field in [
            definition.name.as_str(),
            definition.syntax.as_str(),
            if definition.inherits { "true" } else { "false" },
            definition.initial_value.as_str(),
        ] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        let digest = format!("{:x}", hasher.finalize());

        let mut name = format!("--p{}", &digest[..32]);
        if self.debug_names {
            let original = sanitize_property_name(definition.name.trim_start_matches('-'));
            if !original.is_empty() {
                name.push('-');
                name.push_str(&original);
            }
        }
        name
    }
}

/// Mints a fresh random substitute on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAllocator {
    /// Append name, initial value, syntax and inherits for readability.
    pub debug_names: bool,
}

impl IdentifierAllocator for RandomAllocator {
    fn allocate(&self, definition: &PropertyDefinition) -> String {
        let token = Uuid::new_v4();
        if !self.debug_names {
            return format!("--{token}");
        }
        sanitize_property_name(&format!(
            "--{token}-{}-{}-{}-{}",
            definition.name, definition.initial_value, definition.syntax, definition.inherits
        ))
    }
}

/// Allocate one substitute per definition, in order. The full list is
/// computed before any text is rewritten.
pub fn allocate_all(definitions: &[PropertyDefinition], allocator: &dyn IdentifierAllocator) -> Vec<String> {
    definitions.iter().map(|d| allocator.allocate(d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angle() -> PropertyDefinition {
        PropertyDefinition::new("--a")
            .with_syntax("<angle>")
            .with_initial_value("10deg")
    }

    fn is_valid_name(name: &str) -> bool {
        name.starts_with("--")
            && name.len() > 2
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn content_addressed_is_stable() {
        let alloc = ContentAddressedAllocator::default();
        assert_eq!(alloc.allocate(&angle()), alloc.allocate(&angle()));
        assert!(is_valid_name(&alloc.allocate(&angle())));
        assert_eq!(alloc.allocate(&angle()).len(), 2 + 1 + 32);
    }

    #[test]
    fn content_addressed_depends_on_every_field() {
        let alloc = ContentAddressedAllocator::default();
        let base = alloc.allocate(&angle());
        assert_ne!(base, alloc.allocate(&angle().renamed("--b")));
        assert_ne!(base, alloc.allocate(&angle().with_syntax("<length>")));
        assert_ne!(base, alloc.allocate(&angle().with_inherits(true)));
        assert_ne!(base, alloc.allocate(&angle().with_initial_value("20deg")));
    }

    #[test]
    fn content_addressed_fields_do_not_run_together() {
        let alloc = ContentAddressedAllocator::default();
        let a = PropertyDefinition::new("--a").with_syntax("b");
        let b = PropertyDefinition::new("--ab");
        assert_ne!(alloc.allocate(&a), alloc.allocate(&b));
    }

    #[test]
    fn content_addressed_is_keyed() {
        let key = [7u8; 16];
        let a = ContentAddressedAllocator::default().with_key(key);
        let b = ContentAddressedAllocator::new(false).with_key(key);
        assert_eq!(a.allocate(&angle()), b.allocate(&angle()));
        assert_ne!(
            a.allocate(&angle()),
            ContentAddressedAllocator::default().with_key([8u8; 16]).allocate(&angle())
        );
        // Default allocators in one process agree with each other.
        assert_eq!(
            ContentAddressedAllocator::default().allocate(&angle()),
            AllocationStrategy::ContentAddressed.allocator(false).allocate(&angle())
        );
    }

    #[test]
    fn content_addressed_debug_suffix() {
        let alloc = ContentAddressedAllocator::new(true);
        let name = alloc.allocate(&PropertyDefinition::new("--my.prop"));
        assert!(name.ends_with("-my_prop"), "{name}");
        assert!(is_valid_name(&name));
    }

    #[test]
    fn random_is_fresh_each_call() {
        let alloc = RandomAllocator::default();
        let first = alloc.allocate(&angle());
        let second = alloc.allocate(&angle());
        assert_ne!(first, second);
        assert!(is_valid_name(&first));
    }

    #[test]
    fn random_debug_layout_is_sanitized() {
        let alloc = RandomAllocator { debug_names: true };
        let name = alloc.allocate(&angle());
        assert!(name.ends_with("---a-10deg-_angle_-false"), "{name}");
        assert!(is_valid_name(&name));
    }

    #[test]
    fn allocate_all_is_one_per_definition() {
        let defs = vec![angle(), angle().renamed("--b")];
        let subs = allocate_all(&defs, &ContentAddressedAllocator::default());
        assert_eq!(subs.len(), 2);
        assert_ne!(subs[0], subs[1]);
    }

    #[test]
    fn strategy_builds_matching_allocator() {
        let alloc = AllocationStrategy::ContentAddressed.allocator(false);
        assert!(alloc.allocate(&angle()).starts_with("--p"));
        let alloc = AllocationStrategy::Random.allocator(false);
        // `--` plus a hyphenated UUID.
        assert_eq!(alloc.allocate(&angle()).len(), 2 + 36);
    }
}
