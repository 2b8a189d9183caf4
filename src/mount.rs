//! Scoped rendering: isolated style scopes attached to host nodes.
//!
//! A host is any node a preview can render into. Attaching a scope to it
//! creates an isolation boundary; content set on the scope is one style
//! element followed by markup, and every [`RenderSurface::set_content`] call
//! replaces what was there.

use std::cell::RefCell;

use slotmap::{new_key_type, SlotMap};
use tracing::trace;

new_key_type! {
    /// A node a preview can attach an isolated scope to.
    pub struct HostId;
    /// An isolated rendering scope.
    pub struct ScopeId;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    #[error("host {0:?} does not exist")]
    UnknownHost(HostId),
    #[error("host {0:?} already has a scope attached")]
    ScopeAlreadyAttached(HostId),
    #[error("scope {0:?} does not exist")]
    UnknownScope(ScopeId),
}

/// The scoped-rendering primitive.
pub trait RenderSurface {
    /// Attach a new isolated scope to `host`. A host takes at most one scope.
    fn create_scope(&self, host: HostId) -> Result<ScopeId, MountError>;

    /// The scope already attached to `host`, if any.
    fn scope_of(&self, host: HostId) -> Option<ScopeId>;

    /// Replace the scope's content with one style element carrying `style`
    /// followed by `markup`.
    fn set_content(&self, scope: ScopeId, style: &str, markup: &str) -> Result<(), MountError>;
}

/// What a scope currently renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContent {
    pub style: String,
    pub markup: String,
}

impl ScopeContent {
    /// The scope's children as markup: the style element, then the content.
    pub fn to_html(&self) -> String {
        format!("<style>{}</style>{}", self.style, self.markup)
    }
}

// ---------------------------------------------------------------------------
// In-memory surface
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct HostData {
    label: String,
    scope: Option<ScopeId>,
}

#[derive(Debug)]
struct ScopeData {
    host: HostId,
    content: Option<ScopeContent>,
    /// Number of `set_content` calls.
    writes: usize,
}

#[derive(Debug, Default)]
struct SurfaceState {
    hosts: SlotMap<HostId, HostData>,
    scopes: SlotMap<ScopeId, ScopeData>,
}

/// A rendering surface held in memory, backed by slotmap arenas.
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: RefCell<SurfaceState>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host node.
    pub fn add_host(&self, label: impl Into<String>) -> HostId {
        self.state.borrow_mut().hosts.insert(HostData {
            label: label.into(),
            scope: None,
        })
    }

    /// The label a host was created with.
    pub fn host_label(&self, host: HostId) -> Option<String> {
        self.state.borrow().hosts.get(host).map(|h| h.label.clone())
    }

    /// The host a scope is attached to.
    pub fn host_of(&self, scope: ScopeId) -> Option<HostId> {
        self.state.borrow().scopes.get(scope).map(|s| s.host)
    }

    /// Current content of a scope; `None` until content is first set.
    pub fn content(&self, scope: ScopeId) -> Option<ScopeContent> {
        self.state.borrow().scopes.get(scope)?.content.clone()
    }

    /// How many times content was set on `scope`.
    pub fn writes(&self, scope: ScopeId) -> usize {
        self.state.borrow().scopes.get(scope).map_or(0, |s| s.writes)
    }

    pub fn scope_count(&self) -> usize {
        self.state.borrow().scopes.len()
    }
}

impl RenderSurface for MemorySurface {
    fn create_scope(&self, host: HostId) -> Result<ScopeId, MountError> {
        let mut state = self.state.borrow_mut();
        let existing = state.hosts.get(host).ok_or(MountError::UnknownHost(host))?.scope;
        if existing.is_some() {
            return Err(MountError::ScopeAlreadyAttached(host));
        }

        let scope = state.scopes.insert(ScopeData {
            host,
            content: None,
            writes: 0,
        });
        if let Some(data) = state.hosts.get_mut(host) {
            data.scope = Some(scope);
        }
        trace!(?host, ?scope, "attached scope");
        Ok(scope)
    }

    fn scope_of(&self, host: HostId) -> Option<ScopeId> {
        self.state.borrow().hosts.get(host)?.scope
    }

    fn set_content(&self, scope: ScopeId, style: &str, markup: &str) -> Result<(), MountError> {
        let mut state = self.state.borrow_mut();
        let data = state.scopes.get_mut(scope).ok_or(MountError::UnknownScope(scope))?;
        data.content = Some(ScopeContent {
            style: style.to_string(),
            markup: markup.to_string(),
        });
        data.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_scope_per_host() {
        let surface = MemorySurface::new();
        let host = surface.add_host("preview");
        let scope = surface.create_scope(host).unwrap();
        assert_eq!(surface.scope_of(host), Some(scope));
        assert_eq!(surface.host_of(scope), Some(host));
        assert_eq!(surface.create_scope(host), Err(MountError::ScopeAlreadyAttached(host)));
        assert_eq!(surface.scope_count(), 1);
    }

    #[test]
    fn unknown_host_and_scope() {
        let surface = MemorySurface::new();
        let other = MemorySurface::new();
        let host = other.add_host("elsewhere");
        let scope = other.create_scope(host).unwrap();
        assert_eq!(surface.create_scope(host), Err(MountError::UnknownHost(host)));
        assert_eq!(surface.set_content(scope, "", ""), Err(MountError::UnknownScope(scope)));
    }

    #[test]
    fn content_is_replaced() {
        let surface = MemorySurface::new();
        let host = surface.add_host("preview");
        let scope = surface.create_scope(host).unwrap();
        assert_eq!(surface.content(scope), None);

        surface.set_content(scope, ".a{}", "<p>1</p>").unwrap();
        surface.set_content(scope, ".b{}", "<p>2</p>").unwrap();

        let content = surface.content(scope).unwrap();
        assert_eq!(content.to_html(), "<style>.b{}</style><p>2</p>");
        assert_eq!(surface.writes(scope), 2);
    }

    #[test]
    fn host_labels() {
        let surface = MemorySurface::new();
        let host = surface.add_host("left");
        assert_eq!(surface.host_label(host).as_deref(), Some("left"));
    }
}
