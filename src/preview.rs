//! Preview instances: configuration, lifecycle and the two render paths.
//!
//! A [`Preview`] moves through three states:
//!
//! ```text
//! Uninitialized --attach--> Initialized --first render--> Active --render--> Active
//! ```
//!
//! The isolated scope is created lazily on the first render and reused by
//! every later one, whose content replaces the previous content.
//!
//! Two paths share the registry and mount steps:
//! - [`Preview::render`] runs the whole pipeline on raw author input and
//!   returns the artifact for export.
//! - [`Preview::show`] registers and mounts an already prepared artifact,
//!   e.g. one obtained through [`crate::artifact::import_json`].

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::allocate::{AllocationStrategy, IdentifierAllocator};
use crate::artifact::ExportArtifact;
use crate::mount::{HostId, MountError, RenderSurface, ScopeId};
use crate::pipeline::{prepare, RenderError};
use crate::registry::{register_all, PropertyRegistry, RegistrationSummary};

// ---------------------------------------------------------------------------
// PreviewConfig
// ---------------------------------------------------------------------------

/// Configuration for a preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreviewConfig {
    /// How substitute names are minted.
    pub allocation: AllocationStrategy,
    /// Append a readable form of the original name to substitutes.
    pub debug_names: bool,
}

impl PreviewConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the allocation strategy (builder).
    pub fn with_allocation(mut self, allocation: AllocationStrategy) -> Self {
        self.allocation = allocation;
        self
    }

    /// Enable or disable debug names (builder).
    pub fn with_debug_names(mut self, debug_names: bool) -> Self {
        self.debug_names = debug_names;
        self
    }
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

/// Lifecycle state of a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Uninitialized,
    /// A host is known but no scope is attached yet.
    Initialized { host: HostId },
    /// A scope is attached and has content.
    Active { host: HostId, scope: ScopeId },
}

/// One preview instance.
pub struct Preview {
    config: PreviewConfig,
    allocator: Box<dyn IdentifierAllocator>,
    registry: Rc<dyn PropertyRegistry>,
    surface: Rc<dyn RenderSurface>,
    state: PreviewState,
}

impl Preview {
    /// Create a detached preview. The registry and surface may be shared with
    /// other previews.
    pub fn new(config: PreviewConfig, registry: Rc<dyn PropertyRegistry>, surface: Rc<dyn RenderSurface>) -> Self {
        Self {
            allocator: config.allocation.allocator(config.debug_names),
            config,
            registry,
            surface,
            state: PreviewState::Uninitialized,
        }
    }

    /// Replace the allocator chosen by the config (builder).
    pub fn with_allocator(mut self, allocator: Box<dyn IdentifierAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    /// The attached scope, once the preview is active.
    pub fn scope(&self) -> Option<ScopeId> {
        match self.state {
            PreviewState::Active { scope, .. } => Some(scope),
            _ => None,
        }
    }

    /// Point the preview at a host node. Attaching to the host it already
    /// renders into keeps the current scope.
    pub fn attach(&mut self, host: HostId) {
        self.state = match self.state {
            PreviewState::Active { host: current, scope } if current == host => {
                PreviewState::Active { host, scope }
            }
            _ => PreviewState::Initialized { host },
        };
    }

    /// Run the full pipeline on author input, register the renamed
    /// definitions and mount the result.
    ///
    /// On error nothing is registered or mounted and the previous content
    /// stays in place.
    pub fn render(&mut self, css: &str, html: &str) -> Result<ExportArtifact, RenderError> {
        if self.state == PreviewState::Uninitialized {
            return Err(RenderError::Detached);
        }

        let artifact = prepare(css, html, self.allocator.as_ref()).inspect_err(|err| {
            warn!(error = %err, "render pass produced nothing");
        })?;

        self.register(&artifact);
        self.mount(&artifact.css, &artifact.html)?;
        Ok(artifact)
    }

    /// Register and mount a prepared artifact as is.
    pub fn show(&mut self, artifact: &ExportArtifact) -> Result<(), RenderError> {
        if self.state == PreviewState::Uninitialized {
            return Err(RenderError::Detached);
        }
        self.register(artifact);
        self.mount(&artifact.css, &artifact.html)
    }

    fn register(&self, artifact: &ExportArtifact) -> RegistrationSummary {
        let summary = register_all(self.registry.as_ref(), &artifact.properties);
        debug!(
            registered = summary.registered,
            already_registered = summary.already_registered,
            failed = summary.failed,
            "registered properties"
        );
        summary
    }

    fn mount(&mut self, style: &str, markup: &str) -> Result<(), RenderError> {
        let (host, scope) = match self.state {
            PreviewState::Uninitialized => return Err(RenderError::Detached),
            PreviewState::Active { host, scope } => (host, scope),
            PreviewState::Initialized { host } => (host, self.attach_scope(host)?),
        };
        self.surface.set_content(scope, style, markup)?;
        self.state = PreviewState::Active { host, scope };
        Ok(())
    }

    /// Create the scope, or adopt the one another preview left on the host.
    fn attach_scope(&self, host: HostId) -> Result<ScopeId, MountError> {
        match self.surface.create_scope(host) {
            Err(MountError::ScopeAlreadyAttached(_)) => {
                debug!(?host, "host already has a scope; reusing it");
                self.surface.scope_of(host).ok_or(MountError::ScopeAlreadyAttached(host))
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MemorySurface;
    use crate::registry::MemoryRegistry;
    use pretty_assertions::assert_eq;

    fn setup() -> (Rc<MemoryRegistry>, Rc<MemorySurface>, Preview) {
        let registry = Rc::new(MemoryRegistry::new());
        let surface = Rc::new(MemorySurface::new());
        let preview = Preview::new(PreviewConfig::default(), registry.clone(), surface.clone());
        (registry, surface, preview)
    }

    #[test]
    fn config_builder_and_serde_defaults() {
        let config = PreviewConfig::new()
            .with_allocation(AllocationStrategy::Random)
            .with_debug_names(true);
        assert_eq!(config.allocation, AllocationStrategy::Random);
        assert!(config.debug_names);

        let parsed: PreviewConfig = serde_json::from_str(r#"{"debugNames": true}"#).unwrap();
        assert_eq!(parsed, PreviewConfig::new().with_debug_names(true));
        let parsed: PreviewConfig = serde_json::from_str(r#"{"allocation": "random"}"#).unwrap();
        assert_eq!(parsed.allocation, AllocationStrategy::Random);
    }

    #[test]
    fn render_before_attach_is_detached() {
        let (registry, _, mut preview) = setup();
        assert_eq!(preview.render(".a{}", ""), Err(RenderError::Detached));
        assert!(registry.is_empty());
    }

    #[test]
    fn lifecycle_transitions() {
        let (_, surface, mut preview) = setup();
        let host = surface.add_host("preview");
        assert_eq!(preview.state(), PreviewState::Uninitialized);

        preview.attach(host);
        assert_eq!(preview.state(), PreviewState::Initialized { host });
        assert_eq!(surface.scope_count(), 0);

        preview.render(".a{top:0}", "<p>1</p>").unwrap();
        let scope = preview.scope().unwrap();
        assert_eq!(preview.state(), PreviewState::Active { host, scope });

        preview.render(".a{top:1px}", "<p>2</p>").unwrap();
        assert_eq!(preview.scope(), Some(scope));
        assert_eq!(surface.scope_count(), 1);
        assert_eq!(surface.content(scope).unwrap().markup, "<p>2</p>");
    }

    #[test]
    fn failed_render_keeps_previous_content() {
        let (_, surface, mut preview) = setup();
        let host = surface.add_host("preview");
        preview.attach(host);
        preview.render(".a{top:0}", "<p>ok</p>").unwrap();

        assert!(matches!(preview.render(".a{", "<p>new</p>"), Err(RenderError::Css(_))));
        let scope = preview.scope().unwrap();
        assert_eq!(surface.content(scope).unwrap().markup, "<p>ok</p>");
        assert_eq!(surface.writes(scope), 1);
    }

    #[test]
    fn content_addressed_rerender_reuses_registration() {
        let (registry, surface, mut preview) = setup();
        preview.attach(surface.add_host("preview"));
        let css = "@property --a { syntax: '<angle>'; inherits: false; initial-value: 0deg }";
        let first = preview.render(css, "").unwrap();
        let second = preview.render(css, "").unwrap();
        assert_eq!(first.properties, second.properties);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn random_rerender_grows_registry() {
        let registry = Rc::new(MemoryRegistry::new());
        let surface = Rc::new(MemorySurface::new());
        let mut preview = Preview::new(
            PreviewConfig::new().with_allocation(AllocationStrategy::Random),
            registry.clone(),
            surface.clone(),
        );
        preview.attach(surface.add_host("preview"));
        let css = "@property --a { syntax: '<angle>'; inherits: false; initial-value: 0deg }";
        preview.render(css, "").unwrap();
        preview.render(css, "").unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn show_mounts_artifact_without_rewriting() {
        let (registry, surface, mut preview) = setup();
        preview.attach(surface.add_host("viewer"));
        let artifact = ExportArtifact {
            css: ".a{color:var(--p1)}".into(),
            html: "<p class=\"a\">x</p>".into(),
            properties: vec![crate::property::PropertyDefinition::new("--p1")],
        };
        preview.show(&artifact).unwrap();
        preview.show(&artifact).unwrap();

        let content = surface.content(preview.scope().unwrap()).unwrap();
        assert_eq!(content.style, ".a{color:var(--p1)}");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn second_preview_on_same_host_adopts_scope() {
        let registry = Rc::new(MemoryRegistry::new());
        let surface = Rc::new(MemorySurface::new());
        let host = surface.add_host("shared");

        let mut first = Preview::new(PreviewConfig::default(), registry.clone(), surface.clone());
        let mut second = Preview::new(PreviewConfig::default(), registry.clone(), surface.clone());
        first.attach(host);
        second.attach(host);
        first.render("", "<p>1</p>").unwrap();
        second.render("", "<p>2</p>").unwrap();

        assert_eq!(first.scope(), second.scope());
        assert_eq!(surface.scope_count(), 1);
    }
}
