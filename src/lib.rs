//! # scoped-preview
//!
//! Isolated previews of untrusted CSS+HTML snippets that declare typed custom
//! properties with `@property`.
//!
//! Registered custom properties live in one process-wide registry that never
//! forgets a name. Every declared property is therefore renamed to a
//! collision-free substitute, every reference to it is rewritten in both the
//! stylesheet and the markup, and both texts are sanitized before anything is
//! registered or mounted.
//!
//! ## Core Systems
//!
//! - **[`css`]**: logos tokenizer, rule tree with in-place edits, strict parser
//! - **[`html`]**: strict HTML tokenizer and character references
//! - **[`property`]**: `PropertyDefinition` and the `@property` extractor
//! - **[`allocate`]**: content-addressed and random substitute names
//! - **[`rewrite`]**: whole-token rewriting of CSS and markup from one map
//! - **[`sanitize`]**: fail-closed CSS and HTML sanitizers
//! - **[`registry`]**: the registration primitive and idempotent adapter
//! - **[`mount`]**: isolated scopes on host nodes, slotmap-backed
//! - **[`artifact`]**: export artifact and validating import
//! - **[`pipeline`]**: one render pass from raw text to artifact
//! - **[`preview`]**: preview instances, config, creator and viewer paths
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use scoped_preview::mount::MemorySurface;
//! use scoped_preview::preview::{Preview, PreviewConfig};
//! use scoped_preview::registry::MemoryRegistry;
//!
//! let registry = Rc::new(MemoryRegistry::new());
//! let surface = Rc::new(MemorySurface::new());
//! let mut preview = Preview::new(PreviewConfig::default(), registry.clone(), surface.clone());
//! preview.attach(surface.add_host("preview"));
//!
//! let artifact = preview
//!     .render(
//!         r#"@property --a { syntax: "<angle>"; inherits: false; initial-value: 10deg; }
//!            .box { transform: rotate(var(--a)); }"#,
//!         r#"<div class="box" style="background:var(--a)"></div>"#,
//!     )
//!     .unwrap();
//!
//! assert!(!artifact.css.contains("--a)"));
//! assert_eq!(registry.len(), 1);
//! ```

// Text engines
pub mod css;
pub mod html;

// Isolation pipeline
pub mod allocate;
pub mod property;
pub mod rewrite;
pub mod sanitize;

// Services
pub mod mount;
pub mod registry;

// Render passes
pub mod artifact;
pub mod pipeline;
pub mod preview;

pub use artifact::{import_json, ExportArtifact, ValidationError};
pub use pipeline::{prepare, RenderError};
pub use preview::{Preview, PreviewConfig, PreviewState};
pub use property::PropertyDefinition;
