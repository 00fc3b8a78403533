//! Browser DOM layer for weaver-surface.
//!
//! Implements the controller's collaborator traits against a live
//! contenteditable element and exposes the result to JavaScript. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `surface`: focus, blur and scroll restoration on the editable node
//! - `selection`: DOM selection → abstract selection mapping
//! - `diagnostics`: blocked-selection records with JS stack traces
//! - `render`: keyed block rendering, ARIA attributes and selection writes
//! - `events`: native event extraction
//! - `view`: `EditorView`, the JS-facing mount point
//!
//! # Re-exports
//!
//! This crate re-exports `weaver-surface` for convenience, so consumers
//! only need to depend on `weaver-surface-browser`.

// Re-export core crate
pub use weaver_surface;
pub use weaver_surface::*;

pub mod diagnostics;
pub mod dom;
pub mod events;
pub mod logging;
pub mod render;
pub mod selection;
pub mod surface;
pub mod view;

pub use diagnostics::{BrowserDiagnostics, js_stack};
pub use dom::{char_to_utf16_offset, utf16_to_char_offset};
pub use events::editor_event;
pub use logging::init_logging;
pub use render::{DomRenderer, SurfaceNodes, write_selection};
pub use selection::BrowserSelectionProbe;
pub use surface::BrowserSurface;
pub use view::EditorView;
