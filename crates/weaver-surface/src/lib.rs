//! weaver-surface: interaction controller for a contenteditable surface.
//!
//! This crate provides:
//! - `EditorController` - mode dispatch and the state commit pipeline
//! - `reconcile` - deciding between accepting and forcing the DOM selection
//! - `EditorState` - immutable, identity-compared state handles
//! - Collaborator traits (`EditableSurface`, `SelectionProbe`,
//!   `ContentsRenderer`, `EditorHost`, `InputDelegate`) implemented by the
//!   browser layer and by test fakes
//!
//! Nothing here touches the DOM; see `weaver-surface-browser`.

pub mod config;
pub mod controller;
pub mod deferred;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod guards;
pub mod handlers;
pub mod mode;
pub mod plain;
pub mod platform;
pub mod reconcile;
pub mod registry;
pub mod render;
pub mod state;

pub use config::{
    ControllerConfig, EditorProps, FeatureFlags, InlineStyle, StyleMap, SurfaceOptions,
    TextAlignment, TextDirectionality, generate_editor_key,
};
pub use controller::{Collaborators, EditorController};
pub use deferred::{DeferredKind, DeferredTask, RESOLVE_COMPOSITION_DELAY_MS};
pub use diagnostics::{BlockedSelectionEvent, DiagnosticSink, RecordBuffer, TracingSink};
pub use error::{ControllerError, Result};
pub use event::{EditorEvent, EventOutcome, Modifiers};
pub use guards::{DragCounter, ReentrancyGuards};
pub use handlers::composition::CompositionSession;
pub use mode::{EventKind, Mode, UnknownMode};
pub use plain::{PlainTextInput, document_text};
pub use platform::{
    ChangeQueue, ContentsRenderer, DocumentSelection, EditableSurface, EditorHost, InputDelegate,
    InputResponse, NoInput, ScrollPosition, SelectionProbe,
};
pub use reconcile::{DropReason, SelectionDecision, SelectionGuard};
pub use registry::{Handler, HandlerSet, handlers_for};
pub use render::{RenderView, SurfaceAttributes, surface_attributes};
pub use smol_str::SmolStr;
pub use state::{DocumentContent, EditorState, SelectionState, TextBlock, TextContent};
