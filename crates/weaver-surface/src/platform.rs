//! Collaborator traits at the controller's boundary.
//!
//! These traits define the interface between the controller and the parts of
//! an editor it deliberately does not own: the live editable node, DOM
//! selection probing, content rendering, input-to-command mapping and the
//! host application. The browser implementation lives in
//! `weaver-surface-browser`; tests use recording fakes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::EditorEvent;
use crate::render::RenderView;
use crate::state::{EditorState, SelectionState};

/// Page or scroll-container offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The live editable node.
pub trait EditableSurface {
    /// Whether the editable node currently exists in the document.
    fn is_attached(&self) -> bool;

    /// Scroll offset of the node's scroll parent (or the page).
    fn scroll_position(&self) -> ScrollPosition;

    /// Scroll the node's scroll parent (or the page) back to `position`.
    fn restore_scroll(&self, position: ScrollPosition);

    /// Move input focus into the editable node.
    ///
    /// Fails if the node is not a focusable element.
    fn focus(&self) -> Result<()>;

    /// Move input focus out of the editable node.
    fn blur(&self) -> Result<()>;

    /// Drop a native selection left behind after focus moved to nowhere.
    fn release_selection(&self) {}
}

/// A DOM-derived selection candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentSelection {
    pub selection: SelectionState,
    /// The native range does not map cleanly onto the abstract model, so the
    /// abstract selection must be pushed back into the DOM.
    pub needs_recovery: bool,
}

impl DocumentSelection {
    pub fn clean(selection: SelectionState) -> Self {
        Self {
            selection,
            needs_recovery: false,
        }
    }

    pub fn recovering(selection: SelectionState) -> Self {
        Self {
            selection,
            needs_recovery: true,
        }
    }
}

/// Reads the live DOM selection and maps it onto the abstract model.
///
/// This is the injected recovery policy: how "needs recovery" is decided is
/// entirely up to the implementation.
pub trait SelectionProbe {
    /// Fails only when the nodes the probe needs are missing or malformed.
    fn document_selection(&self, state: &EditorState) -> Result<DocumentSelection>;
}

/// Renders editor contents. Called once per render pass.
pub trait ContentsRenderer {
    fn render(&mut self, view: &RenderView<'_>) -> Result<()>;
}

/// The host application on the other side of the commit pipeline.
pub trait EditorHost {
    /// Receives every state the controller commits.
    fn on_change(&mut self, next: EditorState);

    /// The next state the host wants rendered, if any.
    ///
    /// The host may return a state different from the one it received; the
    /// controller renders whatever comes back.
    fn take_next_state(&mut self) -> Option<EditorState>;
}

/// Response of an `InputDelegate` hook.
#[derive(Clone, Debug)]
pub enum InputResponse {
    /// Not handled; the browser's default action proceeds.
    PassThrough,
    /// Handled without a state change; default is prevented.
    Handled,
    /// Handled; commit this state and prevent default.
    Commit(EditorState),
}

/// Content-mutating input: key bindings, text insertion, clipboard, drop.
///
/// Every hook defaults to doing nothing, so hosts implement only what they
/// support.
pub trait InputDelegate {
    fn before_input(&mut self, _state: &EditorState, _event: &EditorEvent) -> InputResponse {
        InputResponse::PassThrough
    }

    fn input(&mut self, _state: &EditorState, _event: &EditorEvent) -> InputResponse {
        InputResponse::PassThrough
    }

    fn key_down(&mut self, _state: &EditorState, _event: &EditorEvent) -> InputResponse {
        InputResponse::PassThrough
    }

    fn paste(&mut self, _state: &EditorState, _event: &EditorEvent) -> InputResponse {
        InputResponse::PassThrough
    }

    /// `internal` is true when the drag started inside this surface.
    fn drop_payload(
        &mut self,
        _state: &EditorState,
        _event: &EditorEvent,
        _internal: bool,
    ) -> InputResponse {
        InputResponse::PassThrough
    }

    /// Fragment to keep as the editor clipboard for a copy or cut.
    fn copy_fragment(&mut self, _state: &EditorState) -> Option<String> {
        None
    }

    /// State with the selected fragment removed, after a native cut.
    fn remove_fragment(&mut self, _state: &EditorState) -> Option<EditorState> {
        None
    }

    /// State with composed IME text applied at the selection.
    fn commit_composition(&mut self, _state: &EditorState, _text: &str) -> Option<EditorState> {
        None
    }
}

/// Input delegate that handles nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputDelegate for NoInput {}

type ChangeObserver = Box<dyn FnMut(&EditorState)>;

/// A controlled host that echoes every committed state back.
///
/// An optional observer sees each state as it is committed.
#[derive(Default)]
pub struct ChangeQueue {
    pending: VecDeque<EditorState>,
    observer: Option<ChangeObserver>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: impl FnMut(&EditorState) + 'static) -> Self {
        Self {
            pending: VecDeque::new(),
            observer: Some(Box::new(observer)),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl EditorHost for ChangeQueue {
    fn on_change(&mut self, next: EditorState) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&next);
        }
        self.pending.push_back(next);
    }

    fn take_next_state(&mut self) -> Option<EditorState> {
        self.pending.pop_front()
    }
}
