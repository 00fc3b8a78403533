//! Composite mode: an IME composition is in progress.
//!
//! The browser owns the DOM while composing. Text arriving through
//! `beforeinput` is buffered and applied in one commit once the composition
//! resolves, after which the contents are remounted from state.

use crate::controller::EditorController;
use crate::deferred::DeferredTask;
use crate::error::Result;
use crate::event::{EditorEvent, EventOutcome};
use crate::registry::HandlerSet;

pub static HANDLERS: HandlerSet = HandlerSet {
    on_before_input: Some(on_before_input),
    on_composition_end: Some(on_composition_end),
    on_composition_start: Some(on_composition_start),
    on_key_down: Some(on_key_down),
    on_key_press: Some(on_key_press),
    ..HandlerSet::EMPTY
};

/// One IME composition, from the edit-mode `compositionstart` until it
/// resolves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositionSession {
    id: u32,
    buffer: String,
    resolved: bool,
    still_composing: bool,
}

impl CompositionSession {
    pub(crate) fn begin(id: u32) -> Self {
        Self {
            id,
            buffer: String::new(),
            resolved: false,
            still_composing: true,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Text buffered so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn is_composing(&self) -> bool {
        self.still_composing
    }
}

fn on_before_input(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    if let Some(data) = &event.data {
        editor.composition.buffer.push_str(data);
    }
    Ok(EventOutcome::PassThrough)
}

/// Some IMEs end and restart a composition without leaving composite mode.
fn on_composition_start(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    editor.composition.still_composing = true;
    Ok(EventOutcome::PassThrough)
}

fn on_composition_end(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    let session = &mut editor.composition;
    session.resolved = false;
    session.still_composing = false;
    // Browsers that skip beforeinput during composition still report the
    // final text on compositionend.
    if session.buffer.is_empty()
        && let Some(data) = &event.data
    {
        session.buffer.push_str(data);
    }
    let id = session.id;
    editor.defer(DeferredTask::resolve_composition(id));
    Ok(EventOutcome::PassThrough)
}

/// A keydown after the composition ended resolves it immediately and is
/// then handled as an ordinary edit-mode keydown.
fn on_key_down(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    if !editor.composition.still_composing {
        resolve(editor)?;
        return Ok(editor.invoke(event)?.unwrap_or_default());
    }
    Ok(swallow_return_or_escape(event))
}

fn on_key_press(_editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    Ok(swallow_return_or_escape(event))
}

/// Enter and Escape confirm or cancel the IME; they must not edit.
fn swallow_return_or_escape(event: &EditorEvent) -> EventOutcome {
    if event.is_return_or_escape() {
        EventOutcome::Handled
    } else {
        EventOutcome::PassThrough
    }
}

/// Deferred resolution for the session `id`. Ignored if a different session
/// is current.
pub(crate) fn resolve_deferred(editor: &mut EditorController, id: u32) -> Result<()> {
    if editor.composition.id != id {
        tracing::debug!(
            target: "weaver::surface",
            queued = id,
            current = editor.composition.id,
            "composition resolution for a finished session skipped"
        );
        return Ok(());
    }
    resolve(editor)
}

/// Apply the composed text and hand the DOM back to the controller.
///
/// Runs at most once per session; a no-op while still composing.
pub(crate) fn resolve(editor: &mut EditorController) -> Result<()> {
    let session = &mut editor.composition;
    if session.still_composing || session.resolved {
        return Ok(());
    }
    session.resolved = true;
    let composed = std::mem::take(&mut session.buffer);

    let state = editor.latest.set_composition_mode(false);
    tracing::debug!(
        target: "weaver::surface",
        session = editor.composition.id,
        chars = composed.chars().count(),
        "resolving composition"
    );

    editor.restore_editor_dom(None)?;
    editor.exit_current_mode();

    let committed = if composed.is_empty() {
        None
    } else {
        editor.collab.input.commit_composition(&state, &composed)
    };
    let next = committed.unwrap_or_else(|| {
        state.force_selection(state.selection().clone().with_has_focus(true))
    });
    editor.update(next);
    Ok(())
}
