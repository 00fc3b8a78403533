//! Edit mode: ordinary typing, selection, clipboard and drag initiation.

use crate::controller::EditorController;
use crate::deferred::DeferredTask;
use crate::diagnostics::BlockedSelectionEvent;
use crate::error::Result;
use crate::event::{EditorEvent, EventOutcome};
use crate::handlers::{apply_response, composition::CompositionSession};
use crate::mode::Mode;
use crate::platform::ScrollPosition;
use crate::reconcile::{self, DropReason, SelectionDecision, SelectionGuard};
use crate::registry::HandlerSet;
use crate::state::EditorState;

pub static HANDLERS: HandlerSet = HandlerSet {
    on_before_input: Some(on_before_input),
    on_blur: Some(on_blur),
    on_composition_start: Some(on_composition_start),
    on_copy: Some(on_copy),
    on_cut: Some(on_cut),
    on_drag_over: Some(on_drag_over),
    on_drag_start: Some(on_drag_start),
    on_focus: Some(on_focus),
    on_input: Some(on_input),
    on_key_down: Some(on_key_down),
    on_key_up: Some(on_select),
    on_mouse_up: Some(on_select),
    on_paste: Some(on_paste),
    on_select: Some(on_select),
    ..HandlerSet::EMPTY
};

/// Reconcile the DOM selection with the abstract one.
fn on_select(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    let guard = SelectionGuard {
        block_select_events: editor.guards.block_select_events,
        latest: &editor.latest,
        supplied: &editor.props.editor_state,
    };
    let decision = reconcile::reconcile(guard, editor.collab.probe.as_ref())?;

    match &decision {
        SelectionDecision::Drop(DropReason::Suppressed) => {
            let stacktrace = editor.collab.diagnostics.stacktrace();
            let record =
                BlockedSelectionEvent::capture(editor.props.editor_state.selection(), &stacktrace);
            editor.collab.diagnostics.blocked_selection_event(&record);
        }
        SelectionDecision::Drop(DropReason::Stale) => {
            tracing::trace!(
                target: "weaver::surface::selection",
                event = %event.kind,
                "selection event against superseded state dropped"
            );
        }
        SelectionDecision::Force(_) => {
            tracing::debug!(
                target: "weaver::surface::selection",
                event = %event.kind,
                "DOM selection needs recovery; forcing"
            );
        }
        SelectionDecision::Unchanged | SelectionDecision::Accept(_) => {}
    }

    if let Some(next) = reconcile::apply(&editor.props.editor_state, &decision) {
        editor.update(next);
    }
    Ok(EventOutcome::PassThrough)
}

fn on_focus(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    let selection = editor.latest.selection();
    if selection.has_focus {
        return Ok(EventOutcome::PassThrough);
    }
    let next = editor
        .latest
        .accept_selection(selection.clone().with_has_focus(true));
    editor.update(next);
    Ok(EventOutcome::PassThrough)
}

fn on_blur(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    editor.collab.surface.release_selection();

    let selection = editor.latest.selection();
    if !selection.has_focus {
        return Ok(EventOutcome::PassThrough);
    }
    let next = editor
        .latest
        .accept_selection(selection.clone().with_has_focus(false));
    editor.update(next);
    Ok(EventOutcome::PassThrough)
}

fn on_composition_start(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    editor.set_mode(Mode::Composite);
    let next = editor.latest.set_composition_mode(true);
    editor.update(next);
    editor.composition = CompositionSession::begin(editor.composition.id().wrapping_add(1));
    Ok(EventOutcome::PassThrough)
}

fn on_copy(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    if editor.latest.selection().is_collapsed() {
        return Ok(EventOutcome::Handled);
    }
    let fragment = editor.collab.input.copy_fragment(&editor.latest);
    editor.set_clipboard(fragment);
    Ok(EventOutcome::PassThrough)
}

/// Let the browser perform the native cut, then remount over the mutated
/// DOM from a deferred task.
fn on_cut(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    let state = editor.latest.clone();
    if state.selection().is_collapsed() {
        return Ok(EventOutcome::Handled);
    }

    let scroll = editor.collab.surface.scroll_position();
    let fragment = editor.collab.input.copy_fragment(&state);
    editor.set_clipboard(fragment);
    editor.set_mode(Mode::Cut);
    editor.defer(DeferredTask::finish_cut(scroll, state));
    Ok(EventOutcome::PassThrough)
}

pub(crate) fn finish_cut(
    editor: &mut EditorController,
    scroll: ScrollPosition,
    state: &EditorState,
) -> Result<()> {
    editor.restore_editor_dom(Some(scroll))?;
    editor.exit_current_mode();
    if let Some(next) = editor.collab.input.remove_fragment(state) {
        editor.update(next);
    }
    Ok(())
}

fn on_drag_start(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    editor.internal_drag = true;
    editor.set_mode(Mode::Drag);
    Ok(EventOutcome::PassThrough)
}

/// A drag from outside the surface. Accept the drop by preventing default.
fn on_drag_over(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    editor.internal_drag = false;
    editor.set_mode(Mode::Drag);
    Ok(EventOutcome::Handled)
}

fn on_before_input(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    let response = editor.collab.input.before_input(&editor.latest, event);
    Ok(apply_response(editor, response))
}

fn on_input(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    let response = editor.collab.input.input(&editor.latest, event);
    Ok(apply_response(editor, response))
}

fn on_key_down(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    let response = editor.collab.input.key_down(&editor.latest, event);
    Ok(apply_response(editor, response))
}

fn on_paste(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    let response = editor.collab.input.paste(&editor.latest, event);
    Ok(apply_response(editor, response))
}
