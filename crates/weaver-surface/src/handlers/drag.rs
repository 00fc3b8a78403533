//! Drag mode: a drag payload is over the surface.

use crate::controller::EditorController;
use crate::error::Result;
use crate::event::{EditorEvent, EventOutcome};
use crate::handlers::apply_response;
use crate::registry::HandlerSet;

pub static HANDLERS: HandlerSet = HandlerSet {
    on_drag_end: Some(on_drag_end),
    on_drop: Some(on_drop),
    ..HandlerSet::EMPTY
};

fn on_drag_end(editor: &mut EditorController, _event: &EditorEvent) -> Result<EventOutcome> {
    editor.exit_current_mode();
    editor.internal_drag = false;
    Ok(EventOutcome::PassThrough)
}

/// The payload landed. The browser's own drop is always prevented; the
/// input delegate decides what the payload does to the document.
fn on_drop(editor: &mut EditorController, event: &EditorEvent) -> Result<EventOutcome> {
    editor.guards.drag.reset();
    editor.exit_current_mode();

    let internal = editor.internal_drag;
    editor.internal_drag = false;
    let response = editor.collab.input.drop_payload(&editor.latest, event, internal);
    apply_response(editor, response);
    Ok(EventOutcome::Handled)
}
