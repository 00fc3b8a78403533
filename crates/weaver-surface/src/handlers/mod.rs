//! Mode handler bundles.
//!
//! One module per mode that reacts to events. Each exposes a `HANDLERS`
//! table consumed by `registry::handlers_for`.

pub mod composition;
pub mod drag;
pub mod edit;

use crate::controller::EditorController;
use crate::event::EventOutcome;
use crate::platform::InputResponse;

/// Commit whatever state an input delegate produced.
pub(crate) fn apply_response(editor: &mut EditorController, response: InputResponse) -> EventOutcome {
    match response {
        InputResponse::PassThrough => EventOutcome::PassThrough,
        InputResponse::Handled => EventOutcome::Handled,
        InputResponse::Commit(next) => {
            editor.update(next);
            EventOutcome::Handled
        }
    }
}
