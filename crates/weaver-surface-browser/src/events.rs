//! Native event extraction.
//!
//! Copies what the controller's handlers read out of a DOM event. The event
//! kind comes from `Event.type`; the rest depends on the event interface.

use wasm_bindgen::JsCast;
use web_sys::{
    ClipboardEvent, CompositionEvent, DataTransfer, DragEvent, Event, InputEvent, KeyboardEvent,
    MouseEvent,
};

use weaver_surface::{EditorEvent, EventKind, Modifiers};

/// Every DOM event name the view listens for on the editable node.
///
/// `selectionchange` only fires on the document and is wired separately.
pub fn editable_event_names() -> impl Iterator<Item = &'static str> {
    EventKind::ALL
        .into_iter()
        .filter(|k| *k != EventKind::Select)
        .map(|k| k.dom_name())
}

fn plain_text(transfer: Option<DataTransfer>) -> Option<String> {
    transfer
        .and_then(|dt| dt.get_data("text/plain").ok())
        .filter(|text| !text.is_empty())
}

/// Convert a DOM event into an `EditorEvent`. Unknown event types give `None`.
pub fn editor_event(event: &Event) -> Option<EditorEvent> {
    let kind = EventKind::from_dom_name(&event.type_())?;
    let mut out = EditorEvent::new(kind);

    if let Some(e) = event.dyn_ref::<KeyboardEvent>() {
        out = out
            .with_key(e.key())
            .with_modifiers(Modifiers {
                shift: e.shift_key(),
                ctrl: e.ctrl_key(),
                alt: e.alt_key(),
                meta: e.meta_key(),
            })
            .composing(e.is_composing());
    } else if let Some(e) = event.dyn_ref::<InputEvent>() {
        out = out.with_input_type(e.input_type()).composing(e.is_composing());
        if let Some(data) = e.data() {
            out = out.with_data(data);
        }
    } else if let Some(e) = event.dyn_ref::<CompositionEvent>() {
        if let Some(data) = e.data() {
            out = out.with_data(data);
        }
    } else if let Some(e) = event.dyn_ref::<ClipboardEvent>() {
        if let Some(text) = plain_text(e.clipboard_data()) {
            out = out.with_transfer_text(text);
        }
    } else if let Some(e) = event.dyn_ref::<DragEvent>() {
        if let Some(text) = plain_text(e.data_transfer()) {
            out = out.with_transfer_text(text);
        }
    } else if let Some(e) = event.dyn_ref::<MouseEvent>() {
        out = out.with_modifiers(Modifiers {
            shift: e.shift_key(),
            ctrl: e.ctrl_key(),
            alt: e.alt_key(),
            meta: e.meta_key(),
        });
    }

    Some(out)
}
