//! Per-mode handler tables.
//!
//! Each mode owns a `'static` table of optional handler functions, one slot
//! per routable event. Dispatch is a single table read; modes that must
//! ignore everything (`cut`, `render`) simply have no table.

use crate::controller::EditorController;
use crate::error::Result;
use crate::event::{EditorEvent, EventOutcome};
use crate::handlers;
use crate::mode::{EventKind, Mode};

/// A mode's reaction to one event.
pub type Handler = fn(&mut EditorController, &EditorEvent) -> Result<EventOutcome>;

/// Handler slots for one mode.
///
/// `DragEnter`/`DragLeave` have no slot: they only feed the drag counter.
#[derive(Clone, Copy)]
pub struct HandlerSet {
    pub on_before_input: Option<Handler>,
    pub on_blur: Option<Handler>,
    pub on_composition_end: Option<Handler>,
    pub on_composition_start: Option<Handler>,
    pub on_composition_update: Option<Handler>,
    pub on_copy: Option<Handler>,
    pub on_cut: Option<Handler>,
    pub on_drag_end: Option<Handler>,
    pub on_drag_over: Option<Handler>,
    pub on_drag_start: Option<Handler>,
    pub on_drop: Option<Handler>,
    pub on_focus: Option<Handler>,
    pub on_input: Option<Handler>,
    pub on_key_down: Option<Handler>,
    pub on_key_press: Option<Handler>,
    pub on_key_up: Option<Handler>,
    pub on_mouse_down: Option<Handler>,
    pub on_mouse_up: Option<Handler>,
    pub on_paste: Option<Handler>,
    pub on_select: Option<Handler>,
}

impl HandlerSet {
    /// A table with no handlers, the base for `..HandlerSet::EMPTY`.
    pub const EMPTY: HandlerSet = HandlerSet {
        on_before_input: None,
        on_blur: None,
        on_composition_end: None,
        on_composition_start: None,
        on_composition_update: None,
        on_copy: None,
        on_cut: None,
        on_drag_end: None,
        on_drag_over: None,
        on_drag_start: None,
        on_drop: None,
        on_focus: None,
        on_input: None,
        on_key_down: None,
        on_key_press: None,
        on_key_up: None,
        on_mouse_down: None,
        on_mouse_up: None,
        on_paste: None,
        on_select: None,
    };

    pub fn get(&self, kind: EventKind) -> Option<Handler> {
        match kind {
            EventKind::BeforeInput => self.on_before_input,
            EventKind::Blur => self.on_blur,
            EventKind::CompositionEnd => self.on_composition_end,
            EventKind::CompositionStart => self.on_composition_start,
            EventKind::CompositionUpdate => self.on_composition_update,
            EventKind::Copy => self.on_copy,
            EventKind::Cut => self.on_cut,
            EventKind::DragEnd => self.on_drag_end,
            EventKind::DragOver => self.on_drag_over,
            EventKind::DragStart => self.on_drag_start,
            EventKind::Drop => self.on_drop,
            EventKind::Focus => self.on_focus,
            EventKind::Input => self.on_input,
            EventKind::KeyDown => self.on_key_down,
            EventKind::KeyPress => self.on_key_press,
            EventKind::KeyUp => self.on_key_up,
            EventKind::MouseDown => self.on_mouse_down,
            EventKind::MouseUp => self.on_mouse_up,
            EventKind::Paste => self.on_paste,
            EventKind::Select => self.on_select,
            EventKind::DragEnter | EventKind::DragLeave => None,
        }
    }

    /// Event kinds this table handles.
    pub fn handled(&self) -> impl Iterator<Item = EventKind> + '_ {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
    }
}

/// The handler table for `mode`, if the mode handles anything.
pub fn handlers_for(mode: Mode) -> Option<&'static HandlerSet> {
    match mode {
        Mode::Edit => Some(&handlers::edit::HANDLERS),
        Mode::Composite => Some(&handlers::composition::HANDLERS),
        Mode::Drag => Some(&handlers::drag::HANDLERS),
        Mode::Cut | Mode::Render => None,
    }
}
