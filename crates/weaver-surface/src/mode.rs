//! Controller modes and the event kinds they can handle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The behavioural mode of the editing surface.
///
/// Exactly one mode is active once the controller is mounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ordinary editing.
    #[default]
    Edit,
    /// IME composition in progress.
    Composite,
    /// A drag payload is over the surface.
    Drag,
    /// A native cut is being applied; every event is ignored.
    Cut,
    /// Inert; every event is ignored.
    Render,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Edit,
        Mode::Composite,
        Mode::Drag,
        Mode::Cut,
        Mode::Render,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Edit => "edit",
            Mode::Composite => "composite",
            Mode::Drag => "drag",
            Mode::Cut => "cut",
            Mode::Render => "render",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown editor mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Native editable-surface events the dispatcher routes.
///
/// `DragEnter` and `DragLeave` never reach a mode handler; they feed the
/// drag counter directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    BeforeInput,
    Blur,
    CompositionEnd,
    CompositionStart,
    CompositionUpdate,
    Copy,
    Cut,
    DragEnd,
    DragEnter,
    DragLeave,
    DragOver,
    DragStart,
    Drop,
    Focus,
    Input,
    KeyDown,
    KeyPress,
    KeyUp,
    MouseDown,
    MouseUp,
    Paste,
    Select,
}

impl EventKind {
    pub const ALL: [EventKind; 22] = [
        EventKind::BeforeInput,
        EventKind::Blur,
        EventKind::CompositionEnd,
        EventKind::CompositionStart,
        EventKind::CompositionUpdate,
        EventKind::Copy,
        EventKind::Cut,
        EventKind::DragEnd,
        EventKind::DragEnter,
        EventKind::DragLeave,
        EventKind::DragOver,
        EventKind::DragStart,
        EventKind::Drop,
        EventKind::Focus,
        EventKind::Input,
        EventKind::KeyDown,
        EventKind::KeyPress,
        EventKind::KeyUp,
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::Paste,
        EventKind::Select,
    ];

    /// Handler name, as it appears in logs and handler tables.
    pub fn handler_name(&self) -> &'static str {
        match self {
            EventKind::BeforeInput => "onBeforeInput",
            EventKind::Blur => "onBlur",
            EventKind::CompositionEnd => "onCompositionEnd",
            EventKind::CompositionStart => "onCompositionStart",
            EventKind::CompositionUpdate => "onCompositionUpdate",
            EventKind::Copy => "onCopy",
            EventKind::Cut => "onCut",
            EventKind::DragEnd => "onDragEnd",
            EventKind::DragEnter => "onDragEnter",
            EventKind::DragLeave => "onDragLeave",
            EventKind::DragOver => "onDragOver",
            EventKind::DragStart => "onDragStart",
            EventKind::Drop => "onDrop",
            EventKind::Focus => "onFocus",
            EventKind::Input => "onInput",
            EventKind::KeyDown => "onKeyDown",
            EventKind::KeyPress => "onKeyPress",
            EventKind::KeyUp => "onKeyUp",
            EventKind::MouseDown => "onMouseDown",
            EventKind::MouseUp => "onMouseUp",
            EventKind::Paste => "onPaste",
            EventKind::Select => "onSelect",
        }
    }

    /// DOM event type name (`addEventListener` name).
    ///
    /// `Select` has no reliable native event on contenteditable; the browser
    /// layer synthesises it from `selectionchange`.
    pub fn dom_name(&self) -> &'static str {
        match self {
            EventKind::BeforeInput => "beforeinput",
            EventKind::Blur => "blur",
            EventKind::CompositionEnd => "compositionend",
            EventKind::CompositionStart => "compositionstart",
            EventKind::CompositionUpdate => "compositionupdate",
            EventKind::Copy => "copy",
            EventKind::Cut => "cut",
            EventKind::DragEnd => "dragend",
            EventKind::DragEnter => "dragenter",
            EventKind::DragLeave => "dragleave",
            EventKind::DragOver => "dragover",
            EventKind::DragStart => "dragstart",
            EventKind::Drop => "drop",
            EventKind::Focus => "focus",
            EventKind::Input => "input",
            EventKind::KeyDown => "keydown",
            EventKind::KeyPress => "keypress",
            EventKind::KeyUp => "keyup",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::Paste => "paste",
            EventKind::Select => "selectionchange",
        }
    }

    /// Look up an event kind by its DOM name.
    pub fn from_dom_name(name: &str) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|k| k.dom_name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.handler_name())
    }
}
