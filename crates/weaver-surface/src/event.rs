//! Platform-neutral event records.
//!
//! The browser layer copies what handlers need out of the native event; the
//! controller never looks at anything else.

use smol_str::SmolStr;

use crate::mode::EventKind;

/// Keyboard modifier state at the time of the event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A native surface event, reduced to plain data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorEvent {
    pub kind: EventKind,
    /// `KeyboardEvent.key`
    pub key: Option<SmolStr>,
    pub modifiers: Modifiers,
    /// `InputEvent.data` / `CompositionEvent.data`
    pub data: Option<String>,
    /// `InputEvent.inputType`
    pub input_type: Option<SmolStr>,
    /// Plain text carried by a clipboard or drag data transfer.
    pub transfer_text: Option<String>,
    pub is_composing: bool,
}

impl EditorEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            key: None,
            modifiers: Modifiers::default(),
            data: None,
            input_type: None,
            transfer_text: None,
            is_composing: false,
        }
    }

    pub fn with_key(mut self, key: impl Into<SmolStr>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<SmolStr>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn with_transfer_text(mut self, text: impl Into<String>) -> Self {
        self.transfer_text = Some(text.into());
        self
    }

    pub fn composing(mut self, is_composing: bool) -> Self {
        self.is_composing = is_composing;
        self
    }

    /// Enter or Escape, the keys IME sessions must not leak to the browser.
    pub fn is_return_or_escape(&self) -> bool {
        matches!(self.key.as_deref(), Some("Enter") | Some("Escape"))
    }
}

/// What the browser should do with the native event after dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EventOutcome {
    /// Let the browser apply its default action.
    #[default]
    PassThrough,
    /// Handled by the controller; call `preventDefault()`.
    Handled,
}

impl EventOutcome {
    pub fn prevents_default(&self) -> bool {
        matches!(self, EventOutcome::Handled)
    }
}
