//! Immutable editor state snapshots and selections.
//!
//! `EditorState` is owned by the host application. The controller never
//! mutates one; every transition produces a fresh handle, and "did the state
//! change" is answered by identity (`EditorState::ptr_eq`), not by value.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

/// Anchor/focus selection over keyed blocks.
///
/// Offsets are character offsets within the block named by the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub anchor_key: SmolStr,
    pub anchor_offset: usize,
    pub focus_key: SmolStr,
    pub focus_offset: usize,
    /// Focus precedes anchor in document order.
    pub is_backward: bool,
    pub has_focus: bool,
}

impl SelectionState {
    /// Create a selection. Backwardness is only inferred within one block.
    pub fn new(
        anchor_key: impl Into<SmolStr>,
        anchor_offset: usize,
        focus_key: impl Into<SmolStr>,
        focus_offset: usize,
    ) -> Self {
        let anchor_key = anchor_key.into();
        let focus_key = focus_key.into();
        let is_backward = anchor_key == focus_key && focus_offset < anchor_offset;
        Self {
            anchor_key,
            anchor_offset,
            focus_key,
            focus_offset,
            is_backward,
            has_focus: false,
        }
    }

    /// Create a collapsed selection (caret) inside one block.
    pub fn collapsed(key: impl Into<SmolStr>, offset: usize) -> Self {
        let key = key.into();
        Self::new(key.clone(), offset, key, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key && self.anchor_offset == self.focus_offset
    }

    pub fn with_has_focus(mut self, has_focus: bool) -> Self {
        self.has_focus = has_focus;
        self
    }

    pub fn with_backward(mut self, is_backward: bool) -> Self {
        self.is_backward = is_backward;
        self
    }

    /// Key of the block where the selection starts in document order.
    pub fn start_key(&self) -> &SmolStr {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    pub fn end_key(&self) -> &SmolStr {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }
}

/// Opaque document content held by an `EditorState`.
///
/// The controller only ever asks whether there is any text (placeholder
/// logic). Hosts downcast through `as_any` to reach their own type.
pub trait DocumentContent: fmt::Debug {
    /// True if the document contains any text worth hiding a placeholder for.
    fn has_text(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// A block of plain text with a stable key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBlock {
    pub key: SmolStr,
    pub text: String,
}

/// Ordered keyed text blocks. The simplest useful `DocumentContent`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextContent {
    blocks: Vec<TextBlock>,
}

impl TextContent {
    pub fn from_blocks(blocks: impl IntoIterator<Item = TextBlock>) -> Self {
        Self {
            blocks: blocks.into_iter().collect(),
        }
    }

    /// Split on newlines, one block per line, keyed `b0`, `b1`, ...
    pub fn from_text(text: &str) -> Self {
        Self::from_blocks(text.split('\n').enumerate().map(|(idx, line)| TextBlock {
            key: format_smolstr!("b{idx}"),
            text: line.to_string(),
        }))
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn block(&self, key: &str) -> Option<&TextBlock> {
        self.blocks.iter().find(|b| b.key == key)
    }

    pub fn first_key(&self) -> Option<&SmolStr> {
        self.blocks.first().map(|b| &b.key)
    }
}

impl DocumentContent for TextContent {
    fn has_text(&self) -> bool {
        // A single empty block is the empty document.
        self.blocks.len() > 1 || self.blocks.first().is_some_and(|b| !b.text.is_empty())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct Snapshot {
    content: Rc<dyn DocumentContent>,
    selection: SelectionState,
    in_composition_mode: bool,
    force_selection: bool,
}

/// Immutable editor state handle. Cloning is cheap and preserves identity.
#[derive(Clone, Debug)]
pub struct EditorState {
    inner: Rc<Snapshot>,
}

impl EditorState {
    pub fn create(content: Rc<dyn DocumentContent>, selection: SelectionState) -> Self {
        Self {
            inner: Rc::new(Snapshot {
                content,
                selection,
                in_composition_mode: false,
                force_selection: false,
            }),
        }
    }

    /// State over plain text with a caret at the start of the first block.
    pub fn from_text(text: &str) -> Self {
        let content = TextContent::from_text(text);
        let key = content.first_key().cloned().unwrap_or_default();
        Self::create(Rc::new(content), SelectionState::collapsed(key, 0))
    }

    /// Identity comparison. Logically equal states built separately differ.
    pub fn ptr_eq(a: &EditorState, b: &EditorState) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn selection(&self) -> &SelectionState {
        &self.inner.selection
    }

    pub fn content(&self) -> &Rc<dyn DocumentContent> {
        &self.inner.content
    }

    pub fn is_in_composition_mode(&self) -> bool {
        self.inner.in_composition_mode
    }

    /// The rendering layer must write this state's selection into the DOM.
    pub fn must_force_selection(&self) -> bool {
        self.inner.force_selection
    }

    pub fn has_focus(&self) -> bool {
        self.inner.selection.has_focus
    }

    /// Adopt a selection that already matches the DOM.
    pub fn accept_selection(&self, selection: SelectionState) -> Self {
        self.derive(|s| {
            s.selection = selection;
            s.force_selection = false;
        })
    }

    /// Make `selection` authoritative; the DOM will be overwritten with it.
    ///
    /// The selection is stored as given, focus flag included.
    pub fn force_selection(&self, selection: SelectionState) -> Self {
        self.derive(|s| {
            s.selection = selection;
            s.force_selection = true;
        })
    }

    pub fn set_composition_mode(&self, in_composition_mode: bool) -> Self {
        self.derive(|s| s.in_composition_mode = in_composition_mode)
    }

    /// Replace content and selection, forcing the selection into the DOM.
    pub fn push_content(
        &self,
        content: Rc<dyn DocumentContent>,
        selection_after: SelectionState,
    ) -> Self {
        self.derive(|s| {
            s.content = content;
            s.selection = selection_after;
            s.force_selection = true;
        })
    }

    fn derive(&self, f: impl FnOnce(&mut Snapshot)) -> Self {
        let mut next = Snapshot {
            content: Rc::clone(&self.inner.content),
            selection: self.inner.selection.clone(),
            in_composition_mode: self.inner.in_composition_mode,
            force_selection: self.inner.force_selection,
        };
        f(&mut next);
        Self {
            inner: Rc::new(next),
        }
    }
}
