//! `SelectionProbe` over `window.getSelection()`.
//!
//! Endpoints are mapped through their nearest `data-block-key` ancestor. An
//! endpoint that lands on an element rather than a text node, or outside any
//! block, still maps to a position but asks for recovery: the controller then
//! writes the abstract selection back so the caret ends up in a text node.

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, Node};

use weaver_surface::{
    ControllerError, DocumentSelection, EditorState, Result, SelectionProbe, SelectionState,
    SmolStr,
};

use crate::dom::{self, BLOCK_KEY_ATTR, char_offset_in_block, keyed_block};

/// One mapped endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Point {
    key: SmolStr,
    offset: usize,
    needs_recovery: bool,
}

pub struct BrowserSelectionProbe {
    editable: Element,
}

impl BrowserSelectionProbe {
    pub fn new(editable: Element) -> Self {
        Self { editable }
    }

    /// Map an endpoint that is not inside any block.
    ///
    /// Offset zero on the container is the document start; anything else on
    /// it, or a stray node, is treated as the document end.
    fn container_point(&self, contents: &Element, node: &Node, offset: u32) -> Result<Option<Point>> {
        let blocks = contents
            .query_selector_all(&format!("[{BLOCK_KEY_ATTR}]"))
            .map_err(|e| format!("query_selector_all failed: {:?}", e))?;
        let first = blocks.get(0).and_then(|n| n.dyn_into::<Element>().ok());
        let last = blocks
            .length()
            .checked_sub(1)
            .and_then(|i| blocks.get(i))
            .and_then(|n| n.dyn_into::<Element>().ok());

        let on_container = node.is_same_node(Some(self.editable.as_ref()))
            || node.is_same_node(Some(contents.as_ref()));
        let (block, at_start) = if on_container && offset == 0 {
            (first, true)
        } else {
            (last, false)
        };
        let Some(block) = block else {
            return Ok(None);
        };
        let key = block.get_attribute(BLOCK_KEY_ATTR).unwrap_or_default();
        let offset = if at_start {
            0
        } else {
            let mut chars = 0;
            dom::walk_text_nodes(&block, |_, text| {
                chars += text.chars().count();
                false
            })?;
            chars
        };
        Ok(Some(Point {
            key: key.into(),
            offset,
            needs_recovery: true,
        }))
    }

    fn point(&self, contents: &Element, node: &Node, offset: u32) -> Result<Option<Point>> {
        let Some(block) = keyed_block(node, &self.editable) else {
            return self.container_point(contents, node, offset);
        };
        let key = block.get_attribute(BLOCK_KEY_ATTR).unwrap_or_default();
        Ok(Some(Point {
            key: key.into(),
            offset: char_offset_in_block(&block, node, offset)?,
            needs_recovery: node.node_type() != Node::TEXT_NODE,
        }))
    }
}

impl SelectionProbe for BrowserSelectionProbe {
    fn document_selection(&self, state: &EditorState) -> Result<DocumentSelection> {
        if !self.editable.is_connected() {
            return Err(ControllerError::MissingEditorNode);
        }
        let contents: Element = self
            .editable
            .first_child()
            .and_then(|n| n.dyn_into::<HtmlElement>().ok())
            .ok_or(ControllerError::NotAnElement("editorNode.firstChild"))?
            .into();

        let unfocused = || {
            DocumentSelection::clean(state.selection().clone().with_has_focus(false))
        };

        let selection = dom::window()?
            .get_selection()
            .map_err(|e| format!("get_selection failed: {:?}", e))?;
        let Some(selection) = selection else {
            return Ok(unfocused());
        };
        if selection.range_count() == 0 {
            return Ok(unfocused());
        }
        let (Some(anchor_node), Some(focus_node)) = (selection.anchor_node(), selection.focus_node())
        else {
            return Ok(unfocused());
        };
        if !self.editable.contains(Some(&anchor_node)) || !self.editable.contains(Some(&focus_node)) {
            return Ok(unfocused());
        }

        let anchor = self.point(&contents, &anchor_node, selection.anchor_offset())?;
        let focus = self.point(&contents, &focus_node, selection.focus_offset())?;
        let (Some(anchor), Some(focus)) = (anchor, focus) else {
            return Ok(unfocused());
        };

        let is_backward = if anchor.key == focus.key {
            focus.offset < anchor.offset
        } else {
            anchor_node.compare_document_position(&focus_node) & Node::DOCUMENT_POSITION_PRECEDING
                != 0
        };
        let needs_recovery = anchor.needs_recovery || focus.needs_recovery;
        let mapped = SelectionState::new(anchor.key, anchor.offset, focus.key, focus.offset)
            .with_backward(is_backward)
            .with_has_focus(state.has_focus());

        Ok(if needs_recovery {
            DocumentSelection::recovering(mapped)
        } else {
            DocumentSelection::clean(mapped)
        })
    }
}
