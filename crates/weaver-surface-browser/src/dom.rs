//! DOM lookups shared by the probe and the renderer.
//!
//! Block elements carry `data-block-key`; offsets inside them are counted in
//! UTF-16 code units by the DOM and converted to char offsets here.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node, Window};

use weaver_surface::{ControllerError, Result};

/// Attribute naming the block an element renders.
pub const BLOCK_KEY_ATTR: &str = "data-block-key";

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| ControllerError::Dom("no window".into()))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| ControllerError::Dom("no document".into()))
}

/// Char offset of a UTF-16 offset into `text`.
///
/// An offset inside a surrogate pair rounds down to the pair's start.
pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut utf16 = 0;
    for (chars, c) in text.chars().enumerate() {
        let next = utf16 + c.len_utf16();
        if next > utf16_offset {
            return chars;
        }
        utf16 = next;
    }
    text.chars().count()
}

/// UTF-16 offset of a char offset into `text`, clamped to the end.
pub fn char_to_utf16_offset(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

/// Nearest ancestor-or-self block element below `editable`.
pub fn keyed_block(node: &Node, editable: &Element) -> Option<Element> {
    let mut current = Some(node.clone());
    while let Some(node) = current {
        if let Some(element) = node.dyn_ref::<Element>() {
            if element == editable {
                return None;
            }
            if element.has_attribute(BLOCK_KEY_ATTR) {
                return Some(element.clone());
            }
        }
        current = node.parent_node();
    }
    None
}

/// Visit editable text nodes under `container` in document order, skipping
/// `contenteditable="false"` subtrees. Stops when `visit` returns true.
pub fn walk_text_nodes(
    container: &Element,
    mut visit: impl FnMut(&Node, &str) -> bool,
) -> Result<()> {
    let walker = document()?
        .create_tree_walker_with_what_to_show(container, 0xFFFFFFFF)
        .map_err(|e| format!("create_tree_walker failed: {:?}", e))?;

    let mut skip_until_exit: Option<Element> = None;
    while let Ok(Some(node)) = walker.next_node() {
        if let Some(ref skip_elem) = skip_until_exit
            && !skip_elem.contains(Some(&node))
        {
            skip_until_exit = None;
        }

        if skip_until_exit.is_none()
            && let Some(element) = node.dyn_ref::<Element>()
            && element.get_attribute("contenteditable").as_deref() == Some("false")
        {
            skip_until_exit = Some(element.clone());
            continue;
        }

        if skip_until_exit.is_some() || node.node_type() != Node::TEXT_NODE {
            continue;
        }

        let text = node.text_content().unwrap_or_default();
        if visit(&node, &text) {
            break;
        }
    }
    Ok(())
}

/// Char offset of a DOM position (node + offset) within `block`.
///
/// Text-node offsets are UTF-16; element offsets are child indices, in which
/// case every text node before that child is counted.
pub fn char_offset_in_block(block: &Element, node: &Node, offset: u32) -> Result<usize> {
    let mut chars = 0;

    if node.node_type() == Node::TEXT_NODE {
        walk_text_nodes(block, |text_node, text| {
            if text_node.is_same_node(Some(node)) {
                chars += utf16_to_char_offset(text, offset as usize);
                return true;
            }
            chars += text.chars().count();
            false
        })?;
        return Ok(chars);
    }

    let children = node.child_nodes();
    let preceding: Vec<Node> = (0..offset.min(children.length()))
        .filter_map(|i| children.get(i))
        .collect();
    walk_text_nodes(block, |text_node, text| {
        let before = if node.contains(Some(text_node)) {
            preceding.iter().any(|child| child.contains(Some(text_node)))
        } else {
            node.compare_document_position(text_node) & Node::DOCUMENT_POSITION_PRECEDING != 0
        };
        if !before {
            return true;
        }
        chars += text.chars().count();
        false
    })?;
    Ok(chars)
}

/// DOM position (node + UTF-16 offset) of a char offset within `block`.
///
/// Blocks without text resolve to the start of their first element child.
pub fn dom_position_in_block(block: &Element, char_offset: usize) -> Result<(Node, u32)> {
    let mut accumulated = 0;
    let mut found: Option<(Node, u32)> = None;
    let mut last: Option<(Node, u32)> = None;

    walk_text_nodes(block, |node, text| {
        let len = text.chars().count();
        if accumulated + len >= char_offset {
            let offset = char_to_utf16_offset(text, char_offset - accumulated);
            found = Some((node.clone(), offset as u32));
            return true;
        }
        accumulated += len;
        last = Some((node.clone(), text.encode_utf16().count() as u32));
        false
    })?;

    if let Some(position) = found.or(last) {
        return Ok(position);
    }
    let target: Node = match block.first_element_child() {
        Some(child) => child.into(),
        None => block.clone().into(),
    };
    Ok((target, 0))
}

/// Element with the given block key under `editable`.
pub fn block_element(editable: &Element, key: &str) -> Option<Element> {
    let selector = format!("[{BLOCK_KEY_ATTR}='{key}']");
    editable.query_selector(&selector).ok().flatten()
}
