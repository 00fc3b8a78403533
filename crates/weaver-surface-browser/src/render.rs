//! `ContentsRenderer` writing keyed text blocks into the editable node.
//!
//! Layout:
//!
//! ```text
//! div.weaver-surface-root
//!   div.weaver-surface-container
//!     div.weaver-surface-placeholder#placeholder-<key>   (only when shown)
//!     div[contenteditable]                               (the editable node)
//!       div[data-contents=contents<n>]
//!         div[data-block-key=<key>] > span[data-text] > #text | br
//! ```
//!
//! A changed `data-contents` identity rebuilds the whole subtree. Otherwise
//! blocks whose text still matches are kept in place so the native
//! selection inside them survives the pass.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

use weaver_surface::render::{CONTAINER_CLASS, MANAGED_ATTRIBUTES};
use weaver_surface::{
    ContentsRenderer, ControllerError, RenderView, Result, SelectionState, TextBlock, TextContent,
    TextDirectionality, surface_attributes,
};

use crate::dom::{self, BLOCK_KEY_ATTR, block_element, dom_position_in_block};

pub const PLACEHOLDER_CLASS: &str = "weaver-surface-placeholder";
pub const BLOCK_CLASS: &str = "weaver-surface-block";
const CONTENTS_ATTR: &str = "data-contents";

fn dom_err(what: &str) -> impl FnOnce(wasm_bindgen::JsValue) -> ControllerError + '_ {
    move |e| ControllerError::Dom(format!("{what} failed: {:?}", e))
}

/// The three nested elements a surface is mounted into.
#[derive(Clone)]
pub struct SurfaceNodes {
    pub root: Element,
    pub container: Element,
    pub editable: Element,
}

impl SurfaceNodes {
    /// Create the root, container and editable elements under `parent`.
    pub fn create(parent: &Element) -> Result<Self> {
        let document = dom::document()?;
        let root = document.create_element("div").map_err(dom_err("create_element"))?;
        let container = document.create_element("div").map_err(dom_err("create_element"))?;
        let editable = document.create_element("div").map_err(dom_err("create_element"))?;

        container.set_class_name(CONTAINER_CLASS);
        container.append_child(&editable).map_err(dom_err("append_child"))?;
        root.append_child(&container).map_err(dom_err("append_child"))?;
        parent.append_child(&root).map_err(dom_err("append_child"))?;

        if let Some(html) = editable.dyn_ref::<HtmlElement>() {
            let style = html.style();
            let _ = style.set_property("outline", "none");
            let _ = style.set_property("user-select", "text");
            let _ = style.set_property("-webkit-user-select", "text");
            let _ = style.set_property("white-space", "pre-wrap");
            let _ = style.set_property("overflow-wrap", "break-word");
        }

        Ok(Self {
            root,
            container,
            editable,
        })
    }

    pub fn remove(&self) {
        self.root.remove();
    }
}

pub struct DomRenderer {
    nodes: SurfaceNodes,
    placeholder: Option<Element>,
}

impl DomRenderer {
    pub fn new(nodes: SurfaceNodes) -> Self {
        Self {
            nodes,
            placeholder: None,
        }
    }

    fn apply_attributes(&self, view: &RenderView<'_>) -> Result<()> {
        let attrs = surface_attributes(view.options, view.editor_key);
        let editable = &self.nodes.editable;

        self.nodes.root.set_class_name(&attrs.root_classes.join(" "));
        editable.set_class_name(&attrs.content_classes.join(" "));

        for name in MANAGED_ATTRIBUTES {
            match attrs.get(name) {
                Some(value) => editable
                    .set_attribute(name, value)
                    .map_err(dom_err("set_attribute"))?,
                None => editable
                    .remove_attribute(name)
                    .map_err(dom_err("remove_attribute"))?,
            }
        }

        match view.options.text_directionality {
            Some(dir) => {
                let dir = match dir {
                    TextDirectionality::Ltr => "ltr",
                    TextDirectionality::Rtl => "rtl",
                    TextDirectionality::Neutral => "auto",
                };
                editable.set_attribute("dir", dir).map_err(dom_err("set_attribute"))?;
            }
            None => editable.remove_attribute("dir").map_err(dom_err("remove_attribute"))?,
        }
        Ok(())
    }

    fn render_placeholder(&mut self, document: &Document, view: &RenderView<'_>) -> Result<()> {
        let text = view.options.placeholder.as_deref().filter(|_| view.show_placeholder);
        let Some(text) = text else {
            if let Some(placeholder) = self.placeholder.take() {
                placeholder.remove();
            }
            return Ok(());
        };

        let placeholder = match self.placeholder.take() {
            Some(existing) => existing,
            None => {
                let el = document.create_element("div").map_err(dom_err("create_element"))?;
                el.set_class_name(PLACEHOLDER_CLASS);
                self.nodes
                    .container
                    .insert_before(&el, Some(self.nodes.editable.as_ref()))
                    .map_err(dom_err("insert_before"))?;
                el
            }
        };
        placeholder.set_id(&view.placeholder_id());
        placeholder.set_text_content(Some(text));
        self.placeholder = Some(placeholder);
        Ok(())
    }

    /// The contents element for this identity, rebuilt if the identity moved.
    fn contents(&self, document: &Document, identity: &str) -> Result<(Element, bool)> {
        let editable = &self.nodes.editable;
        if let Some(existing) = editable.first_element_child()
            && existing.get_attribute(CONTENTS_ATTR).as_deref() == Some(identity)
        {
            return Ok((existing, false));
        }

        tracing::debug!(target: "weaver::surface::render", identity, "rebuilding contents");
        let contents = document.create_element("div").map_err(dom_err("create_element"))?;
        contents
            .set_attribute(CONTENTS_ATTR, identity)
            .map_err(dom_err("set_attribute"))?;
        editable.set_text_content(None);
        editable.append_child(&contents).map_err(dom_err("append_child"))?;
        Ok((contents, true))
    }

    /// Bring the block elements in line with `blocks`. Returns whether any
    /// block element was created, moved or removed.
    fn render_blocks(document: &Document, contents: &Element, blocks: &[TextBlock]) -> Result<bool> {
        let mut existing: HashMap<String, Element> = HashMap::new();
        let children = contents.children();
        for i in 0..children.length() {
            if let Some(child) = children.item(i)
                && let Some(key) = child.get_attribute(BLOCK_KEY_ATTR)
            {
                existing.insert(key, child);
            }
        }

        let mut changed = false;
        let mut cursor: Option<Node> = contents.first_child();
        for block in blocks {
            let element = match existing.remove(block.key.as_str()) {
                Some(el) if el.text_content().unwrap_or_default() == block.text => el,
                _ => {
                    changed = true;
                    block_node(document, block)?
                }
            };
            let node: &Node = element.as_ref();
            if cursor.as_ref().is_some_and(|c| c.is_same_node(Some(node))) {
                cursor = node.next_sibling();
            } else {
                changed = true;
                contents
                    .insert_before(node, cursor.as_ref())
                    .map_err(dom_err("insert_before"))?;
            }
        }

        while let Some(stale) = cursor {
            changed = true;
            cursor = stale.next_sibling();
            contents.remove_child(&stale).map_err(dom_err("remove_child"))?;
        }
        Ok(changed)
    }
}

fn block_node(document: &Document, block: &TextBlock) -> Result<Element> {
    let el = document.create_element("div").map_err(dom_err("create_element"))?;
    el.set_class_name(BLOCK_CLASS);
    el.set_attribute(BLOCK_KEY_ATTR, &block.key)
        .map_err(dom_err("set_attribute"))?;

    let span = document.create_element("span").map_err(dom_err("create_element"))?;
    span.set_attribute("data-text", "true")
        .map_err(dom_err("set_attribute"))?;
    if block.text.is_empty() {
        // Keeps the empty line's height and gives the caret somewhere to sit.
        let br = document.create_element("br").map_err(dom_err("create_element"))?;
        span.append_child(&br).map_err(dom_err("append_child"))?;
    } else {
        span.set_text_content(Some(&block.text));
    }
    el.append_child(&span).map_err(dom_err("append_child"))?;
    Ok(el)
}

/// Write an abstract selection into the DOM.
pub fn write_selection(editable: &Element, selection: &SelectionState) -> Result<()> {
    let (Some(anchor_block), Some(focus_block)) = (
        block_element(editable, &selection.anchor_key),
        block_element(editable, &selection.focus_key),
    ) else {
        tracing::warn!(
            anchor_key = %selection.anchor_key,
            focus_key = %selection.focus_key,
            "selection names a block that is not rendered"
        );
        return Ok(());
    };

    let (anchor_node, anchor_offset) = dom_position_in_block(&anchor_block, selection.anchor_offset)?;
    let (focus_node, focus_offset) = dom_position_in_block(&focus_block, selection.focus_offset)?;

    tracing::trace!(
        target: "weaver::surface::render",
        anchor_key = %selection.anchor_key,
        anchor_offset,
        focus_key = %selection.focus_key,
        focus_offset,
        "writing selection"
    );

    let native = dom::window()?
        .get_selection()
        .map_err(dom_err("get_selection"))?
        .ok_or_else(|| ControllerError::Dom("no selection object".into()))?;
    native
        .set_base_and_extent(&anchor_node, anchor_offset, &focus_node, focus_offset)
        .map_err(dom_err("set_base_and_extent"))
}

impl ContentsRenderer for DomRenderer {
    fn render(&mut self, view: &RenderView<'_>) -> Result<()> {
        let state = view.editor_state;
        let content = state
            .content()
            .as_any()
            .downcast_ref::<TextContent>()
            .ok_or_else(|| ControllerError::Render("unsupported document content".into()))?;

        let document = dom::document()?;
        self.apply_attributes(view)?;
        self.render_placeholder(&document, view)?;

        let identity = view.contents_identity();
        let (contents, rebuilt) = self.contents(&document, &identity)?;
        let changed = Self::render_blocks(&document, &contents, content.blocks())? || rebuilt;

        // The IME owns the DOM selection while composing.
        if state.has_focus()
            && !state.is_in_composition_mode()
            && (state.must_force_selection() || changed)
        {
            write_selection(&self.nodes.editable, state.selection())?;
        }
        Ok(())
    }
}
