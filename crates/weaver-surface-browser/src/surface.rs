//! `EditableSurface` over a live contenteditable element.

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use weaver_surface::{ControllerError, EditableSurface, Result, ScrollPosition};

use crate::dom;

/// The editable node plus its nearest scrolling ancestor.
pub struct BrowserSurface {
    editable: Element,
}

impl BrowserSurface {
    pub fn new(editable: Element) -> Self {
        Self { editable }
    }

    pub fn element(&self) -> &Element {
        &self.editable
    }

    /// Nearest ancestor whose computed overflow scrolls; `None` means the page.
    fn scroll_parent(&self) -> Option<Element> {
        let window = web_sys::window()?;
        let mut current = self.editable.parent_element();
        while let Some(element) = current {
            if let Ok(Some(style)) = window.get_computed_style(&element) {
                let overflow = style.get_property_value("overflow-y").unwrap_or_default();
                if matches!(overflow.as_str(), "auto" | "scroll") {
                    return Some(element);
                }
            }
            current = element.parent_element();
        }
        None
    }

    fn html_element(&self) -> Result<&HtmlElement> {
        self.editable
            .dyn_ref::<HtmlElement>()
            .ok_or(ControllerError::NotAnElement("editorNode"))
    }
}

impl EditableSurface for BrowserSurface {
    fn is_attached(&self) -> bool {
        self.editable.is_connected()
    }

    fn scroll_position(&self) -> ScrollPosition {
        match self.scroll_parent() {
            Some(parent) => {
                ScrollPosition::new(parent.scroll_left() as f64, parent.scroll_top() as f64)
            }
            None => web_sys::window()
                .map(|w| {
                    ScrollPosition::new(
                        w.page_x_offset().unwrap_or_default(),
                        w.page_y_offset().unwrap_or_default(),
                    )
                })
                .unwrap_or_default(),
        }
    }

    fn restore_scroll(&self, position: ScrollPosition) {
        match self.scroll_parent() {
            Some(parent) => {
                parent.set_scroll_left(position.x as i32);
                parent.set_scroll_top(position.y as i32);
            }
            None => {
                if let Some(window) = web_sys::window() {
                    window.scroll_to_with_x_and_y(position.x, position.y);
                }
            }
        }
    }

    fn focus(&self) -> Result<()> {
        self.html_element()?
            .focus()
            .map_err(|e| ControllerError::Dom(format!("focus failed: {:?}", e)))
    }

    fn blur(&self) -> Result<()> {
        self.html_element()?
            .blur()
            .map_err(|e| ControllerError::Dom(format!("blur failed: {:?}", e)))
    }

    /// Focus that moved to the body leaves a stale native range behind.
    fn release_selection(&self) {
        let Ok(document) = dom::document() else {
            return;
        };
        let focus_on_body = match (document.active_element(), document.body()) {
            (Some(active), Some(body)) => active.is_same_node(Some(body.as_ref())),
            (None, _) => true,
            _ => false,
        };
        if !focus_on_body {
            return;
        }
        if let Ok(Some(selection)) = document.get_selection() {
            let _ = selection.remove_all_ranges();
        }
    }
}
