//! What the rendering layer needs from the controller.
//!
//! Contents rendering itself is a collaborator (`ContentsRenderer`); this
//! module computes the inputs it is handed and the editable node's
//! attributes.

use smol_str::{SmolStr, format_smolstr};

use crate::config::{StyleMap, SurfaceOptions, TextAlignment};
use crate::state::EditorState;

/// Input for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    pub editor_state: &'a EditorState,
    pub editor_key: &'a str,
    /// Remount counter; part of the contents identity.
    pub contents_key: u32,
    pub options: &'a SurfaceOptions,
    /// Built-in inline styles overlaid by the host's custom map.
    pub style_map: &'a StyleMap,
    pub show_placeholder: bool,
}

impl RenderView<'_> {
    /// Identity of the contents subtree. A change means "rebuild from
    /// scratch", never "patch".
    pub fn contents_identity(&self) -> SmolStr {
        format_smolstr!("contents{}", self.contents_key)
    }

    pub fn placeholder_id(&self) -> SmolStr {
        placeholder_id(self.editor_key)
    }
}

/// Accessibility id of the placeholder element for an editor.
pub fn placeholder_id(editor_key: &str) -> SmolStr {
    format_smolstr!("placeholder-{editor_key}")
}

/// Placeholder text is shown only over an empty, non-composing document.
pub fn show_placeholder(options: &SurfaceOptions, state: &EditorState) -> bool {
    options.placeholder.is_some()
        && !state.is_in_composition_mode()
        && !state.content().has_text()
}

pub const ROOT_CLASS: &str = "weaver-surface-root";
pub const CONTAINER_CLASS: &str = "weaver-surface-container";
pub const CONTENT_CLASS: &str = "weaver-surface-content";

/// Classes and attributes for the root and editable nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceAttributes {
    pub root_classes: Vec<&'static str>,
    pub content_classes: Vec<&'static str>,
    /// Attributes to set on the editable node. Absent ones must be removed.
    pub attributes: Vec<(&'static str, String)>,
}

impl SurfaceAttributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Every attribute name `surface_attributes` may emit.
pub const MANAGED_ATTRIBUTES: &[&str] = &[
    "aria-activedescendant",
    "aria-autocomplete",
    "aria-controls",
    "aria-describedby",
    "aria-expanded",
    "aria-label",
    "aria-labelledby",
    "aria-multiline",
    "contenteditable",
    "data-testid",
    "role",
    "spellcheck",
    "tabindex",
];

/// Compute the editable node's attributes.
///
/// Interactive ARIA state is withheld while read-only, and `aria-expanded`
/// only applies to comboboxes.
pub fn surface_attributes(options: &SurfaceOptions, editor_key: &str) -> SurfaceAttributes {
    let read_only = options.read_only;
    let role = options.role.clone().unwrap_or_else(|| SmolStr::new_static("textbox"));

    let mut root_classes = vec![ROOT_CLASS];
    match options.text_alignment {
        Some(TextAlignment::Left) => root_classes.push("weaver-surface-align-left"),
        Some(TextAlignment::Center) => root_classes.push("weaver-surface-align-center"),
        Some(TextAlignment::Right) => root_classes.push("weaver-surface-align-right"),
        None => {}
    }

    let mut content_classes = Vec::new();
    if !read_only {
        // Keep in-browser translation from rewriting managed DOM.
        content_classes.push("notranslate");
    }
    content_classes.push(CONTENT_CLASS);

    let mut attributes: Vec<(&'static str, String)> = Vec::new();
    let mut push = |name: &'static str, value: Option<String>| {
        if let Some(value) = value {
            attributes.push((name, value));
        }
    };

    let interactive = |value: &Option<String>| if read_only { None } else { value.clone() };

    push(
        "aria-activedescendant",
        interactive(&options.aria_active_descendant_id),
    );
    push("aria-autocomplete", interactive(&options.aria_auto_complete));
    push("aria-controls", interactive(&options.aria_controls));
    push(
        "aria-describedby",
        Some(
            options
                .aria_described_by
                .clone()
                .unwrap_or_else(|| placeholder_id(editor_key).to_string()),
        ),
    );
    push(
        "aria-expanded",
        (!read_only && role == "combobox").then(|| options.aria_expanded.to_string()),
    );
    push("aria-label", options.aria_label.clone());
    push("aria-labelledby", options.aria_labelled_by.clone());
    push(
        "aria-multiline",
        options.aria_multiline.map(|m| m.to_string()),
    );
    push("contenteditable", Some((!read_only).to_string()));
    push("data-testid", options.test_id.clone());
    push("role", (!read_only).then(|| role.to_string()));
    push("spellcheck", Some(options.spell_check.to_string()));
    push("tabindex", options.tab_index.map(|t| t.to_string()));

    SurfaceAttributes {
        root_classes,
        content_classes,
        attributes,
    }
}
