//! Controller configuration and host-supplied props.
//!
//! Everything here deserializes with defaults, so a host can hand over a
//! partial JSON/JS object and get sensible behaviour.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::state::EditorState;

/// Switches for legacy-compatibility behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    /// Suppress selection events between `will_update` and `did_update`.
    pub block_select_events: bool,
    /// Move `latest_editor_state` forward at commit time (`did_mount` /
    /// `did_update`) instead of at `will_update`.
    pub defer_latest_to_commit: bool,
    /// Flush every update a handler schedules before the dispatch returns.
    pub synchronous_flush: bool,
    /// Initialise selection diagnostics once per process at mount. Blocked
    /// selection events reach the diagnostic sink whether or not this is set.
    pub selection_diagnostics: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            block_select_events: true,
            defer_latest_to_commit: false,
            synchronous_flush: false,
            selection_diagnostics: false,
        }
    }
}

/// Per-instance controller configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Key disambiguating several editors on one page. Generated when absent.
    pub editor_key: Option<SmolStr>,
    pub flags: FeatureFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDirectionality {
    #[serde(rename = "LTR")]
    Ltr,
    #[serde(rename = "RTL")]
    Rtl,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

/// CSS declarations for one inline style, property → value.
pub type InlineStyle = BTreeMap<SmolStr, SmolStr>;

/// Inline style name → CSS declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap(pub BTreeMap<SmolStr, InlineStyle>);

impl StyleMap {
    /// The built-in inline styles.
    pub fn defaults() -> Self {
        let entry = |pairs: &[(&str, &str)]| -> InlineStyle {
            pairs
                .iter()
                .map(|(k, v)| (SmolStr::new(k), SmolStr::new(v)))
                .collect()
        };

        let mut map = BTreeMap::new();
        map.insert(SmolStr::new("BOLD"), entry(&[("fontWeight", "bold")]));
        map.insert(
            SmolStr::new("CODE"),
            entry(&[("fontFamily", "monospace"), ("wordWrap", "break-word")]),
        );
        map.insert(SmolStr::new("ITALIC"), entry(&[("fontStyle", "italic")]));
        map.insert(
            SmolStr::new("STRIKETHROUGH"),
            entry(&[("textDecoration", "line-through")]),
        );
        map.insert(
            SmolStr::new("UNDERLINE"),
            entry(&[("textDecoration", "underline")]),
        );
        StyleMap(map)
    }

    /// Defaults overlaid by `self`. A custom entry replaces the default
    /// entry of the same name wholesale.
    pub fn over_defaults(&self) -> StyleMap {
        let mut merged = StyleMap::defaults();
        for (name, style) in &self.0 {
            merged.0.insert(name.clone(), style.clone());
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<&InlineStyle> {
        self.0.get(name)
    }
}

/// Presentation and accessibility options supplied with each render.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceOptions {
    /// Suppresses all event handling and makes the node non-editable.
    pub read_only: bool,
    pub placeholder: Option<String>,
    pub text_alignment: Option<TextAlignment>,
    pub text_directionality: Option<TextDirectionality>,
    pub spell_check: bool,
    /// ARIA role; `textbox` when absent.
    pub role: Option<SmolStr>,
    pub aria_active_descendant_id: Option<String>,
    pub aria_auto_complete: Option<String>,
    pub aria_controls: Option<String>,
    pub aria_described_by: Option<String>,
    /// Only rendered for the `combobox` role.
    pub aria_expanded: bool,
    pub aria_label: Option<String>,
    pub aria_labelled_by: Option<String>,
    pub aria_multiline: Option<bool>,
    pub tab_index: Option<i32>,
    pub test_id: Option<String>,
    pub custom_style_map: StyleMap,
}

/// Everything the host supplies on each render: the state plus options.
#[derive(Clone, Debug)]
pub struct EditorProps {
    pub editor_state: EditorState,
    pub options: SurfaceOptions,
}

impl EditorProps {
    pub fn new(editor_state: EditorState) -> Self {
        Self {
            editor_state,
            options: SurfaceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SurfaceOptions) -> Self {
        self.options = options;
        self
    }

    /// Same options, different state.
    pub fn with_state(&self, editor_state: EditorState) -> Self {
        Self {
            editor_state,
            options: self.options.clone(),
        }
    }
}

static NEXT_EDITOR_KEY: AtomicU64 = AtomicU64::new(1);

/// Generate an editor key unique within this process.
pub fn generate_editor_key() -> SmolStr {
    let mut n = NEXT_EDITOR_KEY.fetch_add(1, Ordering::Relaxed);
    const DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 32) as usize] as char);
        n /= 32;
    }
    let digits: String = digits.into_iter().rev().collect();
    smol_str::format_smolstr!("e{digits}")
}
