//! Diagnostic sink with JavaScript stack traces.

use wasm_bindgen::JsValue;
use weaver_surface::{BlockedSelectionEvent, DiagnosticSink, TracingSink};

/// Logs records through `tracing`, stamping them with the JS call stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserDiagnostics;

impl DiagnosticSink for BrowserDiagnostics {
    fn blocked_selection_event(&mut self, record: &BlockedSelectionEvent) {
        TracingSink.blocked_selection_event(record);
    }

    fn stacktrace(&self) -> String {
        js_stack()
    }
}

/// Stack of a freshly constructed JS `Error`, or empty if the engine has none.
pub fn js_stack() -> String {
    let error = js_sys::Error::new("");
    js_sys::Reflect::get(&error, &JsValue::from_str("stack"))
        .ok()
        .and_then(|stack| stack.as_string())
        .unwrap_or_default()
}
