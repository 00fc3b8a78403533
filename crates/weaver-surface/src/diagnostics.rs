//! Selection diagnostics.
//!
//! Blocked selection events are recorded so suppression is observable, but
//! recording never changes behaviour.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use smol_str::SmolStr;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::state::SelectionState;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialise process-wide diagnostics. Idempotent.
///
/// Returns true only for the call that performed the initialisation.
pub fn ensure_initialized() -> bool {
    let first = INITIALIZED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok();
    if first {
        tracing::info!(
            target: "weaver::surface::diagnostics",
            "selection diagnostics initialized"
        );
    }
    first
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// A selection event dropped because selection events were suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSelectionEvent {
    /// DOM context is never recorded.
    pub anonymized_dom: SmolStr,
    /// JSON object; carries the captured stack trace.
    pub extra_params: String,
    /// JSON of the abstract selection at the time of the event.
    pub selection_state: String,
    pub timestamp_ms: u64,
}

impl BlockedSelectionEvent {
    /// Record `selection` now, with a stack trace taken by the caller.
    pub fn capture(selection: &SelectionState, stacktrace: &str) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::with_stacktrace(selection, stacktrace, timestamp_ms)
    }

    pub fn with_stacktrace(selection: &SelectionState, stacktrace: &str, timestamp_ms: u64) -> Self {
        let selection_state = serde_json::to_string(selection).unwrap_or_else(|e| {
            tracing::warn!(target: "weaver::surface::diagnostics", "selection not serializable: {e}");
            String::new()
        });
        let extra_params = serde_json::json!({ "stacktrace": stacktrace }).to_string();
        Self {
            anonymized_dom: SmolStr::new_static("N/A"),
            extra_params,
            selection_state,
            timestamp_ms,
        }
    }
}

/// Receives diagnostic records.
pub trait DiagnosticSink {
    fn blocked_selection_event(&mut self, record: &BlockedSelectionEvent);

    /// Stack trace for a record about to be sent to this sink.
    ///
    /// The default is a native backtrace, which is empty unless
    /// `RUST_BACKTRACE` is set and unsupported on wasm. Platform sinks
    /// override it.
    fn stacktrace(&self) -> String {
        Backtrace::capture().to_string()
    }
}

/// Logs records through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn blocked_selection_event(&mut self, record: &BlockedSelectionEvent) {
        tracing::debug!(
            target: "weaver::surface::diagnostics",
            anonymized_dom = %record.anonymized_dom,
            selection_state = %record.selection_state,
            extra_params = %record.extra_params,
            timestamp_ms = record.timestamp_ms,
            "blocked selection event"
        );
    }
}

/// Maximum number of records a `RecordBuffer` keeps.
const MAX_RECORDS: usize = 50;

/// Keeps the most recent records for bug reports. Clones share storage.
#[derive(Debug, Default, Clone)]
pub struct RecordBuffer {
    records: Rc<RefCell<VecDeque<BlockedSelectionEvent>>>,
    stack_capture: Option<fn() -> String>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take record stack traces from `capture` instead of a native backtrace.
    pub fn with_stack_capture(mut self, capture: fn() -> String) -> Self {
        self.stack_capture = Some(capture);
        self
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Snapshot of the buffered records, oldest first.
    pub fn records(&self) -> Vec<BlockedSelectionEvent> {
        self.records.borrow().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl DiagnosticSink for RecordBuffer {
    fn blocked_selection_event(&mut self, record: &BlockedSelectionEvent) {
        TracingSink.blocked_selection_event(record);
        let mut records = self.records.borrow_mut();
        if records.len() >= MAX_RECORDS {
            records.pop_front();
        }
        records.push_back(record.clone());
    }

    fn stacktrace(&self) -> String {
        match self.stack_capture {
            Some(capture) => capture(),
            None => Backtrace::capture().to_string(),
        }
    }
}
