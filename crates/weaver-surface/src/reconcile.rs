//! Selection reconciliation.
//!
//! Native selection events fire both for user-driven changes and for DOM
//! mutations the controller caused itself. For each event these functions
//! decide whether to ignore it, adopt the DOM's selection (accept), or push
//! the abstract selection back into the DOM (force). Everything here is pure;
//! the edit-mode select handler wires it to the controller.

use crate::error::Result;
use crate::platform::{DocumentSelection, SelectionProbe};
use crate::state::{EditorState, SelectionState};

/// Why a selection event was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Selection events are suppressed around a controller-provoked render.
    Suppressed,
    /// The event was produced against a state that has been superseded.
    Stale,
}

/// Outcome of reconciling one selection event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionDecision {
    Drop(DropReason),
    /// DOM and abstract selection agree.
    Unchanged,
    /// Adopt the DOM selection.
    Accept(SelectionState),
    /// Keep this (abstract) selection and write it back into the DOM.
    Force(SelectionState),
}

/// The state references the staleness guard compares.
#[derive(Clone, Copy, Debug)]
pub struct SelectionGuard<'a> {
    pub block_select_events: bool,
    /// Most recent state the controller computed or was handed.
    pub latest: &'a EditorState,
    /// State the host most recently supplied for rendering.
    pub supplied: &'a EditorState,
}

impl SelectionGuard<'_> {
    /// Decide whether the event must be dropped before probing the DOM.
    pub fn check(&self) -> Option<DropReason> {
        if self.block_select_events {
            Some(DropReason::Suppressed)
        } else if !EditorState::ptr_eq(self.latest, self.supplied) {
            Some(DropReason::Stale)
        } else {
            None
        }
    }
}

/// Compare a DOM-derived candidate against the abstract selection.
pub fn decide(current: &SelectionState, candidate: DocumentSelection) -> SelectionDecision {
    if candidate.selection == *current {
        return SelectionDecision::Unchanged;
    }
    if candidate.needs_recovery {
        SelectionDecision::Force(current.clone())
    } else {
        SelectionDecision::Accept(candidate.selection)
    }
}

/// The next state a decision produces, if it produces one.
pub fn apply(state: &EditorState, decision: &SelectionDecision) -> Option<EditorState> {
    match decision {
        SelectionDecision::Accept(selection) => Some(state.accept_selection(selection.clone())),
        SelectionDecision::Force(selection) => Some(state.force_selection(selection.clone())),
        SelectionDecision::Drop(_) | SelectionDecision::Unchanged => None,
    }
}

/// Reconcile one selection event against the supplied state.
///
/// The probe is only consulted when the guard lets the event through.
pub fn reconcile(guard: SelectionGuard<'_>, probe: &dyn SelectionProbe) -> Result<SelectionDecision> {
    if let Some(reason) = guard.check() {
        return Ok(SelectionDecision::Drop(reason));
    }
    let candidate = probe.document_selection(guard.supplied)?;
    tracing::trace!(
        target: "weaver::surface::selection",
        needs_recovery = candidate.needs_recovery,
        anchor_key = %candidate.selection.anchor_key,
        anchor_offset = candidate.selection.anchor_offset,
        focus_key = %candidate.selection.focus_key,
        focus_offset = candidate.selection.focus_offset,
        "probed document selection"
    );
    Ok(decide(guard.supplied.selection(), candidate))
}
