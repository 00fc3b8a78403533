//! Work handlers schedule for after the browser has finished its own.
//!
//! The controller never owns a timer. Handlers queue tasks here; the host
//! drains them with `EditorController::take_deferred` and hands each back to
//! `EditorController::run_deferred` once `delay_ms` has elapsed.

use crate::platform::ScrollPosition;
use crate::state::EditorState;

/// Delay between `compositionend` and resolving the composed text. Some IMEs
/// fire one more `compositionstart` right after ending, which cancels it.
pub const RESOLVE_COMPOSITION_DELAY_MS: u32 = 20;

#[derive(Clone, Debug)]
pub enum DeferredKind {
    /// The native cut has mutated the DOM: remount, leave cut mode and
    /// commit the removal against the state captured at cut time.
    FinishCut {
        scroll: ScrollPosition,
        state: EditorState,
    },
    /// Resolve the composition session with this id, unless it already
    /// resolved or resumed composing.
    ResolveComposition { session: u32 },
}

#[derive(Clone, Debug)]
pub struct DeferredTask {
    pub delay_ms: u32,
    pub kind: DeferredKind,
}

impl DeferredTask {
    /// Runs on the next tick, after the browser's default action.
    pub fn finish_cut(scroll: ScrollPosition, state: EditorState) -> Self {
        Self {
            delay_ms: 0,
            kind: DeferredKind::FinishCut { scroll, state },
        }
    }

    pub fn resolve_composition(session: u32) -> Self {
        Self {
            delay_ms: RESOLVE_COMPOSITION_DELAY_MS,
            kind: DeferredKind::ResolveComposition { session },
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            DeferredKind::FinishCut { .. } => "finish_cut",
            DeferredKind::ResolveComposition { .. } => "resolve_composition",
        }
    }
}
