//! Reentrancy guards.
//!
//! Small pieces of controller-owned mutable state that track physical
//! event-ordering hazards in the DOM. They are not domain data.

/// Balances nested `dragenter` / `dragleave` pairs.
///
/// Browsers fire enter/leave for every child element a drag payload crosses,
/// so a leave does not mean the payload left the surface. Only the
/// transition back to zero does.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DragCounter {
    count: u32,
}

impl DragCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn enter(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Returns true when this leave brought the count to exactly zero.
    ///
    /// A leave with no matching enter is ignored and returns false.
    pub fn leave(&mut self) -> bool {
        if self.count == 0 {
            tracing::warn!(
                target: "weaver::surface",
                "dragleave without matching dragenter"
            );
            return false;
        }
        self.count -= 1;
        self.count == 0
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// The controller's hazard-suppression state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReentrancyGuards {
    /// Raised while a render pass the controller itself provoked is in
    /// flight; selection events seen meanwhile are not user input.
    pub block_select_events: bool,
    pub drag: DragCounter,
    /// Remount counter. The rendering layer keys the contents subtree on it,
    /// so bumping it discards and rebuilds the subtree.
    pub contents_key: u32,
}

impl ReentrancyGuards {
    /// Bump the remount counter and return the new key.
    pub fn next_contents_key(&mut self) -> u32 {
        self.contents_key = self.contents_key.wrapping_add(1);
        self.contents_key
    }
}
