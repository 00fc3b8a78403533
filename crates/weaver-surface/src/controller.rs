//! The interaction controller.
//!
//! `EditorController` sits between native surface events and the host's
//! immutable editor state. It routes events to the active mode's handlers,
//! keeps the cached state references the selection reconciler compares, and
//! drives the commit pipeline: handlers call `update`, the host answers with
//! the state it wants rendered, and the render pass is bracketed by
//! `will_update` / `did_update`.

use std::collections::VecDeque;

use smol_str::SmolStr;

use crate::config::{ControllerConfig, EditorProps, FeatureFlags, generate_editor_key};
use crate::deferred::{DeferredKind, DeferredTask};
use crate::diagnostics::{self, DiagnosticSink, TracingSink};
use crate::error::Result;
use crate::event::{EditorEvent, EventOutcome};
use crate::guards::ReentrancyGuards;
use crate::handlers::{self, composition::CompositionSession};
use crate::mode::{EventKind, Mode};
use crate::platform::{
    ContentsRenderer, EditableSurface, EditorHost, InputDelegate, NoInput, ScrollPosition,
    SelectionProbe,
};
use crate::registry::{HandlerSet, handlers_for};
use crate::render::{RenderView, SurfaceAttributes, show_placeholder, surface_attributes};
use crate::state::EditorState;

/// Everything the controller talks to but does not own the logic of.
pub struct Collaborators {
    pub surface: Box<dyn EditableSurface>,
    pub probe: Box<dyn SelectionProbe>,
    pub renderer: Box<dyn ContentsRenderer>,
    pub input: Box<dyn InputDelegate>,
    /// Receives committed states. Optional so a misconfigured host degrades
    /// to warnings instead of failing to construct.
    pub host: Option<Box<dyn EditorHost>>,
    pub diagnostics: Box<dyn DiagnosticSink>,
}

impl Collaborators {
    /// No host, no input handling, diagnostics to `tracing`.
    pub fn new(
        surface: impl EditableSurface + 'static,
        probe: impl SelectionProbe + 'static,
        renderer: impl ContentsRenderer + 'static,
    ) -> Self {
        Self {
            surface: Box::new(surface),
            probe: Box::new(probe),
            renderer: Box::new(renderer),
            input: Box::new(NoInput),
            host: None,
            diagnostics: Box::new(TracingSink),
        }
    }

    pub fn with_host(mut self, host: impl EditorHost + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    pub fn with_input(mut self, input: impl InputDelegate + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }
}

pub struct EditorController {
    pub(crate) props: EditorProps,
    flags: FeatureFlags,
    editor_key: SmolStr,
    mode: Option<Mode>,
    handlers: Option<&'static HandlerSet>,
    /// Most recent state the controller computed or was handed.
    pub(crate) latest: EditorState,
    /// State of the last completed render pass.
    latest_committed: EditorState,
    pub(crate) guards: ReentrancyGuards,
    pub(crate) internal_drag: bool,
    clipboard: Option<String>,
    pub(crate) composition: CompositionSession,
    deferred: VecDeque<DeferredTask>,
    pub(crate) collab: Collaborators,
}

impl EditorController {
    /// Create an unmounted controller. Events are ignored until `did_mount`.
    pub fn new(props: EditorProps, config: ControllerConfig, collab: Collaborators) -> Self {
        if collab.host.is_none() && cfg!(debug_assertions) {
            tracing::warn!(
                target: "weaver::surface",
                "controller created without a host; committed states will be dropped"
            );
        }
        let editor_key = config.editor_key.unwrap_or_else(generate_editor_key);
        let state = props.editor_state.clone();
        Self {
            props,
            flags: config.flags,
            editor_key,
            mode: None,
            handlers: None,
            latest: state.clone(),
            latest_committed: state,
            guards: ReentrancyGuards::default(),
            internal_drag: false,
            clipboard: None,
            composition: CompositionSession::default(),
            deferred: VecDeque::new(),
            collab,
        }
    }

    /// Initial render pass followed by `did_mount`.
    pub fn mount(&mut self) -> Result<()> {
        self.render()?;
        self.did_mount();
        Ok(())
    }

    pub fn did_mount(&mut self) {
        if self.flags.selection_diagnostics {
            diagnostics::ensure_initialized();
        }
        if self.flags.defer_latest_to_commit {
            self.latest = self.props.editor_state.clone();
        }
        self.set_mode(Mode::Edit);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != Some(mode) {
            tracing::debug!(
                target: "weaver::surface",
                from = self.mode.map(|m| m.as_str()),
                to = %mode,
                "mode change"
            );
        }
        self.mode = Some(mode);
        self.handlers = handlers_for(mode);
    }

    pub fn exit_current_mode(&mut self) {
        self.set_mode(Mode::Edit);
    }

    /// Route one native event to the active mode.
    ///
    /// Drag enter/leave feed the drag counter regardless of mode or
    /// read-only. Everything else is ignored while read-only or when the
    /// active mode has no handler for it.
    pub fn dispatch(&mut self, event: &EditorEvent) -> Result<EventOutcome> {
        match event.kind {
            EventKind::DragEnter => {
                self.drag_enter();
                return Ok(EventOutcome::PassThrough);
            }
            EventKind::DragLeave => {
                self.drag_leave();
                return Ok(EventOutcome::PassThrough);
            }
            _ => {}
        }

        match self.invoke(event)? {
            Some(outcome) => {
                if self.flags.synchronous_flush {
                    self.flush_pending()?;
                }
                Ok(outcome)
            }
            None => Ok(EventOutcome::PassThrough),
        }
    }

    /// Run the active mode's handler, if any, without flushing.
    pub(crate) fn invoke(&mut self, event: &EditorEvent) -> Result<Option<EventOutcome>> {
        if self.props.options.read_only {
            tracing::trace!(target: "weaver::surface", event = %event.kind, "read-only; ignored");
            return Ok(None);
        }
        let Some(handler) = self.handlers.and_then(|set| set.get(event.kind)) else {
            tracing::trace!(
                target: "weaver::surface",
                event = %event.kind,
                mode = self.mode.map(|m| m.as_str()),
                "no handler"
            );
            return Ok(None);
        };
        tracing::trace!(
            target: "weaver::surface",
            event = %event.kind,
            mode = self.mode.map(|m| m.as_str()),
            "dispatch"
        );
        handler(self, event).map(Some)
    }

    pub fn drag_enter(&mut self) {
        self.guards.drag.enter();
    }

    /// Leaves drag mode once every nested enter has been balanced.
    pub fn drag_leave(&mut self) {
        if self.guards.drag.leave() && self.mode.is_some() {
            self.exit_current_mode();
        }
    }

    /// Hand `next` to the host. The only way handlers change state.
    pub fn update(&mut self, next: EditorState) {
        self.latest = next.clone();
        match self.collab.host.as_mut() {
            Some(host) => host.on_change(next),
            None => {
                if cfg!(debug_assertions) {
                    tracing::warn!(
                        target: "weaver::surface",
                        "no host to receive a committed state; it was dropped"
                    );
                }
            }
        }
    }

    /// Called before a render pass with the props it will render.
    pub fn will_update(&mut self, next: EditorProps) {
        if self.flags.block_select_events {
            self.guards.block_select_events = true;
        }
        if !self.flags.defer_latest_to_commit {
            self.latest = next.editor_state.clone();
        }
        self.props = next;
    }

    /// Called once the render pass is observably complete.
    pub fn did_update(&mut self) {
        self.guards.block_select_events = false;
        if self.flags.defer_latest_to_commit {
            self.latest = self.props.editor_state.clone();
        }
        self.latest_committed = self.props.editor_state.clone();
    }

    /// A full render pass with new props.
    ///
    /// If rendering fails `did_update` is not reached and selection events
    /// stay suppressed until the next successful pass.
    pub fn commit_props(&mut self, props: EditorProps) -> Result<()> {
        self.will_update(props);
        self.render()?;
        self.did_update();
        Ok(())
    }

    /// Render `state` with the current options.
    pub fn set_editor_state(&mut self, state: EditorState) -> Result<()> {
        let props = self.props.with_state(state);
        self.commit_props(props)
    }

    /// Render every state the host has queued since the last flush.
    ///
    /// Returns how many render passes ran.
    pub fn flush_pending(&mut self) -> Result<usize> {
        let mut passes = 0;
        while let Some(next) = self.collab.host.as_mut().and_then(|h| h.take_next_state()) {
            self.set_editor_state(next)?;
            passes += 1;
        }
        if passes > 0 {
            tracing::debug!(target: "weaver::surface", passes, "flushed pending states");
        }
        Ok(passes)
    }

    fn render(&mut self) -> Result<()> {
        let style_map = self.props.options.custom_style_map.over_defaults();
        let view = RenderView {
            editor_state: &self.props.editor_state,
            editor_key: &self.editor_key,
            contents_key: self.guards.contents_key,
            options: &self.props.options,
            style_map: &style_map,
            show_placeholder: show_placeholder(&self.props.options, &self.props.editor_state),
        };
        self.collab.renderer.render(&view)
    }

    /// Focus the surface, keeping the scroll position.
    ///
    /// When the editor did not have focus the current selection is forced
    /// back in, since some browsers put the caret at the first character.
    /// A detached surface is ignored.
    pub fn focus(&mut self, scroll: Option<ScrollPosition>) -> Result<()> {
        let surface = &self.collab.surface;
        if !surface.is_attached() {
            tracing::debug!(target: "weaver::surface", "focus on a detached surface ignored");
            return Ok(());
        }
        let state = self.props.editor_state.clone();
        let position = scroll.unwrap_or_else(|| surface.scroll_position());
        surface.focus()?;
        surface.restore_scroll(position);

        if !state.has_focus() {
            let selection = state.selection().clone().with_has_focus(true);
            self.update(state.force_selection(selection));
        }
        Ok(())
    }

    pub fn blur(&mut self) -> Result<()> {
        self.collab.surface.blur()
    }

    /// Rebuild the contents subtree from state, then refocus.
    ///
    /// Used after the browser mutated the DOM on its own (native cut, IME).
    pub fn restore_editor_dom(&mut self, scroll: Option<ScrollPosition>) -> Result<()> {
        let key = self.guards.next_contents_key();
        tracing::debug!(target: "weaver::surface", contents_key = key, "remounting contents");
        self.commit_props(self.props.clone())?;
        self.focus(scroll)
    }

    pub fn set_clipboard(&mut self, fragment: Option<String>) {
        self.clipboard = fragment;
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    pub(crate) fn defer(&mut self, task: DeferredTask) {
        tracing::trace!(
            target: "weaver::surface",
            task = task.name(),
            delay_ms = task.delay_ms,
            "deferred"
        );
        self.deferred.push_back(task);
    }

    /// Drain tasks queued by handlers, in queue order.
    pub fn take_deferred(&mut self) -> Vec<DeferredTask> {
        self.deferred.drain(..).collect()
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Run a task previously returned by `take_deferred`.
    pub fn run_deferred(&mut self, task: DeferredTask) -> Result<()> {
        tracing::trace!(target: "weaver::surface", task = task.name(), "running deferred");
        match task.kind {
            DeferredKind::FinishCut { scroll, state } => {
                handlers::edit::finish_cut(self, scroll, &state)?
            }
            DeferredKind::ResolveComposition { session } => {
                handlers::composition::resolve_deferred(self, session)?
            }
        }
        if self.flags.synchronous_flush {
            self.flush_pending()?;
        }
        Ok(())
    }

    /// Active mode; `None` before mount.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// State most recently supplied by the host.
    pub fn editor_state(&self) -> &EditorState {
        &self.props.editor_state
    }

    pub fn latest_editor_state(&self) -> &EditorState {
        &self.latest
    }

    pub fn latest_committed_editor_state(&self) -> &EditorState {
        &self.latest_committed
    }

    pub fn props(&self) -> &EditorProps {
        &self.props
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    pub fn is_read_only(&self) -> bool {
        self.props.options.read_only
    }

    pub fn editor_key(&self) -> &str {
        &self.editor_key
    }

    pub fn contents_key(&self) -> u32 {
        self.guards.contents_key
    }

    pub fn drag_count(&self) -> u32 {
        self.guards.drag.count()
    }

    pub fn is_blocking_select_events(&self) -> bool {
        self.guards.block_select_events
    }

    /// The current drag started inside this surface.
    pub fn is_internal_drag(&self) -> bool {
        self.internal_drag
    }

    pub fn composition(&self) -> &CompositionSession {
        &self.composition
    }

    pub fn surface_attributes(&self) -> SurfaceAttributes {
        surface_attributes(&self.props.options, &self.editor_key)
    }
}
