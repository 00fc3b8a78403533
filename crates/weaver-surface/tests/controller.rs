//! Controller behaviour driven through recording fakes of every collaborator.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weaver_surface::{
    ChangeQueue, Collaborators, ContentsRenderer, ControllerConfig, ControllerError,
    DeferredKind, DocumentSelection, EditableSurface, EditorController, EditorEvent, EditorProps,
    EditorState, EventKind, EventOutcome, FeatureFlags, InputDelegate, InputResponse, Mode,
    RecordBuffer, RenderView, ScrollPosition, SelectionProbe, SelectionState, SmolStr,
    PlainTextInput, SurfaceOptions, TextBlock, TextContent, diagnostics, document_text,
};

// === Fakes ===

struct Rendered {
    state: EditorState,
    contents_key: u32,
    identity: SmolStr,
    show_placeholder: bool,
}

#[derive(Default)]
struct Log {
    changes: Vec<EditorState>,
    renders: Vec<Rendered>,
    focus_calls: usize,
    blur_calls: usize,
    released: usize,
    restored: Vec<ScrollPosition>,
    probe_calls: usize,
}

type SharedLog = Rc<RefCell<Log>>;
type ProbeScript = Rc<RefCell<Option<weaver_surface::Result<DocumentSelection>>>>;

struct FakeSurface {
    log: SharedLog,
    attached: Rc<Cell<bool>>,
    scroll: ScrollPosition,
}

impl EditableSurface for FakeSurface {
    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.scroll
    }

    fn restore_scroll(&self, position: ScrollPosition) {
        self.log.borrow_mut().restored.push(position);
    }

    fn focus(&self) -> weaver_surface::Result<()> {
        self.log.borrow_mut().focus_calls += 1;
        Ok(())
    }

    fn blur(&self) -> weaver_surface::Result<()> {
        self.log.borrow_mut().blur_calls += 1;
        Ok(())
    }

    fn release_selection(&self) {
        self.log.borrow_mut().released += 1;
    }
}

/// Returns the scripted candidate, or agrees with the state when unscripted.
struct FakeProbe {
    log: SharedLog,
    next: ProbeScript,
}

impl SelectionProbe for FakeProbe {
    fn document_selection(&self, state: &EditorState) -> weaver_surface::Result<DocumentSelection> {
        self.log.borrow_mut().probe_calls += 1;
        match self.next.borrow().clone() {
            Some(result) => result,
            None => Ok(DocumentSelection::clean(state.selection().clone())),
        }
    }
}

struct FakeRenderer {
    log: SharedLog,
    fail: Rc<Cell<bool>>,
}

impl ContentsRenderer for FakeRenderer {
    fn render(&mut self, view: &RenderView<'_>) -> weaver_surface::Result<()> {
        if self.fail.get() {
            return Err(ControllerError::Render("renderer unavailable".to_string()));
        }
        self.log.borrow_mut().renders.push(Rendered {
            state: view.editor_state.clone(),
            contents_key: view.contents_key,
            identity: view.contents_identity(),
            show_placeholder: view.show_placeholder,
        });
        Ok(())
    }
}

#[derive(Default)]
struct InputLog {
    key_downs: Vec<SmolStr>,
    drops: Vec<bool>,
    composed: Vec<String>,
}

/// Single-block text editing: printable keys insert, drops insert the
/// transfer text, cut removes the selection.
struct ScriptedInput {
    log: Rc<RefCell<InputLog>>,
}

fn first_block(state: &EditorState) -> TextBlock {
    state
        .content()
        .as_any()
        .downcast_ref::<TextContent>()
        .and_then(|c| c.blocks().first().cloned())
        .unwrap_or(TextBlock {
            key: SmolStr::new("b0"),
            text: String::new(),
        })
}

fn replace_selection(state: &EditorState, insert: &str) -> EditorState {
    let block = first_block(state);
    let selection = state.selection();
    let chars: Vec<char> = block.text.chars().collect();
    let start = selection.start_offset().min(chars.len());
    let end = selection.end_offset().min(chars.len());
    let text: String = chars[..start]
        .iter()
        .copied()
        .chain(insert.chars())
        .chain(chars[end..].iter().copied())
        .collect();
    let caret = start + insert.chars().count();
    let content = TextContent::from_blocks([TextBlock {
        key: block.key.clone(),
        text,
    }]);
    state.push_content(
        Rc::new(content),
        SelectionState::collapsed(block.key, caret).with_has_focus(true),
    )
}

fn block_text(state: &EditorState) -> String {
    first_block(state).text
}

impl InputDelegate for ScriptedInput {
    fn key_down(&mut self, state: &EditorState, event: &EditorEvent) -> InputResponse {
        let key = event.key.clone().unwrap_or_default();
        self.log.borrow_mut().key_downs.push(key.clone());
        if key.chars().count() == 1 {
            InputResponse::Commit(replace_selection(state, &key))
        } else {
            InputResponse::PassThrough
        }
    }

    fn drop_payload(
        &mut self,
        state: &EditorState,
        event: &EditorEvent,
        internal: bool,
    ) -> InputResponse {
        self.log.borrow_mut().drops.push(internal);
        let text = event.transfer_text.clone().unwrap_or_default();
        InputResponse::Commit(replace_selection(state, &text))
    }

    fn copy_fragment(&mut self, state: &EditorState) -> Option<String> {
        let selection = state.selection();
        let text: String = first_block(state)
            .text
            .chars()
            .skip(selection.start_offset())
            .take(selection.end_offset() - selection.start_offset())
            .collect();
        Some(text)
    }

    fn remove_fragment(&mut self, state: &EditorState) -> Option<EditorState> {
        Some(replace_selection(state, ""))
    }

    fn commit_composition(&mut self, state: &EditorState, text: &str) -> Option<EditorState> {
        self.log.borrow_mut().composed.push(text.to_string());
        Some(replace_selection(state, text))
    }
}

// === Harness ===

struct Harness {
    controller: EditorController,
    log: SharedLog,
    probe: ProbeScript,
    input: Rc<RefCell<InputLog>>,
    records: RecordBuffer,
    attached: Rc<Cell<bool>>,
    render_fails: Rc<Cell<bool>>,
}

const SCROLL: ScrollPosition = ScrollPosition { x: 0.0, y: 120.0 };

fn build(state: EditorState, options: SurfaceOptions, flags: FeatureFlags) -> Harness {
    let log = SharedLog::default();
    let probe = ProbeScript::default();
    let input = Rc::new(RefCell::new(InputLog::default()));
    let records = RecordBuffer::new().with_stack_capture(|| "at on_select".to_string());
    let attached = Rc::new(Cell::new(true));
    let render_fails = Rc::new(Cell::new(false));

    let observer = log.clone();
    let host = ChangeQueue::with_observer(move |s| observer.borrow_mut().changes.push(s.clone()));

    let collab = Collaborators::new(
        FakeSurface {
            log: log.clone(),
            attached: attached.clone(),
            scroll: SCROLL,
        },
        FakeProbe {
            log: log.clone(),
            next: probe.clone(),
        },
        FakeRenderer {
            log: log.clone(),
            fail: render_fails.clone(),
        },
    )
    .with_host(host)
    .with_input(ScriptedInput {
        log: input.clone(),
    })
    .with_diagnostics(records.clone());

    let config = ControllerConfig {
        editor_key: Some(SmolStr::new("test")),
        flags,
    };
    let props = EditorProps::new(state).with_options(options);
    Harness {
        controller: EditorController::new(props, config, collab),
        log,
        probe,
        input,
        records,
        attached,
        render_fails,
    }
}

fn mounted_with(state: EditorState, options: SurfaceOptions, flags: FeatureFlags) -> Harness {
    let mut h = build(state, options, flags);
    h.controller.mount().unwrap();
    h
}

fn mounted(state: EditorState) -> Harness {
    mounted_with(state, SurfaceOptions::default(), FeatureFlags::default())
}

fn focused(text: &str, selection: SelectionState) -> EditorState {
    EditorState::from_text(text).accept_selection(selection.with_has_focus(true))
}

impl Harness {
    fn fire(&mut self, kind: EventKind) -> EventOutcome {
        self.controller.dispatch(&EditorEvent::new(kind)).unwrap()
    }

    fn fire_event(&mut self, event: EditorEvent) -> EventOutcome {
        self.controller.dispatch(&event).unwrap()
    }

    fn dom_selection(&self, candidate: DocumentSelection) {
        *self.probe.borrow_mut() = Some(Ok(candidate));
    }

    fn changes(&self) -> usize {
        self.log.borrow().changes.len()
    }

    fn last_change(&self) -> EditorState {
        self.log
            .borrow()
            .changes
            .last()
            .cloned()
            .expect("a committed state")
    }

    fn renders(&self) -> usize {
        self.log.borrow().renders.len()
    }

    fn run_all_deferred(&mut self) {
        for task in self.controller.take_deferred() {
            self.controller.run_deferred(task).unwrap();
        }
    }
}

fn routed_kinds() -> impl Iterator<Item = EventKind> {
    EventKind::ALL
        .into_iter()
        .filter(|k| !matches!(k, EventKind::DragEnter | EventKind::DragLeave))
}

// === Lifecycle ===

#[test]
fn test_events_ignored_before_mount() {
    let mut h = build(
        EditorState::from_text("hello"),
        SurfaceOptions::default(),
        FeatureFlags::default(),
    );
    assert_eq!(h.controller.mode(), None);

    h.dom_selection(DocumentSelection::clean(SelectionState::collapsed("b0", 3)));
    for kind in routed_kinds() {
        assert_eq!(h.fire(kind), EventOutcome::PassThrough);
    }
    assert_eq!(h.changes(), 0);
    assert_eq!(h.log.borrow().probe_calls, 0);
    assert_eq!(h.controller.mode(), None);
}

#[test]
fn test_mount_renders_and_enters_edit() {
    let h = mounted(EditorState::from_text("hello"));
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert_eq!(h.renders(), 1);

    let log = h.log.borrow();
    assert_eq!(log.renders[0].contents_key, 0);
    assert_eq!(log.renders[0].identity, "contents0");
    assert!(EditorState::ptr_eq(
        h.controller.latest_committed_editor_state(),
        h.controller.editor_state()
    ));
}

#[test]
fn test_mount_initializes_diagnostics_when_enabled() {
    let flags = FeatureFlags {
        selection_diagnostics: true,
        ..FeatureFlags::default()
    };
    let _h = mounted_with(EditorState::from_text(""), SurfaceOptions::default(), flags);
    assert!(diagnostics::is_initialized());
}

#[test]
fn test_render_failure_is_fatal() {
    let mut h = build(
        EditorState::from_text("hello"),
        SurfaceOptions::default(),
        FeatureFlags::default(),
    );
    h.render_fails.set(true);
    assert_eq!(
        h.controller.mount(),
        Err(ControllerError::Render("renderer unavailable".to_string()))
    );
    assert_eq!(h.controller.mode(), None);
}

#[test]
fn test_placeholder_visibility_reaches_renderer() {
    let options = SurfaceOptions {
        placeholder: Some("Write".to_string()),
        ..SurfaceOptions::default()
    };
    let mut h = mounted_with(EditorState::from_text(""), options, FeatureFlags::default());
    assert!(h.log.borrow().renders[0].show_placeholder);

    h.controller
        .set_editor_state(EditorState::from_text("words"))
        .unwrap();
    assert!(!h.log.borrow().renders[1].show_placeholder);
}

#[test]
fn test_surface_attributes_use_editor_key() {
    let h = mounted(EditorState::from_text(""));
    let attrs = h.controller.surface_attributes();
    assert_eq!(attrs.get("aria-describedby"), Some("placeholder-test"));
    assert_eq!(attrs.get("contenteditable"), Some("true"));
}

// === Selection reconciliation ===

#[test]
fn test_accepts_clean_dom_selection() {
    let mut h = mounted(focused("hello world", SelectionState::collapsed("b0", 0)));
    let dom = SelectionState::new("b0", 0, "b0", 5).with_has_focus(true);
    h.dom_selection(DocumentSelection::clean(dom.clone()));

    h.fire(EventKind::Select);

    assert_eq!(h.changes(), 1);
    let next = h.last_change();
    assert_eq!(next.selection(), &dom);
    assert!(!next.must_force_selection());
    assert!(EditorState::ptr_eq(&next, h.controller.latest_editor_state()));
}

#[test]
fn test_forces_abstract_selection_when_recovery_needed() {
    let original = SelectionState::collapsed("b0", 4);
    let mut h = mounted(focused("hello world", original.clone()));
    h.dom_selection(DocumentSelection::recovering(SelectionState::collapsed(
        "b0", 0,
    )));

    h.fire(EventKind::MouseUp);

    let next = h.last_change();
    assert_eq!(next.selection(), &original.with_has_focus(true));
    assert!(next.must_force_selection());
}

#[test]
fn test_forced_selection_keeps_missing_focus() {
    let original = SelectionState::collapsed("b0", 2);
    let mut h = mounted(EditorState::from_text("hello world").accept_selection(original.clone()));
    h.dom_selection(DocumentSelection::recovering(SelectionState::collapsed(
        "b0", 9,
    )));

    h.fire(EventKind::MouseUp);

    let next = h.last_change();
    assert_eq!(next.selection(), &original);
    assert!(!next.has_focus());
    assert!(next.must_force_selection());
}

#[test]
fn test_matching_selection_commits_nothing() {
    let mut h = mounted(focused("hello", SelectionState::collapsed("b0", 2)));
    h.fire(EventKind::KeyUp);
    assert_eq!(h.log.borrow().probe_calls, 1);
    assert_eq!(h.changes(), 0);
}

#[test]
fn test_probe_failure_terminates_event() {
    let mut h = mounted(EditorState::from_text("hello"));
    *h.probe.borrow_mut() = Some(Err(ControllerError::MissingEditorNode));
    assert_eq!(
        h.controller.dispatch(&EditorEvent::new(EventKind::Select)),
        Err(ControllerError::MissingEditorNode)
    );
    assert_eq!(h.changes(), 0);
}

#[test]
fn test_selection_against_superseded_state_is_dropped() {
    let mut h = mounted(focused("hello", SelectionState::collapsed("b0", 5)));

    // A keystroke moves latest ahead of what the host has supplied.
    h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("!"));
    assert_eq!(h.changes(), 1);
    assert!(!EditorState::ptr_eq(
        h.controller.latest_editor_state(),
        h.controller.editor_state()
    ));

    h.dom_selection(DocumentSelection::clean(
        SelectionState::collapsed("b0", 1).with_has_focus(true),
    ));
    h.fire(EventKind::Select);
    assert_eq!(h.changes(), 1);
    assert_eq!(h.log.borrow().probe_calls, 0);

    // Once the host has caught up the same event is honored.
    assert_eq!(h.controller.flush_pending().unwrap(), 1);
    h.fire(EventKind::Select);
    assert_eq!(h.changes(), 2);
    assert_eq!(h.last_change().selection().anchor_offset, 1);
}

#[test]
fn test_staleness_across_queued_states() {
    let mut h = mounted(focused("", SelectionState::collapsed("b0", 0)));
    h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("a"));
    h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("b"));
    h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("c"));
    assert_eq!(block_text(h.controller.latest_editor_state()), "abc");

    h.dom_selection(DocumentSelection::clean(SelectionState::collapsed("b0", 0)));
    h.fire(EventKind::Select);
    assert_eq!(h.changes(), 3);

    assert_eq!(h.controller.flush_pending().unwrap(), 3);
    assert_eq!(block_text(h.controller.editor_state()), "abc");
    assert!(EditorState::ptr_eq(
        h.controller.latest_editor_state(),
        h.controller.editor_state()
    ));
    h.fire(EventKind::Select);
    assert_eq!(h.changes(), 4);
}

#[test]
fn test_blocked_selection_event_is_recorded() {
    let mut h = mounted(focused("hello", SelectionState::collapsed("b0", 2)));
    let props = h.controller.props().clone();
    h.controller.will_update(props);
    assert!(h.controller.is_blocking_select_events());

    h.dom_selection(DocumentSelection::clean(
        SelectionState::collapsed("b0", 4).with_has_focus(true),
    ));
    h.fire(EventKind::Select);

    assert_eq!(h.changes(), 0);
    assert_eq!(h.log.borrow().probe_calls, 0);
    let records = h.records.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].anonymized_dom, "N/A");
    assert!(records[0].selection_state.contains(r#""anchorOffset":2"#));
    assert_eq!(records[0].extra_params, r#"{"stacktrace":"at on_select"}"#);

    h.controller.did_update();
    assert!(!h.controller.is_blocking_select_events());
    h.fire(EventKind::Select);
    assert_eq!(h.changes(), 1);
    assert_eq!(h.records.len(), 1);
}

#[test]
fn test_blocking_can_be_disabled() {
    let flags = FeatureFlags {
        block_select_events: false,
        ..FeatureFlags::default()
    };
    let mut h = mounted_with(
        focused("hello", SelectionState::collapsed("b0", 2)),
        SurfaceOptions::default(),
        flags,
    );
    let props = h.controller.props().clone();
    h.controller.will_update(props);
    assert!(!h.controller.is_blocking_select_events());

    h.dom_selection(DocumentSelection::clean(
        SelectionState::collapsed("b0", 4).with_has_focus(true),
    ));
    h.fire(EventKind::Select);
    assert_eq!(h.changes(), 1);
    assert!(h.records.is_empty());
}

// === Commit pipeline ===

#[test]
fn test_committed_state_moves_only_in_did_update() {
    let mut h = mounted(EditorState::from_text("one"));
    let initial = h.controller.editor_state().clone();
    let next = EditorState::from_text("two");

    h.controller.will_update(h.controller.props().with_state(next.clone()));
    assert!(EditorState::ptr_eq(h.controller.latest_editor_state(), &next));
    assert!(EditorState::ptr_eq(
        h.controller.latest_committed_editor_state(),
        &initial
    ));

    h.controller.did_update();
    assert!(EditorState::ptr_eq(
        h.controller.latest_committed_editor_state(),
        &next
    ));
}

#[test]
fn test_deferred_latest_moves_at_commit() {
    let flags = FeatureFlags {
        defer_latest_to_commit: true,
        ..FeatureFlags::default()
    };
    let mut h = mounted_with(EditorState::from_text("one"), SurfaceOptions::default(), flags);
    let initial = h.controller.editor_state().clone();
    let next = EditorState::from_text("two");

    h.controller.will_update(h.controller.props().with_state(next.clone()));
    assert!(EditorState::ptr_eq(
        h.controller.latest_editor_state(),
        &initial
    ));

    h.controller.did_update();
    assert!(EditorState::ptr_eq(h.controller.latest_editor_state(), &next));
    assert!(EditorState::ptr_eq(
        h.controller.latest_committed_editor_state(),
        &next
    ));
}

#[test]
fn test_batched_flush_waits_for_host() {
    let mut h = mounted(focused("", SelectionState::collapsed("b0", 0)));
    h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("x"));
    assert_eq!(h.renders(), 1);

    assert_eq!(h.controller.flush_pending().unwrap(), 1);
    assert_eq!(h.renders(), 2);
    assert_eq!(h.controller.flush_pending().unwrap(), 0);
}

#[test]
fn test_synchronous_flush_renders_before_returning() {
    let flags = FeatureFlags {
        synchronous_flush: true,
        ..FeatureFlags::default()
    };
    let mut h = mounted_with(
        focused("", SelectionState::collapsed("b0", 0)),
        SurfaceOptions::default(),
        flags,
    );
    assert_eq!(
        h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("x")),
        EventOutcome::Handled
    );

    assert_eq!(h.renders(), 2);
    assert_eq!(block_text(h.controller.editor_state()), "x");
    assert!(EditorState::ptr_eq(
        h.controller.latest_committed_editor_state(),
        h.controller.latest_editor_state()
    ));
    assert!(!h.controller.is_blocking_select_events());
}

#[test]
fn test_missing_host_drops_commits() {
    let log = SharedLog::default();
    let collab = Collaborators::new(
        FakeSurface {
            log: log.clone(),
            attached: Rc::new(Cell::new(true)),
            scroll: SCROLL,
        },
        FakeProbe {
            log: log.clone(),
            next: ProbeScript::default(),
        },
        FakeRenderer {
            log: log.clone(),
            fail: Rc::new(Cell::new(false)),
        },
    );
    let mut controller = EditorController::new(
        EditorProps::new(EditorState::from_text("hi")),
        ControllerConfig::default(),
        collab,
    );
    controller.mount().unwrap();

    controller
        .dispatch(&EditorEvent::new(EventKind::Focus))
        .unwrap();
    assert!(controller.latest_editor_state().has_focus());
    assert_eq!(controller.flush_pending().unwrap(), 0);
    assert!(controller.editor_key().starts_with('e'));
}

// === Read-only and inert modes ===

#[test]
fn test_read_only_produces_no_commits() {
    let options = SurfaceOptions {
        read_only: true,
        ..SurfaceOptions::default()
    };
    let mut h = mounted_with(
        EditorState::from_text("locked"),
        options,
        FeatureFlags::default(),
    );
    h.dom_selection(DocumentSelection::clean(SelectionState::collapsed("b0", 3)));

    for kind in routed_kinds() {
        let event = EditorEvent::new(kind).with_key("z").with_data("z");
        assert_eq!(h.fire_event(event), EventOutcome::PassThrough);
    }

    assert_eq!(h.changes(), 0);
    assert_eq!(h.log.borrow().probe_calls, 0);
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert!(!h.controller.has_deferred());
}

#[test]
fn test_inert_modes_ignore_everything() {
    for mode in [Mode::Render, Mode::Cut] {
        let mut h = mounted(focused("text", SelectionState::new("b0", 0, "b0", 2)));
        h.controller.set_mode(mode);
        h.dom_selection(DocumentSelection::clean(SelectionState::collapsed("b0", 3)));

        for kind in routed_kinds() {
            let event = EditorEvent::new(kind).with_key("z");
            assert_eq!(h.fire_event(event), EventOutcome::PassThrough);
        }

        assert_eq!(h.changes(), 0, "{mode} committed a state");
        assert_eq!(h.controller.mode(), Some(mode));
        assert!(h.controller.clipboard().is_none());
    }
}

// === Drag ===

#[test]
fn test_nested_drag_leaves_exit_only_at_zero() {
    let mut h = mounted(EditorState::from_text("drag me"));
    h.fire(EventKind::DragStart);
    assert_eq!(h.controller.mode(), Some(Mode::Drag));
    assert!(h.controller.is_internal_drag());

    for _ in 0..3 {
        h.fire(EventKind::DragEnter);
    }
    h.fire(EventKind::DragLeave);
    h.fire(EventKind::DragLeave);
    assert_eq!(h.controller.drag_count(), 1);
    assert_eq!(h.controller.mode(), Some(Mode::Drag));

    h.fire(EventKind::DragLeave);
    assert_eq!(h.controller.drag_count(), 0);
    assert_eq!(h.controller.mode(), Some(Mode::Edit));

    h.fire(EventKind::DragLeave);
    assert_eq!(h.controller.drag_count(), 0);
}

#[test]
fn test_drag_counting_ignores_read_only() {
    let options = SurfaceOptions {
        read_only: true,
        ..SurfaceOptions::default()
    };
    let mut h = mounted_with(EditorState::from_text(""), options, FeatureFlags::default());
    h.fire(EventKind::DragEnter);
    h.fire(EventKind::DragEnter);
    assert_eq!(h.controller.drag_count(), 2);
}

#[test]
fn test_external_drop_is_delegated() {
    let mut h = mounted(focused("ab", SelectionState::collapsed("b0", 1)));
    assert_eq!(h.fire(EventKind::DragOver), EventOutcome::Handled);
    assert_eq!(h.controller.mode(), Some(Mode::Drag));
    assert!(!h.controller.is_internal_drag());
    h.fire(EventKind::DragEnter);
    h.fire(EventKind::DragEnter);

    let outcome = h.fire_event(EditorEvent::new(EventKind::Drop).with_transfer_text("--"));
    assert_eq!(outcome, EventOutcome::Handled);
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert_eq!(h.controller.drag_count(), 0);
    assert_eq!(h.input.borrow().drops, vec![false]);
    assert_eq!(block_text(&h.last_change()), "a--b");
}

#[test]
fn test_internal_drag_reported_on_drop() {
    let mut h = mounted(focused("ab", SelectionState::collapsed("b0", 0)));
    h.fire(EventKind::DragStart);
    h.fire_event(EditorEvent::new(EventKind::Drop).with_transfer_text("x"));
    assert_eq!(h.input.borrow().drops, vec![true]);
    assert!(!h.controller.is_internal_drag());
}

#[test]
fn test_drag_end_returns_to_edit() {
    let mut h = mounted(EditorState::from_text("ab"));
    h.fire(EventKind::DragStart);
    h.fire(EventKind::DragEnd);
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert!(!h.controller.is_internal_drag());
    assert_eq!(h.changes(), 0);
}

// === Composition ===

#[test]
fn test_composition_resolves_once_and_remounts() {
    let mut h = mounted(focused("", SelectionState::collapsed("b0", 0)));

    h.fire(EventKind::CompositionStart);
    assert_eq!(h.controller.mode(), Some(Mode::Composite));
    assert!(h.last_change().is_in_composition_mode());
    h.controller.flush_pending().unwrap();

    h.fire_event(EditorEvent::new(EventKind::BeforeInput).with_data("か"));
    h.fire_event(EditorEvent::new(EventKind::BeforeInput).with_data("な"));
    assert_eq!(h.controller.composition().text(), "かな");
    assert_eq!(
        h.fire_event(EditorEvent::new(EventKind::KeyPress).with_key("Enter")),
        EventOutcome::Handled
    );

    h.fire(EventKind::CompositionEnd);
    let tasks = h.controller.take_deferred();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].delay_ms, weaver_surface::RESOLVE_COMPOSITION_DELAY_MS);
    assert!(matches!(
        tasks[0].kind,
        DeferredKind::ResolveComposition { .. }
    ));

    h.controller.run_deferred(tasks[0].clone()).unwrap();
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert_eq!(h.controller.contents_key(), 1);
    assert_eq!(h.log.borrow().renders.last().map(|r| r.contents_key), Some(1));
    let resolved = h.last_change();
    assert_eq!(block_text(&resolved), "かな");
    assert!(!resolved.is_in_composition_mode());
    assert_eq!(h.input.borrow().composed, vec!["かな".to_string()]);

    let before = h.changes();
    h.controller.run_deferred(tasks[0].clone()).unwrap();
    assert_eq!(h.changes(), before);
    assert_eq!(h.controller.contents_key(), 1);
}

#[test]
fn test_composition_end_data_is_used_without_beforeinput() {
    let mut h = mounted(focused("", SelectionState::collapsed("b0", 0)));
    h.fire(EventKind::CompositionStart);
    h.fire_event(EditorEvent::new(EventKind::CompositionEnd).with_data("é"));
    h.run_all_deferred();
    assert_eq!(block_text(&h.last_change()), "é");
}

#[test]
fn test_empty_composition_forces_selection() {
    let mut h = mounted(focused("abc", SelectionState::collapsed("b0", 1)));
    h.fire(EventKind::CompositionStart);
    h.fire(EventKind::CompositionEnd);
    h.run_all_deferred();

    let next = h.last_change();
    assert!(next.must_force_selection());
    assert!(!next.is_in_composition_mode());
    assert_eq!(next.selection().anchor_offset, 1);
    assert!(h.input.borrow().composed.is_empty());
}

#[test]
fn test_keydown_after_composition_end_resolves_immediately() {
    let mut h = mounted(focused("", SelectionState::collapsed("b0", 0)));
    h.fire(EventKind::CompositionStart);
    h.fire_event(EditorEvent::new(EventKind::BeforeInput).with_data("ü"));
    h.fire(EventKind::CompositionEnd);

    h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("ArrowLeft"));
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert!(h.controller.composition().is_resolved());
    assert_eq!(
        h.input.borrow().key_downs,
        vec![SmolStr::new("ArrowLeft")]
    );

    let before = h.changes();
    h.run_all_deferred();
    assert_eq!(h.changes(), before);
}

#[test]
fn test_keys_while_composing() {
    let mut h = mounted(focused("", SelectionState::collapsed("b0", 0)));
    h.fire(EventKind::CompositionStart);

    assert_eq!(
        h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("Escape")),
        EventOutcome::Handled
    );
    assert_eq!(
        h.fire_event(EditorEvent::new(EventKind::KeyDown).with_key("a")),
        EventOutcome::PassThrough
    );
    assert_eq!(h.controller.mode(), Some(Mode::Composite));
    assert!(h.input.borrow().key_downs.is_empty());
}

#[test]
fn test_restarted_composition_defers_resolution() {
    let mut h = mounted(focused("", SelectionState::collapsed("b0", 0)));
    h.fire(EventKind::CompositionStart);
    h.fire(EventKind::CompositionEnd);
    h.fire(EventKind::CompositionStart);

    h.run_all_deferred();
    assert_eq!(h.controller.mode(), Some(Mode::Composite));
    assert!(!h.controller.composition().is_resolved());
}

// === Clipboard ===

#[test]
fn test_copy_keeps_fragment() {
    let mut h = mounted(focused("hello world", SelectionState::new("b0", 6, "b0", 11)));
    assert_eq!(h.fire(EventKind::Copy), EventOutcome::PassThrough);
    assert_eq!(h.controller.clipboard(), Some("world"));
}

#[test]
fn test_collapsed_copy_and_cut_are_prevented() {
    let mut h = mounted(focused("hello", SelectionState::collapsed("b0", 2)));
    assert_eq!(h.fire(EventKind::Copy), EventOutcome::Handled);
    assert_eq!(h.fire(EventKind::Cut), EventOutcome::Handled);
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert!(!h.controller.has_deferred());
    assert!(h.controller.clipboard().is_none());
}

#[test]
fn test_cut_finishes_after_native_cut() {
    let mut h = mounted(focused("hello world", SelectionState::new("b0", 0, "b0", 6)));

    assert_eq!(h.fire(EventKind::Cut), EventOutcome::PassThrough);
    assert_eq!(h.controller.mode(), Some(Mode::Cut));
    assert_eq!(h.controller.clipboard(), Some("hello "));
    assert_eq!(h.changes(), 0);

    let tasks = h.controller.take_deferred();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].delay_ms, 0);

    h.controller.run_deferred(tasks[0].clone()).unwrap();
    assert_eq!(h.controller.mode(), Some(Mode::Edit));
    assert_eq!(h.controller.contents_key(), 1);
    assert_eq!(h.log.borrow().restored, vec![SCROLL]);
    assert_eq!(block_text(&h.last_change()), "world");
}

// === Focus ===

#[test]
fn test_focus_without_prior_focus_forces_selection() {
    let mut h = mounted(EditorState::from_text("hello"));
    h.controller.focus(None).unwrap();

    assert_eq!(h.log.borrow().focus_calls, 1);
    assert_eq!(h.log.borrow().restored, vec![SCROLL]);
    let next = h.last_change();
    assert!(next.must_force_selection());
    assert!(next.has_focus());

    h.controller.flush_pending().unwrap();
    let explicit = ScrollPosition::new(0.0, 5.0);
    h.controller.focus(Some(explicit)).unwrap();
    assert_eq!(h.changes(), 1);
    assert_eq!(h.log.borrow().restored, vec![SCROLL, explicit]);
}

#[test]
fn test_focus_on_detached_surface_is_ignored() {
    let mut h = mounted(EditorState::from_text("hello"));
    h.attached.set(false);
    h.controller.focus(None).unwrap();
    assert_eq!(h.log.borrow().focus_calls, 0);
    assert_eq!(h.changes(), 0);
}

#[test]
fn test_blur_delegates_to_surface() {
    let mut h = mounted(EditorState::from_text("hello"));
    h.controller.blur().unwrap();
    assert_eq!(h.log.borrow().blur_calls, 1);
}

#[test]
fn test_focus_and_blur_events_track_has_focus() {
    let mut h = mounted(EditorState::from_text("hello"));

    h.fire(EventKind::Focus);
    let focused = h.last_change();
    assert!(focused.has_focus());
    assert!(!focused.must_force_selection());
    h.controller.flush_pending().unwrap();

    h.fire(EventKind::Focus);
    assert_eq!(h.changes(), 1);

    h.fire(EventKind::Blur);
    assert_eq!(h.log.borrow().released, 1);
    assert!(!h.last_change().has_focus());
}

#[test]
fn test_restore_editor_dom_remounts() {
    let mut h = mounted(focused("hello", SelectionState::collapsed("b0", 1)));
    h.controller
        .restore_editor_dom(Some(ScrollPosition::new(3.0, 4.0)))
        .unwrap();

    assert_eq!(h.controller.contents_key(), 1);
    let log = h.log.borrow();
    assert_eq!(log.renders.len(), 2);
    assert_eq!(log.renders[1].identity, "contents1");
    assert!(EditorState::ptr_eq(&log.renders[1].state, &log.renders[0].state));
    assert_eq!(log.restored, vec![ScrollPosition::new(3.0, 4.0)]);
    // Already focused: nothing to force.
    assert!(log.changes.is_empty());
    drop(log);
    assert!(!h.controller.is_blocking_select_events());
}

// === Plain-text input ===

#[test]
fn test_plain_text_input_through_controller() {
    let log = SharedLog::default();
    let collab = Collaborators::new(
        FakeSurface {
            log: log.clone(),
            attached: Rc::new(Cell::new(true)),
            scroll: SCROLL,
        },
        FakeProbe {
            log: log.clone(),
            next: ProbeScript::default(),
        },
        FakeRenderer {
            log: log.clone(),
            fail: Rc::new(Cell::new(false)),
        },
    )
    .with_host(ChangeQueue::new())
    .with_input(PlainTextInput);
    let config = ControllerConfig {
        editor_key: None,
        flags: FeatureFlags {
            synchronous_flush: true,
            ..FeatureFlags::default()
        },
    };
    let props = EditorProps::new(focused("ab", SelectionState::collapsed("b0", 1)));
    let mut controller = EditorController::new(props, config, collab);
    controller.mount().unwrap();

    let typed = EditorEvent::new(EventKind::BeforeInput)
        .with_input_type("insertText")
        .with_data("x");
    assert_eq!(controller.dispatch(&typed).unwrap(), EventOutcome::Handled);
    assert_eq!(document_text(controller.editor_state()).as_deref(), Some("axb"));

    let enter = EditorEvent::new(EventKind::BeforeInput).with_input_type("insertParagraph");
    assert_eq!(controller.dispatch(&enter).unwrap(), EventOutcome::Handled);
    let state = controller.editor_state();
    assert_eq!(document_text(state).as_deref(), Some("ax\nb"));
    assert_eq!(state.selection().anchor_key, "b1");
    assert!(state.must_force_selection());

    // Composition text is left to the IME until it resolves.
    let composing = EditorEvent::new(EventKind::BeforeInput)
        .with_input_type("insertCompositionText")
        .with_data("k");
    assert_eq!(controller.dispatch(&composing).unwrap(), EventOutcome::PassThrough);
    assert_eq!(log.borrow().renders.len(), 3);
}
