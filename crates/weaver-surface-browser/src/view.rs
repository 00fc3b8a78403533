//! `EditorView` - the controller mounted on a live element, exposed to JS.
//!
//! Native listeners feed the controller one event at a time. A DOM call made
//! while the controller is busy (focusing the editable node, for instance)
//! can fire another event synchronously; that event is queued and replayed
//! once the outer dispatch returns, so the controller is never re-entered.
//! Such replayed events can no longer prevent their default action.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlElement};

use weaver_surface::{
    Collaborators, ControllerConfig, ControllerError, DeferredTask, EditorController, EditorEvent,
    EditorHost, EditorProps, EditorState, PlainTextInput, SelectionState, SurfaceOptions,
    document_text,
};

use crate::diagnostics::BrowserDiagnostics;
use crate::events::{editable_event_names, editor_event};
use crate::logging::init_logging;
use crate::render::{DomRenderer, SurfaceNodes};
use crate::selection::BrowserSelectionProbe;
use crate::surface::BrowserSurface;

type Pending = Rc<RefCell<VecDeque<EditorState>>>;

/// Controlled host: every committed state is rendered back as-is.
struct JsHost {
    pending: Pending,
}

impl EditorHost for JsHost {
    fn on_change(&mut self, next: EditorState) {
        self.pending.borrow_mut().push_back(next);
    }

    fn take_next_state(&mut self) -> Option<EditorState> {
        self.pending.borrow_mut().pop_front()
    }
}

/// What the JS `onChange` callback receives.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeSummary<'a> {
    text: String,
    selection: &'a SelectionState,
    mode: Option<&'static str>,
}

struct ViewInner {
    controller: RefCell<EditorController>,
    /// Events that arrived while the controller was borrowed.
    queue: RefCell<VecDeque<EditorEvent>>,
    pending: Pending,
    flush_scheduled: Cell<bool>,
    nodes: SurfaceNodes,
    listeners: RefCell<Vec<EventListener>>,
    on_change: Option<js_sys::Function>,
    last_notified: RefCell<Option<EditorState>>,
}

fn report(context: &str, err: ControllerError) -> ControllerError {
    tracing::error!(error = %err, "{context}");
    err
}

impl ViewInner {
    fn handle(self: &Rc<Self>, event: &Event) {
        let Some(editor_event) = editor_event(event) else {
            return;
        };

        let outcome = match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.dispatch(&editor_event),
            Err(_) => {
                tracing::trace!(kind = %editor_event.kind, "reentrant event queued");
                self.queue.borrow_mut().push_back(editor_event);
                return;
            }
        };

        let failure = match outcome {
            Ok(outcome) => {
                if outcome.prevents_default() {
                    event.prevent_default();
                }
                None
            }
            Err(err) => Some(report("event handler failed", err)),
        };

        self.settle();
        if let Some(err) = failure {
            wasm_bindgen::throw_str(&err.to_string());
        }
    }

    /// Selection changes anywhere in the document; only ours are dispatched.
    fn handle_selection_change(self: &Rc<Self>, event: &Event) {
        let inside = web_sys::window()
            .and_then(|w| w.get_selection().ok().flatten())
            .and_then(|s| s.anchor_node())
            .is_some_and(|anchor| self.nodes.editable.contains(Some(&anchor)));
        if inside {
            self.handle(event);
        }
    }

    /// Run whatever the last dispatch left behind: replay queued events,
    /// schedule deferred tasks and the batched flush, then tell JS.
    fn settle(self: &Rc<Self>) {
        self.drain_queue();
        self.schedule_deferred();
        self.schedule_flush();
        self.notify_change();
    }

    fn drain_queue(&self) {
        loop {
            let Some(event) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            let Ok(mut controller) = self.controller.try_borrow_mut() else {
                self.queue.borrow_mut().push_front(event);
                break;
            };
            if let Err(err) = controller.dispatch(&event) {
                report("replayed event failed", err);
            }
        }
    }

    fn schedule_deferred(self: &Rc<Self>) {
        let tasks = match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.take_deferred(),
            Err(_) => return,
        };
        for task in tasks {
            self.schedule_task(task);
        }
    }

    fn schedule_task(self: &Rc<Self>, task: DeferredTask) {
        let weak: Weak<Self> = Rc::downgrade(self);
        Timeout::new(task.delay_ms, move || {
            if let Some(inner) = weak.upgrade() {
                inner.run_task(task);
            }
        })
        .forget();
    }

    fn run_task(self: &Rc<Self>, task: DeferredTask) {
        let result = match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.run_deferred(task),
            Err(_) => {
                self.schedule_task(DeferredTask { delay_ms: 0, ..task });
                return;
            }
        };
        if let Err(err) = result {
            report("deferred task failed", err);
        }
        self.settle();
    }

    /// Render pending host states on the next microtask.
    fn schedule_flush(self: &Rc<Self>) {
        if self.flush_scheduled.get() || self.pending.borrow().is_empty() {
            return;
        }
        self.flush_scheduled.set(true);
        let weak = Rc::downgrade(self);
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(inner) = weak.upgrade() {
                inner.flush();
            }
        });
    }

    fn flush(self: &Rc<Self>) {
        self.flush_scheduled.set(false);
        let result = match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.flush_pending(),
            Err(_) => {
                self.schedule_flush();
                return;
            }
        };
        match result {
            Ok(rendered) => tracing::trace!(rendered, "flushed pending states"),
            Err(err) => {
                report("render failed", err);
            }
        }
        self.settle();
    }

    /// Call the JS callback if the rendered state moved since last time.
    fn notify_change(&self) {
        let Some(callback) = self.on_change.as_ref() else {
            return;
        };
        let summary = {
            let Ok(controller) = self.controller.try_borrow() else {
                return;
            };
            let state = controller.editor_state();
            let mut last = self.last_notified.borrow_mut();
            if last.as_ref().is_some_and(|l| EditorState::ptr_eq(l, state)) {
                return;
            }
            *last = Some(state.clone());
            let summary = ChangeSummary {
                text: document_text(state).unwrap_or_default(),
                selection: state.selection(),
                mode: controller.mode().map(|m| m.as_str()),
            };
            serde_wasm_bindgen::to_value(&summary)
        };
        match summary {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    tracing::warn!("onChange callback threw: {:?}", e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize change: {}", e),
        }
    }

    /// Run `f` against the controller from a JS-facing method.
    fn with_controller<T>(
        self: &Rc<Self>,
        f: impl FnOnce(&mut EditorController) -> weaver_surface::Result<T>,
    ) -> Result<T, JsError> {
        let result = {
            let mut controller = self
                .controller
                .try_borrow_mut()
                .map_err(|_| JsError::new("editor is busy"))?;
            f(&mut controller)
        };
        self.settle();
        result.map_err(|e| JsError::new(&report("editor call failed", e).to_string()))
    }
}

fn from_js<T: Default + serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsError::new(&format!("Invalid {}: {}", what, e)))
}

/// A contenteditable surface driven by `EditorController`.
#[wasm_bindgen]
pub struct EditorView {
    inner: Rc<ViewInner>,
}

#[wasm_bindgen]
impl EditorView {
    /// Mount a new surface inside `container`.
    ///
    /// `options` and `config` are partial `SurfaceOptions` and
    /// `ControllerConfig` objects. `on_change` receives `{ text, selection,
    /// mode }` after every render.
    pub fn mount(
        container: &HtmlElement,
        options: JsValue,
        config: JsValue,
        on_change: Option<js_sys::Function>,
        initial_text: Option<String>,
    ) -> Result<EditorView, JsError> {
        init_logging();

        let options: SurfaceOptions = from_js(options, "options")?;
        let config: ControllerConfig = from_js(config, "config")?;
        let nodes =
            SurfaceNodes::create(container).map_err(|e| JsError::new(&e.to_string()))?;
        let editable: Element = nodes.editable.clone();

        let pending: Pending = Rc::default();
        let collab = Collaborators::new(
            BrowserSurface::new(editable.clone()),
            BrowserSelectionProbe::new(editable.clone()),
            DomRenderer::new(nodes.clone()),
        )
        .with_host(JsHost {
            pending: Rc::clone(&pending),
        })
        .with_input(PlainTextInput)
        .with_diagnostics(BrowserDiagnostics);

        let state = EditorState::from_text(initial_text.as_deref().unwrap_or_default());
        let props = EditorProps::new(state).with_options(options);
        let mut controller = EditorController::new(props, config, collab);
        controller
            .mount()
            .map_err(|e| JsError::new(&report("mount failed", e).to_string()))?;

        let inner = Rc::new(ViewInner {
            controller: RefCell::new(controller),
            queue: RefCell::default(),
            pending,
            flush_scheduled: Cell::new(false),
            nodes,
            listeners: RefCell::default(),
            on_change,
            last_notified: RefCell::default(),
        });

        let mut listeners = Vec::new();
        for name in editable_event_names() {
            let weak = Rc::downgrade(&inner);
            listeners.push(EventListener::new_with_options(
                &editable,
                name,
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle(event);
                    }
                },
            ));
        }
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let weak = Rc::downgrade(&inner);
            listeners.push(EventListener::new(&document, "selectionchange", move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_selection_change(event);
                }
            }));
        }
        *inner.listeners.borrow_mut() = listeners;

        tracing::debug!(
            editor_key = inner.controller.borrow().editor_key(),
            "editor view mounted"
        );
        inner.notify_change();
        Ok(EditorView { inner })
    }

    /// The editable element, for hosts that want to style or observe it.
    #[wasm_bindgen(getter)]
    pub fn editable(&self) -> Element {
        self.inner.nodes.editable.clone()
    }

    pub fn focus(&self) -> Result<(), JsError> {
        self.inner.with_controller(|c| c.focus(None))
    }

    pub fn blur(&self) -> Result<(), JsError> {
        self.inner.with_controller(|c| c.blur())
    }

    /// Replace the document, keeping the surface mounted.
    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&self, text: &str) -> Result<(), JsError> {
        self.inner
            .with_controller(|c| c.set_editor_state(EditorState::from_text(text)))
    }

    pub fn text(&self) -> Result<String, JsError> {
        self.inner
            .with_controller(|c| Ok(document_text(c.editor_state()).unwrap_or_default()))
    }

    pub fn selection(&self) -> Result<JsValue, JsError> {
        let selection = self
            .inner
            .with_controller(|c| Ok(c.editor_state().selection().clone()))?;
        serde_wasm_bindgen::to_value(&selection)
            .map_err(|e| JsError::new(&format!("Failed to serialize selection: {}", e)))
    }

    /// Active mode name, or `undefined` before mount.
    pub fn mode(&self) -> Result<Option<String>, JsError> {
        self.inner
            .with_controller(|c| Ok(c.mode().map(|m| m.as_str().to_string())))
    }

    #[wasm_bindgen(js_name = setReadOnly)]
    pub fn set_read_only(&self, read_only: bool) -> Result<(), JsError> {
        self.inner.with_controller(|c| {
            let mut props = c.props().clone();
            props.options.read_only = read_only;
            c.commit_props(props)
        })
    }

    /// Remove listeners and the mounted DOM.
    pub fn destroy(&self) {
        self.inner.listeners.borrow_mut().clear();
        self.inner.nodes.remove();
    }
}
