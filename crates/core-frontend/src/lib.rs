//! Wires the dispatcher, store, renderer, input encoder and process bridge
//! into one serial event path.
//!
//! Every action goes through [`Frontend::dispatch`], which queues it and
//! drains the queue one action at a time. The store applies the action and
//! its notifications are delivered, in order, to the renderer, the bridge
//! and then any host observers. Follow-up actions the renderer returns are
//! queued ahead of whatever was already waiting.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use core_bridge::{Bridge, BridgeError, RpcMessage, RpcSink};
use core_config::Config;
use core_events::{Action, DispatchError, Dispatcher, HandlerError};
use core_input::{InputEncoder, KeyDisposition, KeyInput};
use core_render::render_metrics::RenderMetricsSnapshot;
use core_render::{PointerInput, RenderError, Renderer, RendererOptions, Surface, WheelInput};
use core_state::{Notification, ScreenState, Store, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

type Observer = Box<dyn FnMut(&Notification, &ScreenState)>;

/// Everything the dispatcher handler touches.
struct Core<S: Surface, R: RpcSink> {
    store: RefCell<Store>,
    renderer: RefCell<Renderer<S>>,
    bridge: RefCell<Bridge<R>>,
    observers: RefCell<Vec<Observer>>,
    follow_ups: RefCell<Vec<Action>>,
}

impl<S: Surface, R: RpcSink> Core<S, R> {
    fn handle(&self, action: &Action) -> Result<(), StoreError> {
        let notes = self.store.borrow_mut().apply(action)?;
        let store = self.store.borrow();
        let state = store.state();
        for note in &notes {
            match self.renderer.borrow_mut().on_notification(note, state) {
                Ok(follow) => self.follow_ups.borrow_mut().extend(follow),
                Err(err) => {
                    warn!(target: "frontend", note = note.name(), error = %err, "render_failed");
                }
            }
            if let Err(err) = self.bridge.borrow_mut().on_notification(note) {
                self.bridge_failed(err, state);
            }
            for observer in self.observers.borrow_mut().iter_mut() {
                observer(note, state);
            }
        }
        Ok(())
    }

    fn bridge_failed(&self, err: BridgeError, state: &ScreenState) {
        match err {
            BridgeError::Disconnected => {
                debug!(target: "frontend", "write_after_disconnect_dropped");
            }
            err => {
                warn!(target: "frontend", error = %err, "bridge_write_failed");
                if state.attached {
                    self.follow_ups.borrow_mut().push(Action::disconnected());
                }
            }
        }
    }
}

pub struct Frontend<S: Surface + 'static, R: RpcSink + 'static> {
    dispatcher: Rc<Dispatcher>,
    core: Rc<Core<S, R>>,
    encoder: InputEncoder,
    pending: VecDeque<Action>,
    font_px: u32,
    viewport: (u32, u32),
}

impl<S: Surface + 'static, R: RpcSink + 'static> Frontend<S, R> {
    pub fn new(surface: S, sink: R, config: &Config) -> Self {
        let font = &config.file.font;
        let state = ScreenState::new(&font.face, config.font_px());
        let core = Rc::new(Core {
            store: RefCell::new(Store::with_state(state)),
            renderer: RefCell::new(Renderer::new(surface, RendererOptions::from_config(config))),
            bridge: RefCell::new(Bridge::new(sink)),
            observers: RefCell::new(Vec::new()),
            follow_ups: RefCell::new(Vec::new()),
        });
        let dispatcher = Rc::new(Dispatcher::new());
        let handler_core = Rc::clone(&core);
        dispatcher.register(move |action| {
            handler_core
                .handle(action)
                .map_err(|e| Box::new(e) as HandlerError)
        });
        Self {
            dispatcher,
            core,
            encoder: InputEncoder::from_config(config),
            pending: VecDeque::new(),
            font_px: config.font_px(),
            viewport: (config.file.screen.width, config.file.screen.height),
        }
    }

    /// Measures the font, fits the grid to the configured viewport and
    /// attaches the UI.
    pub fn start(&mut self) -> Result<(), FrontendError> {
        self.dispatch(Action::update_font_px(self.font_px))?;
        let (width, height) = self.viewport;
        self.resize_px(width, height)?;
        let (lines, cols) = {
            let state = self.state();
            (state.size.lines, state.size.cols)
        };
        self.core.bridge.borrow_mut().attach(lines, cols)?;
        info!(target: "frontend", lines, cols, width, height, "frontend_started");
        Ok(())
    }

    /// Host-facing dispatcher. Handlers registered here run after the store
    /// pipeline for every action.
    pub fn dispatcher(&self) -> Rc<Dispatcher> {
        Rc::clone(&self.dispatcher)
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Notification, &ScreenState) + 'static,
    {
        self.core.observers.borrow_mut().push(Box::new(observer));
    }

    pub fn dispatch(&mut self, action: Action) -> Result<(), FrontendError> {
        self.pending.push_back(action);
        self.drain()
    }

    /// Dispatches a batch in order. Every action is attempted; the first
    /// failure is returned once the queue is empty.
    pub fn dispatch_all<I>(&mut self, actions: I) -> Result<(), FrontendError>
    where
        I: IntoIterator<Item = Action>,
    {
        self.pending.extend(actions);
        self.drain()
    }

    fn drain(&mut self) -> Result<(), FrontendError> {
        let mut first_failure = None;
        while let Some(action) = self.pending.pop_front() {
            let result = self.dispatcher.dispatch(&action);
            let follow = std::mem::take(&mut *self.core.follow_ups.borrow_mut());
            for next in follow.into_iter().rev() {
                self.pending.push_front(next);
            }
            if let Err(err) = result {
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// One message read from the editor process.
    pub fn handle_rpc(&mut self, msg: RpcMessage) -> Result<(), FrontendError> {
        let actions = self.core.bridge.borrow_mut().handle_message(msg)?;
        self.dispatch_all(actions)
    }

    pub fn key_down(&mut self, ev: &KeyInput) -> Result<KeyDisposition, FrontendError> {
        let disposition = {
            let state = self.state();
            self.encoder.key_down(ev, &state.mode)
        };
        if let KeyDisposition::Consumed(action) = &disposition {
            self.dispatch(action.clone())?;
        }
        Ok(disposition)
    }

    pub fn composition_start(&mut self) {
        self.encoder.composition_start();
    }

    pub fn composition_end(&mut self) {
        self.encoder.composition_end();
    }

    pub fn is_composing(&self) -> bool {
        self.encoder.is_composing()
    }

    pub fn input_completed(&mut self, text: &str) -> Result<(), FrontendError> {
        match self.encoder.input_completed(text) {
            Some(action) => self.dispatch(action),
            None => Ok(()),
        }
    }

    pub fn focus_changed(&mut self, focused: bool) -> Result<(), FrontendError> {
        let action = self.encoder.focus_changed(focused);
        self.dispatch(action)
    }

    pub fn mouse_down(&mut self, ev: &PointerInput) -> Result<(), FrontendError> {
        let action = self.with_renderer(|r, state| r.mouse_down(ev, state));
        self.dispatch(action)
    }

    pub fn mouse_move(&mut self, ev: &PointerInput) -> Result<(), FrontendError> {
        match self.with_renderer(|r, state| r.mouse_move(ev, state)) {
            Some(action) => self.dispatch(action),
            None => Ok(()),
        }
    }

    pub fn mouse_up(&mut self, ev: &PointerInput) -> Result<(), FrontendError> {
        let action = self.with_renderer(|r, state| r.mouse_up(ev, state));
        self.dispatch(action)
    }

    pub fn wheel(&mut self, ev: &WheelInput) -> Result<(), FrontendError> {
        let actions = self.with_renderer(|r, state| r.wheel(ev, state));
        self.dispatch_all(actions)
    }

    /// Host viewport resized to `width` x `height` pixels.
    pub fn resize_px(&mut self, width: u32, height: u32) -> Result<(), FrontendError> {
        let follow = self.with_renderer(|r, state| r.resize_px(width, height, state))?;
        self.dispatch_all(follow)
    }

    pub fn resize_grid(&mut self, lines: u32, cols: u32) -> Result<(), FrontendError> {
        let follow = self.with_renderer(|r, state| r.resize_grid(lines, cols, state))?;
        self.dispatch_all(follow)
    }

    pub fn change_font_px(&mut self, px: u32) -> Result<(), FrontendError> {
        self.dispatch(Action::update_font_px(px))
    }

    pub fn change_font_face(&mut self, face: &str) -> Result<(), FrontendError> {
        self.dispatch(Action::update_font_face(face))
    }

    /// The editor process exited or its pipe closed.
    pub fn disconnected(&mut self) -> Result<(), FrontendError> {
        self.dispatch(Action::disconnected())
    }

    pub fn state(&self) -> Ref<'_, ScreenState> {
        Ref::map(self.core.store.borrow(), Store::state)
    }

    pub fn surface(&self) -> Ref<'_, S> {
        Ref::map(self.core.renderer.borrow(), Renderer::surface)
    }

    pub fn bridge(&self) -> Ref<'_, Bridge<R>> {
        self.core.bridge.borrow()
    }

    pub fn render_metrics(&self) -> RenderMetricsSnapshot {
        self.core.renderer.borrow().metrics()
    }

    fn with_renderer<T>(&self, f: impl FnOnce(&mut Renderer<S>, &ScreenState) -> T) -> T {
        let store = self.core.store.borrow();
        let mut renderer = self.core.renderer.borrow_mut();
        f(&mut renderer, store.state())
    }
}
