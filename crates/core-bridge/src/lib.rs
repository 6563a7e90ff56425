//! Process bridge: the msgpack-RPC link to the embedded editor.
//!
//! Inbound, `redraw` notifications are decoded into actions for the
//! dispatcher. Outbound, store notifications that concern the editor
//! (`Input`, host-initiated grid changes) become RPC requests written through
//! an [`RpcSink`]. Requests are fire-and-forget; responses are matched by id
//! only to log failures.

pub mod redraw;
pub mod rpc;

pub use redraw::{RedrawBatch, RedrawDecoder};
pub use rpc::{MemorySink, MsgpackWriter, RpcMessage, RpcSink, read_message};

use std::collections::HashMap;
use std::io;

use core_events::Action;
use core_state::Notification;
use rmpv::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed `{event}`: {reason}")]
    Malformed { event: String, reason: String },
    #[error("invalid rpc message: {0}")]
    Protocol(String),
    #[error("msgpack decode: {0}")]
    Decode(String),
    #[error("msgpack encode: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("editor process disconnected")]
    Disconnected,
}

pub struct Bridge<R: RpcSink> {
    sink: R,
    decoder: RedrawDecoder,
    next_id: u64,
    pending: HashMap<u64, String>,
    ui_attached: bool,
    connected: bool,
}

impl<R: RpcSink> Bridge<R> {
    pub fn new(sink: R) -> Self {
        Self {
            sink,
            decoder: RedrawDecoder::new(),
            next_id: 0,
            pending: HashMap::new(),
            ui_attached: false,
            connected: true,
        }
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn is_ui_attached(&self) -> bool {
        self.ui_attached
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Requests sent whose response has not arrived yet.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn attach(&mut self, lines: u32, cols: u32) -> Result<u64, BridgeError> {
        let options = Value::Map(vec![(Value::from("rgb"), Value::from(true))]);
        let id = self.request(
            "nvim_ui_attach",
            vec![Value::from(cols), Value::from(lines), options],
        )?;
        self.ui_attached = true;
        info!(target: "bridge.rpc", lines, cols, "ui_attach_sent");
        Ok(id)
    }

    pub fn input(&mut self, text: &str) -> Result<u64, BridgeError> {
        self.request("nvim_input", vec![Value::from(text)])
    }

    pub fn try_resize(&mut self, lines: u32, cols: u32) -> Result<u64, BridgeError> {
        self.request("nvim_ui_try_resize", vec![Value::from(cols), Value::from(lines)])
    }

    fn request(&mut self, method: &str, params: Vec<Value>) -> Result<u64, BridgeError> {
        if !self.connected {
            return Err(BridgeError::Disconnected);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.sink.send(&RpcMessage::request(id, method, params))?;
        self.pending.insert(id, method.to_string());
        debug!(target: "bridge.rpc", id, method, "request_sent");
        Ok(id)
    }

    /// Handles one inbound message and returns the actions to dispatch, in
    /// order. Malformed redraw events are logged and skipped.
    pub fn handle_message(&mut self, msg: RpcMessage) -> Result<Vec<Action>, BridgeError> {
        match msg {
            RpcMessage::Notification { method, params } if method == "redraw" => {
                let batch = self.decoder.decode(&params);
                for err in &batch.errors {
                    warn!(target: "bridge.redraw", error = %err, "redraw_event_skipped");
                }
                debug!(target: "bridge.redraw", actions = batch.actions.len(), "redraw_batch_decoded");
                Ok(batch.actions)
            }
            RpcMessage::Notification { method, .. } => {
                debug!(target: "bridge.rpc", method = %method, "notification_ignored");
                Ok(Vec::new())
            }
            RpcMessage::Request { id, method, .. } => {
                warn!(target: "bridge.rpc", id, method = %method, "request_unsupported");
                if self.connected {
                    self.sink.send(&RpcMessage::Response {
                        id,
                        error: Value::from("unsupported request"),
                        result: Value::Nil,
                    })?;
                }
                Ok(Vec::new())
            }
            RpcMessage::Response { id, error, .. } => {
                match self.pending.remove(&id) {
                    Some(method) if !error.is_nil() => {
                        warn!(target: "bridge.rpc", id, method = %method, error = %error, "request_failed");
                    }
                    Some(_) => {}
                    None => warn!(target: "bridge.rpc", id, "response_unmatched"),
                }
                Ok(Vec::new())
            }
        }
    }

    /// Forwards the notifications the editor needs to hear about.
    pub fn on_notification(&mut self, note: &Notification) -> Result<(), BridgeError> {
        match note {
            Notification::Input(text) => {
                self.input(text)?;
            }
            // The grid is sent with the attach request itself.
            Notification::ScreenBoundsChanged { lines, cols } if !self.ui_attached => {
                debug!(target: "bridge.rpc", lines, cols, "resize_before_attach_skipped");
            }
            Notification::ScreenBoundsChanged { lines, cols } => {
                self.try_resize(*lines, *cols)?;
            }
            Notification::Disconnected => {
                if self.connected {
                    info!(target: "bridge.rpc", pending = self.pending.len(), "editor_disconnected");
                }
                self.connected = false;
                self.pending.clear();
            }
            _ => {}
        }
        Ok(())
    }
}
