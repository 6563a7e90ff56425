//! msgpack-RPC framing: message decode/encode and the outbound sink.

use std::io::{self, Read, Write};

use rmpv::Value;
use tracing::trace;

use crate::BridgeError;

const REQUEST: u64 = 0;
const RESPONSE: u64 = 1;
const NOTIFICATION: u64 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum RpcMessage {
    Request {
        id: u64,
        method: String,
        params: Vec<Value>,
    },
    Response {
        id: u64,
        error: Value,
        result: Value,
    },
    Notification {
        method: String,
        params: Vec<Value>,
    },
}

impl RpcMessage {
    pub fn request(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        RpcMessage::Request {
            id,
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Vec<Value>) -> Self {
        RpcMessage::Notification {
            method: method.into(),
            params,
        }
    }

    /// `[0, id, method, params]`, `[1, id, error, result]` or
    /// `[2, method, params]`.
    pub fn decode(value: Value) -> Result<Self, BridgeError> {
        let Value::Array(items) = value else {
            return Err(BridgeError::Protocol("message is not an array".into()));
        };
        let mut items = items.into_iter();
        let kind = items
            .next()
            .and_then(|v| v.as_u64())
            .ok_or_else(|| BridgeError::Protocol("missing message type".into()))?;
        let rest: Vec<Value> = items.collect();
        match (kind, rest.as_slice()) {
            (REQUEST, [id, method, params]) => Ok(RpcMessage::Request {
                id: expect_id(id)?,
                method: expect_method(method)?,
                params: expect_params(params)?,
            }),
            (RESPONSE, [id, error, result]) => Ok(RpcMessage::Response {
                id: expect_id(id)?,
                error: error.clone(),
                result: result.clone(),
            }),
            (NOTIFICATION, [method, params]) => Ok(RpcMessage::Notification {
                method: expect_method(method)?,
                params: expect_params(params)?,
            }),
            _ => Err(BridgeError::Protocol(format!(
                "unexpected message type {kind} with {} fields",
                rest.len()
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RpcMessage::Request { id, method, params } => Value::Array(vec![
                Value::from(REQUEST),
                Value::from(*id),
                Value::from(method.as_str()),
                Value::Array(params.clone()),
            ]),
            RpcMessage::Response { id, error, result } => Value::Array(vec![
                Value::from(RESPONSE),
                Value::from(*id),
                error.clone(),
                result.clone(),
            ]),
            RpcMessage::Notification { method, params } => Value::Array(vec![
                Value::from(NOTIFICATION),
                Value::from(method.as_str()),
                Value::Array(params.clone()),
            ]),
        }
    }
}

fn expect_id(v: &Value) -> Result<u64, BridgeError> {
    v.as_u64()
        .ok_or_else(|| BridgeError::Protocol(format!("message id {v} is not an unsigned integer")))
}

fn expect_method(v: &Value) -> Result<String, BridgeError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| BridgeError::Protocol(format!("method {v} is not a string")))
}

fn expect_params(v: &Value) -> Result<Vec<Value>, BridgeError> {
    v.as_array()
        .cloned()
        .ok_or_else(|| BridgeError::Protocol("params are not an array".into()))
}

/// Reads one message. `Ok(None)` on a clean end of stream.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Option<RpcMessage>, BridgeError> {
    match rmpv::decode::read_value(reader) {
        Ok(value) => RpcMessage::decode(value).map(Some),
        Err(rmpv::decode::Error::InvalidMarkerRead(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Ok(None)
        }
        Err(e) => Err(BridgeError::Decode(e.to_string())),
    }
}

/// Where outbound messages go.
pub trait RpcSink {
    fn send(&mut self, msg: &RpcMessage) -> Result<(), BridgeError>;
}

/// Encodes each message as one msgpack value and flushes it.
#[derive(Debug)]
pub struct MsgpackWriter<W: Write> {
    out: W,
}

impl<W: Write> MsgpackWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RpcSink for MsgpackWriter<W> {
    fn send(&mut self, msg: &RpcMessage) -> Result<(), BridgeError> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &msg.to_value())
            .map_err(|e| BridgeError::Encode(e.to_string()))?;
        self.out.write_all(&buf)?;
        self.out.flush()?;
        trace!(target: "bridge.rpc", bytes = buf.len(), "message_written");
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub sent: Vec<RpcMessage>,
}

impl RpcSink for MemorySink {
    fn send(&mut self, msg: &RpcMessage) -> Result<(), BridgeError> {
        self.sent.push(msg.clone());
        Ok(())
    }
}
