//! Decoding of `redraw` notification batches into actions.
//!
//! A batch is `[[name, args...], ...]`; each `args` tuple is one invocation
//! of `name`. Events are decoded in order. Unknown names are skipped; a
//! malformed tuple fails only its own event and the rest of the batch is
//! kept.

use core_events::{Action, HighlightSet, Region, Rgb};
use rmpv::Value;
use tracing::debug;

use crate::BridgeError;

/// Actions decoded from one batch plus the per-event failures.
#[derive(Debug, Default)]
pub struct RedrawBatch {
    pub actions: Vec<Action>,
    pub errors: Vec<BridgeError>,
}

/// Stateful decoder. Tracks what the protocol implies but never states:
/// the write position after `put` and the default colours that a
/// `highlight_set` without colours falls back to.
#[derive(Debug, Clone)]
pub struct RedrawDecoder {
    line: u32,
    col: u32,
    default_fg: Rgb,
    default_bg: Rgb,
}

impl Default for RedrawDecoder {
    fn default() -> Self {
        Self {
            line: 0,
            col: 0,
            default_fg: Rgb::WHITE,
            default_bg: Rgb::BLACK,
        }
    }
}

impl RedrawDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, params: &[Value]) -> RedrawBatch {
        let mut batch = RedrawBatch::default();
        for event in params {
            let Some(items) = event.as_array() else {
                batch.errors.push(malformed("<batch>", "event is not an array"));
                continue;
            };
            let Some(name) = items.first().and_then(Value::as_str) else {
                batch.errors.push(malformed("<batch>", "event name is not a string"));
                continue;
            };
            let mut out = Vec::new();
            match self.decode_event(name, &items[1..], &mut out) {
                Ok(()) => batch.actions.extend(out),
                Err(e) => batch.errors.push(e),
            }
        }
        batch
    }

    fn decode_event(&mut self, name: &str, calls: &[Value], out: &mut Vec<Action>) -> Result<(), BridgeError> {
        match name {
            "put" => {
                let mut cells = Vec::with_capacity(calls.len());
                for args in calls {
                    cells.push(text(name, arg(name, args, 0)?)?);
                }
                if cells.is_empty() {
                    return Ok(());
                }
                let advance = cells.len() as u32;
                out.push(Action::put_text(cells));
                self.col = self.col.saturating_add(advance);
                out.push(Action::cursor(self.line, self.col));
            }
            "cursor_goto" => {
                for args in calls {
                    let line = uint(name, arg(name, args, 0)?)?;
                    let col = uint(name, arg(name, args, 1)?)?;
                    self.line = line;
                    self.col = col;
                    out.push(Action::cursor(line, col));
                }
            }
            "highlight_set" => {
                for args in calls {
                    out.push(Action::highlight(self.highlight(arg(name, args, 0)?)?));
                }
            }
            "clear" => repeat(calls, out, Action::clear_all),
            "eol_clear" => repeat(calls, out, Action::clear_eol),
            "resize" => {
                for args in calls {
                    let cols = uint(name, arg(name, args, 0)?)?;
                    let lines = uint(name, arg(name, args, 1)?)?;
                    out.push(Action::resize(lines, cols));
                }
            }
            "update_fg" | "update_bg" => {
                for args in calls {
                    let raw = int(name, arg(name, args, 0)?)?;
                    let Some(color) = Rgb::from_rpc(raw) else {
                        continue;
                    };
                    if name == "update_fg" {
                        self.default_fg = color;
                        out.push(Action::update_fg(color));
                    } else {
                        self.default_bg = color;
                        out.push(Action::update_bg(color));
                    }
                }
            }
            "mode_change" => {
                for args in calls {
                    out.push(Action::mode(text(name, arg(name, args, 0)?)?));
                }
            }
            "busy_start" => repeat(calls, out, Action::busy_start),
            "busy_stop" => repeat(calls, out, Action::busy_stop),
            "mouse_on" => repeat(calls, out, Action::enable_mouse),
            "mouse_off" => repeat(calls, out, Action::disable_mouse),
            "bell" => repeat(calls, out, || Action::bell(false)),
            "visual_bell" => repeat(calls, out, || Action::bell(true)),
            "set_title" => {
                for args in calls {
                    out.push(Action::set_title(text(name, arg(name, args, 0)?)?));
                }
            }
            "set_icon" => {
                for args in calls {
                    out.push(Action::set_icon(text(name, arg(name, args, 0)?)?));
                }
            }
            "set_scroll_region" => {
                for args in calls {
                    let top = uint(name, arg(name, args, 0)?)?;
                    let bottom = uint(name, arg(name, args, 1)?)?;
                    let left = uint(name, arg(name, args, 2)?)?;
                    let right = uint(name, arg(name, args, 3)?)?;
                    out.push(Action::set_scroll_region(Region::new(top, bottom, left, right)));
                }
            }
            "scroll" => {
                for args in calls {
                    out.push(Action::scroll_screen(int(name, arg(name, args, 0)?)?));
                }
            }
            other => {
                debug!(target: "bridge.redraw", event = other, "redraw_event_ignored");
            }
        }
        Ok(())
    }

    /// A `highlight_set` map fully describes the attributes: absent colours
    /// mean the defaults and absent flags mean off.
    fn highlight(&self, map: &Value) -> Result<HighlightSet, BridgeError> {
        let entries = map
            .as_map()
            .ok_or_else(|| malformed("highlight_set", "attributes are not a map"))?;
        let mut set = HighlightSet {
            fg: Some(self.default_fg),
            bg: Some(self.default_bg),
            bold: Some(false),
            italic: Some(false),
            reverse: Some(false),
            underline: Some(false),
            undercurl: Some(false),
        };
        for (key, value) in entries {
            let Some(key) = key.as_str() else {
                continue;
            };
            match key {
                "foreground" => set.fg = value.as_i64().and_then(Rgb::from_rpc).or(set.fg),
                "background" => set.bg = value.as_i64().and_then(Rgb::from_rpc).or(set.bg),
                "bold" => set.bold = Some(truthy(value)),
                "italic" => set.italic = Some(truthy(value)),
                "reverse" => set.reverse = Some(truthy(value)),
                "underline" => set.underline = Some(truthy(value)),
                "undercurl" => set.undercurl = Some(truthy(value)),
                _ => {}
            }
        }
        Ok(set)
    }
}

fn repeat(calls: &[Value], out: &mut Vec<Action>, make: impl Fn() -> Action) {
    for _ in 0..calls.len().max(1) {
        out.push(make());
    }
}

fn malformed(event: &str, reason: impl Into<String>) -> BridgeError {
    BridgeError::Malformed {
        event: event.to_string(),
        reason: reason.into(),
    }
}

fn arg<'a>(event: &str, args: &'a Value, index: usize) -> Result<&'a Value, BridgeError> {
    args.as_array()
        .and_then(|a| a.get(index))
        .ok_or_else(|| malformed(event, format!("missing argument {index}")))
}

fn uint(event: &str, v: &Value) -> Result<u32, BridgeError> {
    let n = int(event, v)?;
    Ok(n.clamp(0, i64::from(u32::MAX)) as u32)
}

fn int(event: &str, v: &Value) -> Result<i64, BridgeError> {
    v.as_i64()
        .ok_or_else(|| malformed(event, format!("{v} is not an integer")))
}

fn text(event: &str, v: &Value) -> Result<String, BridgeError> {
    match v {
        Value::String(s) => Ok(String::from_utf8_lossy(s.as_bytes()).into_owned()),
        Value::Binary(b) => Ok(String::from_utf8_lossy(b).into_owned()),
        other => Err(malformed(event, format!("{other} is not a string"))),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Boolean(b) => *b,
        Value::Nil => false,
        other => other.as_i64().is_some_and(|n| n != 0),
    }
}
