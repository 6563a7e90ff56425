//! End-to-end behaviour of the serial event path: host input and editor
//! redraws in, pixels and RPC requests out.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use core_bridge::{BridgeError, MemorySink, RpcMessage, RpcSink};
use core_config::Config;
use core_events::{Action, ActionKind, DispatchError, ModMask, MouseButton, Rgb};
use core_frontend::{Frontend, FrontendError};
use core_input::{KeyDisposition, KeyInput};
use core_render::{PixelBuffer, PointerInput, Surface};
use pretty_assertions::assert_eq;
use rmpv::Value;

fn started() -> Frontend<PixelBuffer, MemorySink> {
    let surface = PixelBuffer::new(1, 1).unwrap();
    let mut fe = Frontend::new(surface, MemorySink::default(), &Config::default());
    fe.start().unwrap();
    fe
}

/// `nvim_input` payloads sent so far, in order.
fn inputs(fe: &Frontend<PixelBuffer, MemorySink>) -> Vec<String> {
    fe.bridge()
        .sink()
        .sent
        .iter()
        .filter_map(|m| match m {
            RpcMessage::Request { method, params, .. } if method == "nvim_input" => {
                params.first().and_then(Value::as_str).map(str::to_string)
            }
            _ => None,
        })
        .collect()
}

fn redraw(events: Vec<(&str, Vec<Vec<Value>>)>) -> RpcMessage {
    let params = events
        .into_iter()
        .map(|(name, calls)| {
            let mut items = vec![Value::from(name)];
            items.extend(calls.into_iter().map(Value::Array));
            Value::Array(items)
        })
        .collect();
    RpcMessage::notification("redraw", params)
}

#[test]
fn ctrl_c_is_sent_as_notation() {
    let mut fe = started();
    let disposition = fe
        .key_down(&KeyInput::new("c", 67, ModMask::CTRL))
        .unwrap();
    assert!(matches!(disposition, KeyDisposition::Consumed(_)));
    assert_eq!(inputs(&fe), vec!["<C-c>"]);
}

#[test]
fn shifted_less_than_drops_shift() {
    let mut fe = started();
    fe.key_down(&KeyInput::new("<", 188, ModMask::SHIFT)).unwrap();
    assert_eq!(inputs(&fe), vec!["<LT>"]);
}

#[test]
fn plain_keys_pass_through_to_text_input() {
    let mut fe = started();
    let disposition = fe.key_down(&KeyInput::new("a", 65, ModMask::empty())).unwrap();
    assert_eq!(disposition, KeyDisposition::PassThrough);
    fe.input_completed("a").unwrap();
    assert_eq!(inputs(&fe), vec!["a"]);
}

#[test]
fn composition_sends_exactly_one_input() {
    let mut fe = started();
    fe.composition_start();
    assert_eq!(
        fe.key_down(&KeyInput::new("k", 75, ModMask::CTRL)).unwrap(),
        KeyDisposition::Suppressed
    );
    fe.input_completed("k").unwrap();
    fe.input_completed("か").unwrap();
    assert!(inputs(&fe).is_empty());
    fe.composition_end();
    fe.input_completed("かな").unwrap();
    assert_eq!(inputs(&fe), vec!["かな"]);
}

#[test]
fn reentrant_dispatch_is_rejected_without_side_effects() {
    let mut fe = started();
    let dispatcher = fe.dispatcher();
    let nested = Rc::new(RefCell::new(None));
    {
        let inner = Rc::clone(&dispatcher);
        let nested = Rc::clone(&nested);
        dispatcher.register(move |action| {
            if matches!(action, Action::Cursor { .. }) {
                *nested.borrow_mut() = Some(inner.dispatch(&Action::input("x")));
            }
            Ok(())
        });
    }
    let before = fe.bridge().sink().sent.len();
    fe.dispatch(Action::cursor(3, 4)).unwrap();

    let result = nested.borrow_mut().take().unwrap();
    assert!(matches!(
        result,
        Err(DispatchError::Reentrant {
            action: ActionKind::Input
        })
    ));
    assert_eq!(fe.bridge().sink().sent.len(), before);
    assert_eq!((fe.state().cursor.line, fe.state().cursor.col), (3, 4));
}

#[test]
fn redraw_batch_paints_the_surface() {
    let mut fe = started();
    let highlight = Value::Map(vec![(Value::from("foreground"), Value::from(0xff0000))]);
    fe.handle_rpc(redraw(vec![
        ("update_bg", vec![vec![0x102030.into()]]),
        ("highlight_set", vec![vec![highlight]]),
        ("cursor_goto", vec![vec![0.into(), 0.into()]]),
        ("put", vec![vec!["X".into()], vec![" ".into()]]),
    ]))
    .unwrap();

    let state = fe.state();
    assert_eq!((state.cursor.line, state.cursor.col), (0, 2));
    assert_eq!(state.default_bg, Rgb(0x102030));
    drop(state);

    let surface = fe.surface();
    // Glyph block of the first cell, its background and the blank second cell.
    assert_eq!(surface.pixel(4, 6), Some(Rgb(0xff0000)));
    assert_eq!(surface.pixel(4, 14), Some(Rgb(0x102030)));
    assert_eq!(surface.pixel(12, 6), Some(Rgb(0x102030)));
    assert_eq!(surface.pixel(400, 300), Some(Rgb(0x102030)));
}

#[test]
fn editor_resize_refits_the_surface() {
    let mut fe = started();
    fe.handle_rpc(redraw(vec![("resize", vec![vec![120.into(), 40.into()]])]))
        .unwrap();
    let state = fe.state();
    assert_eq!((state.size.lines, state.size.cols), (40, 120));
    assert_eq!(state.size.width, 120 * state.font_attr.cell_width);
    assert_eq!(state.size.height, 40 * state.font_attr.cell_height);
    assert_eq!(fe.surface().size(), (state.size.width, state.size.height));
}

#[test]
fn oversized_editor_resize_is_rejected() {
    let mut fe = started();
    let err = fe
        .handle_rpc(redraw(vec![
            ("resize", vec![vec![5_000_000_000u64.into(), 80.into()]]),
            ("cursor_goto", vec![vec![2.into(), 3.into()]]),
        ]))
        .unwrap_err();
    assert!(matches!(
        err,
        FrontendError::Dispatch(DispatchError::HandlerFailure { .. })
    ));
    let state = fe.state();
    assert_eq!((state.size.lines, state.size.cols), (37, 100));
    assert_eq!((state.size.width, state.size.height), (800, 592));
    assert_eq!((state.cursor.line, state.cursor.col), (2, 3));
    drop(state);
    assert_eq!(fe.surface().size(), (800, 592));
}

#[test]
fn oversized_font_is_rejected() {
    let mut fe = started();
    assert!(fe.change_font_px(u32::MAX).is_err());
    let state = fe.state();
    assert_eq!(state.font_attr.specified_px, 12);
    assert_eq!((state.font_attr.cell_width, state.font_attr.cell_height), (8, 16));
}

#[test]
fn host_resize_asks_the_editor_to_resize() {
    let mut fe = started();
    fe.resize_px(400, 320).unwrap();
    let last = fe.bridge().sink().sent.last().cloned();
    assert_eq!(
        last,
        Some(RpcMessage::request(
            1,
            "nvim_ui_try_resize",
            vec![50.into(), 20.into()]
        ))
    );
}

#[test]
fn drag_is_forwarded_only_when_mouse_enabled() {
    let mut fe = started();
    let press = PointerInput {
        x: 20,
        y: 40,
        button: MouseButton::Left,
        buttons: 1,
        mods: ModMask::empty(),
    };
    fe.mouse_down(&press).unwrap();
    assert!(inputs(&fe).is_empty());

    fe.handle_rpc(redraw(vec![("mouse_on", vec![vec![]])])).unwrap();
    fe.mouse_down(&press).unwrap();
    fe.mouse_move(&PointerInput { x: 21, ..press }).unwrap();
    fe.mouse_move(&PointerInput { x: 30, ..press }).unwrap();
    fe.mouse_up(&PointerInput { x: 30, buttons: 0, ..press }).unwrap();
    assert_eq!(
        inputs(&fe),
        vec![
            "<LeftMouse><2,2>",
            "<LeftDrag><3,2>",
            "<LeftRelease><3,2>",
        ]
    );
}

#[test]
fn input_after_disconnect_is_dropped() {
    let mut fe = started();
    let notified = Rc::new(Cell::new(false));
    let flag = Rc::clone(&notified);
    fe.subscribe(move |note, _| {
        if note.name() == "disconnected" {
            flag.set(true);
        }
    });
    fe.disconnected().unwrap();
    fe.input_completed("i").unwrap();
    assert!(notified.get());
    assert!(!fe.state().attached);
    assert!(!fe.bridge().is_connected());
    assert!(inputs(&fe).is_empty());
}

struct BrokenPipe;

impl RpcSink for BrokenPipe {
    fn send(&mut self, _msg: &RpcMessage) -> Result<(), BridgeError> {
        Err(BridgeError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")))
    }
}

#[test]
fn write_failure_disconnects() {
    let surface = PixelBuffer::new(1, 1).unwrap();
    let mut fe = Frontend::new(surface, BrokenPipe, &Config::default());
    assert!(matches!(fe.start(), Err(FrontendError::Bridge(BridgeError::Io(_)))));
    fe.input_completed("x").unwrap();
    assert!(!fe.state().attached);
}
