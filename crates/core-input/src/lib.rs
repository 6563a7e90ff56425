//! Host key input to editor input notation.
//!
//! The encoder's only state is whether an IME composition is running. While
//! it is, key-down and input-completion events produce nothing; the first
//! completion after the composition ends is forwarded exactly once.
//!
//! Per key-down, first match wins:
//! 1. special key (see [`special_keys`]) -> `<[C-][A-][S-]Name>`, Shift
//!    omitted for `LT`;
//! 2. no Ctrl/Alt held, or the press is a lone modifier -> pass through to
//!    the host's text input;
//! 3. Alt held and the literal-Alt option applies in the current mode ->
//!    `<[C-][A-][S-]c>` with `c` the lowercased character of the key code;
//! 4. otherwise `<[C-][A-][S-]key>`.

pub mod special_keys;

use core_config::{AltLiteralConfig, Config};
use core_events::notation::{key_notation, modifier_prefix};
use core_events::{Action, ModMask};
use tracing::{trace, warn};

pub use special_keys::special_key_name;

const SHIFT_CODE: u32 = 16;
const CTRL_CODE: u32 = 17;
const ALT_CODE: u32 = 18;

/// A key-down as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// Key identifier (`"a"`, `"Enter"`, `"ArrowUp"`); `None` on hosts that
    /// only report numeric codes.
    pub key: Option<String>,
    pub code: u32,
    pub mods: ModMask,
}

impl KeyInput {
    pub fn new(key: impl Into<String>, code: u32, mods: ModMask) -> Self {
        Self {
            key: Some(key.into()),
            code,
            mods,
        }
    }

    pub fn from_code(code: u32, mods: ModMask) -> Self {
        Self {
            key: None,
            code,
            mods,
        }
    }
}

/// What the host should do with a key-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Dispatch the action, prevent the default behaviour and clear the
    /// host's transient text buffer.
    Consumed(Action),
    /// Let the host's text input handle it.
    PassThrough,
    /// IME composition in progress.
    Suppressed,
}

#[derive(Debug, Clone, Default)]
pub struct InputEncoder {
    composing: bool,
    alt_literal: AltLiteralConfig,
}

impl InputEncoder {
    pub fn new(alt_literal: AltLiteralConfig) -> Self {
        Self {
            composing: false,
            alt_literal,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.file.input.alt_literal.clone())
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn composition_start(&mut self) {
        trace!(target: "input.encoder", "composition_start");
        self.composing = true;
    }

    pub fn composition_end(&mut self) {
        trace!(target: "input.encoder", "composition_end");
        self.composing = false;
    }

    /// Encodes one key-down given the editor's current `mode`.
    pub fn key_down(&self, ev: &KeyInput, mode: &str) -> KeyDisposition {
        if self.composing {
            return KeyDisposition::Suppressed;
        }
        let mods = ev.mods;
        let shift = mods.contains(ModMask::SHIFT);

        if let Some(name) = special_key_name(ev.key.as_deref(), ev.code, shift) {
            let with_shift = name != "LT";
            return self.consumed(key_notation(&name, mods, with_shift));
        }

        let ctrl = mods.contains(ModMask::CTRL);
        let alt = mods.contains(ModMask::ALT);
        let lone_modifier = (shift && ev.code == SHIFT_CODE)
            || (ctrl && ev.code == CTRL_CODE)
            || (alt && ev.code == ALT_CODE);
        if (!ctrl && !alt) || lone_modifier {
            return KeyDisposition::PassThrough;
        }

        if alt && self.alt_literal.applies_in(mode) {
            return match char::from_u32(ev.code) {
                Some(c) => {
                    let lower: String = c.to_lowercase().collect();
                    self.consumed(format!("<{}{}>", modifier_prefix(mods, true), lower))
                }
                None => KeyDisposition::PassThrough,
            };
        }

        let key = match ev.key.as_deref() {
            Some(k) => k.to_string(),
            None => match char::from_u32(ev.code) {
                Some(c) => c.to_lowercase().collect(),
                None => return KeyDisposition::PassThrough,
            },
        };
        self.consumed(key_notation(&key, mods, true))
    }

    /// Text committed by the host's text input (plain typing or the end of an
    /// IME composition).
    pub fn input_completed(&self, text: &str) -> Option<Action> {
        if self.composing {
            return None;
        }
        if text.is_empty() {
            warn!(target: "input.encoder", "empty_input_ignored");
            return None;
        }
        trace!(target: "input.encoder", len = text.len(), "text_input");
        Some(Action::input(text))
    }

    pub fn focus_changed(&self, focused: bool) -> Action {
        Action::focus(focused)
    }

    fn consumed(&self, notation: String) -> KeyDisposition {
        trace!(target: "input.encoder", notation = %notation, "key_encoded");
        KeyDisposition::Consumed(Action::input(notation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl Write for LockedWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    /// Runs `f` with `input.encoder` events at TRACE captured as text.
    fn captured<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(BufferWriter { inner: buf.clone() })
            .finish();
        let out = with_default(subscriber, f);
        let text = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        (out, text)
    }

    fn encoder() -> InputEncoder {
        InputEncoder::new(AltLiteralConfig {
            enabled: false,
            modes: vec!["normal".into()],
        })
    }

    fn sent(d: KeyDisposition) -> String {
        match d {
            KeyDisposition::Consumed(Action::Input(s)) => s,
            other => panic!("expected consumed input, got {other:?}"),
        }
    }

    #[test]
    fn ctrl_c() {
        let d = encoder().key_down(&KeyInput::new("c", 67, ModMask::CTRL), "normal");
        assert_eq!(sent(d), "<C-c>");
    }

    #[test]
    fn special_keys_with_and_without_mods() {
        let e = encoder();
        assert_eq!(sent(e.key_down(&KeyInput::new("Escape", 27, ModMask::empty()), "insert")), "<Esc>");
        assert_eq!(
            sent(e.key_down(
                &KeyInput::new("ArrowUp", 38, ModMask::CTRL | ModMask::ALT | ModMask::SHIFT),
                "normal"
            )),
            "<C-A-S-Up>"
        );
        assert_eq!(sent(e.key_down(&KeyInput::new("Enter", 13, ModMask::SHIFT), "normal")), "<S-CR>");
    }

    #[test]
    fn shifted_lt_omits_shift() {
        let e = encoder();
        assert_eq!(sent(e.key_down(&KeyInput::new("<", 188, ModMask::SHIFT), "normal")), "<LT>");
        assert_eq!(sent(e.key_down(&KeyInput::from_code(188, ModMask::SHIFT), "normal")), "<LT>");
        assert_eq!(
            sent(e.key_down(&KeyInput::new("<", 188, ModMask::SHIFT | ModMask::CTRL), "normal")),
            "<C-LT>"
        );
    }

    #[test]
    fn plain_and_lone_modifier_keys_pass_through() {
        let e = encoder();
        assert_eq!(e.key_down(&KeyInput::new("a", 65, ModMask::empty()), "normal"), KeyDisposition::PassThrough);
        assert_eq!(e.key_down(&KeyInput::new("A", 65, ModMask::SHIFT), "normal"), KeyDisposition::PassThrough);
        assert_eq!(e.key_down(&KeyInput::new("Control", 17, ModMask::CTRL), "normal"), KeyDisposition::PassThrough);
        assert_eq!(e.key_down(&KeyInput::new("Alt", 18, ModMask::ALT), "normal"), KeyDisposition::PassThrough);
    }

    #[test]
    fn alt_literal_applies_only_in_configured_modes() {
        let e = InputEncoder::new(AltLiteralConfig {
            enabled: true,
            modes: vec!["normal".into()],
        });
        // Host reports the composed character as the key; the literal path uses the code.
        let ev = KeyInput::new("ø", 79, ModMask::ALT);
        assert_eq!(sent(e.key_down(&ev, "normal")), "<A-o>");
        assert_eq!(sent(e.key_down(&ev, "insert")), "<A-ø>");
    }

    #[test]
    fn code_only_key_falls_back_to_character() {
        let d = encoder().key_down(&KeyInput::from_code(87, ModMask::CTRL), "normal");
        assert_eq!(sent(d), "<C-w>");
    }

    #[test]
    fn composition_suppresses_everything() {
        let mut e = encoder();
        e.composition_start();
        assert!(e.is_composing());
        assert_eq!(e.key_down(&KeyInput::new("c", 67, ModMask::CTRL), "normal"), KeyDisposition::Suppressed);
        assert_eq!(e.input_completed("にほ"), None);
        e.composition_end();
        assert_eq!(e.input_completed("日本"), Some(Action::input("日本")));
    }

    #[test]
    fn empty_completion_is_ignored() {
        let (out, logs) = captured(|| encoder().input_completed(""));
        assert_eq!(out, None);
        assert!(logs.contains("WARN input.encoder:"));
        assert!(logs.contains("empty_input_ignored"));
    }

    #[test]
    fn encoded_keys_are_traced_with_their_notation() {
        let (d, logs) = captured(|| {
            encoder().key_down(&KeyInput::new("Tab", 9, ModMask::CTRL), "normal")
        });
        assert_eq!(sent(d), "<C-Tab>");
        assert!(logs.contains("TRACE input.encoder:"));
        assert!(logs.contains("key_encoded"));
        assert!(logs.contains("notation=<C-Tab>"));
        // Pass-through presses log nothing.
        let (_, quiet) = captured(|| {
            encoder().key_down(&KeyInput::new("a", 65, ModMask::empty()), "normal")
        });
        assert!(quiet.is_empty());
    }

    #[test]
    fn focus_maps_to_action() {
        assert_eq!(encoder().focus_changed(false), Action::focus(false));
    }
}
