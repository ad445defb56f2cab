//! Key mapping for terminal input
//!
//! Converts USB HID key codes plus modifier and lock state to the bytes
//! the remote host expects, and drives typematic repeat from the tick.

use bitflags::bitflags;

use crate::core::host::Host;
use crate::core::terminal::Terminal;

/// Ticks before the first repeat of a held key
const FIRST_REPEAT_TICKS: u16 = 500;
/// Ticks between subsequent repeats
const NEXT_REPEAT_TICKS: u16 = 33;

/// USB HID usage IDs (keyboard page)
pub mod keys {
    pub const NONE: u8 = 0x00;
    pub const A: u8 = 0x04;
    pub const B: u8 = 0x05;
    pub const C: u8 = 0x06;
    pub const D: u8 = 0x07;
    pub const E: u8 = 0x08;
    pub const F: u8 = 0x09;
    pub const G: u8 = 0x0A;
    pub const H: u8 = 0x0B;
    pub const I: u8 = 0x0C;
    pub const J: u8 = 0x0D;
    pub const K: u8 = 0x0E;
    pub const L: u8 = 0x0F;
    pub const M: u8 = 0x10;
    pub const N: u8 = 0x11;
    pub const O: u8 = 0x12;
    pub const P: u8 = 0x13;
    pub const Q: u8 = 0x14;
    pub const R: u8 = 0x15;
    pub const S: u8 = 0x16;
    pub const T: u8 = 0x17;
    pub const U: u8 = 0x18;
    pub const V: u8 = 0x19;
    pub const W: u8 = 0x1A;
    pub const X: u8 = 0x1B;
    pub const Y: u8 = 0x1C;
    pub const Z: u8 = 0x1D;
    pub const N1: u8 = 0x1E;
    pub const N2: u8 = 0x1F;
    pub const N3: u8 = 0x20;
    pub const N4: u8 = 0x21;
    pub const N5: u8 = 0x22;
    pub const N6: u8 = 0x23;
    pub const N7: u8 = 0x24;
    pub const N8: u8 = 0x25;
    pub const N9: u8 = 0x26;
    pub const N0: u8 = 0x27;
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const BACKSPACE: u8 = 0x2A;
    pub const TAB: u8 = 0x2B;
    pub const SPACE: u8 = 0x2C;
    pub const MINUS: u8 = 0x2D;
    pub const EQUAL: u8 = 0x2E;
    pub const LEFT_BRACKET: u8 = 0x2F;
    pub const RIGHT_BRACKET: u8 = 0x30;
    pub const BACKSLASH: u8 = 0x31;
    pub const NON_US_HASH: u8 = 0x32;
    pub const SEMICOLON: u8 = 0x33;
    pub const APOSTROPHE: u8 = 0x34;
    pub const GRAVE: u8 = 0x35;
    pub const COMMA: u8 = 0x36;
    pub const DOT: u8 = 0x37;
    pub const SLASH: u8 = 0x38;
    pub const CAPS_LOCK: u8 = 0x39;
    pub const F1: u8 = 0x3A;
    pub const F2: u8 = 0x3B;
    pub const F3: u8 = 0x3C;
    pub const F4: u8 = 0x3D;
    pub const F5: u8 = 0x3E;
    pub const F6: u8 = 0x3F;
    pub const F7: u8 = 0x40;
    pub const F8: u8 = 0x41;
    pub const F9: u8 = 0x42;
    pub const F10: u8 = 0x43;
    pub const F11: u8 = 0x44;
    pub const F12: u8 = 0x45;
    pub const PRINT_SCREEN: u8 = 0x46;
    pub const SCROLL_LOCK: u8 = 0x47;
    pub const PAUSE: u8 = 0x48;
    pub const INSERT: u8 = 0x49;
    pub const HOME: u8 = 0x4A;
    pub const PAGE_UP: u8 = 0x4B;
    pub const DELETE: u8 = 0x4C;
    pub const END: u8 = 0x4D;
    pub const PAGE_DOWN: u8 = 0x4E;
    pub const RIGHT: u8 = 0x4F;
    pub const LEFT: u8 = 0x50;
    pub const DOWN: u8 = 0x51;
    pub const UP: u8 = 0x52;
    pub const NUM_LOCK: u8 = 0x53;
    pub const KP_SLASH: u8 = 0x54;
    pub const KP_ASTERISK: u8 = 0x55;
    pub const KP_MINUS: u8 = 0x56;
    pub const KP_PLUS: u8 = 0x57;
    pub const KP_ENTER: u8 = 0x58;
    pub const KP_1: u8 = 0x59;
    pub const KP_9: u8 = 0x61;
    pub const KP_0: u8 = 0x62;
    pub const KP_DOT: u8 = 0x63;
}

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

bitflags! {
    /// Keyboard lock state, mirrored on the keyboard LEDs
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LockState: u8 {
        const NUM    = 0b0001;
        const CAPS   = 0b0010;
        const SCROLL = 0b0100;
    }
}

/// Local effect of a key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyHandler {
    CapsLock,
    NumLock,
    ScrollLock,
}

/// What a key press does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Ignore,
    /// One byte; prefixed with ESC while Alt is held
    Char(u8),
    Str(&'static [u8]),
    Handler(KeyHandler),
}

/// Terminal state consulted when mapping a key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyContext {
    pub modifiers: Modifiers,
    pub lock_state: LockState,
    /// LNM
    pub new_line: bool,
    /// DECCKM
    pub cursor_key: bool,
    /// false in VT52 mode
    pub ansi: bool,
    /// Backspace sends BS instead of DEL
    pub backspace: bool,
}

/// Digit and punctuation keys: (code, plain, shifted, with Ctrl)
const PRINTABLE_KEYS: [(u8, u8, u8, Option<u8>); 22] = [
    (keys::N1, b'1', b'!', None),
    (keys::N2, b'2', b'@', Some(0x00)),
    (keys::N3, b'3', b'#', Some(0x1B)),
    (keys::N4, b'4', b'$', Some(0x1C)),
    (keys::N5, b'5', b'%', Some(0x1D)),
    (keys::N6, b'6', b'^', Some(0x1E)),
    (keys::N7, b'7', b'&', Some(0x1F)),
    (keys::N8, b'8', b'*', Some(0x7F)),
    (keys::N9, b'9', b'(', None),
    (keys::N0, b'0', b')', None),
    (keys::MINUS, b'-', b'_', None),
    (keys::EQUAL, b'=', b'+', None),
    (keys::LEFT_BRACKET, b'[', b'{', Some(0x1B)),
    (keys::RIGHT_BRACKET, b']', b'}', Some(0x1D)),
    (keys::BACKSLASH, b'\\', b'|', Some(0x1C)),
    (keys::NON_US_HASH, b'#', b'~', None),
    (keys::SEMICOLON, b';', b':', None),
    (keys::APOSTROPHE, b'\'', b'"', None),
    (keys::GRAVE, b'`', b'~', Some(0x1E)),
    (keys::COMMA, b',', b'<', None),
    (keys::DOT, b'.', b'>', None),
    (keys::SLASH, b'/', b'?', Some(0x1F)),
];

const FUNCTION_KEYS: [&[u8]; 12] = [
    b"\x1b[11~", b"\x1b[12~", b"\x1b[13~", b"\x1b[14~", b"\x1b[15~", b"\x1b[17~",
    b"\x1b[18~", b"\x1b[19~", b"\x1b[20~", b"\x1b[21~", b"\x1b[23~", b"\x1b[24~",
];

/// Insert, Home, PageUp, Delete, End, PageDown
const EDITING_KEYS: [&[u8]; 6] = [
    b"\x1b[2~", b"\x1b[1~", b"\x1b[5~", b"\x1b[3~", b"\x1b[4~", b"\x1b[6~",
];

/// Right, Left, Down, Up
const CURSOR_KEYS: [&[u8]; 4] = [b"\x1b[C", b"\x1b[D", b"\x1b[B", b"\x1b[A"];
const CURSOR_KEYS_APPLICATION: [&[u8]; 4] = [b"\x1bOC", b"\x1bOD", b"\x1bOB", b"\x1bOA"];
const CURSOR_KEYS_VT52: [&[u8]; 4] = [b"\x1bC", b"\x1bD", b"\x1bB", b"\x1bA"];

/// Keypad in HID order: / * - + Enter 1-9 0 .
const KEYPAD_NUMERIC: [u8; 16] = [
    b'/', b'*', b'-', b'+', b'\r', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'0',
    b'.',
];
const KEYPAD_APPLICATION: [&[u8]; 16] = [
    b"\x1bOo", b"\x1bOj", b"\x1bOm", b"\x1bOk", b"\x1bOM", b"\x1bOq", b"\x1bOr", b"\x1bOs",
    b"\x1bOt", b"\x1bOu", b"\x1bOv", b"\x1bOw", b"\x1bOx", b"\x1bOy", b"\x1bOp", b"\x1bOn",
];
const KEYPAD_VT52: [&[u8]; 16] = [
    b"\x1b?o", b"\x1b?j", b"\x1b?m", b"\x1b?k", b"\x1b?M", b"\x1b?q", b"\x1b?r", b"\x1b?s",
    b"\x1b?t", b"\x1b?u", b"\x1b?v", b"\x1b?w", b"\x1b?x", b"\x1b?y", b"\x1b?p", b"\x1b?n",
];

/// Map a key code to its action under `context`.
pub fn key_action(code: u8, context: &KeyContext) -> KeyAction {
    let shift = context.modifiers.contains(Modifiers::SHIFT);
    let ctrl = context.modifiers.contains(Modifiers::CTRL);

    match code {
        keys::A..=keys::Z => {
            let offset = code - keys::A;
            if ctrl {
                KeyAction::Char(offset + 1)
            } else if context.lock_state.contains(LockState::CAPS) ^ shift {
                KeyAction::Char(b'A' + offset)
            } else {
                KeyAction::Char(b'a' + offset)
            }
        }
        keys::ENTER => enter(context),
        keys::ESCAPE => KeyAction::Char(0x1B),
        keys::BACKSPACE => {
            if ctrl {
                KeyAction::Char(0x18)
            } else if context.backspace {
                KeyAction::Char(0x08)
            } else {
                KeyAction::Char(0x7F)
            }
        }
        keys::TAB => KeyAction::Char(b'\t'),
        keys::SPACE => KeyAction::Char(if ctrl { 0x00 } else { b' ' }),
        keys::CAPS_LOCK => KeyAction::Handler(KeyHandler::CapsLock),
        keys::SCROLL_LOCK => KeyAction::Handler(KeyHandler::ScrollLock),
        keys::NUM_LOCK => KeyAction::Handler(KeyHandler::NumLock),
        keys::F1..=keys::F12 => KeyAction::Str(FUNCTION_KEYS[usize::from(code - keys::F1)]),
        keys::INSERT..=keys::PAGE_DOWN => {
            KeyAction::Str(EDITING_KEYS[usize::from(code - keys::INSERT)])
        }
        keys::RIGHT..=keys::UP => {
            let index = usize::from(code - keys::RIGHT);
            let table = if !context.ansi {
                &CURSOR_KEYS_VT52
            } else if context.cursor_key {
                &CURSOR_KEYS_APPLICATION
            } else {
                &CURSOR_KEYS
            };
            KeyAction::Str(table[index])
        }
        keys::KP_SLASH..=keys::KP_DOT => keypad(code, context),
        _ => match PRINTABLE_KEYS.iter().find(|(key, ..)| *key == code) {
            Some(&(_, _, _, Some(control))) if ctrl => KeyAction::Char(control),
            Some(&(_, plain, shifted, _)) => KeyAction::Char(if shift { shifted } else { plain }),
            None => KeyAction::Ignore,
        },
    }
}

fn enter(context: &KeyContext) -> KeyAction {
    if context.new_line {
        KeyAction::Str(b"\r\n")
    } else {
        KeyAction::Char(b'\r')
    }
}

/// Num lock on: the main keys' characters. Off: application keypad.
fn keypad(code: u8, context: &KeyContext) -> KeyAction {
    let index = usize::from(code - keys::KP_SLASH);

    if context.lock_state.contains(LockState::NUM) {
        if code == keys::KP_ENTER {
            return enter(context);
        }
        KeyAction::Char(KEYPAD_NUMERIC[index])
    } else if context.ansi {
        KeyAction::Str(KEYPAD_APPLICATION[index])
    } else {
        KeyAction::Str(KEYPAD_VT52[index])
    }
}

/// Keys that never auto-repeat
fn repeat_exempt(code: u8) -> bool {
    matches!(
        code,
        keys::NONE
            | keys::ESCAPE
            | keys::TAB
            | keys::ENTER
            | keys::CAPS_LOCK
            | keys::NUM_LOCK
            | keys::SCROLL_LOCK
    )
}

/// Keyboard side of the terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyboardState {
    pub(crate) pressed_key: u8,
    pub(crate) modifiers: Modifiers,
    pub(crate) lock_state: LockState,
    pub(crate) repeat_counter: u16,
    pub(crate) repeat_pending: bool,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self {
            pressed_key: keys::NONE,
            modifiers: Modifiers::empty(),
            lock_state: LockState::NUM,
            repeat_counter: 0,
            repeat_pending: false,
        }
    }
}

impl<H: Host> Terminal<H> {
    /// Key code reported by the keyboard; [`keys::NONE`] on release.
    /// Reports of the already pressed key are ignored.
    pub fn handle_key(&mut self, code: u8) {
        if self.keyboard.pressed_key == code {
            return;
        }

        self.keyboard.pressed_key = code;
        self.keyboard.repeat_pending = false;
        self.keyboard.repeat_counter = if repeat_exempt(code)
            || self.keyboard.modifiers.contains(Modifiers::CTRL)
            || !self.modes.auto_repeat
        {
            0
        } else {
            FIRST_REPEAT_TICKS
        };

        self.dispatch_key(code);
    }

    pub fn handle_shift(&mut self, pressed: bool) {
        self.keyboard.modifiers.set(Modifiers::SHIFT, pressed);
    }

    pub fn handle_alt(&mut self, pressed: bool) {
        self.keyboard.modifiers.set(Modifiers::ALT, pressed);
    }

    pub fn handle_ctrl(&mut self, pressed: bool) {
        self.keyboard.modifiers.set(Modifiers::CTRL, pressed);
    }

    /// Re-dispatch the held key once its repeat interval elapsed. Called
    /// once per main loop iteration.
    pub fn repeat_key(&mut self) {
        if !self.keyboard.repeat_pending {
            return;
        }
        self.keyboard.repeat_pending = false;
        self.keyboard.repeat_counter = NEXT_REPEAT_TICKS;
        self.dispatch_key(self.keyboard.pressed_key);
    }

    pub(crate) fn tick_key_repeat(&mut self) {
        if self.keyboard.repeat_counter == 0 {
            return;
        }
        self.keyboard.repeat_counter -= 1;
        if self.keyboard.repeat_counter == 0 {
            self.keyboard.repeat_pending = true;
        }
    }

    pub fn lock_state(&self) -> LockState {
        self.keyboard.lock_state
    }

    /// Numeric (num lock on) or application keypad
    pub(crate) fn set_numeric_keypad(&mut self, numeric: bool) {
        self.keyboard.lock_state.set(LockState::NUM, numeric);
        self.update_keyboard_leds();
    }

    pub(crate) fn update_keyboard_leds(&mut self) {
        self.host.keyboard_set_leds(self.keyboard.lock_state);
    }

    fn key_context(&self) -> KeyContext {
        KeyContext {
            modifiers: self.keyboard.modifiers,
            lock_state: self.keyboard.lock_state,
            new_line: self.modes.new_line,
            cursor_key: self.modes.cursor_key,
            ansi: self.modes.ansi,
            backspace: self.modes.backspace,
        }
    }

    fn dispatch_key(&mut self, code: u8) {
        let action = key_action(code, &self.key_context());

        if let KeyAction::Handler(handler) = action {
            let lock = match handler {
                KeyHandler::CapsLock => LockState::CAPS,
                KeyHandler::NumLock => LockState::NUM,
                KeyHandler::ScrollLock => LockState::SCROLL,
            };
            self.keyboard.lock_state.toggle(lock);
            self.update_keyboard_leds();
            return;
        }

        // KAM
        if self.modes.keyboard_action {
            tracing::trace!("Keyboard locked, dropping key {:#04x}", code);
            return;
        }

        match action {
            KeyAction::Char(byte) if self.keyboard.modifiers.contains(Modifiers::ALT) => {
                self.transmit(&[0x1B, byte])
            }
            KeyAction::Char(byte) => self.transmit(&[byte]),
            KeyAction::Str(bytes) => self.transmit(bytes),
            KeyAction::Ignore | KeyAction::Handler(_) => {}
        }
    }
}
