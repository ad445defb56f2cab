//! Terminal state management
//!
//! This module defines the cursor and attribute snapshot (`VisualState`),
//! terminal-wide modes, tab stops and the cursor blink phase.

use crate::config::{C1Mode, Charset, TerminalConfig};
use crate::core::host::{Color, DrawStyle};

use super::charset::{CharsetTable, GSet};

pub const COLS: usize = 80;
pub const ROWS: usize = 24;

pub const DEFAULT_ACTIVE_COLOR: Color = 0x7;
pub const DEFAULT_INACTIVE_COLOR: Color = 0x0;
pub const CURSOR_COLOR: Color = 0xF;

const CURSOR_ON_COUNTER: u16 = 650;
const CURSOR_OFF_COUNTER: u16 = 350;

/// Glyph weight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Font {
    #[default]
    Normal,
    Bold,
    Thin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Blink {
    #[default]
    Off,
    Slow,
    Rapid,
}

/// Cursor position, rendition and charset designation.
///
/// Copied wholesale by DECSC/DECRC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualState {
    pub cursor_row: usize,
    pub cursor_col: usize,
    /// A character was written to the last column; the next one wraps first
    pub cursor_last_col: bool,
    pub font: Font,
    pub italic: bool,
    pub underlined: bool,
    pub blink: Blink,
    pub negative: bool,
    pub concealed: bool,
    pub crossedout: bool,
    pub active_color: Color,
    pub inactive_color: Color,
    /// Tables designated to G0-G3
    pub charsets: [CharsetTable; 4],
    /// G-set invoked into GL
    pub gl: GSet,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            cursor_row: 0,
            cursor_col: 0,
            cursor_last_col: false,
            font: Font::Normal,
            italic: false,
            underlined: false,
            blink: Blink::Off,
            negative: false,
            concealed: false,
            crossedout: false,
            active_color: DEFAULT_ACTIVE_COLOR,
            inactive_color: DEFAULT_INACTIVE_COLOR,
            charsets: [CharsetTable::UsAscii; 4],
            gl: GSet::G0,
        }
    }
}

impl VisualState {
    /// SGR 0
    pub fn reset_attributes(&mut self) {
        self.font = Font::Normal;
        self.italic = false;
        self.underlined = false;
        self.blink = Blink::Off;
        self.negative = false;
        self.concealed = false;
        self.crossedout = false;
        self.active_color = DEFAULT_ACTIVE_COLOR;
        self.inactive_color = DEFAULT_INACTIVE_COLOR;
    }

    pub fn reset_charsets(&mut self) {
        self.charsets = [CharsetTable::UsAscii; 4];
        self.gl = GSet::G0;
    }

    pub fn charset(&self, set: GSet) -> CharsetTable {
        self.charsets[set.index()]
    }

    pub fn designate(&mut self, set: GSet, table: CharsetTable) {
        self.charsets[set.index()] = table;
    }

    /// Rendition for the next drawn cell. Negative swaps the colors here only.
    pub fn draw_style(&self) -> DrawStyle {
        let (active, inactive) = if self.negative {
            (self.inactive_color, self.active_color)
        } else {
            (self.active_color, self.inactive_color)
        };

        DrawStyle {
            font: self.font,
            italic: self.italic,
            underlined: self.underlined,
            crossedout: self.crossedout,
            active,
            inactive,
        }
    }
}

/// Terminal-wide modes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalModes {
    /// LNM
    pub new_line: bool,
    /// DECCKM
    pub cursor_key: bool,
    /// KAM
    pub keyboard_action: bool,
    /// DECARM
    pub auto_repeat: bool,
    /// DECAWM
    pub auto_wrap: bool,
    /// DECOM
    pub origin: bool,
    /// IRM
    pub insert: bool,
    /// DECCOLM
    pub column: bool,
    /// DECSCLM
    pub scrolling: bool,
    /// DECSCNM
    pub screen: bool,
    /// DECANM; false is VT52
    pub ansi: bool,
    /// SRM; false enables local echo
    pub send_receive: bool,
    /// Backspace key sends BS instead of DEL
    pub backspace: bool,
    pub charset: Charset,
    pub receive_c1: C1Mode,
    pub transmit_c1: C1Mode,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self::from_config(&TerminalConfig::default())
    }
}

impl TerminalModes {
    pub fn from_config(config: &TerminalConfig) -> Self {
        Self {
            new_line: config.new_line_mode,
            cursor_key: config.cursor_key_mode,
            keyboard_action: false,
            auto_repeat: config.auto_repeat_mode,
            auto_wrap: config.auto_wrap_mode,
            origin: false,
            insert: false,
            column: false,
            scrolling: false,
            screen: config.screen_mode,
            ansi: config.ansi_mode,
            send_receive: config.send_receive_mode,
            backspace: config.backspace_mode,
            charset: config.charset,
            receive_c1: config.receive_c1_mode,
            transmit_c1: config.transmit_c1_mode,
        }
    }

    /// Raw 0x80-0x9F bytes are C1 controls rather than text
    pub fn raw_c1_controls(&self) -> bool {
        self.charset == Charset::Ascii && self.receive_c1 == C1Mode::Bit8
    }
}

/// One tab stop flag per column
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabStops {
    stops: [bool; COLS],
}

impl Default for TabStops {
    fn default() -> Self {
        let mut stops = [false; COLS];
        for (col, stop) in stops.iter_mut().enumerate() {
            *stop = col != 0 && col % 8 == 0;
        }
        Self { stops }
    }
}

impl TabStops {
    pub fn set(&mut self, col: usize) {
        if let Some(stop) = self.stops.get_mut(col) {
            *stop = true;
        }
    }

    pub fn clear(&mut self, col: usize) {
        if let Some(stop) = self.stops.get_mut(col) {
            *stop = false;
        }
    }

    pub fn clear_all(&mut self) {
        self.stops = [false; COLS];
    }

    pub fn is_set(&self, col: usize) -> bool {
        self.stops.get(col).copied().unwrap_or(false)
    }

    /// Next stop after `col`, or the last column
    pub fn next(&self, col: usize) -> usize {
        let mut col = col;
        while col < COLS - 1 {
            col += 1;
            if self.stops[col] {
                break;
            }
        }
        col
    }

    /// Previous stop before `col`, or the first column
    pub fn previous(&self, col: usize) -> usize {
        let mut col = col.min(COLS - 1);
        while col > 0 {
            col -= 1;
            if self.stops[col] {
                break;
            }
        }
        col
    }
}

/// Blink phase of the cursor block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorBlink {
    /// Ticks left in the current phase; 0 disables blinking (DECTCEM off)
    counter: u16,
    on: bool,
    /// The block is currently drawn on screen
    inverted: bool,
}

impl Default for CursorBlink {
    fn default() -> Self {
        Self {
            counter: CURSOR_ON_COUNTER,
            on: true,
            inverted: false,
        }
    }
}

impl CursorBlink {
    pub fn is_enabled(&self) -> bool {
        self.counter != 0
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Restart the on phase. Returns true when a drawn block must be erased.
    pub fn restart(&mut self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let erase = self.inverted;
        self.counter = CURSOR_ON_COUNTER;
        self.on = true;
        self.inverted = false;
        erase
    }

    pub fn enable(&mut self, enable: bool) {
        if enable {
            self.counter = CURSOR_ON_COUNTER;
            self.on = true;
        } else {
            self.counter = 0;
            self.on = false;
        }
        self.inverted = false;
    }

    pub fn tick(&mut self) {
        if self.counter == 0 {
            return;
        }
        self.counter -= 1;
        if self.counter == 0 {
            if self.on {
                self.on = false;
                self.counter = CURSOR_OFF_COUNTER;
            } else {
                self.on = true;
                self.counter = CURSOR_ON_COUNTER;
            }
        }
    }

    /// Returns true when the block must be toggled on screen.
    pub fn update(&mut self) -> bool {
        if self.on != self.inverted {
            self.inverted = self.on;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tab_stops() {
        let tabs = TabStops::default();
        assert!(!tabs.is_set(0));
        assert!(tabs.is_set(8));
        assert_eq!(tabs.next(0), 8);
        assert_eq!(tabs.next(8), 16);
        assert_eq!(tabs.next(75), COLS - 1);
        assert_eq!(tabs.previous(17), 16);
        assert_eq!(tabs.previous(5), 0);
    }

    #[test]
    fn test_cleared_tab_stops() {
        let mut tabs = TabStops::default();
        tabs.clear(8);
        assert_eq!(tabs.next(0), 16);
        tabs.clear_all();
        assert_eq!(tabs.next(0), COLS - 1);
        tabs.set(3);
        assert_eq!(tabs.next(0), 3);
    }

    #[test]
    fn test_negative_swaps_only_draw_colors() {
        let mut vs = VisualState::default();
        vs.active_color = 1;
        vs.inactive_color = 4;
        vs.negative = true;
        let style = vs.draw_style();
        assert_eq!(style.active, 4);
        assert_eq!(style.inactive, 1);
        assert_eq!(vs.active_color, 1);
        assert_eq!(vs.inactive_color, 4);
    }

    #[test]
    fn test_reset_attributes_keeps_position_and_charsets() {
        let mut vs = VisualState::default();
        vs.cursor_row = 3;
        vs.font = Font::Bold;
        vs.blink = Blink::Rapid;
        vs.designate(GSet::G1, CharsetTable::DecSpecialGraphics);
        vs.reset_attributes();
        assert_eq!(vs.font, Font::Normal);
        assert_eq!(vs.blink, Blink::Off);
        assert_eq!(vs.cursor_row, 3);
        assert_eq!(vs.charset(GSet::G1), CharsetTable::DecSpecialGraphics);
    }

    #[test]
    fn test_cursor_blink_phases() {
        let mut blink = CursorBlink::default();
        assert!(blink.update());
        assert!(blink.is_inverted());
        for _ in 0..CURSOR_ON_COUNTER {
            blink.tick();
        }
        assert!(blink.update());
        assert!(!blink.is_inverted());
        for _ in 0..CURSOR_OFF_COUNTER {
            blink.tick();
        }
        assert!(blink.update());
        assert!(!blink.update());
    }

    #[test]
    fn test_cursor_blink_disabled() {
        let mut blink = CursorBlink::default();
        blink.enable(false);
        blink.tick();
        assert!(!blink.update());
        assert!(!blink.restart());
    }
}
