//! Terminal aggregate
//!
//! Owns all emulation state and the host collaborator. Decoding, cursor
//! handling, transport and keyboard each add their own `impl` block on
//! [`Terminal`] in their module.

use std::collections::VecDeque;

use crate::config::{StartUp, TerminalConfig};
use crate::core::host::Host;
use crate::core::term::charset::GSet;
use crate::core::term::params::{ControlString, CsiParams, SequenceTrace};
use crate::core::term::parser::ReceiveTable;
use crate::core::term::state::{CursorBlink, TabStops, TerminalModes, VisualState, CURSOR_COLOR, ROWS};
use crate::core::term::utf8::Utf8Decoder;
use crate::core::uart::{ReceiveRing, RingBuffer, XonOff};
use crate::ui::keymapper::KeyboardState;

/// Terminal emulator state bound to a host
pub struct Terminal<H: Host> {
    pub(crate) host: H,
    pub(crate) config: TerminalConfig,
    pub(crate) modes: TerminalModes,

    pub(crate) vs: VisualState,
    pub(crate) saved_vs: VisualState,
    pub(crate) margin_top: usize,
    pub(crate) margin_bottom: usize,
    pub(crate) tab_stops: TabStops,
    pub(crate) cursor: CursorBlink,

    pub(crate) receive_table: ReceiveTable,
    pub(crate) params: CsiParams,
    pub(crate) utf8: Utf8Decoder,
    pub(crate) control_string: ControlString,
    pub(crate) single_shift: Option<GSet>,
    pub(crate) vt52_row: usize,
    /// Bytes of the current sequence, for logs
    pub(crate) trace: SequenceTrace,
    /// The current sequence was recognized but not acted upon
    pub(crate) unhandled: bool,

    pub(crate) keyboard: KeyboardState,

    pub(crate) transmit_ring: RingBuffer,
    pub(crate) receive_ring: ReceiveRing,
    pub(crate) xon_off_state: XonOff,
    pub(crate) local_echo: VecDeque<u8>,
}

impl<H: Host> Terminal<H> {
    /// Create a terminal with transmit and receive rings of the given
    /// sizes. Call [`init`](Self::init) before feeding it bytes.
    pub fn new(host: H, config: TerminalConfig, transmit_size: usize, receive_size: usize) -> Self {
        Self {
            host,
            modes: TerminalModes::from_config(&config),
            config,
            vs: VisualState::default(),
            saved_vs: VisualState::default(),
            margin_top: 0,
            margin_bottom: ROWS,
            tab_stops: TabStops::default(),
            cursor: CursorBlink::default(),
            receive_table: ReceiveTable::Utf8,
            params: CsiParams::default(),
            utf8: Utf8Decoder::new(),
            control_string: ControlString::default(),
            single_shift: None,
            vt52_row: 0,
            trace: SequenceTrace::default(),
            unhandled: false,
            keyboard: KeyboardState::default(),
            transmit_ring: RingBuffer::new(transmit_size),
            receive_ring: ReceiveRing::new(receive_size),
            xon_off_state: XonOff::Xon,
            local_echo: VecDeque::new(),
        }
    }

    /// Reset everything to power-on defaults, clear the screen, arm the
    /// receive ring and show the start-up banner.
    pub fn init(&mut self) {
        tracing::info!(
            "Terminal init: charset {:?}, receive C1 {:?}, ansi {}",
            self.config.charset,
            self.config.receive_c1_mode,
            self.config.ansi_mode
        );

        self.modes = TerminalModes::from_config(&self.config);
        self.vs = VisualState::default();
        self.saved_vs = VisualState::default();
        self.margin_top = 0;
        self.margin_bottom = ROWS;
        self.tab_stops = TabStops::default();
        self.cursor = CursorBlink::default();

        self.params.clear();
        self.control_string.clear();
        self.single_shift = None;
        self.vt52_row = 0;
        self.reset_receive_table();

        self.keyboard = KeyboardState::default();

        self.host.set_screen_mode(self.modes.screen);
        self.host.clear_rows(0, ROWS, self.vs.inactive_color);
        self.reset_transport();
        self.update_keyboard_leds();

        if self.config.start_up == StartUp::Message {
            let banner = format!("serterm {}\r\n", env!("CARGO_PKG_VERSION"));
            self.receive_string(banner);
        }
    }

    /// RIS: the system collaborator resets, then the terminal returns to
    /// power-on state.
    pub fn system_reset(&mut self) {
        tracing::info!("System reset");
        self.host.system_reset();
        self.init();
    }

    /// Periodic tick (one per millisecond on hardware)
    pub fn timer_tick(&mut self) {
        self.cursor.tick();
        self.tick_key_repeat();
    }

    /// Draw or erase the cursor block when its blink phase changed.
    /// Called once per main loop iteration.
    pub fn update_cursor(&mut self) {
        if self.cursor.update() {
            self.host
                .draw_cursor(self.vs.cursor_row, self.vs.cursor_col, CURSOR_COLOR);
        }
    }

    /// (row, col), 0-based and absolute
    pub fn cursor_position(&self) -> (usize, usize) {
        (self.vs.cursor_row, self.vs.cursor_col)
    }

    pub fn visual_state(&self) -> &VisualState {
        &self.vs
    }

    pub fn modes(&self) -> &TerminalModes {
        &self.modes
    }

    pub fn receive_table(&self) -> ReceiveTable {
        self.receive_table
    }

    /// Scroll region as a half-open row range
    pub fn margins(&self) -> (usize, usize) {
        (self.margin_top, self.margin_bottom)
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Charset;
    use crate::core::test_support::{terminal, RecordingHost};
    use crate::ui::keymapper::LockState;

    #[test]
    fn test_init_shows_banner() {
        let mut term = Terminal::new(RecordingHost::default(), TerminalConfig::default(), 64, 64);
        term.init();
        let banner = format!("serterm {}", env!("CARGO_PKG_VERSION"));
        assert_eq!(term.host().grid.row_text(0).trim_end(), banner);
        assert_eq!(term.cursor_position(), (1, 0));
        // Shown locally, never sent to the remote host
        assert!(term.host().transmitted.is_empty());
    }

    #[test]
    fn test_init_power_on_state() {
        let term = terminal();
        assert_eq!(term.cursor_position(), (0, 0));
        assert_eq!(term.margins(), (0, ROWS));
        assert!(term.receive_table().is_base());
        assert_eq!(term.receive_table(), ReceiveTable::Utf8);
        assert_eq!(term.host().leds.last(), Some(&LockState::NUM));
        assert_eq!(term.host().receive_armed, Some(64));
    }

    #[test]
    fn test_ascii_charset_base_table() {
        let mut config = TerminalConfig::default();
        config.charset = Charset::Ascii;
        config.start_up = StartUp::None;
        let mut term = Terminal::new(RecordingHost::default(), config, 16, 16);
        term.init();
        assert_eq!(term.receive_table(), ReceiveTable::Ascii);
    }

    #[test]
    fn test_system_reset_restores_power_on_state() {
        let mut term = terminal();
        term.receive_string("\x1b[5;20r\x1b[?6h\x1b[4h\x1b[1;31mtext");
        term.system_reset();
        assert_eq!(term.host().resets, 1);
        assert_eq!(term.margins(), (0, ROWS));
        assert!(!term.modes().origin);
        assert!(!term.modes().insert);
        assert_eq!(*term.visual_state(), VisualState::default());
        assert_eq!(term.host().grid.row_text(0).trim_end(), "");
    }

    #[test]
    fn test_cursor_blinks_on_ticks() {
        let mut term = terminal();
        term.update_cursor();
        assert_eq!(term.host().cursor_draws, 1);
        assert!(term.host().grid.cursor_visible());

        for _ in 0..650 {
            term.timer_tick();
        }
        term.update_cursor();
        assert_eq!(term.host().cursor_draws, 2);
        assert!(!term.host().grid.cursor_visible());

        for _ in 0..350 {
            term.timer_tick();
        }
        term.update_cursor();
        assert_eq!(term.host().cursor_draws, 3);
    }

    #[test]
    fn test_motion_erases_drawn_cursor() {
        let mut term = terminal();
        term.update_cursor();
        term.receive_string("\x1b[5;5H");
        assert_eq!(term.host().cursor_draws, 2);
        assert!(!term.host().grid.cursor_visible());
        term.update_cursor();
        assert_eq!(term.host().cursor_draws, 3);
        assert_eq!(term.host().grid.cursor_at(), Some((4, 4)));
    }
}
