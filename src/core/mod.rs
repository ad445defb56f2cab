//! Core terminal emulation components.
//!
//! - **host**: collaborator traits the embedding implements
//! - **term**: VT100/ANSI/VT52 decoder, cursor state machine, device reports
//! - **terminal**: the `Terminal` aggregate, init/reset and tick counters
//! - **uart**: transmit/receive rings, flow control, local echo
//!
//! # Architecture
//!
//! ```text
//! Terminal<H: Host>
//! ├── receive state machine (term::parser, term::csi)
//! ├── visual state (term::state, term::cursor)
//! ├── keyboard encoder (ui::keymapper)
//! └── transport rings (uart)
//!         │
//!         ▼
//!   H: Screen + Uart + System
//! ```

pub mod host;
pub mod term;
pub mod terminal;
pub mod uart;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{StartUp, TerminalConfig};
    use crate::core::host::{Color, DrawStyle, Screen, Scroll, System, Uart};
    use crate::core::terminal::Terminal;
    use crate::ui::grid::GridScreen;
    use crate::ui::keymapper::LockState;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct DrawCall {
        pub row: usize,
        pub col: usize,
        pub codepoint: char,
        pub style: DrawStyle,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct ScrollCall {
        pub scroll: Scroll,
        pub from_row: usize,
        pub to_row: usize,
        pub rows: usize,
    }

    /// Host that keeps a real grid and records every collaborator call
    #[derive(Debug, Default)]
    pub(crate) struct RecordingHost {
        pub grid: GridScreen,
        pub draws: Vec<DrawCall>,
        pub scrolls: Vec<ScrollCall>,
        pub cursor_draws: usize,
        pub transmitted: Vec<u8>,
        /// (length, head) per transmit call
        pub transmit_calls: Vec<(usize, usize)>,
        pub receive_armed: Option<usize>,
        pub leds: Vec<LockState>,
        pub resets: usize,
    }

    impl Screen for RecordingHost {
        fn draw_codepoint(&mut self, row: usize, col: usize, codepoint: char, style: &DrawStyle) {
            self.draws.push(DrawCall {
                row,
                col,
                codepoint,
                style: *style,
            });
            self.grid.draw_codepoint(row, col, codepoint, style);
        }

        fn clear_rows(&mut self, from_row: usize, to_row: usize, color: Color) {
            self.grid.clear_rows(from_row, to_row, color);
        }

        fn clear_cols(&mut self, row: usize, from_col: usize, to_col: usize, color: Color) {
            self.grid.clear_cols(row, from_col, to_col, color);
        }

        fn scroll(&mut self, scroll: Scroll, from_row: usize, to_row: usize, rows: usize, color: Color) {
            self.scrolls.push(ScrollCall {
                scroll,
                from_row,
                to_row,
                rows,
            });
            self.grid.scroll(scroll, from_row, to_row, rows, color);
        }

        fn shift_characters_left(&mut self, row: usize, col: usize, color: Color) {
            self.grid.shift_characters_left(row, col, color);
        }

        fn shift_characters_right(&mut self, row: usize, col: usize, color: Color) {
            self.grid.shift_characters_right(row, col, color);
        }

        fn draw_cursor(&mut self, row: usize, col: usize, color: Color) {
            self.cursor_draws += 1;
            self.grid.draw_cursor(row, col, color);
        }

        fn set_screen_mode(&mut self, negative: bool) {
            self.grid.set_screen_mode(negative);
        }
    }

    impl Uart for RecordingHost {
        fn transmit(&mut self, data: &[u8], head: usize) {
            self.transmitted.extend_from_slice(data);
            self.transmit_calls.push((data.len(), head));
        }

        fn receive(&mut self, length: usize) {
            self.receive_armed = Some(length);
        }
    }

    impl System for RecordingHost {
        fn keyboard_set_leds(&mut self, state: LockState) {
            self.leds.push(state);
        }

        fn system_reset(&mut self) {
            self.resets += 1;
        }
    }

    /// Power-on defaults without the start-up banner
    pub(crate) fn test_config() -> TerminalConfig {
        TerminalConfig {
            start_up: StartUp::None,
            ..TerminalConfig::default()
        }
    }

    pub(crate) fn terminal_sized(
        config: TerminalConfig,
        transmit_size: usize,
        receive_size: usize,
    ) -> Terminal<RecordingHost> {
        let mut term = Terminal::new(RecordingHost::default(), config, transmit_size, receive_size);
        term.init();
        term
    }

    pub(crate) fn terminal_with(config: TerminalConfig) -> Terminal<RecordingHost> {
        terminal_sized(config, 64, 64)
    }

    pub(crate) fn terminal() -> Terminal<RecordingHost> {
        terminal_with(test_config())
    }
}
