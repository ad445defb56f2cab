//! Control sequence execution
//!
//! Cursor and erase commands, SGR, ANSI and DEC private modes, and the
//! device reports (DA, DSR, DECREQTPARM, DECRQSS).

use crate::core::host::{Color, Host, Scroll};
use crate::core::terminal::Terminal;

use super::parser::CsiCommand;
use super::state::{Blink, Font, VisualState, DEFAULT_ACTIVE_COLOR, DEFAULT_INACTIVE_COLOR, ROWS};

/// Setting named in a DECRQSS request (`DCS $ q <setting> ST`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusRequest {
    Sgr,
    Margins,
    ConformanceLevel,
    ProtectionAttribute,
    Invalid,
}

impl StatusRequest {
    fn parse(payload: &[u8]) -> Option<Self> {
        let setting = payload.strip_prefix(b"$q")?;
        Some(match setting {
            b"m" => StatusRequest::Sgr,
            b"r" => StatusRequest::Margins,
            b"\"p" => StatusRequest::ConformanceLevel,
            b"\"q" => StatusRequest::ProtectionAttribute,
            _ => StatusRequest::Invalid,
        })
    }
}

impl<H: Host> Terminal<H> {
    pub(crate) fn execute_csi(&mut self, command: CsiCommand) {
        let p0 = i32::from(self.params.get(0));
        let p1 = i32::from(self.params.get(1));
        let count = usize::from(self.params.get_or(0, 1));
        let distance = count as i32;

        match command {
            CsiCommand::InsertCharacters => self.insert_characters(count),
            CsiCommand::CursorUp => self.move_cursor(-distance, 0),
            CsiCommand::CursorDown | CsiCommand::RowRelative => self.move_cursor(distance, 0),
            CsiCommand::CursorForward | CsiCommand::ColumnRelative => {
                self.move_cursor(0, distance)
            }
            CsiCommand::CursorBackward => self.move_cursor(0, -distance),
            CsiCommand::CursorNextLine => {
                self.carriage_return();
                self.index(count);
            }
            CsiCommand::CursorPrecedingLine => {
                self.carriage_return();
                self.reverse_index(count);
            }
            CsiCommand::CursorColumn | CsiCommand::ColumnAbsolute => {
                self.move_cursor_absolute(self.relative_cursor_row() as i32, p0 - 1)
            }
            CsiCommand::CursorPosition => self.move_cursor_absolute(p0 - 1, p1 - 1),
            CsiCommand::RowAbsolute => {
                self.move_cursor_absolute(p0 - 1, self.vs.cursor_col as i32)
            }
            CsiCommand::ForwardTab => self.horizontal_tab(count),
            CsiCommand::BackwardTab => self.backward_tab(count),
            CsiCommand::EraseDisplay => match p0 {
                0 => {
                    self.clear_to_right();
                    self.clear_to_bottom();
                }
                1 => {
                    self.clear_to_left();
                    self.clear_to_top();
                }
                2 | 3 => self.clear_all(),
                _ => self.unhandled = true,
            },
            CsiCommand::EraseLine => match p0 {
                0 => self.clear_to_right(),
                1 => self.clear_to_left(),
                2 => self.clear_row(),
                _ => self.unhandled = true,
            },
            CsiCommand::InsertLines => self.insert_lines(count),
            CsiCommand::DeleteLines => self.delete_lines(count),
            CsiCommand::DeleteCharacters => self.delete_characters(count),
            CsiCommand::EraseCharacters => self.erase_characters(count),
            CsiCommand::ScrollUp => self.scroll(Scroll::Up, self.margin_top, self.margin_bottom, count),
            CsiCommand::ScrollDown => {
                self.scroll(Scroll::Down, self.margin_top, self.margin_bottom, count)
            }
            CsiCommand::DeviceAttributes => {
                if p0 == 0 {
                    self.report_device_attributes();
                }
            }
            CsiCommand::SecondaryDeviceAttributes => {
                if p0 == 0 {
                    self.transmit_csi(">1;10;0c");
                }
            }
            CsiCommand::TabClear => match p0 {
                0 => self.tab_stops.clear(self.vs.cursor_col),
                3 => self.tab_stops.clear_all(),
                _ => self.unhandled = true,
            },
            CsiCommand::SetMode | CsiCommand::ResetMode => {
                let enable = command == CsiCommand::SetMode;
                for i in 0..self.params.count().max(1) {
                    self.set_ansi_mode(self.params.get(i), enable);
                }
            }
            CsiCommand::DecSetMode | CsiCommand::DecResetMode => {
                let enable = command == CsiCommand::DecSetMode;
                for i in 0..self.params.count().max(1) {
                    self.set_dec_mode(self.params.get(i), enable);
                }
            }
            CsiCommand::SelectGraphicRendition => self.select_graphic_rendition(),
            CsiCommand::DeviceStatusReport => match p0 {
                5 => self.transmit_csi("0n"),
                6 => {
                    let report = format!(
                        "{};{}R",
                        self.relative_cursor_row() + 1,
                        self.vs.cursor_col + 1
                    );
                    self.transmit_csi(&report);
                }
                _ => self.unhandled = true,
            },
            CsiCommand::SetMargins => self.set_margins(p0, p1),
            CsiCommand::SaveCursor => self.save_visual_state(),
            CsiCommand::RestoreCursor => self.restore_visual_state(),
            CsiCommand::RequestTerminalParameters => self.report_terminal_parameters(p0),
            CsiCommand::ConfidenceTest => {}
            CsiCommand::SoftReset => self.soft_reset(),
        }
    }

    fn select_graphic_rendition(&mut self) {
        let vs = &mut self.vs;
        let mut params = self.params.values();

        while let Some(code) = params.next() {
            match code {
                0 => vs.reset_attributes(),
                1 => vs.font = Font::Bold,
                2 => vs.font = Font::Thin,
                3 => vs.italic = true,
                4 => vs.underlined = true,
                5 => vs.blink = Blink::Slow,
                6 => vs.blink = Blink::Rapid,
                7 => vs.negative = true,
                8 => vs.concealed = true,
                9 => vs.crossedout = true,
                10 | 21 | 22 => vs.font = Font::Normal,
                23 => vs.italic = false,
                24 => vs.underlined = false,
                25 => vs.blink = Blink::Off,
                27 => vs.negative = false,
                28 => vs.concealed = false,
                29 => vs.crossedout = false,
                30..=37 => vs.active_color = (code - 30) as Color,
                38 => vs.active_color = extended_color(&mut params, DEFAULT_ACTIVE_COLOR),
                39 => vs.active_color = DEFAULT_ACTIVE_COLOR,
                40..=47 => vs.inactive_color = (code - 40) as Color,
                48 => vs.inactive_color = extended_color(&mut params, DEFAULT_INACTIVE_COLOR),
                49 => vs.inactive_color = DEFAULT_INACTIVE_COLOR,
                90..=97 => vs.active_color = (code - 90 + 8) as Color,
                100..=107 => vs.inactive_color = (code - 100 + 8) as Color,
                _ => {
                    tracing::debug!("Unknown SGR: {}", code);
                    self.unhandled = true;
                }
            }
        }
    }

    fn set_ansi_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            2 => self.modes.keyboard_action = enable,
            4 => self.modes.insert = enable,
            12 => self.modes.send_receive = enable,
            20 => self.modes.new_line = enable,
            _ => {
                tracing::debug!("Unknown ANSI mode: {} {}", mode, enable);
                self.unhandled = true;
            }
        }
    }

    fn set_dec_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => self.modes.cursor_key = enable,
            2 => self.modes.ansi = enable,
            3 => {
                self.modes.column = enable;
                self.clear_all();
                self.move_cursor_absolute(0, 0);
            }
            4 => self.modes.scrolling = enable,
            5 => {
                self.modes.screen = enable;
                self.host.set_screen_mode(enable);
            }
            6 => {
                self.modes.origin = enable;
                self.move_cursor_absolute(0, 0);
            }
            7 => self.modes.auto_wrap = enable,
            8 => self.modes.auto_repeat = enable,
            // DECINLM
            9 => {}
            25 => {
                self.clear_cursor();
                self.cursor.enable(enable);
            }
            66 => self.set_numeric_keypad(!enable),
            _ => {
                tracing::debug!("Unknown DEC private mode: {} {}", mode, enable);
                self.unhandled = true;
            }
        }
    }

    /// DECSTBM. Invalid bounds are ignored; valid ones home the cursor.
    fn set_margins(&mut self, top: i32, bottom: i32) {
        let top = if top > 0 { top - 1 } else { top };
        let bottom = if bottom == 0 { ROWS as i32 } else { bottom };

        if top >= 0 && top < bottom && bottom <= ROWS as i32 {
            self.margin_top = top as usize;
            self.margin_bottom = bottom as usize;
            self.move_cursor_absolute(0, 0);
        } else {
            tracing::debug!("Ignoring margins {}..{}", top, bottom);
        }
    }

    /// DECSTR
    pub(crate) fn soft_reset(&mut self) {
        tracing::info!("Soft reset");
        self.modes.insert = false;
        self.modes.origin = false;
        self.modes.keyboard_action = false;
        self.modes.auto_wrap = self.config.auto_wrap_mode;
        self.margin_top = 0;
        self.margin_bottom = ROWS;
        self.vs.reset_attributes();
        self.vs.reset_charsets();
        self.single_shift = None;
        self.saved_vs = VisualState::default();
        self.clear_cursor();
        self.cursor.enable(true);
    }

    pub(crate) fn report_device_attributes(&mut self) {
        self.transmit_csi("?65;1;9c");
    }

    /// DECREQTPARM; the reported line settings come from the configuration
    fn report_terminal_parameters(&mut self, request: i32) {
        if !(0..=1).contains(&request) {
            self.unhandled = true;
            return;
        }

        let report = self.config.report;
        let reply = format!(
            "{};{};{};{};{};{};{}x",
            request + 2,
            report.parity,
            report.nbits,
            report.xspeed,
            report.rspeed,
            report.clkmul,
            report.flags
        );
        self.transmit_csi(&reply);
    }

    /// DCS payload complete. Only DECRQSS is understood.
    pub(crate) fn execute_dcs(&mut self) {
        let Some(request) = StatusRequest::parse(self.control_string.as_bytes()) else {
            tracing::debug!(
                "Unknown DCS: {}",
                String::from_utf8_lossy(self.control_string.as_bytes())
            );
            self.unhandled = true;
            return;
        };

        let value = match request {
            StatusRequest::Sgr => Some(format!("{}m", sgr_status(&self.vs))),
            StatusRequest::Margins => {
                Some(format!("{};{}r", self.margin_top + 1, self.margin_bottom))
            }
            StatusRequest::ConformanceLevel => Some("65;1\"p".to_string()),
            StatusRequest::ProtectionAttribute => Some("0\"q".to_string()),
            StatusRequest::Invalid => None,
        };

        match value {
            Some(value) => self.transmit_dcs(&format!("0$r{}", value)),
            None => self.transmit_dcs("1$r"),
        }
    }
}

/// Color selector after 38/48: `5;N` indexed, `2;r;g;b` has no palette
/// mapping and yields `default`
fn extended_color(params: &mut impl Iterator<Item = u16>, default: Color) -> Color {
    match params.next() {
        Some(5) => params.next().map_or(0, |n| n.min(255) as Color),
        Some(2) => {
            for _ in 0..3 {
                params.next();
            }
            default
        }
        _ => default,
    }
}

/// Current rendition as SGR parameters
fn sgr_status(vs: &VisualState) -> String {
    let mut status = String::from("0");

    match vs.font {
        Font::Normal => {}
        Font::Bold => status.push_str(";1"),
        Font::Thin => status.push_str(";2"),
    }
    if vs.italic {
        status.push_str(";3");
    }
    if vs.underlined {
        status.push_str(";4");
    }
    match vs.blink {
        Blink::Off => {}
        Blink::Slow => status.push_str(";5"),
        Blink::Rapid => status.push_str(";6"),
    }
    if vs.negative {
        status.push_str(";7");
    }
    if vs.concealed {
        status.push_str(";8");
    }
    if vs.crossedout {
        status.push_str(";9");
    }

    if vs.active_color != DEFAULT_ACTIVE_COLOR {
        let code = match vs.active_color {
            c @ 0..=7 => format!(";{}", 30 + u16::from(c)),
            c @ 8..=15 => format!(";{}", 90 + u16::from(c) - 8),
            c => format!(";38;5;{}", c),
        };
        status.push_str(&code);
    }
    if vs.inactive_color != DEFAULT_INACTIVE_COLOR {
        let code = match vs.inactive_color {
            c @ 0..=7 => format!(";{}", 40 + u16::from(c)),
            c @ 8..=15 => format!(";{}", 100 + u16::from(c) - 8),
            c => format!(";48;5;{}", c),
        };
        status.push_str(&code);
    }

    status
}
