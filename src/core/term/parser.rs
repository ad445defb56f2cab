//! Receive state machine
//!
//! Every received byte is classified by the pure [`action`] function against
//! the active [`ReceiveTable`]; [`Terminal::receive_character`] then performs
//! the resulting [`Action`]. The table is the only decoder state that decides
//! how a byte is interpreted.

use crate::config::{C1Mode, Charset};
use crate::core::host::Host;
use crate::core::terminal::Terminal;

use super::charset::{CharsetTable, GSet};
use super::params::StringKind;
use super::state::COLS;
use super::utf8::Utf8Step;

/// Active dispatch table of the receive state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveTable {
    /// Base table, bytes are Latin-1 characters
    Ascii,
    /// Base table, bytes are UTF-8 lead bytes
    Utf8,
    /// Waiting for UTF-8 continuation bytes
    Utf8Continuation,
    /// `ESC`
    Esc,
    /// `ESC [`
    Csi,
    /// `ESC [ ?`
    CsiPrivate,
    /// `ESC [ >`
    CsiSecondary,
    /// `ESC [ !`
    CsiExclamation,
    /// Unsupported control sequence, skipped up to its final byte
    CsiIgnore,
    /// `ESC #`
    EscHash,
    /// `ESC SP`
    EscSpace,
    /// `ESC %`
    EscPercent,
    /// `ESC (`, `ESC )`, `ESC *`, `ESC +`
    Scs(GSet),
    /// OSC, DCS, APC or PM payload
    ControlString(StringKind),
    /// `ESC` inside a control string
    ControlStringEsc(StringKind),
    /// `ESC` in VT52 mode
    Vt52Esc,
    /// `ESC Y`, waiting for the row
    Vt52Row,
    /// `ESC Y <row>`, waiting for the column
    Vt52Col,
}

impl ReceiveTable {
    pub fn is_base(self) -> bool {
        matches!(self, ReceiveTable::Ascii | ReceiveTable::Utf8)
    }

    /// Inside an escape, control or VT52 sequence
    pub fn is_sequence(self) -> bool {
        !self.is_base() && self != ReceiveTable::Utf8Continuation
    }
}

/// C0 control functions executed in every non-string table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Backspace,
    Tab,
    LineFeed,
    CarriageReturn,
    /// SO: G1 into GL
    ShiftOut,
    /// SI: G0 into GL
    ShiftIn,
    Escape,
    /// CAN or SUB
    Cancel,
}

/// Final byte after `ESC`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscCommand {
    Csi,
    String(StringKind),
    Hash,
    Space,
    Percent,
    Designate(GSet),
    Index,
    NextLine,
    TabSet,
    ReverseIndex,
    SaveCursor,
    RestoreCursor,
    Reset,
    KeypadApplication,
    KeypadNumeric,
    Identify,
    StringTerminator,
    LockingShift2,
    LockingShift3,
    SingleShift2,
    SingleShift3,
}

/// Final byte of a control sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsiCommand {
    InsertCharacters,
    CursorUp,
    CursorDown,
    CursorForward,
    CursorBackward,
    CursorNextLine,
    CursorPrecedingLine,
    CursorColumn,
    CursorPosition,
    ForwardTab,
    EraseDisplay,
    EraseLine,
    InsertLines,
    DeleteLines,
    DeleteCharacters,
    ScrollUp,
    ScrollDown,
    EraseCharacters,
    BackwardTab,
    ColumnAbsolute,
    ColumnRelative,
    DeviceAttributes,
    RowAbsolute,
    RowRelative,
    TabClear,
    SetMode,
    ResetMode,
    SelectGraphicRendition,
    DeviceStatusReport,
    SetMargins,
    SaveCursor,
    RestoreCursor,
    RequestTerminalParameters,
    ConfidenceTest,
    DecSetMode,
    DecResetMode,
    SecondaryDeviceAttributes,
    SoftReset,
}

/// Command after `ESC` in VT52 mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vt52Command {
    Up,
    Down,
    Right,
    Left,
    GraphicsOn,
    GraphicsOff,
    Home,
    ReverseLineFeed,
    EraseToEndOfScreen,
    EraseToEndOfLine,
    DirectCursorAddress,
    Identify,
    KeypadApplication,
    KeypadNumeric,
    EnterAnsi,
}

/// What a received byte does in a given table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Ignore,
    /// Draw the byte as a Latin-1 character
    Print,
    /// Raw 0x80-0x9F byte
    C1,
    Utf8Lead,
    Utf8Continuation,
    Control(Control),
    Esc(EscCommand),
    CsiParam,
    CsiDelimiter,
    /// Switch to a CSI sub-table (`?`, `>`, `!`)
    CsiMarker(ReceiveTable),
    Csi(CsiCommand),
    /// Final byte of a skipped sequence
    CsiUnknown,
    Alignment,
    LineSize,
    SelectTransmitC1(C1Mode),
    SelectCharset(Charset),
    Designate(CharsetTable),
    StringData,
    StringTerminate,
    /// 0x9C inside a control string
    StringC1Terminator,
    StringEscape,
    /// `ESC x` inside a control string with `x` other than `\`
    StringInterrupted,
    Vt52(Vt52Command),
    Vt52Coordinate,
    Unexpected,
}

/// Classify `byte` in `table`.
pub fn action(table: ReceiveTable, byte: u8) -> Action {
    match table {
        ReceiveTable::ControlString(_) => string_action(byte),
        ReceiveTable::ControlStringEsc(_) => {
            if byte == b'\\' {
                Action::StringTerminate
            } else {
                Action::StringInterrupted
            }
        }
        _ if byte < 0x20 => control_action(byte),
        // DEL is padding inside a sequence
        _ if byte == 0x7F && table.is_sequence() => Action::Ignore,
        ReceiveTable::Ascii => match byte {
            0x7F => Action::Control(Control::Backspace),
            0x80..=0x9F => Action::C1,
            _ => Action::Print,
        },
        ReceiveTable::Utf8 => match byte {
            0x20..=0x7E => Action::Print,
            0x7F => Action::Control(Control::Backspace),
            _ => Action::Utf8Lead,
        },
        ReceiveTable::Utf8Continuation => match byte {
            0x80..=0xBF => Action::Utf8Continuation,
            _ => Action::Unexpected,
        },
        ReceiveTable::Esc => esc_action(byte),
        ReceiveTable::Csi => match byte {
            b'?' => Action::CsiMarker(ReceiveTable::CsiPrivate),
            b'>' => Action::CsiMarker(ReceiveTable::CsiSecondary),
            b'!' => Action::CsiMarker(ReceiveTable::CsiExclamation),
            _ => csi_action(byte, csi_command(byte)),
        },
        ReceiveTable::CsiPrivate => csi_action(
            byte,
            match byte {
                b'h' => Some(CsiCommand::DecSetMode),
                b'l' => Some(CsiCommand::DecResetMode),
                _ => None,
            },
        ),
        ReceiveTable::CsiSecondary => csi_action(
            byte,
            (byte == b'c').then_some(CsiCommand::SecondaryDeviceAttributes),
        ),
        ReceiveTable::CsiExclamation => {
            csi_action(byte, (byte == b'p').then_some(CsiCommand::SoftReset))
        }
        ReceiveTable::CsiIgnore => match byte {
            0x20..=0x3F => Action::Ignore,
            0x40..=0x7E => Action::CsiUnknown,
            _ => Action::Unexpected,
        },
        ReceiveTable::EscHash => match byte {
            b'8' => Action::Alignment,
            b'3'..=b'7' => Action::LineSize,
            _ => Action::Unexpected,
        },
        ReceiveTable::EscSpace => match byte {
            b'F' => Action::SelectTransmitC1(C1Mode::Bit7),
            b'G' => Action::SelectTransmitC1(C1Mode::Bit8),
            _ => Action::Unexpected,
        },
        ReceiveTable::EscPercent => match byte {
            b'G' => Action::SelectCharset(Charset::Utf8),
            b'@' => Action::SelectCharset(Charset::Ascii),
            _ => Action::Unexpected,
        },
        ReceiveTable::Scs(_) => match CharsetTable::from_final(byte) {
            Some(table) => Action::Designate(table),
            None => Action::Unexpected,
        },
        ReceiveTable::Vt52Esc => vt52_action(byte),
        ReceiveTable::Vt52Row | ReceiveTable::Vt52Col => Action::Vt52Coordinate,
    }
}

fn control_action(byte: u8) -> Action {
    match byte {
        0x08 => Action::Control(Control::Backspace),
        0x09 => Action::Control(Control::Tab),
        0x0A..=0x0C => Action::Control(Control::LineFeed),
        0x0D => Action::Control(Control::CarriageReturn),
        0x0E => Action::Control(Control::ShiftOut),
        0x0F => Action::Control(Control::ShiftIn),
        0x18 | 0x1A => Action::Control(Control::Cancel),
        0x1B => Action::Control(Control::Escape),
        _ => Action::Ignore,
    }
}

fn string_action(byte: u8) -> Action {
    match byte {
        0x07 => Action::StringTerminate,
        0x18 | 0x1A => Action::Control(Control::Cancel),
        0x1B => Action::StringEscape,
        0x9C => Action::StringC1Terminator,
        _ => Action::StringData,
    }
}

fn esc_action(byte: u8) -> Action {
    let command = match byte {
        b'[' => EscCommand::Csi,
        b']' => EscCommand::String(StringKind::Osc),
        b'P' => EscCommand::String(StringKind::Dcs),
        b'_' => EscCommand::String(StringKind::Apc),
        b'^' => EscCommand::String(StringKind::Pm),
        b'#' => EscCommand::Hash,
        b' ' => EscCommand::Space,
        b'%' => EscCommand::Percent,
        b'(' => EscCommand::Designate(GSet::G0),
        b')' => EscCommand::Designate(GSet::G1),
        b'*' => EscCommand::Designate(GSet::G2),
        b'+' => EscCommand::Designate(GSet::G3),
        b'D' => EscCommand::Index,
        b'E' => EscCommand::NextLine,
        b'H' => EscCommand::TabSet,
        b'M' => EscCommand::ReverseIndex,
        b'7' => EscCommand::SaveCursor,
        b'8' => EscCommand::RestoreCursor,
        b'c' => EscCommand::Reset,
        b'=' => EscCommand::KeypadApplication,
        b'>' => EscCommand::KeypadNumeric,
        b'Z' => EscCommand::Identify,
        b'\\' => EscCommand::StringTerminator,
        b'n' => EscCommand::LockingShift2,
        b'o' => EscCommand::LockingShift3,
        b'N' => EscCommand::SingleShift2,
        b'O' => EscCommand::SingleShift3,
        _ => return Action::Unexpected,
    };
    Action::Esc(command)
}

fn csi_command(byte: u8) -> Option<CsiCommand> {
    let command = match byte {
        b'@' => CsiCommand::InsertCharacters,
        b'A' => CsiCommand::CursorUp,
        b'B' => CsiCommand::CursorDown,
        b'C' => CsiCommand::CursorForward,
        b'D' => CsiCommand::CursorBackward,
        b'E' => CsiCommand::CursorNextLine,
        b'F' => CsiCommand::CursorPrecedingLine,
        b'G' => CsiCommand::CursorColumn,
        b'H' | b'f' => CsiCommand::CursorPosition,
        b'I' => CsiCommand::ForwardTab,
        b'J' => CsiCommand::EraseDisplay,
        b'K' => CsiCommand::EraseLine,
        b'L' => CsiCommand::InsertLines,
        b'M' => CsiCommand::DeleteLines,
        b'P' => CsiCommand::DeleteCharacters,
        b'S' => CsiCommand::ScrollUp,
        b'T' => CsiCommand::ScrollDown,
        b'X' => CsiCommand::EraseCharacters,
        b'Z' => CsiCommand::BackwardTab,
        b'`' => CsiCommand::ColumnAbsolute,
        b'a' => CsiCommand::ColumnRelative,
        b'c' => CsiCommand::DeviceAttributes,
        b'd' => CsiCommand::RowAbsolute,
        b'e' => CsiCommand::RowRelative,
        b'g' => CsiCommand::TabClear,
        b'h' => CsiCommand::SetMode,
        b'l' => CsiCommand::ResetMode,
        b'm' => CsiCommand::SelectGraphicRendition,
        b'n' => CsiCommand::DeviceStatusReport,
        b'r' => CsiCommand::SetMargins,
        b's' => CsiCommand::SaveCursor,
        b'u' => CsiCommand::RestoreCursor,
        b'x' => CsiCommand::RequestTerminalParameters,
        b'y' => CsiCommand::ConfidenceTest,
        _ => return None,
    };
    Some(command)
}

/// Parameter bytes, then the table's own finals; anything else in the
/// parameter/intermediate range skips the sequence
fn csi_action(byte: u8, command: Option<CsiCommand>) -> Action {
    match (byte, command) {
        (b'0'..=b'9', _) => Action::CsiParam,
        (b';', _) => Action::CsiDelimiter,
        (_, Some(command)) => Action::Csi(command),
        (0x20..=0x3F, None) => Action::CsiMarker(ReceiveTable::CsiIgnore),
        (0x40..=0x7E, None) => Action::CsiUnknown,
        _ => Action::Unexpected,
    }
}

fn vt52_action(byte: u8) -> Action {
    let command = match byte {
        b'A' => Vt52Command::Up,
        b'B' => Vt52Command::Down,
        b'C' => Vt52Command::Right,
        b'D' => Vt52Command::Left,
        b'F' => Vt52Command::GraphicsOn,
        b'G' => Vt52Command::GraphicsOff,
        b'H' => Vt52Command::Home,
        b'I' => Vt52Command::ReverseLineFeed,
        b'J' => Vt52Command::EraseToEndOfScreen,
        b'K' => Vt52Command::EraseToEndOfLine,
        b'Y' => Vt52Command::DirectCursorAddress,
        b'Z' => Vt52Command::Identify,
        b'=' => Vt52Command::KeypadApplication,
        b'>' => Vt52Command::KeypadNumeric,
        b'<' => Vt52Command::EnterAnsi,
        _ => return Action::Unexpected,
    };
    Action::Vt52(command)
}

impl<H: Host> Terminal<H> {
    /// Feed one received byte through the state machine.
    pub fn receive_character(&mut self, byte: u8) {
        if self.receive_table.is_sequence() {
            self.trace.push(byte);
        }
        self.perform(action(self.receive_table, byte), byte);
    }

    /// Feed every byte of `bytes` in order.
    pub fn receive_string(&mut self, bytes: impl AsRef<[u8]>) {
        for &byte in bytes.as_ref() {
            self.receive_character(byte);
        }
    }

    pub(crate) fn base_table(&self) -> ReceiveTable {
        match self.modes.charset {
            Charset::Ascii => ReceiveTable::Ascii,
            Charset::Utf8 => ReceiveTable::Utf8,
        }
    }

    /// Return to the base table without logging
    pub(crate) fn reset_receive_table(&mut self) {
        self.receive_table = self.base_table();
        self.utf8.reset();
        self.trace.clear();
        self.unhandled = false;
    }

    /// A sequence is complete: log it and return to the base table
    fn finish_sequence(&mut self) {
        if self.unhandled {
            tracing::debug!("Unhandled sequence: ESC {}", self.trace.as_str());
        } else {
            tracing::trace!("ESC {}", self.trace.as_str());
        }
        self.reset_receive_table();
    }

    fn unexpected(&mut self) {
        if self.receive_table == ReceiveTable::Utf8Continuation {
            tracing::debug!("Malformed UTF-8 sequence");
            self.reset_receive_table();
            return;
        }
        self.unhandled = true;
        self.finish_sequence();
    }

    fn perform(&mut self, act: Action, byte: u8) {
        match act {
            Action::Ignore => {}
            Action::Print => self.put_character(char::from(byte)),
            Action::C1 => self.receive_c1(byte),
            Action::Utf8Lead => match self.utf8.start(byte) {
                Utf8Step::Pending => self.receive_table = ReceiveTable::Utf8Continuation,
                Utf8Step::Complete(codepoint) => self.receive_codepoint(codepoint),
                Utf8Step::Invalid => self.put_character(char::REPLACEMENT_CHARACTER),
            },
            Action::Utf8Continuation => match self.utf8.push(byte) {
                Utf8Step::Pending => {}
                Utf8Step::Complete(codepoint) => {
                    self.reset_receive_table();
                    self.receive_codepoint(codepoint);
                }
                Utf8Step::Invalid => {
                    self.reset_receive_table();
                    self.put_character(char::REPLACEMENT_CHARACTER);
                }
            },
            Action::Control(control) => self.execute_control(control),
            Action::Esc(command) => self.execute_esc(command),
            Action::CsiParam => self.params.push_digit(byte),
            Action::CsiDelimiter => self.params.delimiter(),
            Action::CsiMarker(table) => self.receive_table = table,
            Action::Csi(command) => {
                self.execute_csi(command);
                self.finish_sequence();
            }
            Action::CsiUnknown => {
                self.unhandled = true;
                self.finish_sequence();
            }
            Action::Alignment => {
                self.screen_alignment();
                self.finish_sequence();
            }
            Action::LineSize => self.finish_sequence(),
            Action::SelectTransmitC1(mode) => {
                self.modes.transmit_c1 = mode;
                self.finish_sequence();
            }
            Action::SelectCharset(charset) => {
                self.modes.charset = charset;
                self.finish_sequence();
            }
            Action::Designate(table) => {
                if let ReceiveTable::Scs(set) = self.receive_table {
                    self.vs.designate(set, table);
                }
                self.finish_sequence();
            }
            Action::StringData => {
                if !self.control_string.push(byte) {
                    self.finish_control_string();
                }
            }
            Action::StringTerminate => self.finish_control_string(),
            Action::StringC1Terminator => {
                if self.modes.raw_c1_controls() {
                    self.finish_control_string();
                } else if !self.control_string.push(byte) {
                    self.finish_control_string();
                }
            }
            Action::StringEscape => {
                if let ReceiveTable::ControlString(kind) = self.receive_table {
                    self.receive_table = ReceiveTable::ControlStringEsc(kind);
                }
            }
            Action::StringInterrupted => {
                self.finish_control_string();
                self.receive_table = ReceiveTable::Esc;
                self.trace.push(byte);
                self.perform(action(ReceiveTable::Esc, byte), byte);
            }
            Action::Vt52(command) => self.execute_vt52(command),
            Action::Vt52Coordinate => self.receive_vt52_coordinate(byte),
            Action::Unexpected => self.unexpected(),
        }
    }

    /// A decoded codepoint from the UTF-8 base table
    fn receive_codepoint(&mut self, codepoint: char) {
        match u32::from(codepoint) {
            // C1 encoded as UTF-8
            code @ 0x80..=0x9F => self.deflect_c1(code as u8),
            _ => self.put_character(codepoint),
        }
    }

    fn receive_c1(&mut self, byte: u8) {
        if self.modes.raw_c1_controls() {
            self.deflect_c1(byte);
        }
    }

    /// Run a C1 control as its `ESC Fe` equivalent
    fn deflect_c1(&mut self, byte: u8) {
        if !self.modes.ansi {
            return;
        }
        self.trace.clear();
        self.unhandled = false;
        self.receive_table = ReceiveTable::Esc;
        self.receive_character(byte - 0x40);
    }

    fn execute_control(&mut self, control: Control) {
        match control {
            Control::Backspace => self.move_cursor(0, -1),
            Control::Tab => self.horizontal_tab(1),
            Control::LineFeed => {
                if self.modes.new_line {
                    self.carriage_return();
                }
                self.index(1);
            }
            Control::CarriageReturn => self.carriage_return(),
            Control::ShiftOut => self.vs.gl = GSet::G1,
            Control::ShiftIn => self.vs.gl = GSet::G0,
            Control::Escape => {
                if self.receive_table.is_sequence() {
                    // The interrupted sequence is logged without the ESC
                    self.unhandled = true;
                    self.finish_sequence();
                } else if self.receive_table == ReceiveTable::Utf8Continuation {
                    tracing::debug!("UTF-8 sequence interrupted by ESC");
                }
                self.utf8.reset();
                self.trace.clear();
                self.unhandled = false;
                self.receive_table = if self.modes.ansi {
                    ReceiveTable::Esc
                } else {
                    ReceiveTable::Vt52Esc
                };
            }
            Control::Cancel => {
                if self.receive_table.is_sequence() {
                    tracing::trace!("Cancelled sequence: ESC {}", self.trace.as_str());
                }
                self.reset_receive_table();
            }
        }
    }

    fn execute_esc(&mut self, command: EscCommand) {
        match command {
            EscCommand::Csi => {
                self.params.clear();
                self.receive_table = ReceiveTable::Csi;
                return;
            }
            EscCommand::String(kind) => {
                self.control_string.clear();
                self.receive_table = ReceiveTable::ControlString(kind);
                return;
            }
            EscCommand::Hash => {
                self.receive_table = ReceiveTable::EscHash;
                return;
            }
            EscCommand::Space => {
                self.receive_table = ReceiveTable::EscSpace;
                return;
            }
            EscCommand::Percent => {
                self.receive_table = ReceiveTable::EscPercent;
                return;
            }
            EscCommand::Designate(set) => {
                self.receive_table = ReceiveTable::Scs(set);
                return;
            }
            EscCommand::Index => self.index(1),
            EscCommand::NextLine => {
                self.carriage_return();
                self.index(1);
            }
            EscCommand::TabSet => self.tab_stops.set(self.vs.cursor_col),
            EscCommand::ReverseIndex => self.reverse_index(1),
            EscCommand::SaveCursor => self.save_visual_state(),
            EscCommand::RestoreCursor => self.restore_visual_state(),
            EscCommand::Reset => {
                self.finish_sequence();
                self.system_reset();
                return;
            }
            EscCommand::KeypadApplication => self.set_numeric_keypad(false),
            EscCommand::KeypadNumeric => self.set_numeric_keypad(true),
            EscCommand::Identify => self.report_device_attributes(),
            EscCommand::StringTerminator => {}
            EscCommand::LockingShift2 => self.vs.gl = GSet::G2,
            EscCommand::LockingShift3 => self.vs.gl = GSet::G3,
            EscCommand::SingleShift2 => self.single_shift = Some(GSet::G2),
            EscCommand::SingleShift3 => self.single_shift = Some(GSet::G3),
        }
        self.finish_sequence();
    }

    fn finish_control_string(&mut self) {
        let kind = match self.receive_table {
            ReceiveTable::ControlString(kind) | ReceiveTable::ControlStringEsc(kind) => kind,
            _ => return,
        };

        match kind {
            StringKind::Dcs => self.execute_dcs(),
            _ => tracing::trace!(
                "{:?} {}",
                kind,
                String::from_utf8_lossy(self.control_string.as_bytes())
            ),
        }
        self.control_string.clear();
        self.finish_sequence();
    }

    fn execute_vt52(&mut self, command: Vt52Command) {
        match command {
            Vt52Command::Up => self.move_cursor(-1, 0),
            Vt52Command::Down => self.move_cursor(1, 0),
            Vt52Command::Right => self.move_cursor(0, 1),
            Vt52Command::Left => self.move_cursor(0, -1),
            Vt52Command::GraphicsOn => {
                self.vs.designate(GSet::G0, CharsetTable::DecSpecialGraphics)
            }
            Vt52Command::GraphicsOff => self.vs.designate(GSet::G0, CharsetTable::UsAscii),
            Vt52Command::Home => self.move_cursor_absolute(0, 0),
            Vt52Command::ReverseLineFeed => self.reverse_index(1),
            Vt52Command::EraseToEndOfScreen => {
                self.clear_to_right();
                self.clear_to_bottom();
            }
            Vt52Command::EraseToEndOfLine => self.clear_to_right(),
            Vt52Command::DirectCursorAddress => {
                self.receive_table = ReceiveTable::Vt52Row;
                return;
            }
            Vt52Command::Identify => self.transmit(b"\x1b/Z"),
            Vt52Command::KeypadApplication => self.set_numeric_keypad(false),
            Vt52Command::KeypadNumeric => self.set_numeric_keypad(true),
            Vt52Command::EnterAnsi => self.modes.ansi = true,
        }
        self.finish_sequence();
    }

    fn receive_vt52_coordinate(&mut self, byte: u8) {
        let value = usize::from(byte.saturating_sub(0x20));
        if self.receive_table == ReceiveTable::Vt52Row {
            self.vt52_row = value;
            self.receive_table = ReceiveTable::Vt52Col;
            return;
        }

        // Out-of-range columns leave the cursor column unchanged
        let col = if value < COLS {
            value
        } else {
            self.vs.cursor_col
        };
        self.move_cursor_absolute(self.vt52_row as i32, col as i32);
        self.finish_sequence();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{terminal, terminal_with, test_config};

    const TABLES: [ReceiveTable; 20] = [
        ReceiveTable::Ascii,
        ReceiveTable::Utf8,
        ReceiveTable::Utf8Continuation,
        ReceiveTable::Esc,
        ReceiveTable::Csi,
        ReceiveTable::CsiPrivate,
        ReceiveTable::CsiSecondary,
        ReceiveTable::CsiExclamation,
        ReceiveTable::CsiIgnore,
        ReceiveTable::EscHash,
        ReceiveTable::EscSpace,
        ReceiveTable::EscPercent,
        ReceiveTable::Scs(GSet::G0),
        ReceiveTable::Scs(GSet::G3),
        ReceiveTable::ControlString(StringKind::Osc),
        ReceiveTable::ControlString(StringKind::Dcs),
        ReceiveTable::ControlStringEsc(StringKind::Apc),
        ReceiveTable::Vt52Esc,
        ReceiveTable::Vt52Row,
        ReceiveTable::Vt52Col,
    ];

    #[test]
    fn test_c0_controls_shared_by_sequence_tables() {
        for table in TABLES {
            if matches!(
                table,
                ReceiveTable::ControlString(_) | ReceiveTable::ControlStringEsc(_)
            ) {
                continue;
            }
            assert_eq!(action(table, 0x0D), Action::Control(Control::CarriageReturn));
            assert_eq!(action(table, 0x1B), Action::Control(Control::Escape));
            assert_eq!(action(table, 0x18), Action::Control(Control::Cancel));
            assert_eq!(action(table, 0x07), Action::Ignore);
        }
    }

    #[test]
    fn test_base_tables() {
        assert_eq!(action(ReceiveTable::Ascii, b'a'), Action::Print);
        assert_eq!(action(ReceiveTable::Ascii, 0xE9), Action::Print);
        assert_eq!(action(ReceiveTable::Ascii, 0x9B), Action::C1);
        assert_eq!(action(ReceiveTable::Ascii, 0x7F), Action::Control(Control::Backspace));
        assert_eq!(action(ReceiveTable::Utf8, 0xE2), Action::Utf8Lead);
        assert_eq!(action(ReceiveTable::Utf8Continuation, 0x82), Action::Utf8Continuation);
        assert_eq!(action(ReceiveTable::Utf8Continuation, b'a'), Action::Unexpected);
    }

    #[test]
    fn test_csi_finals() {
        assert_eq!(action(ReceiveTable::Csi, b'5'), Action::CsiParam);
        assert_eq!(action(ReceiveTable::Csi, b';'), Action::CsiDelimiter);
        assert_eq!(action(ReceiveTable::Csi, b'H'), Action::Csi(CsiCommand::CursorPosition));
        assert_eq!(action(ReceiveTable::Csi, b'f'), Action::Csi(CsiCommand::CursorPosition));
        assert_eq!(
            action(ReceiveTable::Csi, b'?'),
            Action::CsiMarker(ReceiveTable::CsiPrivate)
        );
        assert_eq!(action(ReceiveTable::CsiPrivate, b'h'), Action::Csi(CsiCommand::DecSetMode));
        assert_eq!(action(ReceiveTable::CsiPrivate, b'm'), Action::CsiUnknown);
        assert_eq!(action(ReceiveTable::Csi, b'$'), Action::CsiMarker(ReceiveTable::CsiIgnore));
        assert_eq!(action(ReceiveTable::Csi, 0xC0), Action::Unexpected);
    }

    #[test]
    fn test_state_machine_is_closed() {
        let mut term = terminal();
        let mut seed: u32 = 0x1234_5678;
        for _ in 0..20_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            term.receive_character((seed >> 24) as u8);
            let (row, col) = term.cursor_position();
            assert!(row < crate::core::term::ROWS);
            assert!(col < COLS);
        }

        // Every sequence table returns to the base table on a terminator
        term.receive_string("\x18");
        assert!(term.receive_table().is_base());
    }

    #[test]
    fn test_every_table_reaches_base() {
        for table in TABLES {
            let mut term = terminal();
            term.receive_table = table;
            term.receive_string("\x18");
            assert!(term.receive_table().is_base(), "{:?}", table);
        }
    }

    #[test]
    fn test_unknown_escape_returns_to_base() {
        let mut term = terminal();
        term.receive_string("\x1b!x");
        assert!(term.receive_table().is_base());
        // The byte after the failed sequence is printed normally
        assert_eq!(term.host().grid.row_text(0).trim_end(), "x");
    }

    #[test]
    fn test_unsupported_csi_is_skipped() {
        let mut term = terminal();
        term.receive_string("\x1b[2 qA");
        assert!(term.receive_table().is_base());
        assert_eq!(term.host().grid.row_text(0).trim_end(), "A");
    }

    #[test]
    fn test_c0_inside_csi_executes() {
        let mut term = terminal();
        term.receive_string("ab\x1b[1\rC");
        assert_eq!(term.cursor_position(), (0, 1));
    }

    #[test]
    fn test_esc_restarts_sequence() {
        let mut term = terminal();
        term.receive_string("\x1b[3\x1b[5;10H");
        assert_eq!(term.cursor_position(), (4, 9));
    }

    #[test]
    fn test_utf8_euro_is_one_draw() {
        let mut term = terminal();
        term.receive_character(0xE2);
        assert!(term.host().draws.is_empty());
        term.receive_character(0x82);
        assert!(term.host().draws.is_empty());
        term.receive_character(0xAC);
        assert_eq!(term.host().draws.len(), 1);
        assert_eq!(term.host().draws[0].codepoint, '\u{20AC}');
        assert_eq!(term.receive_table(), ReceiveTable::Utf8);
    }

    #[test]
    fn test_invalid_utf8_lead_draws_replacement() {
        let mut term = terminal();
        term.receive_character(0xFF);
        assert_eq!(term.host().draws[0].codepoint, char::REPLACEMENT_CHARACTER);
        assert_eq!(term.receive_table(), ReceiveTable::Utf8);
    }

    #[test]
    fn test_ascii_latin1() {
        let mut config = test_config();
        config.charset = Charset::Ascii;
        let mut term = terminal_with(config);
        term.receive_character(0xE9);
        assert_eq!(term.host().draws[0].codepoint, 'é');
    }

    #[test]
    fn test_raw_c1_csi_in_ascii_mode() {
        let mut config = test_config();
        config.charset = Charset::Ascii;
        config.receive_c1_mode = C1Mode::Bit8;
        let mut term = terminal_with(config.clone());
        term.receive_string(b"\x9b5;10H");
        assert_eq!(term.cursor_position(), (4, 9));

        // 7-bit receive mode ignores raw C1 bytes
        config.receive_c1_mode = C1Mode::Bit7;
        let mut term = terminal_with(config);
        term.receive_string(b"\x9b5;10H");
        assert_eq!(term.cursor_position(), (0, 5));
    }

    #[test]
    fn test_utf8_encoded_c1_is_deflected() {
        let mut term = terminal();
        term.receive_string("\u{9b}2;3H");
        assert_eq!(term.cursor_position(), (1, 2));
    }

    #[test]
    fn test_special_graphics_designation() {
        let mut term = terminal();
        term.receive_string("\x1b(0qx\x1b(Bq");
        let draws: Vec<char> = term.host().draws.iter().map(|d| d.codepoint).collect();
        assert_eq!(draws, vec!['─', '│', 'q']);
    }

    #[test]
    fn test_shift_out_selects_g1() {
        let mut term = terminal();
        term.receive_string("\x1b)0\x0eq\x0fq");
        let draws: Vec<char> = term.host().draws.iter().map(|d| d.codepoint).collect();
        assert_eq!(draws, vec!['─', 'q']);
    }

    #[test]
    fn test_single_shift_applies_once() {
        let mut term = terminal();
        term.receive_string("\x1b*0\x1bNqq");
        let draws: Vec<char> = term.host().draws.iter().map(|d| d.codepoint).collect();
        assert_eq!(draws, vec!['─', 'q']);
    }

    #[test]
    fn test_osc_terminated_by_bel_and_st() {
        let mut term = terminal();
        term.receive_string("\x1b]0;title\x07A");
        assert!(term.receive_table().is_base());
        term.receive_string("\x1b]0;title\x1b\\B");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "AB");
    }

    #[test]
    fn test_string_interrupted_by_escape_sequence() {
        let mut term = terminal();
        term.receive_string("\x1b_payload\x1b[3;4H");
        assert_eq!(term.cursor_position(), (2, 3));
    }

    #[test]
    fn test_control_string_buffer_full_terminates() {
        let mut term = terminal();
        term.receive_string("\x1bP");
        for _ in 0..crate::core::term::params::CONTROL_STRING_LENGTH {
            term.receive_character(b'x');
        }
        assert!(term.receive_table().is_base());
        term.receive_character(b'y');
        assert_eq!(term.host().grid.row_text(0).trim_end(), "y");
    }

    #[test]
    fn test_escape_percent_selects_charset() {
        let mut term = terminal();
        term.receive_string("\x1b%@");
        assert_eq!(term.receive_table(), ReceiveTable::Ascii);
        term.receive_string("\x1b%G");
        assert_eq!(term.receive_table(), ReceiveTable::Utf8);
    }

    #[test]
    fn test_vt52_mode() {
        let mut term = terminal();
        term.receive_string("\x1b[?2l");
        assert!(!term.modes().ansi);

        term.receive_string("\x1bY%*");
        assert_eq!(term.cursor_position(), (5, 10));
        term.receive_string("\x1bA\x1bD");
        assert_eq!(term.cursor_position(), (4, 9));
        term.receive_string("\x1bH");
        assert_eq!(term.cursor_position(), (0, 0));

        term.receive_string("\x1bZ");
        assert_eq!(term.host().transmitted, b"\x1b/Z");

        term.receive_string("\x1b<");
        assert!(term.modes().ansi);
        term.receive_string("\x1b[3;3H");
        assert_eq!(term.cursor_position(), (2, 2));
    }

    #[test]
    fn test_vt52_graphics() {
        let mut term = terminal();
        term.receive_string("\x1b[?2l\x1bFq\x1bGq");
        let draws: Vec<char> = term.host().draws.iter().map(|d| d.codepoint).collect();
        assert_eq!(draws, vec!['─', 'q']);
    }

    #[test]
    fn test_del_inside_sequences_is_ignored() {
        let mut term = terminal();
        term.receive_string(b"\x1b[5\x7f;10H");
        assert_eq!(term.cursor_position(), (4, 9));
        assert_eq!(term.host().grid.row_text(0).trim_end(), "");

        term.receive_string(b"\x1b[3;3H\x1b\x7fD");
        assert_eq!(term.cursor_position(), (3, 2));

        term.receive_string(b"\x1b(\x7f0q");
        assert_eq!(term.host().draws.last().map(|d| d.codepoint), Some('─'));
        assert!(term.receive_table().is_base());
    }

    #[test]
    fn test_del_in_base_table_backspaces() {
        let mut term = terminal();
        term.receive_string(b"ab\x7f");
        assert_eq!(term.cursor_position(), (0, 1));
        term.receive_string(b"\x7f\x7f");
        assert_eq!(term.cursor_position(), (0, 0));
        assert_eq!(term.host().grid.row_text(0).trim_end(), "ab");
    }

    #[test]
    fn test_locking_shifts_select_g2_g3() {
        let mut term = terminal();
        term.receive_string("\x1b*0\x1b+A\x1bnq\x1bo#\x0fq");
        let draws: Vec<char> = term.host().draws.iter().map(|d| d.codepoint).collect();
        assert_eq!(draws, vec!['─', '£', 'q']);
    }

    #[test]
    fn test_united_kingdom_set() {
        let mut term = terminal();
        term.receive_string("\x1b(A#a\x1b(B#");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "£a#");
    }

    #[test]
    fn test_ris_calls_system_reset() {
        let mut term = terminal();
        term.receive_string("\x1b[5;5H\x1bc");
        assert_eq!(term.host().resets, 1);
        assert_eq!(term.cursor_position(), (0, 0));
    }
}
