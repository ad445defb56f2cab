//! VT100/ANSI/VT52 emulation
//!
//! - **parser**: receive state machine (byte classification tables)
//! - **csi**: control sequence execution and device reports
//! - **cursor**: cursor motion, scrolling and erase
//! - **state**: visual state, modes, tab stops, cursor blink
//! - **charset**: SCS tables
//! - **utf8**: incremental UTF-8 decoding
//! - **params**: CSI parameter and control string buffers

pub mod charset;
pub mod csi;
pub mod cursor;
pub mod params;
pub mod parser;
pub mod state;
pub mod utf8;

pub use charset::{CharsetTable, GSet};
pub use params::{ControlString, CsiParams, SequenceTrace, StringKind};
pub use parser::{action, Action, CsiCommand, ReceiveTable};
pub use state::{
    Blink, CursorBlink, Font, TabStops, TerminalModes, VisualState, COLS, CURSOR_COLOR,
    DEFAULT_ACTIVE_COLOR, DEFAULT_INACTIVE_COLOR, ROWS,
};
pub use utf8::{Utf8Decoder, Utf8Step};
