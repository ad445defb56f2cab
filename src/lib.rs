//! serterm - VT100/ANSI/VT52 terminal emulator core
//!
//! Decodes a serial byte stream into screen updates through the
//! collaborator traits in [`core::host`], and encodes key presses into the
//! bytes a remote host expects.
//!
//! ```ignore
//! use serterm::config::TerminalConfig;
//! use serterm::core::terminal::Terminal;
//!
//! // `host` implements Screen + Uart + System
//! let mut term = Terminal::new(host, TerminalConfig::default(), 256, 4096);
//! term.init();
//! term.receive_string("\x1b[1mbold\x1b[0m\r\n");
//! ```

pub mod config;
pub mod core;
pub mod ui;
