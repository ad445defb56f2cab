//! Keyboard input and screen output.
//!
//! - **keymapper**: HID key codes to transmitted byte sequences
//! - **grid**: in-memory cell grid implementing `Screen`
//! - **renderer**: crossterm rendering of a grid

pub mod grid;
pub mod keymapper;
pub mod renderer;

pub use grid::{Cell, GridScreen};
pub use keymapper::{key_action, KeyAction, KeyContext, LockState, Modifiers};
pub use renderer::Renderer;
