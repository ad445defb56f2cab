//! Collaborator interfaces
//!
//! The terminal core never touches hardware directly. Glyph rasterization,
//! the serial transport and system services are reached through the traits
//! in this module; an embedding implements them once and hands the result to
//! [`Terminal`](crate::core::terminal::Terminal).

use crate::core::term::state::Font;
use crate::ui::keymapper::LockState;

/// Palette index (0-255)
pub type Color = u8;

/// Scroll direction for [`Screen::scroll`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scroll {
    /// Content moves up, blank rows appear at the bottom
    Up,
    /// Content moves down, blank rows appear at the top
    Down,
}

/// Rendition of a single drawn character cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawStyle {
    pub font: Font,
    pub italic: bool,
    pub underlined: bool,
    pub crossedout: bool,
    /// Foreground palette index
    pub active: Color,
    /// Background palette index
    pub inactive: Color,
}

/// Glyph/frame-buffer collaborator.
///
/// All rows and columns are 0-based. Row ranges are half-open
/// (`from_row..to_row`), as are column ranges.
pub trait Screen {
    fn draw_codepoint(&mut self, row: usize, col: usize, codepoint: char, style: &DrawStyle);

    fn clear_rows(&mut self, from_row: usize, to_row: usize, color: Color);

    fn clear_cols(&mut self, row: usize, from_col: usize, to_col: usize, color: Color);

    /// Scroll `rows` rows within `from_row..to_row`, filling the vacated rows with `color`.
    fn scroll(&mut self, scroll: Scroll, from_row: usize, to_row: usize, rows: usize, color: Color);

    /// Delete the character at `col`, shifting the rest of the row left.
    fn shift_characters_left(&mut self, row: usize, col: usize, color: Color);

    /// Open a blank cell at `col`, shifting the rest of the row right.
    fn shift_characters_right(&mut self, row: usize, col: usize, color: Color);

    /// Toggle the cursor block at the given cell.
    fn draw_cursor(&mut self, row: usize, col: usize, color: Color);

    /// DECSCNM: whole-screen reverse video.
    fn set_screen_mode(&mut self, _negative: bool) {}
}

/// Serial transport collaborator
pub trait Uart {
    /// Send `data`, which was just written to the transmit ring ending at `head`.
    fn transmit(&mut self, data: &[u8], head: usize);

    /// Arm a (DMA) read into the terminal's receive ring of `length` bytes.
    fn receive(&mut self, _length: usize) {}
}

/// System services collaborator
pub trait System {
    fn keyboard_set_leds(&mut self, state: LockState);

    fn system_reset(&mut self);
}

/// Everything a terminal needs from its embedding.
pub trait Host: Screen + Uart + System {}

impl<T: Screen + Uart + System> Host for T {}
