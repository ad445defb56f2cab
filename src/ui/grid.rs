//! In-memory screen
//!
//! A `ROWS` x `COLS` cell grid implementing the
//! [`Screen`](crate::core::host::Screen) collaborator. The host binary
//! renders it with crossterm; tests assert on its contents.

use crate::core::host::{Color, DrawStyle, Screen, Scroll};
use crate::core::term::state::{Font, COLS, DEFAULT_ACTIVE_COLOR, ROWS};

/// One character cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub codepoint: char,
    pub font: Font,
    pub italic: bool,
    pub underlined: bool,
    pub crossedout: bool,
    pub active: Color,
    pub inactive: Color,
}

impl Cell {
    fn blank(color: Color) -> Self {
        Self {
            codepoint: ' ',
            font: Font::Normal,
            italic: false,
            underlined: false,
            crossedout: false,
            active: DEFAULT_ACTIVE_COLOR,
            inactive: color,
        }
    }

    fn drawn(codepoint: char, style: &DrawStyle) -> Self {
        Self {
            codepoint,
            font: style.font,
            italic: style.italic,
            underlined: style.underlined,
            crossedout: style.crossedout,
            active: style.active,
            inactive: style.inactive,
        }
    }

    /// Same rendition as `other`, ignoring the character
    pub fn same_style(&self, other: &Cell) -> bool {
        Cell { codepoint: ' ', ..*self } == Cell { codepoint: ' ', ..*other }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(0)
    }
}

#[derive(Debug, Clone)]
pub struct GridScreen {
    cells: Vec<Cell>,
    /// Cell currently covered by the cursor block
    cursor: Option<(usize, usize)>,
    negative: bool,
}

impl Default for GridScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl GridScreen {
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::default(); ROWS * COLS],
            cursor: None,
            negative: false,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row * COLS + col]
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * COLS..(row + 1) * COLS]
    }

    /// The characters of `row`, `COLS` of them
    pub fn row_text(&self, row: usize) -> String {
        self.row(row).iter().map(|cell| cell.codepoint).collect()
    }

    pub fn cursor_at(&self) -> Option<(usize, usize)> {
        self.cursor
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor.is_some()
    }

    /// DECSCNM
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    fn row_mut(&mut self, row: usize) -> &mut [Cell] {
        &mut self.cells[row * COLS..(row + 1) * COLS]
    }
}

impl Screen for GridScreen {
    fn draw_codepoint(&mut self, row: usize, col: usize, codepoint: char, style: &DrawStyle) {
        if row < ROWS && col < COLS {
            self.cells[row * COLS + col] = Cell::drawn(codepoint, style);
        }
    }

    fn clear_rows(&mut self, from_row: usize, to_row: usize, color: Color) {
        let to_row = to_row.min(ROWS);
        if from_row < to_row {
            self.cells[from_row * COLS..to_row * COLS].fill(Cell::blank(color));
        }
    }

    fn clear_cols(&mut self, row: usize, from_col: usize, to_col: usize, color: Color) {
        let to_col = to_col.min(COLS);
        if row < ROWS && from_col < to_col {
            self.row_mut(row)[from_col..to_col].fill(Cell::blank(color));
        }
    }

    fn scroll(&mut self, scroll: Scroll, from_row: usize, to_row: usize, rows: usize, color: Color) {
        let to_row = to_row.min(ROWS);
        if from_row >= to_row {
            return;
        }
        let rows = rows.min(to_row - from_row);
        let region = &mut self.cells[from_row * COLS..to_row * COLS];

        match scroll {
            Scroll::Up => {
                region.rotate_left(rows * COLS);
                let length = region.len();
                region[length - rows * COLS..].fill(Cell::blank(color));
            }
            Scroll::Down => {
                region.rotate_right(rows * COLS);
                region[..rows * COLS].fill(Cell::blank(color));
            }
        }
    }

    fn shift_characters_left(&mut self, row: usize, col: usize, color: Color) {
        if row < ROWS && col < COLS {
            let cells = &mut self.row_mut(row)[col..];
            cells.rotate_left(1);
            cells[cells.len() - 1] = Cell::blank(color);
        }
    }

    fn shift_characters_right(&mut self, row: usize, col: usize, color: Color) {
        if row < ROWS && col < COLS {
            let cells = &mut self.row_mut(row)[col..];
            cells.rotate_right(1);
            cells[0] = Cell::blank(color);
        }
    }

    fn draw_cursor(&mut self, row: usize, col: usize, _color: Color) {
        self.cursor = match self.cursor {
            Some(position) if position == (row, col) => None,
            _ => Some((row, col)),
        };
    }

    fn set_screen_mode(&mut self, negative: bool) {
        self.negative = negative;
    }
}
