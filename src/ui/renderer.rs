//! Grid renderer using crossterm
//!
//! Writes a [`GridScreen`] to a host terminal as styled text, one line per
//! row.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use unicode_width::UnicodeWidthChar;

use crate::core::term::state::{Font, ROWS};
use crate::ui::grid::{Cell, GridScreen};

/// Grid renderer
#[derive(Debug, Default)]
pub struct Renderer {
    /// No colors or attributes, trailing blanks trimmed
    plain: bool,
}

impl Renderer {
    pub fn new(plain: bool) -> Self {
        Self { plain }
    }

    /// Render every row of `grid` to `out`
    pub fn render<W: Write>(&self, out: &mut W, grid: &GridScreen) -> io::Result<()> {
        for row in 0..ROWS {
            if self.plain {
                let text = display_text(grid.row(row));
                queue!(out, Print(text.trim_end()))?;
            } else {
                self.render_row(out, grid, row)?;
            }
            queue!(out, Print("\r\n"))?;
        }
        out.flush()
    }

    fn render_row<W: Write>(&self, out: &mut W, grid: &GridScreen, row: usize) -> io::Result<()> {
        let cells = grid.row(row);
        let mut line_buffer = String::with_capacity(cells.len());
        let mut start = 0;

        // Flush a run of cells sharing one rendition
        for col in 1..=cells.len() {
            if col < cells.len() && cells[col].same_style(&cells[start]) {
                continue;
            }
            line_buffer.clear();
            line_buffer.push_str(&display_text(&cells[start..col]));
            self.apply_attrs(out, &cells[start], grid.is_negative())?;
            queue!(out, Print(&line_buffer))?;
            start = col;
        }

        queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    fn apply_attrs<W: Write>(&self, out: &mut W, cell: &Cell, negative: bool) -> io::Result<()> {
        queue!(out, SetAttribute(Attribute::Reset))?;

        match cell.font {
            Font::Normal => {}
            Font::Bold => queue!(out, SetAttribute(Attribute::Bold))?,
            Font::Thin => queue!(out, SetAttribute(Attribute::Dim))?,
        }
        if cell.italic {
            queue!(out, SetAttribute(Attribute::Italic))?;
        }
        if cell.underlined {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        if cell.crossedout {
            queue!(out, SetAttribute(Attribute::CrossedOut))?;
        }

        // DECSCNM swaps the whole screen
        let (fg, bg) = if negative {
            (cell.inactive, cell.active)
        } else {
            (cell.active, cell.inactive)
        };
        queue!(
            out,
            SetForegroundColor(Color::AnsiValue(fg)),
            SetBackgroundColor(Color::AnsiValue(bg))
        )?;

        Ok(())
    }
}

/// Text of `cells`, one character per cell. Zero-width and control
/// codepoints show as a blank; wide ones are kept even though they push the
/// rest of the row right.
fn display_text(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|cell| match cell.codepoint.width() {
            Some(1) | Some(2) => cell.codepoint,
            _ => ' ',
        })
        .collect()
}
