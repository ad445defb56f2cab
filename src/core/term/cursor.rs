//! Cursor motion, line feeds and erase operations
//!
//! Everything visible goes through the [`Screen`](crate::core::host::Screen)
//! collaborator. Any operation that may move the cursor first erases a drawn
//! cursor block and restarts its blink phase.

use crate::core::host::{Color, Host, Scroll};
use crate::core::terminal::Terminal;

use super::charset;
use super::state::{VisualState, COLS, CURSOR_COLOR, ROWS};

impl<H: Host> Terminal<H> {
    /// Erase a drawn cursor block and restart the blink phase.
    pub(crate) fn clear_cursor(&mut self) {
        if self.cursor.restart() {
            self.host
                .draw_cursor(self.vs.cursor_row, self.vs.cursor_col, CURSOR_COLOR);
        }
    }

    pub(crate) fn inside_margins(&self) -> bool {
        self.vs.cursor_row >= self.margin_top && self.vs.cursor_row < self.margin_bottom
    }

    /// Row as seen by the host: relative to the top margin in origin mode
    pub(crate) fn relative_cursor_row(&self) -> usize {
        if self.modes.origin {
            self.vs.cursor_row.saturating_sub(self.margin_top)
        } else {
            self.vs.cursor_row
        }
    }

    fn fill_color(&self) -> Color {
        self.vs.inactive_color
    }

    /// Absolute positioning. In origin mode `row` is relative to the top
    /// margin and confined to the margins.
    pub(crate) fn move_cursor_absolute(&mut self, row: i32, col: i32) {
        self.clear_cursor();

        let (row, top, bottom) = if self.modes.origin {
            (row + self.margin_top as i32, self.margin_top, self.margin_bottom)
        } else {
            (row, 0, ROWS)
        };

        self.vs.cursor_row = row.clamp(top as i32, bottom as i32 - 1) as usize;
        self.vs.cursor_col = col.clamp(0, COLS as i32 - 1) as usize;
        self.vs.cursor_last_col = false;
    }

    /// Relative motion. Confined to the margins when starting inside them
    /// (or in origin mode), to the screen otherwise.
    pub(crate) fn move_cursor(&mut self, rows: i32, cols: i32) {
        self.clear_cursor();

        let (top, bottom) = if self.modes.origin || self.inside_margins() {
            (self.margin_top, self.margin_bottom)
        } else {
            (0, ROWS)
        };

        let row = self.vs.cursor_row as i32 + rows;
        let col = self.vs.cursor_col as i32 + cols;
        self.vs.cursor_row = row.clamp(top as i32, bottom as i32 - 1) as usize;
        self.vs.cursor_col = col.clamp(0, COLS as i32 - 1) as usize;
        self.vs.cursor_last_col = false;
    }

    fn set_cursor_col(&mut self, col: usize) {
        self.clear_cursor();
        self.vs.cursor_col = col.min(COLS - 1);
        self.vs.cursor_last_col = false;
    }

    pub(crate) fn carriage_return(&mut self) {
        self.set_cursor_col(0);
    }

    pub(crate) fn horizontal_tab(&mut self, count: usize) {
        let mut col = self.vs.cursor_col;
        for _ in 0..count {
            col = self.tab_stops.next(col);
        }
        self.set_cursor_col(col);
    }

    pub(crate) fn backward_tab(&mut self, count: usize) {
        let mut col = self.vs.cursor_col;
        for _ in 0..count {
            col = self.tab_stops.previous(col);
        }
        self.set_cursor_col(col);
    }

    pub(crate) fn scroll(&mut self, scroll: Scroll, from_row: usize, to_row: usize, rows: usize) {
        if from_row >= to_row || rows == 0 {
            return;
        }
        self.clear_cursor();
        let color = self.fill_color();
        self.host.scroll(scroll, from_row, to_row, rows, color);
    }

    /// Move down `rows` rows. At the bottom margin the margin region scrolls
    /// up by the overflow; outside the margins the cursor stops at the last
    /// row.
    pub(crate) fn index(&mut self, rows: usize) {
        self.clear_cursor();
        self.vs.cursor_last_col = false;

        let row = self.vs.cursor_row + rows;
        if self.inside_margins() {
            let last = self.margin_bottom - 1;
            if row > last {
                self.scroll(Scroll::Up, self.margin_top, self.margin_bottom, row - last);
                self.vs.cursor_row = last;
            } else {
                self.vs.cursor_row = row;
            }
        } else {
            self.vs.cursor_row = row.min(ROWS - 1);
        }
    }

    /// Move up `rows` rows, scrolling the margin region down at the top margin.
    pub(crate) fn reverse_index(&mut self, rows: usize) {
        self.clear_cursor();
        self.vs.cursor_last_col = false;

        if self.inside_margins() {
            let first = self.margin_top;
            if self.vs.cursor_row < first + rows {
                let overflow = first + rows - self.vs.cursor_row;
                self.scroll(Scroll::Down, self.margin_top, self.margin_bottom, overflow);
                self.vs.cursor_row = first;
            } else {
                self.vs.cursor_row -= rows;
            }
        } else {
            self.vs.cursor_row = self.vs.cursor_row.saturating_sub(rows);
        }
    }

    /// Draw a printable codepoint at the cursor and advance.
    pub(crate) fn put_character(&mut self, codepoint: char) {
        self.clear_cursor();

        let set = self.single_shift.take().unwrap_or(self.vs.gl);
        let codepoint = charset::transform(self.vs.charset(set), codepoint);

        if self.vs.cursor_last_col {
            if self.modes.auto_wrap {
                self.carriage_return();
                self.index(1);
            }
            self.vs.cursor_last_col = false;
        }

        let (row, col) = (self.vs.cursor_row, self.vs.cursor_col);
        if self.modes.insert {
            let color = self.fill_color();
            self.host.shift_characters_right(row, col, color);
        }

        let glyph = if self.vs.concealed { ' ' } else { codepoint };
        let style = self.vs.draw_style();
        self.host.draw_codepoint(row, col, glyph, &style);

        if col == COLS - 1 {
            self.vs.cursor_last_col = self.modes.auto_wrap;
        } else {
            self.vs.cursor_col += 1;
        }
    }

    fn clear_rows(&mut self, from_row: usize, to_row: usize) {
        if from_row >= to_row {
            return;
        }
        self.clear_cursor();
        let color = self.fill_color();
        self.host.clear_rows(from_row, to_row, color);
    }

    fn clear_cols(&mut self, row: usize, from_col: usize, to_col: usize) {
        if from_col >= to_col {
            return;
        }
        self.clear_cursor();
        let color = self.fill_color();
        self.host.clear_cols(row, from_col, to_col, color);
    }

    pub(crate) fn clear_to_right(&mut self) {
        self.clear_cols(self.vs.cursor_row, self.vs.cursor_col, COLS);
    }

    pub(crate) fn clear_to_left(&mut self) {
        self.clear_cols(self.vs.cursor_row, 0, self.vs.cursor_col + 1);
    }

    pub(crate) fn clear_row(&mut self) {
        self.clear_rows(self.vs.cursor_row, self.vs.cursor_row + 1);
    }

    /// Rows above the cursor row
    pub(crate) fn clear_to_top(&mut self) {
        self.clear_rows(0, self.vs.cursor_row);
    }

    /// Rows below the cursor row
    pub(crate) fn clear_to_bottom(&mut self) {
        self.clear_rows(self.vs.cursor_row + 1, ROWS);
    }

    pub(crate) fn clear_all(&mut self) {
        self.clear_rows(0, ROWS);
    }

    pub(crate) fn insert_characters(&mut self, count: usize) {
        self.clear_cursor();
        let (row, col) = (self.vs.cursor_row, self.vs.cursor_col);
        let color = self.fill_color();
        for _ in 0..count.min(COLS - col) {
            self.host.shift_characters_right(row, col, color);
        }
    }

    pub(crate) fn delete_characters(&mut self, count: usize) {
        self.clear_cursor();
        let (row, col) = (self.vs.cursor_row, self.vs.cursor_col);
        let color = self.fill_color();
        for _ in 0..count.min(COLS - col) {
            self.host.shift_characters_left(row, col, color);
        }
    }

    pub(crate) fn erase_characters(&mut self, count: usize) {
        let col = self.vs.cursor_col;
        self.clear_cols(self.vs.cursor_row, col, (col + count).min(COLS));
    }

    /// IL; only inside the margins
    pub(crate) fn insert_lines(&mut self, count: usize) {
        if !self.inside_margins() {
            return;
        }
        self.scroll(Scroll::Down, self.vs.cursor_row, self.margin_bottom, count);
        self.carriage_return();
    }

    /// DL; only inside the margins
    pub(crate) fn delete_lines(&mut self, count: usize) {
        if !self.inside_margins() {
            return;
        }
        self.scroll(Scroll::Up, self.vs.cursor_row, self.margin_bottom, count);
        self.carriage_return();
    }

    pub(crate) fn save_visual_state(&mut self) {
        self.saved_vs = self.vs;
    }

    pub(crate) fn restore_visual_state(&mut self) {
        self.clear_cursor();
        self.vs = self.saved_vs;

        if self.modes.origin {
            self.vs.cursor_row = self
                .vs
                .cursor_row
                .clamp(self.margin_top, self.margin_bottom - 1);
        }
    }

    /// DECALN: fill the screen with `E` and home the cursor
    pub(crate) fn screen_alignment(&mut self) {
        self.clear_cursor();
        let style = VisualState::default().draw_style();
        for row in 0..ROWS {
            for col in 0..COLS {
                self.host.draw_codepoint(row, col, 'E', &style);
            }
        }
        self.move_cursor_absolute(0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{terminal, terminal_with, test_config, ScrollCall};

    #[test]
    fn test_cup_round_trip() {
        let mut term = terminal();
        term.receive_string("\x1b[5;10H");
        assert_eq!(term.cursor_position(), (4, 9));
    }

    #[test]
    fn test_auto_wrap_at_last_column() {
        let mut term = terminal();
        term.receive_string("x".repeat(COLS));
        assert_eq!(term.cursor_position(), (0, COLS - 1));
        assert!(term.visual_state().cursor_last_col);

        term.receive_string("y");
        assert_eq!(term.cursor_position(), (1, 1));
        let last = term.host().draws.last().unwrap();
        assert_eq!((last.row, last.col, last.codepoint), (1, 0, 'y'));
    }

    #[test]
    fn test_no_auto_wrap_overwrites_last_column() {
        let mut term = terminal();
        term.receive_string("\x1b[?7l");
        term.receive_string("x".repeat(COLS + 1));
        assert_eq!(term.cursor_position(), (0, COLS - 1));
        assert!(!term.visual_state().cursor_last_col);
        let last = term.host().draws.last().unwrap();
        assert_eq!((last.row, last.col), (0, COLS - 1));
    }

    #[test]
    fn test_wrap_at_bottom_scrolls() {
        let mut term = terminal();
        term.receive_string("\x1b[24;80Hab");
        assert_eq!(term.cursor_position(), (ROWS - 1, 1));
        assert_eq!(
            term.host().scrolls,
            vec![ScrollCall {
                scroll: Scroll::Up,
                from_row: 0,
                to_row: ROWS,
                rows: 1,
            }]
        );
    }

    #[test]
    fn test_index_scrolls_margin_region() {
        let mut term = terminal();
        for row in 0..ROWS {
            term.receive_string(format!("\x1b[{};1H{}", row + 1, row % 10));
        }
        term.receive_string("\x1b[6;20r");
        assert_eq!((term.margin_top, term.margin_bottom), (5, 20));

        term.receive_string("\x1b[20;1H\x1bD");
        assert_eq!(term.cursor_position(), (19, 0));
        assert_eq!(
            term.host().scrolls,
            vec![ScrollCall {
                scroll: Scroll::Up,
                from_row: 5,
                to_row: 20,
                rows: 1,
            }]
        );

        let grid = &term.host().grid;
        for row in 0..5 {
            assert!(grid.row_text(row).starts_with(&(row % 10).to_string()));
        }
        for row in 5..19 {
            assert!(grid.row_text(row).starts_with(&((row + 1) % 10).to_string()));
        }
        assert_eq!(grid.row_text(19).trim_end(), "");
        for row in 20..ROWS {
            assert!(grid.row_text(row).starts_with(&(row % 10).to_string()));
        }
    }

    #[test]
    fn test_index_scrolls_by_overflow() {
        let mut term = terminal();
        term.receive_string("\x1b[6;20r\x1b[19;1H\x1b[3E");
        assert_eq!(term.cursor_position(), (19, 0));
        assert_eq!(term.host().scrolls[0].rows, 2);
    }

    #[test]
    fn test_index_below_margins_does_not_scroll() {
        let mut term = terminal();
        term.receive_string("\x1b[6;20r\x1b[24;1H\n\n");
        assert_eq!(term.cursor_position(), (ROWS - 1, 0));
        assert!(term.host().scrolls.is_empty());
    }

    #[test]
    fn test_reverse_index_at_top_margin() {
        let mut term = terminal();
        term.receive_string("\x1b[6;20r\x1b[6;1H\x1bM");
        assert_eq!(term.cursor_position(), (5, 0));
        assert_eq!(
            term.host().scrolls,
            vec![ScrollCall {
                scroll: Scroll::Down,
                from_row: 5,
                to_row: 20,
                rows: 1,
            }]
        );
    }

    #[test]
    fn test_relative_motion_confined_inside_margins() {
        let mut term = terminal();
        term.receive_string("\x1b[6;20r\x1b[10;1H\x1b[30A");
        assert_eq!(term.cursor_position(), (5, 0));
        term.receive_string("\x1b[30B");
        assert_eq!(term.cursor_position(), (19, 0));
    }

    #[test]
    fn test_relative_motion_outside_margins_escapes() {
        let mut term = terminal();
        term.receive_string("\x1b[6;20r\x1b[2;1H\x1b[30B");
        assert_eq!(term.cursor_position(), (ROWS - 1, 0));
        term.receive_string("\x1b[30A");
        assert_eq!(term.cursor_position(), (0, 0));
    }

    #[test]
    fn test_origin_mode_addressing() {
        let mut term = terminal();
        term.receive_string("\x1b[6;20r\x1b[?6h");
        assert_eq!(term.cursor_position(), (5, 0));
        term.receive_string("\x1b[3;4H");
        assert_eq!(term.cursor_position(), (7, 3));
        term.receive_string("\x1b[99;1H");
        assert_eq!(term.cursor_position(), (19, 0));

        term.receive_string("\x1b[6n");
        assert_eq!(term.host().transmitted, b"\x1b[15;1R");
    }

    #[test]
    fn test_restore_reclamps_in_origin_mode() {
        let mut term = terminal();
        term.receive_string("\x1b[2;5H\x1b7\x1b[6;20r\x1b[?6h\x1b8");
        assert_eq!(term.cursor_position(), (5, 4));
    }

    #[test]
    fn test_save_restore_attributes() {
        let mut term = terminal();
        term.receive_string("\x1b[3;7H\x1b[1;31m\x1b7\x1b[0m\x1b[H\x1b8");
        assert_eq!(term.cursor_position(), (2, 6));
        assert_eq!(term.visual_state().active_color, 1);
        assert_eq!(term.visual_state().font, crate::core::term::Font::Bold);
    }

    #[test]
    fn test_insert_mode_shifts_right() {
        let mut term = terminal();
        term.receive_string("abc\r\x1b[4hX");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "Xabc");
    }

    #[test]
    fn test_concealed_draws_blank() {
        let mut term = terminal();
        term.receive_string("\x1b[8mZ");
        assert_eq!(term.host().draws[0].codepoint, ' ');
    }

    #[test]
    fn test_erase_in_line_and_display() {
        let mut term = terminal();
        term.receive_string("abcdef\x1b[1;3H\x1b[K");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "ab");
        term.receive_string("\x1b[1K");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "");

        term.receive_string("\x1b[2;1Hline2\x1b[3;1Hline3\x1b[2;3H\x1b[J");
        assert_eq!(term.host().grid.row_text(1).trim_end(), "li");
        assert_eq!(term.host().grid.row_text(2).trim_end(), "");
    }

    #[test]
    fn test_erase_uses_background_color() {
        let mut term = terminal();
        term.receive_string("\x1b[44m\x1b[2J");
        assert_eq!(term.host().grid.cell(10, 10).inactive, 4);
    }

    #[test]
    fn test_character_insert_delete_erase() {
        let mut term = terminal();
        term.receive_string("abcdef\x1b[1;2H\x1b[2P");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "adef");
        term.receive_string("\x1b[2@");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "a  def");
        term.receive_string("\x1b[1;5H\x1b[5X");
        assert_eq!(term.host().grid.row_text(0).trim_end(), "a  d");
    }

    #[test]
    fn test_insert_delete_lines() {
        let mut term = terminal();
        term.receive_string("one\r\ntwo\r\nthree\x1b[2;2H\x1b[L");
        assert_eq!(term.cursor_position(), (1, 0));
        let grid = &term.host().grid;
        assert_eq!(grid.row_text(1).trim_end(), "");
        assert_eq!(grid.row_text(2).trim_end(), "two");

        term.receive_string("\x1b[2M");
        let grid = &term.host().grid;
        assert_eq!(grid.row_text(1).trim_end(), "three");
    }

    #[test]
    fn test_tabs() {
        let mut term = terminal();
        term.receive_string("\t");
        assert_eq!(term.cursor_position(), (0, 8));
        term.receive_string("\x1b[2I");
        assert_eq!(term.cursor_position(), (0, 24));
        term.receive_string("\x1b[Z");
        assert_eq!(term.cursor_position(), (0, 16));

        term.receive_string("\x1b[1;4H\x1bH\x1b[1;1H\t");
        assert_eq!(term.cursor_position(), (0, 3));
        term.receive_string("\x1b[3g\x1b[1;1H\t");
        assert_eq!(term.cursor_position(), (0, COLS - 1));
    }

    #[test]
    fn test_backspace_stops_at_first_column() {
        let mut term = terminal();
        term.receive_string("a\x08\x08");
        assert_eq!(term.cursor_position(), (0, 0));
    }

    #[test]
    fn test_new_line_mode_line_feed() {
        let mut config = test_config();
        config.new_line_mode = true;
        let mut term = terminal_with(config);
        term.receive_string("abc\n");
        assert_eq!(term.cursor_position(), (1, 0));
    }

    #[test]
    fn test_decaln_ignores_rendition() {
        let mut term = terminal();
        term.receive_string("\x1b[8;1;31m\x1b[4h\x1b#8");
        let grid = &term.host().grid;
        assert_eq!(grid.row_text(0), "E".repeat(COLS));
        assert_eq!(grid.cell(0, 0).active, crate::core::term::DEFAULT_ACTIVE_COLOR);
        assert_eq!(grid.cell(0, 0).font, crate::core::term::Font::Normal);
        // Rendition survives for later text
        assert!(term.visual_state().concealed);
    }

    #[test]
    fn test_decaln() {
        let mut term = terminal();
        term.receive_string("\x1b[5;5H\x1b#8");
        assert_eq!(term.cursor_position(), (0, 0));
        let grid = &term.host().grid;
        assert_eq!(grid.row_text(0), "E".repeat(COLS));
        assert_eq!(grid.row_text(ROWS - 1), "E".repeat(COLS));
    }
}
