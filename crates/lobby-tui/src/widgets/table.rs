//! Bordered data table with a selected row and optional check column

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Cell, Row, StatefulWidget, Table, TableState, Widget},
};

/// A table column: header text plus its width constraint
pub struct Column {
    pub header: &'static str,
    pub constraint: Constraint,
}

impl Column {
    pub fn new(header: &'static str, constraint: Constraint) -> Self {
        Self { header, constraint }
    }
}

/// Generic table for the users and logs pages.
///
/// Rows are plain strings; the first column shows a check mark for rows in
/// `checked` when a check column is enabled.
pub struct DataTable<'a> {
    title: String,
    columns: &'a [Column],
    rows: Vec<Vec<String>>,
    selected: Option<usize>,
    checked: Vec<bool>,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> DataTable<'a> {
    pub fn new(title: impl Into<String>, columns: &'a [Column], theme: &'a Theme) -> Self {
        Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
            selected: None,
            checked: Vec::new(),
            focused: false,
            theme,
        }
    }

    pub fn rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    /// Per-row check marks; empty disables the check column
    pub fn checked(mut self, checked: Vec<bool>) -> Self {
        self.checked = checked;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for DataTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(if self.focused {
                self.theme.accent_style()
            } else {
                self.theme.border_style()
            });

        let with_checks = !self.checked.is_empty();

        let mut header_cells: Vec<Cell> = Vec::new();
        let mut constraints: Vec<Constraint> = Vec::new();
        if with_checks {
            header_cells.push(Cell::from(" "));
            constraints.push(Constraint::Length(2));
        }
        for column in self.columns {
            header_cells.push(Cell::from(column.header));
            constraints.push(column.constraint);
        }
        let header = Row::new(header_cells).style(self.theme.header_style());

        let rows: Vec<Row> = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| {
                let mut row_cells: Vec<Cell> = Vec::new();
                if with_checks {
                    let mark = if self.checked.get(i).copied().unwrap_or(false) {
                        "x"
                    } else {
                        " "
                    };
                    row_cells.push(Cell::from(mark));
                }
                row_cells.extend(cells.into_iter().map(Cell::from));
                Row::new(row_cells).style(self.theme.base_style())
            })
            .collect();

        let table = Table::new(rows, constraints)
            .header(header)
            .block(block)
            .row_highlight_style(self.theme.selection_style());

        let mut state = TableState::default();
        state.select(self.selected);
        StatefulWidget::render(table, area, buf, &mut state);
    }
}

/// Move a table selection up, clamping at the first row
pub fn select_up(selected: Option<usize>) -> Option<usize> {
    match selected {
        Some(0) | None => Some(0),
        Some(i) => Some(i - 1),
    }
}

/// Move a table selection down, clamping at `len - 1`
pub fn select_down(selected: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match selected {
        None => Some(0),
        Some(i) => Some((i + 1).min(len - 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_clamps() {
        assert_eq!(select_up(Some(0)), Some(0));
        assert_eq!(select_up(Some(3)), Some(2));
        assert_eq!(select_down(Some(1), 2), Some(1));
        assert_eq!(select_down(None, 2), Some(0));
        assert_eq!(select_down(Some(0), 0), None);
    }
}
