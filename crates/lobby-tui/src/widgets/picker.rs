//! Centered popup list for picking a conversation or a console page

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, StatefulWidget, Widget},
};

/// Maximum width for picker popups
const MAX_POPUP_WIDTH: u16 = 72;

/// An entry in the picker
pub struct PickerItem {
    /// Display label
    pub label: String,
    /// Dim suffix, e.g. a creation date
    pub hint: Option<String>,
    /// Whether this item is the currently active one
    pub is_current: bool,
}

impl PickerItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hint: None,
            is_current: false,
        }
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn current(mut self, is_current: bool) -> Self {
        self.is_current = is_current;
        self
    }
}

/// Centered popup list with a highlighted selection
pub struct Picker<'a> {
    title: &'a str,
    items: &'a [PickerItem],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> Picker<'a> {
    pub fn new(title: &'a str, items: &'a [PickerItem], theme: &'a Theme) -> Self {
        Self {
            title,
            items,
            selected: 0,
            theme,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self
    }

    fn popup_size(&self, area: Rect) -> (u16, u16) {
        let mut max_width = self.title.len() + 4;
        for item in self.items {
            let hint_len = item.hint.as_ref().map(|h| h.len() + 3).unwrap_or(0);
            max_width = max_width.max(item.label.len() + hint_len + 6);
        }
        let width = (max_width as u16).clamp(24, MAX_POPUP_WIDTH.min(area.width));
        let height = (self.items.len() as u16 + 2).min(18).min(area.height);
        (width, height)
    }
}

impl Widget for Picker<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.popup_size(area);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let popup_area = Rect::new(x, y, width, height);

        Clear.render(popup_area, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let prefix = if item.is_current { "* " } else { "  " };
                let style = if i == self.selected {
                    self.theme.selection_style().add_modifier(Modifier::BOLD)
                } else if item.is_current {
                    self.theme.accent_style()
                } else {
                    self.theme.base_style()
                };
                let mut spans = vec![Span::styled(format!("{}{}", prefix, item.label), style)];
                if let Some(hint) = &item.hint {
                    spans.push(Span::styled(format!("  {}", hint), self.theme.dim_style()));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.selected));
        StatefulWidget::render(list, popup_area, buf, &mut state);
    }
}

/// Selection state for a picker popup
#[derive(Default)]
pub struct PickerState {
    /// Currently selected index
    pub selected: usize,
    /// Whether the picker is visible
    pub visible: bool,
}

impl PickerState {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move selection up with wrap-around
    pub fn up(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = item_count - 1;
        }
    }

    /// Move selection down with wrap-around
    pub fn down(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        if self.selected < item_count - 1 {
            self.selected += 1;
        } else {
            self.selected = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picker_state_wraps() {
        let mut state = PickerState::default();
        state.up(3);
        assert_eq!(state.selected, 2);
        state.down(3);
        assert_eq!(state.selected, 0);
        state.down(3);
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn test_picker_state_empty_list() {
        let mut state = PickerState::default();
        state.up(0);
        state.down(0);
        assert_eq!(state.selected, 0);
    }
}
