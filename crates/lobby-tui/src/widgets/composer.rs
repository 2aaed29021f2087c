//! Single-line input with cursor editing and horizontal scroll

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Single-line text input used by the chat page and the table filters
#[derive(Debug, Default)]
pub struct Composer {
    /// Current input text
    content: String,
    /// Cursor position (character index, not byte index)
    cursor: usize,
    /// Horizontal scroll offset (in display width)
    scroll: usize,
    /// Placeholder text
    placeholder: String,
    /// Whether the input is focused
    focused: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.chars().count();
        self.update_scroll(80);
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Take the content out, leaving the composer empty
    pub fn take(&mut self) -> String {
        let text = std::mem::take(&mut self.content);
        self.cursor = 0;
        self.scroll = 0;
        text
    }

    fn cursor_byte_offset(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn cursor_display_width(&self) -> usize {
        self.content
            .chars()
            .take(self.cursor)
            .map(|c| c.to_string().width())
            .sum()
    }

    /// Handle an input action; returns whether the content or cursor changed
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        let char_count = self.content.chars().count();

        match action {
            Action::Char(c) => {
                self.insert_char(*c);
                self.update_scroll(width as usize);
                true
            }
            Action::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_char_at_cursor();
                    self.update_scroll(width as usize);
                    true
                } else {
                    false
                }
            }
            Action::Delete => {
                if self.cursor < char_count {
                    self.remove_char_at_cursor();
                    true
                } else {
                    false
                }
            }
            Action::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.update_scroll(width as usize);
                    true
                } else {
                    false
                }
            }
            Action::Right => {
                if self.cursor < char_count {
                    self.cursor += 1;
                    self.update_scroll(width as usize);
                    true
                } else {
                    false
                }
            }
            Action::Home => {
                self.cursor = 0;
                self.update_scroll(width as usize);
                true
            }
            Action::End => {
                self.cursor = char_count;
                self.update_scroll(width as usize);
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let mut new_cursor = self.cursor;
                let chars: Vec<char> = self.content.chars().collect();

                while new_cursor > 0 && chars.get(new_cursor - 1) == Some(&' ') {
                    new_cursor -= 1;
                }
                while new_cursor > 0 && chars.get(new_cursor - 1) != Some(&' ') {
                    new_cursor -= 1;
                }

                let start_byte = self
                    .content
                    .char_indices()
                    .nth(new_cursor)
                    .map(|(i, _)| i)
                    .unwrap_or(self.content.len());
                let end_byte = self.cursor_byte_offset();

                self.content.drain(start_byte..end_byte);
                self.cursor = new_cursor;
                self.update_scroll(width as usize);
                true
            }
            Action::Paste(text) => {
                for c in text.chars() {
                    // Single-line input: newlines become spaces
                    if c == '\n' || c == '\r' {
                        if !self.content.ends_with(' ') && self.cursor > 0 {
                            self.insert_char(' ');
                        }
                    } else {
                        self.insert_char(c);
                    }
                }
                self.update_scroll(width as usize);
                true
            }
            _ => false,
        }
    }

    fn insert_char(&mut self, c: char) {
        let byte_offset = self.cursor_byte_offset();
        self.content.insert(byte_offset, c);
        self.cursor += 1;
    }

    /// Remove the character the cursor currently points at
    fn remove_char_at_cursor(&mut self) {
        let byte_offset = self.cursor_byte_offset();
        let next_boundary = self.content[byte_offset..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| byte_offset + i)
            .unwrap_or(self.content.len());
        self.content.drain(byte_offset..next_boundary);
    }

    fn update_scroll(&mut self, width: usize) {
        let visible_width = width.saturating_sub(4);
        let cursor_pos = self.cursor_display_width();

        if cursor_pos < self.scroll {
            self.scroll = cursor_pos;
        } else if visible_width > 0 && cursor_pos >= self.scroll + visible_width {
            self.scroll = cursor_pos - visible_width + 1;
        }
    }

    /// Render with a titled border; the border color follows focus
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme, title: &str) {
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(if self.focused {
                theme.accent_style()
            } else {
                theme.border_style()
            });

        let inner = block.inner(area);
        block.render(area, buf);

        let display_text = if self.content.is_empty() {
            self.placeholder.clone()
        } else {
            self.visible_slice(inner.width as usize)
        };

        let style = if self.content.is_empty() {
            theme.dim_style()
        } else {
            theme.base_style()
        };

        Paragraph::new(display_text).style(style).render(inner, buf);

        if self.focused && inner.width > 0 {
            let cursor_x = self.cursor_display_width().saturating_sub(self.scroll);
            if cursor_x < inner.width as usize {
                let x = inner.x + cursor_x as u16;
                if let Some(cell) = buf.cell_mut((x, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }

    /// The slice of content visible at the current scroll offset
    fn visible_slice(&self, visible_width: usize) -> String {
        let chars: Vec<char> = self.content.chars().collect();
        let mut start_idx = 0;
        let mut current_width = 0;

        for (i, c) in chars.iter().enumerate() {
            if current_width >= self.scroll {
                start_idx = i;
                break;
            }
            current_width += c.to_string().width();
        }

        let mut visible = String::new();
        current_width = 0;
        for c in chars.iter().skip(start_idx) {
            let char_width = c.to_string().width();
            if current_width + char_width > visible_width {
                break;
            }
            visible.push(*c);
            current_width += char_width;
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_and_take() {
        let mut composer = Composer::new();
        for c in "hello".chars() {
            composer.handle_action(&Action::Char(c), 80);
        }
        assert_eq!(composer.content(), "hello");
        assert_eq!(composer.take(), "hello");
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn test_backspace_respects_char_boundaries() {
        let mut composer = Composer::new();
        composer.set_content("héllo");
        composer.handle_action(&Action::Home, 80);
        composer.handle_action(&Action::Right, 80);
        composer.handle_action(&Action::Right, 80);
        composer.handle_action(&Action::Backspace, 80);
        assert_eq!(composer.content(), "hllo");
    }

    #[test]
    fn test_delete_word() {
        let mut composer = Composer::new();
        composer.set_content("one two three");
        composer.handle_action(&Action::DeleteWord, 80);
        assert_eq!(composer.content(), "one two ");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut composer = Composer::new();
        composer.set_content("a");
        composer.handle_action(&Action::Paste("b\r\nc".to_string()), 80);
        assert_eq!(composer.content(), "ab c");
    }
}
