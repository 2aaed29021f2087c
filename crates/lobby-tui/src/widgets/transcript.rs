//! Chat transcript rendering

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use textwrap;

/// One rendered entry in the transcript
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// "user", "assistant", or "system"
    pub role: String,
    pub content: String,
    pub is_error: bool,
    /// Still receiving streamed fragments
    pub is_streaming: bool,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            is_error: false,
            is_streaming: false,
        }
    }

    pub fn assistant(content: impl Into<String>, is_streaming: bool) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            is_error: false,
            is_streaming,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            is_error: false,
            is_streaming: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            is_error: true,
            is_streaming: false,
        }
    }
}

/// Scrollable list of chat turns
pub struct Transcript<'a> {
    entries: &'a [TranscriptEntry],
    theme: &'a Theme,
    scroll: usize,
    spinner_frame: &'static str,
}

impl<'a> Transcript<'a> {
    pub fn new(entries: &'a [TranscriptEntry], theme: &'a Theme) -> Self {
        Self {
            entries,
            theme,
            scroll: 0,
            spinner_frame: "",
        }
    }

    /// Set scroll offset in lines
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Frame to show while an empty assistant turn waits for output
    pub fn spinner_frame(mut self, frame: &'static str) -> Self {
        self.spinner_frame = frame;
        self
    }

    fn entry_lines(&self, entry: &TranscriptEntry, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let (label, style, prefix) = match entry.role.as_str() {
            "user" => ("You", self.theme.accent_bold(), "> "),
            "assistant" => ("Assistant", self.theme.success_style(), "< "),
            _ => ("System", self.theme.dim_style(), "* "),
        };

        let header = if entry.is_streaming {
            format!("{}{} ...", prefix, label)
        } else {
            format!("{}{}", prefix, label)
        };
        lines.push(Line::from(Span::styled(header, style)));

        let content_width = width.saturating_sub(2).max(8);
        if entry.content.is_empty() && entry.is_streaming {
            lines.push(Line::from(Span::styled(
                format!("  {} waiting for reply", self.spinner_frame),
                self.theme.warning_style(),
            )));
        } else {
            let content_style = if entry.is_error {
                self.theme.error_style()
            } else {
                self.theme.base_style()
            };
            for wrapped in textwrap::wrap(&entry.content, content_width) {
                lines.push(Line::from(Span::styled(
                    format!("  {}", wrapped),
                    content_style,
                )));
            }
        }

        lines.push(Line::from(""));
        lines
    }
}

impl Widget for Transcript<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let mut all_lines: Vec<Line> = Vec::new();
        for entry in self.entries {
            all_lines.extend(self.entry_lines(entry, width));
        }

        let visible: Vec<Line> = all_lines
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

/// Total rendered height of a transcript at the given width, for
/// scroll-to-bottom math.
pub fn transcript_height(entries: &[TranscriptEntry], width: usize) -> usize {
    let content_width = width.saturating_sub(2).max(8);
    let mut total = 0;
    for entry in entries {
        total += 1; // role header
        if entry.content.is_empty() && entry.is_streaming {
            total += 1;
        } else {
            total += textwrap::wrap(&entry.content, content_width).len();
        }
        total += 1; // separator
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_counts_wrapping() {
        let entries = vec![TranscriptEntry::user("a".repeat(30))];
        // width 18 -> content width 16 -> 2 wrapped lines + header + separator
        assert_eq!(transcript_height(&entries, 18), 4);
    }

    #[test]
    fn test_height_for_waiting_turn() {
        let entries = vec![TranscriptEntry::assistant("", true)];
        assert_eq!(transcript_height(&entries, 40), 3);
    }
}
