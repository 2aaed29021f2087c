//! Dashboard stat cards and series panel

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline, Widget},
};

/// One metric card: a value with its caption
pub struct StatCard<'a> {
    title: &'a str,
    value: String,
    theme: &'a Theme,
}

impl<'a> StatCard<'a> {
    pub fn new(title: &'a str, value: impl Into<String>, theme: &'a Theme) -> Self {
        Self {
            title,
            value: value.into(),
            theme,
        }
    }
}

impl Widget for StatCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        let lines = vec![
            Line::from(Span::styled(self.value, self.theme.accent_bold())),
            Line::from(Span::styled(self.title.to_string(), self.theme.dim_style())),
        ];
        Paragraph::new(lines).render(inner, buf);
    }
}

/// Titled sparkline over a daily series
pub struct SeriesPanel<'a> {
    title: &'a str,
    values: &'a [u64],
    theme: &'a Theme,
}

impl<'a> SeriesPanel<'a> {
    pub fn new(title: &'a str, values: &'a [u64], theme: &'a Theme) -> Self {
        Self {
            title,
            values,
            theme,
        }
    }
}

impl Widget for SeriesPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());
        let inner = block.inner(area);
        block.render(area, buf);

        if self.values.is_empty() {
            Paragraph::new(Span::styled("no data", self.theme.dim_style())).render(inner, buf);
            return;
        }

        Sparkline::default()
            .data(self.values)
            .style(self.theme.accent_style())
            .render(inner, buf);
    }
}

/// Group digits for card values: 1234567 -> "1,234,567"
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
