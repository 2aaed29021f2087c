//! One-line banner for errors and notices

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::Widget,
};

/// Severity of the banner line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Notice,
}

/// The single human-readable message line at the top of the console.
///
/// Every failure ends up here; the rest of the UI stays interactive.
pub struct Banner<'a> {
    message: &'a str,
    kind: BannerKind,
    theme: &'a Theme,
}

impl<'a> Banner<'a> {
    pub fn error(message: &'a str, theme: &'a Theme) -> Self {
        Self {
            message,
            kind: BannerKind::Error,
            theme,
        }
    }

    pub fn notice(message: &'a str, theme: &'a Theme) -> Self {
        Self {
            message,
            kind: BannerKind::Notice,
            theme,
        }
    }
}

impl Widget for Banner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || self.message.is_empty() {
            return;
        }
        let style = match self.kind {
            BannerKind::Error => self.theme.error_style(),
            BannerKind::Notice => self.theme.dim_style(),
        };
        let text = format!("{} (Esc to dismiss)", self.message);
        let span = Span::styled(text, style);
        buf.set_span(area.x, area.y, &span, area.width);
    }
}
