//! Animated activity spinner

use crate::theme::Theme;
use ratatui::{buffer::Buffer, layout::Rect, text::Span, widgets::Widget};
use std::time::{Duration, Instant};

/// Spinner animation frames
const SPINNER_FRAMES: &[&str] = &["|", "/", "-", "\\"];

/// Time per animation frame
const FRAME_DURATION: Duration = Duration::from_millis(120);

/// Pick the frame for a given start time
pub fn frame_for(start: Instant) -> &'static str {
    let elapsed = start.elapsed();
    let index = (elapsed.as_millis() / FRAME_DURATION.as_millis()) as usize;
    SPINNER_FRAMES[index % SPINNER_FRAMES.len()]
}

/// Labeled activity spinner shown while a request is in flight
pub struct Spinner<'a> {
    label: &'a str,
    theme: &'a Theme,
    start_time: Instant,
}

impl<'a> Spinner<'a> {
    pub fn new(label: &'a str, theme: &'a Theme) -> Self {
        Self {
            label,
            theme,
            start_time: Instant::now(),
        }
    }

    /// Use a stored start time so the animation is stable across frames
    pub fn with_start_time(mut self, start: Instant) -> Self {
        self.start_time = start;
        self
    }
}

impl Widget for Spinner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 {
            return;
        }
        let text = format!("{} {}", frame_for(self.start_time), self.label);
        let span = Span::styled(&text, self.theme.warning_style());
        buf.set_span(area.x, area.y, &span, area.width);
    }
}
