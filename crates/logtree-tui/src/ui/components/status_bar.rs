use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

/// Bottom line: a mode badge, as many key hints as fit, and a right-aligned summary
pub struct StatusBar<'a> {
    mode: &'a str,
    hints: Vec<(&'a str, &'a str)>,
    summary: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new(mode: &'a str) -> Self {
        Self {
            mode,
            hints: Vec::new(),
            summary: None,
        }
    }

    /// Key hints as (key, description), most important first
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    pub fn summary<S: Into<String>>(mut self, text: S) -> Self {
        self.summary = Some(text.into());
        self
    }

    fn badge(&self) -> Span<'a> {
        Span::styled(
            format!(" {} ", self.mode),
            Style::default()
                .fg(Color::Black)
                .bg(Theme::PRIMARY)
                .add_modifier(Modifier::BOLD),
        )
    }
}

fn hint_spans<'a>(key: &'a str, desc: &'a str) -> [Span<'a>; 3] {
    [
        Span::styled("  ", Theme::status_bar()),
        Span::styled(key, Theme::status_bar_key()),
        Span::styled(format!(" {}", desc), Theme::status_bar()),
    ]
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let summary = self.summary.as_deref().unwrap_or("");
        let budget = (area.width as usize).saturating_sub(summary.width() + 2);

        let mut spans = vec![self.badge()];
        let mut used = spans[0].width();
        // Hints that would run into the summary are left out
        for (key, desc) in &self.hints {
            let next = hint_spans(key, desc);
            let width: usize = next.iter().map(Span::width).sum();
            if used + width > budget {
                break;
            }
            used += width;
            spans.extend(next);
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        if !summary.is_empty() && used + summary.width() + 2 <= area.width as usize {
            let x = area.x + area.width - summary.width() as u16 - 1;
            buf.set_stringn(x, area.y, summary, summary.width(), Theme::status_bar());
        }
    }
}

/// Hints for the filter console
pub fn console_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("h/l", "level"),
        ("n", "inherit"),
        ("/", "search"),
        ("p", "probe"),
        ("x", "client errors"),
        ("w", "write"),
        ("Tab", "probes"),
        ("?", "help"),
    ]
}

/// Hints for the probe viewer
pub fn viewer_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("j/k", "scroll"),
        ("f", "follow"),
        ("c", "clear"),
        ("Tab", "filters"),
        ("q", "quit"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(bar: StatusBar, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_hints_and_summary() {
        let text = rendered(
            StatusBar::new("FILTERS").hints(viewer_hints()).summary("3 probes"),
            80,
        );
        assert!(text.starts_with(" FILTERS "));
        assert!(text.contains("f follow"));
        assert!(text.trim_end().ends_with("3 probes"));
    }

    #[test]
    fn test_narrow_drops_trailing_hints() {
        let text = rendered(
            StatusBar::new("PROBES").hints(viewer_hints()).summary("0/10"),
            36,
        );
        assert!(text.contains("j/k scroll"));
        assert!(!text.contains("quit"));
        assert!(text.contains("0/10"));
    }
}
