use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::{InputMode, UiState};
use crate::ui::Theme;

/// Input line for searches, new namespaces and notes.
///
/// With the input closed it shows the active search, if any.
pub struct InputBar<'a> {
    ui: &'a UiState,
}

impl<'a> InputBar<'a> {
    pub fn new(ui: &'a UiState) -> Self {
        Self { ui }
    }

    /// Should the bar take screen space?
    pub fn is_visible(ui: &UiState) -> bool {
        ui.input_mode != InputMode::Off || ui.active_filter.is_some() || ui.filter_error.is_some()
    }

    fn title(&self) -> &'static str {
        match self.ui.input_mode {
            InputMode::AddNamespace => " Add Namespace ",
            InputMode::EditNote => " Edit Note ",
            InputMode::Search | InputMode::Off => " Search ",
        }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let ui = self.ui;
        let editing = ui.input_mode != InputMode::Off;
        let mut spans = vec![];

        if editing {
            spans.push(Span::styled(ui.input_mode.prompt(), Theme::text_highlight()));
            spans.push(Span::styled(ui.input.clone(), Theme::text_highlight()));
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        } else if let Some(filter) = &ui.active_filter {
            spans.push(Span::styled(" Filter: ", Theme::text_dim()));
            spans.push(Span::styled(filter.pattern().to_string(), Theme::text_highlight()));
        }

        if let Some(err) = &ui.filter_error {
            spans.push(Span::styled(format!("  ⚠ {}", err), Theme::error()));
        }

        let searching = ui.input_mode == InputMode::Search || (!editing && ui.active_filter.is_some());
        if searching {
            let case_text = if ui.filter_case_insensitive {
                "  [i] case-insensitive"
            } else {
                "  [I] case-sensitive"
            };
            spans.push(Span::styled(case_text, Theme::text_dim()));
        }

        if editing {
            spans.push(Span::styled("  [Enter] Apply  [Esc] Cancel", Theme::text_dim()));
        } else if ui.active_filter.is_some() {
            spans.push(Span::styled("  [Bksp] Clear  [/] Edit", Theme::text_dim()));
        }

        let border = if editing {
            Theme::border_input()
        } else if ui.filter_error.is_some() {
            Style::default().fg(Theme::ERROR)
        } else {
            Theme::border()
        };

        Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(Span::styled(self.title(), Theme::title())),
            )
            .render(area, buf);
    }
}
