use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{AppState, InputMode};
use crate::ui::components::{FilterTable, InputBar, StatusBar, console_hints};
use crate::ui::{Layout, Theme};

/// Filter console: the tree as a table, edited in place
pub struct FilterConsoleScreen;

impl FilterConsoleScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let areas = Layout::main(frame.area(), InputBar::is_visible(&state.ui_state));

        Self::render_header(frame, areas.header, state);

        if let Some(input_area) = areas.input {
            frame.render_widget(InputBar::new(&state.ui_state), input_area);
        }

        let mut table_state = std::mem::take(&mut state.ui_state.table_state);
        let table = FilterTable::new(state.visible_entries())
            .search(state.ui_state.active_filter.as_ref());
        frame.render_stateful_widget(table, areas.content, &mut table_state);
        state.ui_state.table_state = table_state;

        render_notice(frame, areas.notice, state);

        let mode = if state.ui_state.input_mode == InputMode::Off {
            "FILTERS"
        } else {
            "INPUT"
        };
        let status = StatusBar::new(mode)
            .hints(console_hints())
            .summary(format!("{} probes", state.probes.len()));
        frame.render_widget(status, areas.status);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let snapshot = &state.snapshot;

        let mut spans = vec![
            Span::styled("logtree", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
        ];
        for (i, name) in state.level_choices().iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" ", Theme::text_dim()));
            }
            let style = if *name == snapshot.default_level {
                Theme::level(name).add_modifier(ratatui::style::Modifier::UNDERLINED)
            } else {
                Theme::level(name)
            };
            spans.push(Span::styled(name.clone(), style));
        }
        spans.push(Span::styled(" │ ", Theme::text_dim()));
        spans.push(Span::styled("excludeClientErrors ", Theme::text()));
        spans.push(if snapshot.exclude_client_errors {
            Span::styled("on", Theme::info())
        } else {
            Span::styled("off", Theme::error())
        });

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }
}

/// Last notice, shared by both screens
pub(super) fn render_notice(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(notice) = &state.ui_state.notice else {
        return;
    };
    let style = if notice.is_error() {
        Theme::error()
    } else {
        Theme::info()
    };
    let line = Line::from(Span::styled(format!(" {}", notice.text()), style));
    frame.render_widget(Paragraph::new(line), area);
}
