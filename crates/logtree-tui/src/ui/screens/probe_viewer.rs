use ratatui::{
    Frame,
    layout::{Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use logtree_core::{ProbeBuffer, ProbeRecord};

use super::filter_console::render_notice;
use crate::app::AppState;
use crate::ui::components::{StatusBar, viewer_hints};
use crate::ui::{Layout, Theme};

/// Probe viewer: what the registry's sink received, newest last, narrowed
/// by the console's namespace search
pub struct ProbeViewerScreen;

impl ProbeViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let areas = Layout::main(frame.area(), false);

        Self::render_header(frame, areas.header, state);

        let (counts_area, probes_area) = Layout::probe_viewer(areas.content);
        Self::render_counts(frame, counts_area, &state.probes);
        Self::render_probes(frame, probes_area, state);

        render_notice(frame, areas.notice, state);

        let follow = if state.ui_state.auto_scroll { "▼ following" } else { "paused" };
        let status = StatusBar::new("PROBES")
            .hints(viewer_hints())
            .summary(format!("{}/{} {}", state.probes.len(), state.probes.capacity(), follow));
        frame.render_widget(status, areas.status);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let title = Line::from(vec![
            Span::styled("logtree", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("probes", Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("root at {}", state.snapshot.filter.first().map_or("?", |e| e.resolved.as_str())),
                Theme::text(),
            ),
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_counts(frame: &mut Frame, area: Rect, probes: &ProbeBuffer) {
        let counts = probes.level_counts();

        let mut spans = vec![Span::styled(" ", Theme::text())];
        for (name, count) in counts.iter() {
            spans.push(Span::styled(format!("{}:", name), Theme::level(name)));
            spans.push(Span::styled(format!("{} ", count), Theme::text()));
        }
        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled("Total:", Theme::text_dim()));
        spans.push(Span::styled(counts.total().to_string(), Theme::text()));

        let widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Levels ", Theme::title())),
        );
        frame.render_widget(widget, area);
    }

    fn render_probes(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let records = state.visible_probes();
        let lines: Vec<Line> = records.iter().flat_map(probe_lines).collect();
        let total_lines = lines.len();

        let inner_height = area.height.saturating_sub(2) as usize;
        let max_scroll = total_lines.saturating_sub(inner_height);

        if state.ui_state.auto_scroll {
            state.ui_state.probe_scroll = max_scroll;
        }
        if state.ui_state.probe_scroll > max_scroll {
            state.ui_state.probe_scroll = max_scroll;
        }

        let visible: Vec<Line> = lines
            .into_iter()
            .skip(state.ui_state.probe_scroll)
            .take(inner_height)
            .collect();

        let widget = Paragraph::new(visible).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(format!(" Probes ({}) ", records.len()), Theme::title())),
        );
        frame.render_widget(widget, area);

        if total_lines > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(state.ui_state.probe_scroll);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }
}

/// One display line per text line; the first carries the level colour
fn probe_lines(record: &ProbeRecord) -> Vec<Line<'static>> {
    let time = record.received_at.format("%H:%M:%S%.3f").to_string();
    let style = Theme::level(&record.level_name);

    record
        .text
        .lines()
        .enumerate()
        .map(|(i, text)| {
            let gutter = if i == 0 {
                Span::styled(format!("{} ", time), Theme::text_dim())
            } else {
                Span::raw(" ".repeat(time.len() + 1))
            };
            let body = if i == 0 {
                Span::styled(text.to_string(), style)
            } else {
                Span::styled(text.to_string(), Theme::text())
            };
            Line::from(vec![gutter, body])
        })
        .collect()
}
