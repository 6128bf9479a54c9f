use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, StatefulWidget, Table, TableState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use logtree_core::{FilterEntry, LEVEL_NONE};

use crate::app::NamespaceFilter;
use crate::ui::Theme;

/// Table of filter nodes: namespace, declared level, effective level, note
pub struct FilterTable<'a> {
    entries: Vec<&'a FilterEntry>,
    search: Option<&'a NamespaceFilter>,
    title: String,
}

impl<'a> FilterTable<'a> {
    pub fn new(entries: Vec<&'a FilterEntry>) -> Self {
        Self {
            title: format!(" Filters ({}) ", entries.len()),
            entries,
            search: None,
        }
    }

    /// Highlight matches of the active search
    pub fn search(mut self, search: Option<&'a NamespaceFilter>) -> Self {
        self.search = search;
        self
    }

    fn row(&self, entry: &'a FilterEntry, note_width: usize) -> Row<'a> {
        let declared = if entry.level == LEVEL_NONE {
            Span::styled("inherit", Theme::text_dim())
        } else {
            Span::styled(entry.level.as_str(), Theme::level(&entry.level))
        };

        let note = truncate(&entry.note, note_width);

        Row::new(vec![
            Cell::from(self.highlighted(&entry.namespace, Theme::text())),
            Cell::from(Line::from(declared)),
            Cell::from(Line::from(Span::styled(
                entry.resolved.as_str(),
                Theme::level(&entry.resolved),
            ))),
            Cell::from(self.highlighted(&note, Theme::text_dim())),
        ])
    }

    fn highlighted(&self, text: &str, base: Style) -> Line<'static> {
        let matches = self
            .search
            .map(|s| s.find_matches(text))
            .unwrap_or_default();
        if matches.is_empty() {
            return Line::from(Span::styled(text.to_string(), base));
        }

        let mut spans = Vec::new();
        let mut last_end = 0;
        for (start, end) in matches {
            if start > last_end {
                spans.push(Span::styled(text[last_end..start].to_string(), base));
            }
            spans.push(Span::styled(text[start..end].to_string(), Theme::search_match()));
            last_end = end;
        }
        if last_end < text.len() {
            spans.push(Span::styled(text[last_end..].to_string(), base));
        }
        Line::from(spans)
    }
}

/// Cut `text` to at most `width` columns, marking the cut with an ellipsis
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

impl StatefulWidget for FilterTable<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let namespace_width = self
            .entries
            .iter()
            .map(|e| e.namespace.width())
            .max()
            .unwrap_or(0)
            .clamp(9, 48) as u16;

        // borders, highlight symbol and column gaps
        let fixed = namespace_width + 8 + 8 + 2 + 3 + 2;
        let note_width = area.width.saturating_sub(fixed) as usize;

        let rows: Vec<Row> = self
            .entries
            .iter()
            .map(|&entry| self.row(entry, note_width))
            .collect();

        let header = Row::new(vec!["Namespace", "Level", "Resolved", "Note"])
            .style(Theme::table_header());

        let table = Table::new(
            rows,
            [
                Constraint::Length(namespace_width),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Min(4),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(self.title.clone(), Theme::title())),
        )
        .row_highlight_style(Theme::row_selected())
        .highlight_symbol("▶ ");

        StatefulWidget::render(table, area, buf, state);
    }
}
