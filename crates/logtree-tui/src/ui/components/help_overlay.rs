use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 54, 30);
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Filters"),
            Self::key_line("j/k", "Select namespace"),
            Self::key_line("h/l", "Lower / raise the level"),
            Self::key_line("n", "Inherit from the parent"),
            Self::key_line("e/Enter", "Edit the note"),
            Self::key_line("a", "Add a namespace"),
            Self::key_line("x", "Toggle client error exclusion"),
            Self::key_line("p", "Emit sample probes at every level"),
            Line::from(""),
            Self::section("Search"),
            Self::key_line("/", "Search namespaces and notes"),
            Self::key_line("i", "Toggle case sensitivity"),
            Self::key_line("Bksp", "Clear search"),
            Line::from(""),
            Self::section("Probes"),
            Self::key_line("Tab", "Switch filters / probes"),
            Self::key_line("f", "Toggle follow mode"),
            Self::key_line("c", "Clear probes"),
            Line::from(""),
            Self::section("General"),
            Self::key_line("w", "Write configuration file"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("Esc", "Go back"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(title: &str) -> Line<'_> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
