use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Screen areas, top to bottom
pub struct ScreenAreas {
    pub header: Rect,
    pub input: Option<Rect>,
    pub content: Rect,
    pub notice: Rect,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Header, optional input bar, content, notice line and status bar
    pub fn main(area: Rect, show_input: bool) -> ScreenAreas {
        let mut constraints = vec![Constraint::Length(3)]; // Header
        if show_input {
            constraints.push(Constraint::Length(3)); // Input bar
        }
        constraints.push(Constraint::Min(1)); // Content
        constraints.push(Constraint::Length(1)); // Notice
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 0;
        let mut next = || {
            let rect = chunks[idx];
            idx += 1;
            rect
        };

        let header = next();
        let input = show_input.then(&mut next);
        ScreenAreas {
            header,
            input,
            content: next(),
            notice: next(),
            status: next(),
        }
    }

    /// Split the probe viewer content into a level count bar and the probe list
    pub fn probe_viewer(area: Rect) -> (Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Level counts
                Constraint::Min(1),    // Probes
            ])
            .split(area);
        (chunks[0], chunks[1])
    }

    /// Centered popup of at most the given size
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}
