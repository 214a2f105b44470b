use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::Config;

/// The typed password as shown on screen
pub fn mask(input: &str) -> String {
    "*".repeat(input.chars().count())
}

pub fn render_login(f: &mut Frame, area: Rect, input: &str, config: &Config) {
    let style = Style::default()
        .fg(parse_color(&config.theme.fg))
        .bg(parse_color(&config.theme.bg));
    let popup_area = popup_area(area, 40, 25);
    f.render_widget(Clear, popup_area);

    let masked = mask(input);
    let lines = vec![
        Line::from("Admin password:"),
        Line::from(""),
        Line::from(masked.clone()),
        Line::from(""),
        Line::from("Enter to log in, Esc to cancel"),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Login")
        .title_alignment(Alignment::Center)
        .style(style);
    let inner = block.inner(popup_area);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, popup_area);

    // Cursor after the masked input, on the centered third line
    let width = masked.chars().count() as u16;
    if inner.height > 2 && inner.width > width {
        let x = inner.x + (inner.width - width) / 2 + width;
        f.set_cursor_position((x.min(inner.x + inner.width - 1), inner.y + 2));
    }
}
