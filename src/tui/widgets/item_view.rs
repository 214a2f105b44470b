use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;
use std::cmp;

use crate::tui::app::SelectedItem;
use crate::tui::widgets::color::parse_color;
use crate::utils::format_date;
use crate::Config;

/// Detail lines for a record: date header, body, and the photo location if any
pub fn content_lines(item: &SelectedItem) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let (date, content, photo) = match item {
        SelectedItem::Diary(entry) => (entry.date, entry.content.as_str(), entry.photo_path.as_deref()),
        SelectedItem::Notice(notice) => (notice.date, notice.content.as_str(), None),
    };

    let mut lines = vec![
        Line::from(vec![Span::styled("Date: ", bold), Span::raw(format_date(date))]),
        Line::from(""),
    ];
    lines.extend(content.lines().map(|l| Line::from(l.to_string())));
    if let Some(path) = photo {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled("Photo: ", bold), Span::raw(path.to_string())]));
    }
    lines
}

pub fn render_item_view(f: &mut Frame, area: Rect, item: &SelectedItem, config: &Config, scroll_offset: usize) {
    if area.width < 2 || area.height < 2 {
        return;
    }

    let horizontal = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let content_area = horizontal[0];
    let scrollbar_area = horizontal[1];

    let viewport_height = area.height.saturating_sub(2) as usize;
    let lines = content_lines(item);
    let total_lines = lines.len();

    let max_scroll = total_lines.saturating_sub(viewport_height);
    let scroll_offset = cmp::min(scroll_offset, max_scroll);
    let end_line = cmp::min(scroll_offset + viewport_height, total_lines);
    let visible_text = Text::from(lines[scroll_offset..end_line].to_vec());

    let title = match item {
        SelectedItem::Diary(_) => "Diary Entry",
        SelectedItem::Notice(_) => "Announcement",
    };

    let paragraph = Paragraph::new(visible_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(parse_color(&config.theme.fg)))
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(paragraph, content_area);

    if total_lines > viewport_height {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            content_area.y + 1,
            scrollbar_area.width,
            content_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .viewport_content_length(viewport_height)
            .position(scroll_offset);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

pub fn render_empty_view(f: &mut Frame, area: Rect, message: &str, config: &Config) {
    let paragraph = Paragraph::new(message.to_string())
        .block(Block::default().borders(Borders::ALL).title("Content"))
        .style(Style::default().fg(parse_color(&config.theme.fg)));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiaryEntry;
    use chrono::NaiveDate;

    #[test]
    fn diary_detail_shows_body_and_photo() {
        let item = SelectedItem::Diary(DiaryEntry {
            id: 0,
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            content: "slept\nate".to_string(),
            photo_path: Some("photos/2024-04-02_a.jpg".to_string()),
        });

        let rendered: Vec<String> = content_lines(&item).iter().map(|l| l.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["Date: 2024-04-02", "", "slept", "ate", "", "Photo: photos/2024-04-02_a.jpg"]
        );
    }
}
