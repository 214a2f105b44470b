use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget,
};
use ratatui::Frame;

use crate::models::{Announcement, DiaryEntry};
use crate::projection::{diary_title, preview};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::truncate;
use crate::utils::format_date;
use crate::Config;

pub fn diary_labels(entries: &[DiaryEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let marker = if entry.photo_path.is_some() { " *" } else { "" };
            format!("{}{}", diary_title(entry), marker)
        })
        .collect()
}

pub fn notice_labels(notices: &[Announcement]) -> Vec<String> {
    notices
        .iter()
        .map(|notice| format!("{} {}", format_date(notice.date), preview(&notice.content)))
        .collect()
}

pub fn render_record_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    labels: &[String],
    list_state: &mut ListState,
    config: &Config,
) {
    // 2 for borders, 2 for padding
    let max_width = area.width.saturating_sub(4) as usize;
    let highlight_bg = parse_color(&config.theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);

    let items: Vec<ListItem> = labels
        .iter()
        .map(|label| ListItem::new(truncate(label, max_width)))
        .collect();

    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!("{} ({})", title, labels.len())))
        .style(Style::default().fg(parse_color(&config.theme.fg)))
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if labels.len() > visible_items && visible_items > 0 && scrollbar_area.width > 0 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let selected_index = list_state.selected().unwrap_or(0);
        let mut scrollbar_state = ScrollbarState::new(labels.len())
            .viewport_content_length(visible_items)
            .position(selected_index);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn labels_mark_photos_and_preview_notices() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let entries = vec![
            DiaryEntry { id: 0, date, content: String::new(), photo_path: Some("p.jpg".to_string()) },
            DiaryEntry { id: 1, date, content: "ate".to_string(), photo_path: None },
        ];
        assert_eq!(diary_labels(&entries), vec!["2024-02-01 *", "2024-02-01 - ate..."]);

        let notices = vec![Announcement { id: 0, date, content: "vet visit".to_string() }];
        assert_eq!(notice_labels(&notices), vec!["2024-02-01 vet visit..."]);
    }
}
