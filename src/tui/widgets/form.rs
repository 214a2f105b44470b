use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::app::{FormField, RecordForm};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::editor::Editor;
use crate::Config;

/// Height of the content field's text area for a form drawn in `area`
pub fn content_viewport_height(area: Rect, form: &RecordForm) -> usize {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    field_areas(inner, form)[1].height.saturating_sub(2) as usize
}

fn field_areas(area: Rect, form: &RecordForm) -> Vec<Rect> {
    let mut constraints = vec![
        Constraint::Length(3), // Date
        Constraint::Min(3),    // Content
    ];
    if form.fields().contains(&FormField::Photo) {
        constraints.push(Constraint::Length(3));
    }
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

fn field_paragraph<'a>(editor: &'a Editor, title: &'a str, style: Style, height: usize) -> Paragraph<'a> {
    let lines: Vec<Line> = editor
        .visible_lines(height)
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    Paragraph::new(lines)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title))
}

pub fn render_form(f: &mut Frame, area: Rect, form: &RecordForm, config: &Config) {
    if area.width < 2 || area.height < 2 {
        return;
    }

    let highlight_bg = parse_color(&config.theme.highlight_bg);
    let active_style = Style::default()
        .bg(highlight_bg)
        .fg(get_contrast_text_color(highlight_bg));
    let inactive_style = Style::default()
        .fg(parse_color(&config.theme.fg))
        .add_modifier(Modifier::DIM);
    let style_for = |field: FormField| {
        if form.current_field == field { active_style } else { inactive_style }
    };

    let outer = Block::default().borders(Borders::ALL).title(form.title());
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let areas = field_areas(inner, form);
    let content_height = areas[1].height.saturating_sub(2) as usize;

    f.render_widget(
        field_paragraph(&form.date, "Date (YYYY-MM-DD)", style_for(FormField::Date), 1),
        areas[0],
    );
    f.render_widget(
        field_paragraph(&form.content, "Content", style_for(FormField::Content), content_height),
        areas[1],
    );
    if let Some(photo_area) = areas.get(2) {
        f.render_widget(
            field_paragraph(&form.photo, "Photo file (optional)", style_for(FormField::Photo), 1),
            *photo_area,
        );
    }

    let (editor, editor_area) = match form.current_field {
        FormField::Date => (&form.date, areas[0]),
        FormField::Content => (&form.content, areas[1]),
        FormField::Photo => (&form.photo, areas.get(2).copied().unwrap_or(areas[0])),
    };
    if let Some((x, y)) = editor.cursor_screen_pos(editor_area) {
        f.set_cursor_position((x, y));
    }
}
