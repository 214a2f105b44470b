use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;
use crate::Config;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let style = Style::default()
        .fg(parse_color(&config.theme.fg))
        .bg(parse_color(&config.theme.bg));
    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(style),
        )
        .style(style)
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Switch tabs\n", key(&kb.tab_left), key(&kb.tab_right)));
    text.push_str(&format!("  {} / {}: Diary / Notices\n", key(&kb.tab_1), key(&kb.tab_2)));
    text.push_str(&format!("  {} / {} or arrows: Move in list\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str("  PageUp / PageDown: Scroll entry\n");
    text.push('\n');

    text.push_str("Admin:\n");
    text.push_str(&format!("  {}: Log in / log out\n", key(&kb.login)));
    text.push_str(&format!("  {}: New entry\n", key(&kb.new)));
    text.push_str(&format!("  {}: Edit selected entry\n", key(&kb.edit)));
    text.push_str(&format!("  {}: Delete selected entry\n", key(&kb.delete)));
    text.push('\n');

    text.push_str("Form:\n");
    text.push_str(&format!("  {}: Save\n", key(&kb.save)));
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  Enter: New line in content, next field elsewhere\n");
    text.push_str("  Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.login = "L".to_string();
        let text = build_help_text(&config);

        assert!(text.contains("  L: Log in / log out\n"));
        assert!(text.contains(": Save\n"));
    }
}
