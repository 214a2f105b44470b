use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::tui::app::{Mode, Tab};
use crate::tui::widgets::{
    color::parse_color,
    confirm_delete::render_confirm_delete,
    form::render_form,
    help::render_help,
    item_view::{render_empty_view, render_item_view},
    login::render_login,
    record_list::{diary_labels, notice_labels, render_record_list},
    status_bar::render_status_bar,
    tabs::render_tabs,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let title = if app.session.is_admin() { "petlog [admin]" } else { "petlog" };
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(parse_color(&app.config.theme.fg))
                .bg(parse_color(&app.config.theme.bg)),
        );
    f.render_widget(outer_block, f.area());

    render_tabs(f, layout.tabs_area, app.ui.current_tab, &app.config);

    if layout.sidebar_area.width > 0 {
        let (list_title, labels) = match app.ui.current_tab {
            Tab::Diary => ("Diary", diary_labels(&app.diary)),
            Tab::Notices => ("Notices", notice_labels(&app.notices)),
        };
        render_record_list(f, layout.sidebar_area, list_title, &labels, &mut app.ui.list_state, &app.config);
    }

    match (&app.form.form, app.selected_item()) {
        (Some(form), _) => render_form(f, layout.main_area, form, &app.config),
        (None, Some(item)) => {
            render_item_view(f, layout.main_area, &item, &app.config, app.ui.item_view_scroll)
        }
        (None, None) => {
            let message = match app.ui.current_tab {
                Tab::Diary => "No diary entries yet",
                Tab::Notices => "No announcements",
            };
            render_empty_view(f, layout.main_area, message, &app.config);
        }
    }

    // Overlays go after the normal content
    match app.ui.mode {
        Mode::Help => render_help(f, f.area(), &app.config),
        Mode::Login => render_login(f, f.area(), &app.login.input, &app.config),
        Mode::View | Mode::Form => {}
    }
    if let Some(ref item) = app.modals.delete_confirmation {
        render_confirm_delete(f, f.area(), item, app.modals.delete_modal_selection, &app.config);
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
}

pub fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    if app.modals.delete_confirmation.is_some() {
        return vec!["↑/↓: Choose".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()];
    }
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", key(&kb.help))],
        Mode::Login => vec!["Enter: Log in".to_string(), "Esc: Cancel".to_string()],
        Mode::Form => vec![
            format!("{}: Save", key(&kb.save)),
            "Tab/Shift+Tab: Switch field".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::View => {
            let mut hints = vec![format!("{}: Quit", key(&kb.quit))];
            if app.session.is_admin() {
                hints.push(format!("{}: New", key(&kb.new)));
                hints.push(format!("{}: Edit", key(&kb.edit)));
                hints.push(format!("{}: Delete", key(&kb.delete)));
                hints.push(format!("{}: Logout", key(&kb.login)));
            } else {
                hints.push(format!("{}: Login", key(&kb.login)));
            }
            hints.push(format!("{}: Help", key(&kb.help)));
            hints
        }
    }
}
