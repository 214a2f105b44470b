use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size as terminal_size, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;

use crate::tui::app::{App, Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::confirm_delete::DELETE_OPTIONS;
use crate::tui::widgets::form::content_viewport_height;
use crate::utils::{has_primary_modifier, parse_key_binding, ParsedKeyBinding};

/// Guard that ensures terminal state is restored even on panic.
/// A terminal left in raw mode or on the alternate screen is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore terminal state on normal exit; the guard does nothing on drop afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already on a cleanup path, errors are ignored
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;
    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);
        let layout = Layout::calculate(terminal_rect, app.config.sidebar_width_percent);

        // Keep the content editor's cursor in view before drawing
        if let Some(ref mut form) = app.form.form {
            let viewport_height = content_viewport_height(layout.main_area, form);
            form.content.update_scroll(viewport_height);
        }

        terminal.draw(|f| crate::tui::render::render(f, &mut app, &layout))?;

        // Only Press events, so Windows does not double-process Release
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    Ok(())
}

/// Returns true when the user asked to quit
fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if app.modals.delete_confirmation.is_some() {
        return handle_delete_confirmation_modal(app, key_event);
    }

    match app.ui.mode {
        Mode::Form => handle_form_mode(app, key_event),
        Mode::Login => handle_login_mode(app, key_event),
        Mode::Help => handle_help_mode(app, key_event),
        Mode::View => handle_global_key_bindings(app, key_event),
    }
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let last = DELETE_OPTIONS.len() - 1;
    match key_event.code {
        KeyCode::Up => {
            app.modals.delete_modal_selection = if app.modals.delete_modal_selection == 0 {
                last
            } else {
                app.modals.delete_modal_selection - 1
            };
        }
        KeyCode::Down => {
            app.modals.delete_modal_selection = if app.modals.delete_modal_selection == last {
                0
            } else {
                app.modals.delete_modal_selection + 1
            };
        }
        KeyCode::Enter => {
            if app.modals.delete_modal_selection == 0 {
                app.confirm_delete()?;
            } else {
                app.cancel_delete();
            }
        }
        KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
    Ok(false)
}

fn handle_form_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let save_binding = binding(&app.config.key_bindings.save)?;
    if matches_key_event(key_event, &save_binding) {
        app.save_form()?;
        return Ok(false);
    }

    match key_event.code {
        KeyCode::Esc => app.exit_form_mode(),
        KeyCode::Tab => app.navigate_form_field(true),
        KeyCode::BackTab => app.navigate_form_field(false),
        KeyCode::Enter => {
            if app.is_content_field_active() {
                if let Some(editor) = app.get_current_form_editor() {
                    editor.insert_newline();
                }
            } else {
                app.navigate_form_field(true);
            }
        }
        code => {
            if let Some(editor) = app.get_current_form_editor() {
                match code {
                    KeyCode::Char(ch) if !has_primary_modifier(key_event.modifiers) => editor.insert_char(ch),
                    KeyCode::Backspace => editor.delete_char(),
                    KeyCode::Left => editor.move_cursor_left(),
                    KeyCode::Right => editor.move_cursor_right(),
                    KeyCode::Up => editor.move_cursor_up(),
                    KeyCode::Down => editor.move_cursor_down(),
                    KeyCode::Home => editor.move_cursor_home(),
                    KeyCode::End => editor.move_cursor_end(),
                    _ => {}
                }
            }
        }
    }
    Ok(false)
}

fn handle_login_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Enter => app.submit_login(),
        KeyCode::Esc => app.cancel_login(),
        KeyCode::Backspace => {
            app.login.input.pop();
        }
        KeyCode::Char(ch) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.login.input.push(ch);
        }
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let help_binding = binding(&app.config.key_bindings.help)?;
    if key_event.code == KeyCode::Esc || matches_key_event(key_event, &help_binding) {
        app.exit_help_mode();
    }
    Ok(false)
}

fn handle_global_key_bindings(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();

    if matches_key_event(key_event, &binding(&kb.quit)?) {
        return Ok(true);
    }
    if matches_key_event(key_event, &binding(&kb.help)?) {
        app.enter_help_mode();
    } else if matches_key_event(key_event, &binding(&kb.login)?) {
        app.toggle_login();
    } else if matches_key_event(key_event, &binding(&kb.new)?) {
        app.enter_create_mode();
    } else if matches_key_event(key_event, &binding(&kb.edit)?) {
        app.enter_edit_mode();
    } else if matches_key_event(key_event, &binding(&kb.delete)?) {
        app.request_delete();
    } else if matches_key_event(key_event, &binding(&kb.tab_left)?)
        || matches_key_event(key_event, &binding(&kb.tab_1)?)
    {
        app.switch_tab(Tab::Diary);
    } else if matches_key_event(key_event, &binding(&kb.tab_right)?)
        || matches_key_event(key_event, &binding(&kb.tab_2)?)
    {
        app.switch_tab(Tab::Notices);
    } else if key_event.code == KeyCode::Up || matches_key_event(key_event, &binding(&kb.list_up)?) {
        app.move_selection_up();
    } else if key_event.code == KeyCode::Down || matches_key_event(key_event, &binding(&kb.list_down)?) {
        app.move_selection_down();
    } else if key_event.code == KeyCode::PageUp {
        app.scroll_item_view_up();
    } else if key_event.code == KeyCode::PageDown {
        app.scroll_item_view_down();
    }
    Ok(false)
}

fn binding(key_str: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(key_str).map_err(TuiError::KeyBindingError)
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    // Primary modifier is Ctrl on Windows/Linux, Option/Alt on macOS
    binding.requires_ctrl == has_primary_modifier(key_event.modifiers) && binding.key_code == key_event.code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Config};
    use tempfile::TempDir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(dir: &TempDir) -> App {
        let config = Config {
            data_dir: dir.path().to_string_lossy().into_owned(),
            admin_password: "gamu".to_string(),
            ..Config::default()
        };
        let board = Board::open(&config).unwrap();
        App::new(config, board).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            handle_key_event(app, press(KeyCode::Char(ch))).unwrap();
        }
    }

    #[test]
    fn keyboard_flow_posts_a_notice() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        handle_key_event(&mut app, press(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.ui.mode, Mode::Login);
        type_text(&mut app, "gamu");
        handle_key_event(&mut app, press(KeyCode::Enter)).unwrap();
        assert!(app.session.is_admin());

        handle_key_event(&mut app, press(KeyCode::Char('2'))).unwrap();
        handle_key_event(&mut app, press(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.ui.mode, Mode::Form);
        handle_key_event(&mut app, press(KeyCode::Tab)).unwrap();
        type_text(&mut app, "quiet day");
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();

        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.notices.len(), 1);
        assert_eq!(app.notices[0].content, "quiet day");
    }

    #[test]
    fn quit_key_only_quits_from_view_mode() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        app.toggle_login();
        assert!(!handle_key_event(&mut app, press(KeyCode::Char('q'))).unwrap());
        assert_eq!(app.login.input, "q");

        handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert!(handle_key_event(&mut app, press(KeyCode::Char('q'))).unwrap());
    }

    #[test]
    fn escape_cancels_the_delete_modal() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.toggle_login();
        app.login.input = "gamu".to_string();
        app.submit_login();
        let session = app.session.clone();
        app.board
            .post_announcement(&session, chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "x".to_string())
            .unwrap();
        app.load_data().unwrap();
        app.switch_tab(Tab::Notices);

        handle_key_event(&mut app, press(KeyCode::Char('d'))).unwrap();
        assert!(app.modals.delete_confirmation.is_some());
        handle_key_event(&mut app, press(KeyCode::Esc)).unwrap();

        assert!(app.modals.delete_confirmation.is_none());
        assert_eq!(app.notices.len(), 1);
    }
}
