use ratatui::widgets::ListState;
use std::cmp;
use std::path::Path;
use std::time::Instant;

use crate::board::{Ack, Board, BoardError, DiaryDraft};
use crate::models::{Announcement, DiaryEntry};
use crate::photo::PhotoUpload;
use crate::projection::newest_first;
use crate::session::{AdminSecret, EditState, EditTarget, Session};
use crate::store::StoreError;
use crate::tui::widgets::editor::Editor;
use crate::utils::{format_date, parse_date, today};
use crate::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Diary,
    Notices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Help,
    Form,
    Login,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Date,
    Content,
    Photo,
}

/// What saving the form will do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    NewDiary,
    NewNotice,
    Edit(EditTarget),
}

#[derive(Debug, Clone)]
pub struct RecordForm {
    pub kind: FormKind,
    pub current_field: FormField,
    pub date: Editor,
    pub content: Editor,
    pub photo: Editor, // Only shown for new diary entries
}

impl RecordForm {
    fn new(kind: FormKind, date: &str, content: &str) -> Self {
        Self {
            kind,
            current_field: FormField::Date,
            date: Editor::from_string(date),
            content: Editor::from_string(content),
            photo: Editor::new(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::NewDiary => "New Diary Entry",
            FormKind::NewNotice => "New Announcement",
            FormKind::Edit(EditTarget::Diary(_)) => "Edit Diary Entry",
            FormKind::Edit(EditTarget::Announcement(_)) => "Edit Announcement",
        }
    }

    /// Fields in tab order
    pub fn fields(&self) -> &'static [FormField] {
        match self.kind {
            FormKind::NewDiary => &[FormField::Date, FormField::Content, FormField::Photo],
            _ => &[FormField::Date, FormField::Content],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedItem {
    Diary(DiaryEntry),
    Notice(Announcement),
}

impl SelectedItem {
    pub fn target(&self) -> EditTarget {
        match self {
            SelectedItem::Diary(entry) => EditTarget::Diary(entry.id),
            SelectedItem::Notice(notice) => EditTarget::Announcement(notice.id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
    pub mode: Mode,
    pub selected_index: usize,
    pub list_state: ListState,
    pub item_view_scroll: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            current_tab: Tab::Diary,
            mode: Mode::View,
            selected_index: 0,
            list_state: ListState::default(),
            item_view_scroll: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    pub delete_confirmation: Option<SelectedItem>,
    pub delete_modal_selection: usize, // 0 = Delete, 1 = Cancel
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub form: Option<RecordForm>,
}

#[derive(Debug, Clone, Default)]
pub struct LoginState {
    pub input: String,
}

pub struct App {
    pub config: Config,
    pub board: Board,
    pub session: Session,
    secret: AdminSecret,

    // Newest first, as displayed
    pub diary: Vec<DiaryEntry>,
    pub notices: Vec<Announcement>,

    pub ui: UiState,
    pub modals: ModalState,
    pub status: StatusState,
    pub form: FormState,
    pub login: LoginState,
}

impl App {
    pub fn new(config: Config, board: Board) -> Result<Self, StoreError> {
        let secret = config.admin_secret();
        let mut app = Self {
            config,
            board,
            session: Session::new(),
            secret,
            diary: Vec::new(),
            notices: Vec::new(),
            ui: UiState::default(),
            modals: ModalState::default(),
            status: StatusState::default(),
            form: FormState::default(),
            login: LoginState::default(),
        };
        app.load_data()?;
        Ok(app)
    }

    /// Reload both files. An open edit form is re-resolved and closed if its
    /// record is gone.
    pub fn load_data(&mut self) -> Result<(), StoreError> {
        self.diary = newest_first(&self.board.diary_entries()?);
        self.notices = newest_first(&self.board.announcements()?);
        self.adjust_selected_index();

        let editing = matches!(
            self.form.form.as_ref().map(|f| f.kind),
            Some(FormKind::Edit(_))
        );
        if editing && self.board.current_edit(&mut self.session)?.is_idle() {
            self.form.form = None;
            self.ui.mode = Mode::View;
            self.set_status_message("The record being edited no longer exists".to_string());
        }
        Ok(())
    }

    pub fn current_len(&self) -> usize {
        match self.ui.current_tab {
            Tab::Diary => self.diary.len(),
            Tab::Notices => self.notices.len(),
        }
    }

    pub fn selected_item(&self) -> Option<SelectedItem> {
        match self.ui.current_tab {
            Tab::Diary => self
                .diary
                .get(self.ui.selected_index)
                .cloned()
                .map(SelectedItem::Diary),
            Tab::Notices => self
                .notices
                .get(self.ui.selected_index)
                .cloned()
                .map(SelectedItem::Notice),
        }
    }

    pub fn adjust_selected_index(&mut self) {
        let len = self.current_len();
        self.ui.selected_index = cmp::min(self.ui.selected_index, len.saturating_sub(1));
        self.sync_list_state();
    }

    /// Sync ListState with selected_index for proper scrolling
    pub fn sync_list_state(&mut self) {
        if self.current_len() == 0 {
            self.ui.list_state.select(None);
        } else {
            self.ui.list_state.select(Some(self.ui.selected_index));
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.ui.selected_index > 0 {
            self.ui.selected_index -= 1;
            self.ui.item_view_scroll = 0;
            self.sync_list_state();
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.ui.selected_index + 1 < self.current_len() {
            self.ui.selected_index += 1;
            self.ui.item_view_scroll = 0;
            self.sync_list_state();
        }
    }

    pub fn switch_tab(&mut self, new_tab: Tab) {
        if self.ui.current_tab != new_tab {
            self.ui.current_tab = new_tab;
            self.ui.selected_index = 0;
            self.ui.item_view_scroll = 0;
            self.sync_list_state();
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Clear the status message once it is older than the configured timeout
    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= self.config.status_timeout_secs {
                self.clear_status_message();
            }
        }
    }

    fn show_ack(&mut self, ack: Ack) {
        let mut message = ack.message;
        for warning in ack.warnings {
            message.push_str(" (warning: ");
            message.push_str(&warning);
            message.push(')');
        }
        self.set_status_message(message);
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    /// Open the password prompt, or log out when already logged in
    pub fn toggle_login(&mut self) {
        if self.session.is_admin() {
            self.session.logout();
            self.form.form = None;
            self.ui.mode = Mode::View;
            self.set_status_message("Logged out".to_string());
        } else {
            self.login.input.clear();
            self.ui.mode = Mode::Login;
        }
    }

    pub fn submit_login(&mut self) {
        let attempt = std::mem::take(&mut self.login.input);
        match self.session.login(&attempt, &self.secret) {
            Ok(()) => {
                self.ui.mode = Mode::View;
                self.set_status_message("Logged in as admin".to_string());
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    pub fn cancel_login(&mut self) {
        self.login.input.clear();
        self.ui.mode = Mode::View;
    }

    pub fn enter_create_mode(&mut self) {
        if let Err(e) = self.session.require_admin() {
            self.set_status_message(e.to_string());
            return;
        }
        let kind = match self.ui.current_tab {
            Tab::Diary => FormKind::NewDiary,
            Tab::Notices => FormKind::NewNotice,
        };
        self.form.form = Some(RecordForm::new(kind, &format_date(today()), ""));
        self.ui.mode = Mode::Form;
    }

    /// Open the selected record in the form, pre-filled from the edit cursor
    pub fn enter_edit_mode(&mut self) {
        let Some(item) = self.selected_item() else {
            self.set_status_message("No item selected".to_string());
            return;
        };

        let target = item.target();
        let (date, content) = match self.board.open_edit(&mut self.session, target) {
            Ok(EditState::Diary(entry)) => (entry.date, entry.content),
            Ok(EditState::Announcement(notice)) => (notice.date, notice.content),
            Ok(EditState::Idle) => {
                self.set_status_message("The selected record no longer exists".to_string());
                return;
            }
            Err(e) => {
                self.set_status_message(e.to_string());
                return;
            }
        };

        self.form.form = Some(RecordForm::new(
            FormKind::Edit(target),
            &format_date(date),
            &content,
        ));
        self.ui.mode = Mode::Form;
    }

    pub fn exit_form_mode(&mut self) {
        if let Some(FormKind::Edit(_)) = self.form.form.as_ref().map(|f| f.kind) {
            self.session.cancel_edit();
        }
        self.form.form = None;
        self.ui.mode = Mode::View;
    }

    pub fn navigate_form_field(&mut self, forward: bool) {
        if let Some(ref mut form) = self.form.form {
            let fields = form.fields();
            let pos = fields
                .iter()
                .position(|f| *f == form.current_field)
                .unwrap_or(0);
            let next = if forward {
                (pos + 1) % fields.len()
            } else {
                (pos + fields.len() - 1) % fields.len()
            };
            form.current_field = fields[next];
        }
    }

    pub fn get_current_form_editor(&mut self) -> Option<&mut Editor> {
        self.form.form.as_mut().map(|form| match form.current_field {
            FormField::Date => &mut form.date,
            FormField::Content => &mut form.content,
            FormField::Photo => &mut form.photo,
        })
    }

    pub fn is_content_field_active(&self) -> bool {
        self.form
            .form
            .as_ref()
            .is_some_and(|f| f.current_field == FormField::Content)
    }

    /// Submit the open form. Validation and board failures become status
    /// messages; only reload failures are returned.
    pub fn save_form(&mut self) -> Result<(), StoreError> {
        let Some(form) = self.form.form.clone() else {
            return Ok(());
        };

        let date_text = form.date.to_string();
        let date = match parse_date(&date_text) {
            Ok(date) => date,
            Err(_) => {
                self.set_status_message("Date must be in YYYY-MM-DD format".to_string());
                return Ok(());
            }
        };
        let content = form.content.to_string();

        let result = match form.kind {
            FormKind::NewDiary => {
                let photo_path = form.photo.to_string();
                let photo_path = photo_path.trim();
                let photo = if photo_path.is_empty() {
                    None
                } else {
                    match PhotoUpload::from_path(Path::new(photo_path)) {
                        Ok(upload) => Some(upload),
                        Err(e) => {
                            self.set_status_message(format!("Cannot read photo {}: {}", photo_path, e));
                            return Ok(());
                        }
                    }
                };
                self.board
                    .post_diary(&self.session, DiaryDraft { date, content, photo })
            }
            FormKind::NewNotice => self.board.post_announcement(&self.session, date, content),
            FormKind::Edit(_) => self.board.save_edit(&mut self.session, date, content),
        };

        match result {
            Ok(ack) => {
                self.form.form = None;
                self.ui.mode = Mode::View;
                self.show_ack(ack);
                self.load_data()?;
            }
            Err(BoardError::NothingToEdit) => {
                self.form.form = None;
                self.ui.mode = Mode::View;
                self.set_status_message("The record being edited no longer exists".to_string());
                self.load_data()?;
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
        Ok(())
    }

    pub fn request_delete(&mut self) {
        if let Err(e) = self.session.require_admin() {
            self.set_status_message(e.to_string());
            return;
        }
        match self.selected_item() {
            Some(item) => {
                self.modals.delete_confirmation = Some(item);
                self.modals.delete_modal_selection = 0;
            }
            None => self.set_status_message("No item selected".to_string()),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.modals.delete_confirmation = None;
    }

    pub fn confirm_delete(&mut self) -> Result<(), StoreError> {
        let Some(item) = self.modals.delete_confirmation.take() else {
            return Ok(());
        };
        match self.board.delete(&mut self.session, item.target()) {
            Ok(ack) => {
                self.show_ack(ack);
                self.load_data()?;
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
        Ok(())
    }

    pub fn scroll_item_view_up(&mut self) {
        self.ui.item_view_scroll = self.ui.item_view_scroll.saturating_sub(1);
    }

    /// Render clamps the offset to the content height
    pub fn scroll_item_view_down(&mut self) {
        self.ui.item_view_scroll += 1;
    }
}
