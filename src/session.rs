//! Per-session state: the admin flag and the record currently open for editing.

use thiserror::Error;

use crate::models::{Announcement, DiaryEntry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Incorrect password")]
    Rejected,
    #[error("No admin password is configured; set admin_password in the config file")]
    NotConfigured,
    #[error("Log in as admin to make changes")]
    NotAuthenticated,
}

/// The shared admin password. Compared in plain text.
#[derive(Clone, Default)]
pub struct AdminSecret(String);

impl AdminSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_configured(&self) -> bool {
        !self.0.is_empty()
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(..)")
    }
}

/// Which record an edit refers to. The tag picks the store, so equal ids in
/// the two stores never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Diary(usize),
    Announcement(usize),
}

impl EditTarget {
    /// Whether both targets address the same store, whatever their ids
    pub fn same_store(self, other: EditTarget) -> bool {
        matches!(
            (self, other),
            (EditTarget::Diary(_), EditTarget::Diary(_))
                | (EditTarget::Announcement(_), EditTarget::Announcement(_))
        )
    }
}

/// What the edit cursor currently resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Diary(DiaryEntry),
    Announcement(Announcement),
}

impl EditState {
    pub fn is_idle(&self) -> bool {
        matches!(self, EditState::Idle)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    authenticated: bool,
    edit_cursor: Option<EditTarget>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_admin(&self) -> bool {
        self.authenticated
    }

    pub fn login(&mut self, attempt: &str, secret: &AdminSecret) -> Result<(), AuthError> {
        if !secret.is_configured() {
            return Err(AuthError::NotConfigured);
        }
        if attempt != secret.0 {
            tracing::info!("admin login rejected");
            return Err(AuthError::Rejected);
        }
        self.authenticated = true;
        tracing::info!("admin logged in");
        Ok(())
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
        self.edit_cursor = None;
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated)
        }
    }

    pub fn edit_cursor(&self) -> Option<EditTarget> {
        self.edit_cursor
    }

    /// Open a record for editing, replacing any edit already open
    pub fn begin_edit(&mut self, target: EditTarget) -> Result<(), AuthError> {
        self.require_admin()?;
        self.edit_cursor = Some(target);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.edit_cursor = None;
    }

    /// Clear the cursor after the edit was saved
    pub fn finish_edit(&mut self) {
        self.edit_cursor = None;
    }

    /// Resolve the cursor against freshly loaded records.
    ///
    /// Only the store named by the cursor's tag is consulted. A cursor that
    /// matches nothing is cleared before returning `Idle`.
    pub fn resolve(&mut self, diary: &[DiaryEntry], notices: &[Announcement]) -> EditState {
        let state = match self.edit_cursor {
            None => EditState::Idle,
            Some(EditTarget::Diary(id)) => diary
                .iter()
                .find(|entry| entry.id == id)
                .cloned()
                .map_or(EditState::Idle, EditState::Diary),
            Some(EditTarget::Announcement(id)) => notices
                .iter()
                .find(|notice| notice.id == id)
                .cloned()
                .map_or(EditState::Idle, EditState::Announcement),
        };

        if state.is_idle() && self.edit_cursor.is_some() {
            tracing::debug!(cursor = ?self.edit_cursor, "clearing stale edit cursor");
            self.edit_cursor = None;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn diary(ids: &[usize]) -> Vec<DiaryEntry> {
        ids.iter()
            .map(|&id| DiaryEntry {
                id,
                date: date(1),
                content: format!("diary {id}"),
                photo_path: None,
            })
            .collect()
    }

    fn notices(ids: &[usize]) -> Vec<Announcement> {
        ids.iter()
            .map(|&id| Announcement {
                id,
                date: date(2),
                content: format!("notice {id}"),
            })
            .collect()
    }

    fn admin() -> Session {
        let mut session = Session::new();
        session.login("gamu", &AdminSecret::new("gamu")).unwrap();
        session
    }

    #[test]
    fn login_checks_the_secret() {
        let secret = AdminSecret::new("gamu");
        let mut session = Session::new();

        assert_eq!(session.login("wrong", &secret), Err(AuthError::Rejected));
        assert!(!session.is_admin());

        session.login("gamu", &secret).unwrap();
        assert!(session.is_admin());
    }

    #[test]
    fn empty_secret_disables_login() {
        let mut session = Session::new();
        assert_eq!(session.login("", &AdminSecret::default()), Err(AuthError::NotConfigured));
        assert!(!session.is_admin());
    }

    #[test]
    fn editing_requires_admin() {
        let mut session = Session::new();
        assert_eq!(
            session.begin_edit(EditTarget::Diary(0)),
            Err(AuthError::NotAuthenticated)
        );
        assert_eq!(session.edit_cursor(), None);
    }

    #[test]
    fn logout_clears_flag_and_cursor() {
        let mut session = admin();
        session.begin_edit(EditTarget::Announcement(1)).unwrap();

        session.logout();

        assert!(!session.is_admin());
        assert_eq!(session.edit_cursor(), None);
    }

    #[test]
    fn stale_cursor_resolves_to_idle_and_is_cleared() {
        let mut session = admin();
        session.begin_edit(EditTarget::Diary(9)).unwrap();

        let state = session.resolve(&diary(&[0, 1]), &notices(&[0, 1]));

        assert_eq!(state, EditState::Idle);
        assert_eq!(session.edit_cursor(), None);
    }

    #[test]
    fn tagged_cursor_never_crosses_stores() {
        let mut session = admin();
        let diary = diary(&[0, 1, 2]);
        let notices = notices(&[0, 1, 2]);

        session.begin_edit(EditTarget::Announcement(2)).unwrap();
        match session.resolve(&diary, &notices) {
            EditState::Announcement(notice) => assert_eq!(notice.content, "notice 2"),
            other => panic!("expected announcement, got {other:?}"),
        }

        session.begin_edit(EditTarget::Diary(2)).unwrap();
        match session.resolve(&diary, &notices) {
            EditState::Diary(entry) => assert_eq!(entry.content, "diary 2"),
            other => panic!("expected diary entry, got {other:?}"),
        }
    }

    #[test]
    fn cursor_only_matches_its_own_store() {
        let mut session = admin();
        session.begin_edit(EditTarget::Announcement(3)).unwrap();

        // A diary entry with id 3 exists, but no announcement does
        let state = session.resolve(&diary(&[0, 1, 2, 3]), &notices(&[0]));

        assert_eq!(state, EditState::Idle);
        assert_eq!(session.edit_cursor(), None);
    }

    #[test]
    fn cancel_and_finish_return_to_idle() {
        let mut session = admin();
        session.begin_edit(EditTarget::Diary(0)).unwrap();
        session.cancel_edit();
        assert_eq!(session.resolve(&diary(&[0]), &[]), EditState::Idle);

        session.begin_edit(EditTarget::Diary(0)).unwrap();
        session.finish_edit();
        assert_eq!(session.edit_cursor(), None);
    }
}
