//! The diary and notice board: both record stores and the photo store behind
//! one admin-gated API. Presentation layers talk to this and nothing below it.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::Config;
use crate::models::{Announcement, DiaryEntry, NewAnnouncement, NewDiaryEntry};
use crate::photo::{PhotoError, PhotoStore, PhotoUpload};
use crate::session::{AuthError, EditState, EditTarget, Session};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    #[error("Announcement text cannot be empty")]
    EmptyContent,
    #[error("Nothing is open for editing")]
    NothingToEdit,
}

/// Acknowledgment of a completed change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub message: String,
    /// Non-fatal problems, such as a photo saved without orientation fix
    pub warnings: Vec<String>,
}

impl Ack {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            warnings: Vec::new(),
        }
    }
}

/// A diary entry as submitted from a form
#[derive(Debug, Clone)]
pub struct DiaryDraft {
    pub date: NaiveDate,
    pub content: String,
    pub photo: Option<PhotoUpload>,
}

#[derive(Debug)]
pub struct Board {
    diary: RecordStore<DiaryEntry>,
    notices: RecordStore<Announcement>,
    photos: PhotoStore,
}

impl Board {
    /// Open the board at the locations named in the config
    pub fn open(config: &Config) -> Result<Self, BoardError> {
        Self::open_at(
            config.diary_path(),
            config.notices_path(),
            config.photo_dir_path(),
        )
    }

    pub fn open_at(
        diary_path: impl Into<PathBuf>,
        notices_path: impl Into<PathBuf>,
        photo_dir: impl Into<PathBuf>,
    ) -> Result<Self, BoardError> {
        Ok(Self {
            diary: RecordStore::open(diary_path)?,
            notices: RecordStore::open(notices_path)?,
            photos: PhotoStore::open(photo_dir)?,
        })
    }

    /// Diary entries in file order
    pub fn diary_entries(&self) -> Result<Vec<DiaryEntry>, StoreError> {
        self.diary.load_all()
    }

    /// Announcements in file order
    pub fn announcements(&self) -> Result<Vec<Announcement>, StoreError> {
        self.notices.load_all()
    }

    pub fn post_diary(&self, session: &Session, draft: DiaryDraft) -> Result<Ack, BoardError> {
        session.require_admin()?;

        let mut ack = Ack::new("Diary entry saved");
        let stored = self.photos.ingest(draft.photo.as_ref(), draft.date)?;
        let photo_path = stored.map(|photo| {
            ack.warnings.extend(photo.warning);
            photo.path.to_string_lossy().into_owned()
        });

        let entry = NewDiaryEntry::new(draft.date, draft.content).with_photo(photo_path);
        self.diary.append(&entry)?;
        Ok(ack)
    }

    pub fn post_announcement(
        &self,
        session: &Session,
        date: NaiveDate,
        content: String,
    ) -> Result<Ack, BoardError> {
        session.require_admin()?;
        if content.trim().is_empty() {
            return Err(BoardError::EmptyContent);
        }

        self.notices.append(&NewAnnouncement::new(date, content))?;
        Ok(Ack::new("Announcement posted"))
    }

    /// Open a record for editing and return what it resolved to
    pub fn open_edit(&self, session: &mut Session, target: EditTarget) -> Result<EditState, BoardError> {
        session.begin_edit(target)?;
        Ok(self.current_edit(session)?)
    }

    /// Resolve the session's edit cursor against the current files
    pub fn current_edit(&self, session: &mut Session) -> Result<EditState, StoreError> {
        if session.edit_cursor().is_none() {
            return Ok(EditState::Idle);
        }
        let diary = self.diary.load_all()?;
        let notices = self.notices.load_all()?;
        Ok(session.resolve(&diary, &notices))
    }

    /// Save new date and content for the record open for editing and close the edit
    pub fn save_edit(
        &self,
        session: &mut Session,
        date: NaiveDate,
        content: String,
    ) -> Result<Ack, BoardError> {
        session.require_admin()?;

        let ack = match self.current_edit(session)? {
            EditState::Idle => return Err(BoardError::NothingToEdit),
            EditState::Diary(entry) => {
                self.diary.update(entry.id, date, content)?;
                Ack::new("Diary entry updated")
            }
            EditState::Announcement(notice) => {
                if content.trim().is_empty() {
                    return Err(BoardError::EmptyContent);
                }
                self.notices.update(notice.id, date, content)?;
                Ack::new("Announcement updated")
            }
        };

        session.finish_edit();
        Ok(ack)
    }

    /// Delete a record. Deleting something that is not there succeeds without effect.
    pub fn delete(&self, session: &mut Session, target: EditTarget) -> Result<Ack, BoardError> {
        session.require_admin()?;

        let (removed, kind) = match target {
            EditTarget::Diary(id) => (self.diary.delete(id)?, "Diary entry"),
            EditTarget::Announcement(id) => (self.notices.delete(id)?, "Announcement"),
        };

        if !removed {
            return Ok(Ack::new(format!("{} not found, nothing to delete", kind)));
        }

        // Positions in that store shifted, so an open edit there may now point at the wrong row
        if session.edit_cursor().is_some_and(|cursor| cursor.same_store(target)) {
            session.cancel_edit();
        }
        Ok(Ack::new(format!("{} deleted", kind)))
    }
}
