use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::{InvalidDate, Record};
use crate::utils::{format_date, parse_stored_date};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiaryEntry {
    pub id: usize, // Position in file order, not persisted
    pub date: NaiveDate,
    pub content: String,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub id: usize, // Position in file order, not persisted
    pub date: NaiveDate,
    pub content: String,
}

/// A diary entry that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiaryEntry {
    pub date: NaiveDate,
    pub content: String,
    pub photo_path: Option<String>,
}

/// An announcement that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnnouncement {
    pub date: NaiveDate,
    pub content: String,
}

impl DiaryEntry {
    /// Stored in place of blank diary text
    pub const PLACEHOLDER_CONTENT: &'static str = "No notes for today.";
}

impl NewDiaryEntry {
    pub fn new(date: NaiveDate, content: impl Into<String>) -> Self {
        let content = content.into();
        let content = if content.trim().is_empty() {
            DiaryEntry::PLACEHOLDER_CONTENT.to_string()
        } else {
            content
        };
        Self {
            date,
            content,
            photo_path: None,
        }
    }

    pub fn with_photo(mut self, photo_path: Option<String>) -> Self {
        self.photo_path = photo_path;
        self
    }
}

impl NewAnnouncement {
    pub fn new(date: NaiveDate, content: impl Into<String>) -> Self {
        Self {
            date,
            content: content.into(),
        }
    }
}

/// Persisted diary row: `date,content,photo_path`
#[derive(Debug, Serialize, Deserialize)]
pub struct DiaryRow {
    date: String,
    content: String,
    #[serde(default)]
    photo_path: Option<String>,
}

/// Persisted announcement row: `date,content`
#[derive(Debug, Serialize, Deserialize)]
pub struct AnnouncementRow {
    date: String,
    content: String,
}

fn stored_date(value: String) -> Result<NaiveDate, InvalidDate> {
    parse_stored_date(&value).ok_or(InvalidDate(value))
}

impl Record for DiaryEntry {
    type Draft = NewDiaryEntry;
    type Row = DiaryRow;

    const KIND: &'static str = "diary entry";
    const HEADERS: &'static [&'static str] = &["date", "content", "photo_path"];

    fn id(&self) -> usize {
        self.id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn revise(&mut self, date: NaiveDate, content: String) {
        self.date = date;
        self.content = content;
    }

    fn to_row(&self) -> DiaryRow {
        DiaryRow {
            date: format_date(self.date),
            content: self.content.clone(),
            photo_path: self.photo_path.clone(),
        }
    }

    fn draft_row(draft: &NewDiaryEntry) -> DiaryRow {
        DiaryRow {
            date: format_date(draft.date),
            content: draft.content.clone(),
            photo_path: draft.photo_path.clone(),
        }
    }

    fn from_row(id: usize, row: DiaryRow) -> Result<Self, InvalidDate> {
        Ok(Self {
            id,
            date: stored_date(row.date)?,
            content: row.content,
            photo_path: row.photo_path.filter(|p| !p.is_empty()),
        })
    }
}

impl Record for Announcement {
    type Draft = NewAnnouncement;
    type Row = AnnouncementRow;

    const KIND: &'static str = "announcement";
    const HEADERS: &'static [&'static str] = &["date", "content"];

    fn id(&self) -> usize {
        self.id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn revise(&mut self, date: NaiveDate, content: String) {
        self.date = date;
        self.content = content;
    }

    fn to_row(&self) -> AnnouncementRow {
        AnnouncementRow {
            date: format_date(self.date),
            content: self.content.clone(),
        }
    }

    fn draft_row(draft: &NewAnnouncement) -> AnnouncementRow {
        AnnouncementRow {
            date: format_date(draft.date),
            content: draft.content.clone(),
        }
    }

    fn from_row(id: usize, row: AnnouncementRow) -> Result<Self, InvalidDate> {
        Ok(Self {
            id,
            date: stored_date(row.date)?,
            content: row.content,
        })
    }
}
