//! Flat-file record store.
//!
//! Each store owns one CSV file: a header row followed by one row per record.
//! Records are addressed by a positional id, the 0-based index of the row in
//! file order, which is recomputed on every load and never written to disk.
//! Any append or delete shifts the ids of later rows, so an id is only
//! meaningful against the load it came from.
//!
//! The store assumes a single writer. Updates and deletes are read-modify-write
//! cycles over the whole file with no locking; two racing writers lose one
//! write. Rewrites go through a temp file and a rename so readers never see a
//! half-written file.

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: row {row} {problem}: {value:?}", path.display())]
    DataCorruption {
        path: PathBuf,
        row: usize,
        problem: &'static str,
        value: String,
    },
    #[error("No record with id {0}")]
    RecordNotFound(usize),
    #[error("File system error on {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A stored date column that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDate(pub String);

/// A record kind that can live in a [`RecordStore`]
pub trait Record: Clone {
    /// Fields supplied when creating a record (no id)
    type Draft;
    /// Persisted column layout (no id)
    type Row: Serialize + DeserializeOwned;

    /// Human readable name used in messages
    const KIND: &'static str;
    /// Canonical header row
    const HEADERS: &'static [&'static str];

    fn id(&self) -> usize;
    fn date(&self) -> NaiveDate;
    fn content(&self) -> &str;
    /// Replace the editable fields, leaving every other column as is
    fn revise(&mut self, date: NaiveDate, content: String);
    fn to_row(&self) -> Self::Row;
    fn draft_row(draft: &Self::Draft) -> Self::Row;
    fn from_row(id: usize, row: Self::Row) -> Result<Self, InvalidDate>;
}

pub struct RecordStore<R: Record> {
    path: PathBuf,
    _record: PhantomData<R>,
}

impl<R: Record> std::fmt::Debug for RecordStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("kind", &R::KIND)
            .field("path", &self.path)
            .finish()
    }
}

impl<R: Record> RecordStore<R> {
    /// Open a store, creating its directory and a header-only file if missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            _record: PhantomData,
        };

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| store.fs_error(e))?;
            }
        }

        if !store.path.exists() {
            store.write_all(&[])?;
            tracing::info!(path = %store.path.display(), kind = R::KIND, "created record file");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record in file order, assigning positional ids
    pub fn load_all(&self) -> Result<Vec<R>, StoreError> {
        if !self.has_content()? {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).map_err(|e| self.fs_error(e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        // Columns are matched by position so files with other header names still load
        reader.headers()?;

        let headers = csv::StringRecord::from(R::HEADERS.to_vec());
        let mut records = Vec::new();
        for (row_index, raw) in reader.records().enumerate() {
            let raw = raw?;
            // Short rows are legacy files missing trailing columns; long ones are damage
            if raw.len() > R::HEADERS.len() {
                return Err(StoreError::DataCorruption {
                    path: self.path.clone(),
                    row: row_index,
                    problem: "has more fields than the header",
                    value: raw.iter().collect::<Vec<_>>().join(","),
                });
            }
            let row: R::Row = raw.deserialize(Some(&headers))?;
            let record = R::from_row(row_index, row).map_err(|InvalidDate(value)| {
                StoreError::DataCorruption {
                    path: self.path.clone(),
                    row: row_index,
                    problem: "has an unreadable date",
                    value,
                }
            })?;
            records.push(record);
        }

        tracing::debug!(path = %self.path.display(), count = records.len(), "loaded records");
        Ok(records)
    }

    /// Append one record without touching existing rows
    pub fn append(&self, draft: &R::Draft) -> Result<(), StoreError> {
        let needs_header = !self.has_content()?;
        let needs_newline = !needs_header && !self.ends_with_newline()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.fs_error(e))?;
        if needs_newline {
            file.write_all(b"\n").map_err(|e| self.fs_error(e))?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(R::HEADERS)?;
        }
        writer.serialize(R::draft_row(draft))?;
        writer.flush().map_err(|e| self.fs_error(e))?;

        tracing::info!(path = %self.path.display(), kind = R::KIND, "appended record");
        Ok(())
    }

    /// Change the date and content of the record at `id`, rewriting the file
    pub fn update(&self, id: usize, date: NaiveDate, content: String) -> Result<(), StoreError> {
        let mut records = self.load_all()?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(StoreError::RecordNotFound(id))?;
        record.revise(date, content);

        self.write_all(&records)?;
        tracing::info!(path = %self.path.display(), kind = R::KIND, id, "updated record");
        Ok(())
    }

    /// Remove the record at `id`. Returns false, without touching the file,
    /// when no record has that id.
    pub fn delete(&self, id: usize) -> Result<bool, StoreError> {
        let records = self.load_all()?;
        let before = records.len();
        let remaining: Vec<R> = records.into_iter().filter(|r| r.id() != id).collect();

        if remaining.len() == before {
            tracing::debug!(path = %self.path.display(), id, "delete matched no record");
            return Ok(false);
        }

        self.write_all(&remaining)?;
        tracing::info!(path = %self.path.display(), kind = R::KIND, id, "deleted record");
        Ok(true)
    }

    fn has_content(&self) -> Result<bool, StoreError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.fs_error(e)),
        }
    }

    /// Whether the last byte of a non-empty file is a line break
    fn ends_with_newline(&self) -> Result<bool, StoreError> {
        let mut file = File::open(&self.path).map_err(|e| self.fs_error(e))?;
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .and_then(|_| file.read_exact(&mut last))
            .map_err(|e| self.fs_error(e))?;
        Ok(last[0] == b'\n')
    }

    /// Write header and rows to a temp file next to the target, then rename over it
    fn write_all(&self, records: &[R]) -> Result<(), StoreError> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records.csv".to_string());
        let temp_path = self
            .path
            .with_file_name(format!("{}.tmp.{}", file_name, std::process::id()));

        let result = self.write_temp(&temp_path, records).and_then(|()| {
            fs::rename(&temp_path, &self.path).map_err(|e| self.fs_error(e))
        });

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    fn write_temp(&self, temp_path: &Path, records: &[R]) -> Result<(), StoreError> {
        let file = File::create(temp_path).map_err(|e| StoreError::FileSystem {
            path: temp_path.to_path_buf(),
            source: e,
        })?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(R::HEADERS)?;
        for record in records {
            writer.serialize(record.to_row())?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| self.fs_error(e.into_error()))?;
        file.sync_all().map_err(|e| self.fs_error(e))?;
        Ok(())
    }

    fn fs_error(&self, source: io::Error) -> StoreError {
        StoreError::FileSystem {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Announcement, DiaryEntry, NewAnnouncement, NewDiaryEntry};
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn diary_store(dir: &TempDir) -> RecordStore<DiaryEntry> {
        RecordStore::open(dir.path().join("diary.csv")).unwrap()
    }

    fn notice_store(dir: &TempDir) -> RecordStore<Announcement> {
        RecordStore::open(dir.path().join("notices.csv")).unwrap()
    }

    #[test]
    fn open_creates_header_only_file() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::<DiaryEntry>::open(dir.path().join("nested/diary.csv")).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "date,content,photo_path\n");
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn missing_or_empty_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = diary_store(&dir);

        fs::write(store.path(), "").unwrap();
        assert!(store.load_all().unwrap().is_empty());

        fs::remove_file(store.path()).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn append_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = diary_store(&dir);

        store.append(&NewDiaryEntry::new(date(2024, 1, 10), "hello")).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(
            records,
            vec![DiaryEntry {
                id: 0,
                date: date(2024, 1, 10),
                content: "hello".to_string(),
                photo_path: None,
            }]
        );
    }

    #[test]
    fn append_to_empty_file_writes_header_first() {
        let dir = TempDir::new().unwrap();
        let store = notice_store(&dir);
        fs::write(store.path(), "").unwrap();

        store.append(&NewAnnouncement::new(date(2024, 5, 1), "vet visit")).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "date,content\n2024-05-01,vet visit\n");
    }

    #[test]
    fn ids_are_reassigned_after_delete() {
        let dir = TempDir::new().unwrap();
        let store = notice_store(&dir);
        store.append(&NewAnnouncement::new(date(2024, 1, 1), "first")).unwrap();
        store.append(&NewAnnouncement::new(date(2024, 1, 2), "second")).unwrap();

        assert!(store.delete(0).unwrap());

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].content, "second");
    }

    #[test]
    fn update_keeps_photo_path() {
        let dir = TempDir::new().unwrap();
        let store = diary_store(&dir);
        let draft = NewDiaryEntry::new(date(2024, 2, 1), "before")
            .with_photo(Some("photos/2024-02-01_gamu.jpg".to_string()));
        store.append(&draft).unwrap();

        store.update(0, date(2024, 2, 1), "after".to_string()).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records[0].content, "after");
        assert_eq!(records[0].photo_path.as_deref(), Some("photos/2024-02-01_gamu.jpg"));
    }

    #[test]
    fn update_of_missing_id_is_not_found_and_leaves_file() {
        let dir = TempDir::new().unwrap();
        let store = notice_store(&dir);
        store.append(&NewAnnouncement::new(date(2024, 1, 1), "only")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.update(7, date(2024, 1, 1), "nope".to_string()).unwrap_err();

        assert!(matches!(err, StoreError::RecordNotFound(7)));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn delete_of_missing_id_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let store = diary_store(&dir);
        for day in 1..=3 {
            store.append(&NewDiaryEntry::new(date(2024, 1, day), "entry")).unwrap();
        }

        assert!(!store.delete(42).unwrap());
        assert_eq!(store.load_all().unwrap().len(), 3);
    }

    #[test]
    fn unparsable_date_is_data_corruption() {
        let dir = TempDir::new().unwrap();
        let store = notice_store(&dir);
        fs::write(store.path(), "date,content\n2024-01-01,ok\nyesterday,broken\n").unwrap();

        match store.load_all().unwrap_err() {
            StoreError::DataCorruption { row, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected DataCorruption, got {other:?}"),
        }
    }

    #[test]
    fn multiline_content_round_trips_through_rewrite() {
        let dir = TempDir::new().unwrap();
        let store = diary_store(&dir);
        let text = "ran on the wheel,\nthen \"slept\"\nall day";
        store.append(&NewDiaryEntry::new(date(2024, 1, 1), "x")).unwrap();

        store.update(0, date(2024, 1, 2), text.to_string()).unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records[0].content, text);
        assert_eq!(records[0].date, date(2024, 1, 2));
    }

    #[test]
    fn rewrite_never_persists_id_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = notice_store(&dir);
        store.append(&NewAnnouncement::new(date(2024, 1, 1), "a")).unwrap();
        store.append(&NewAnnouncement::new(date(2024, 1, 2), "b")).unwrap();

        store.update(1, date(2024, 1, 3), "b2".to_string()).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "date,content\n2024-01-01,a\n2024-01-03,b2\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn legacy_headers_and_short_rows_load_by_position() {
        let dir = TempDir::new().unwrap();
        let store = diary_store(&dir);
        fs::write(
            store.path(),
            "日付,内容,画像パス\n2023-12-24,ケージ掃除,photos/a.jpg\n2023-12-25 00:00:00,ひまわりの種\n",
        )
        .unwrap();

        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].photo_path.as_deref(), Some("photos/a.jpg"));
        assert_eq!(records[1].date, date(2023, 12, 25));
        assert_eq!(records[1].photo_path, None);
    }

    #[test]
    fn append_after_unterminated_last_row_starts_a_new_line() {
        let dir = TempDir::new().unwrap();
        let store = notice_store(&dir);
        fs::write(store.path(), "date,content\n2024-01-01,a").unwrap();

        store.append(&NewAnnouncement::new(date(2024, 1, 2), "b")).unwrap();

        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "date,content\n2024-01-01,a\n2024-01-02,b\n"
        );
        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "a");
        assert_eq!(records[1].content, "b");
    }

    #[test]
    fn rows_with_extra_fields_are_data_corruption() {
        let dir = TempDir::new().unwrap();
        let store = notice_store(&dir);
        fs::write(store.path(), "date,content\n2024-01-01,a\n2024-01-02,b,c\n").unwrap();

        match store.load_all().unwrap_err() {
            StoreError::DataCorruption { row, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(value, "2024-01-02,b,c");
            }
            other => panic!("expected DataCorruption, got {other:?}"),
        }
    }
}
