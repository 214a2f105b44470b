//! Display-only views over loaded records. Nothing here changes stored order.

use crate::models::DiaryEntry;
use crate::store::Record;
use crate::utils::format_date;

/// Characters kept in a preview before the ellipsis
pub const PREVIEW_CHARS: usize = 20;

/// Records ordered by date, newest first. Records sharing a date keep their
/// load order.
pub fn newest_first<R: Record>(records: &[R]) -> Vec<R> {
    let mut ordered = records.to_vec();
    ordered.sort_by(|a, b| b.date().cmp(&a.date()));
    ordered
}

/// One-line preview: line breaks become spaces, the first 20 characters are
/// kept and `...` is appended to any non-empty text.
pub fn preview(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let flattened = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let mut preview: String = flattened.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// List label for a diary entry: its date, then a preview when there is text
pub fn diary_title(entry: &DiaryEntry) -> String {
    let date = format_date(entry.date);
    if entry.content.is_empty() {
        date
    } else {
        format!("{} - {}", date, preview(&entry.content))
    }
}
