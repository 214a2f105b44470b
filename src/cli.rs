use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

use crate::board::{Ack, Board, BoardError, DiaryDraft};
use crate::models::{Announcement, DiaryEntry};
use crate::photo::PhotoUpload;
use crate::projection::{newest_first, preview};
use crate::session::{AdminSecret, AuthError, EditState, EditTarget, Session};
use crate::store::StoreError;
use crate::utils::{format_date, parse_date, today};

#[derive(Parser)]
#[command(name = "petlog")]
#[command(about = "Pet diary and announcement board in your terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/data)
    #[arg(long)]
    pub dev: bool,

    /// Admin password for commands that change data
    #[arg(long, env = "PETLOG_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Diary,
    Notices,
}

impl Kind {
    fn target(self, id: usize) -> EditTarget {
        match self {
            Kind::Diary => EditTarget::Diary(id),
            Kind::Notices => EditTarget::Announcement(id),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// List records, newest first
    List {
        kind: Kind,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write a diary entry
    AddDiary {
        /// Diary text
        content: String,
        /// Entry date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Photo to attach
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Post an announcement
    AddNotice {
        /// Announcement text
        content: String,
        /// Announcement date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Change the date or text of a record
    Edit {
        kind: Kind,
        /// Record id as shown by `list`
        id: usize,
        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// New text
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a record
    Delete {
        kind: Kind,
        /// Record id as shown by `list`
        id: usize,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Failed to read photo {path}: {message}")]
    PhotoRead { path: String, message: String },
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: usize },
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build the session for one command, logging in when a password was given
pub fn session_for(password: Option<&str>, secret: &AdminSecret) -> Result<Session, CliError> {
    let mut session = Session::new();
    if let Some(password) = password {
        session.login(password, secret)?;
    }
    Ok(session)
}

fn parse_date_arg(date: Option<&str>) -> Result<chrono::NaiveDate, CliError> {
    match date {
        Some(date_str) => parse_date(date_str)
            .map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", date_str, e))),
        None => Ok(today()),
    }
}

fn print_ack(ack: &Ack) {
    println!("{}", ack.message);
    for warning in &ack.warnings {
        eprintln!("warning: {}", warning);
    }
}

/// Handle the list command
pub fn handle_list(kind: Kind, json: bool, board: &Board) -> Result<(), CliError> {
    match kind {
        Kind::Diary => {
            let entries = newest_first(&board.diary_entries()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", format_diary_table(&entries));
            }
        }
        Kind::Notices => {
            let notices = newest_first(&board.announcements()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&notices)?);
            } else {
                print!("{}", format_notice_table(&notices));
            }
        }
    }
    Ok(())
}

fn format_diary_table(entries: &[DiaryEntry]) -> String {
    if entries.is_empty() {
        return "No diary entries yet.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let photo = if entry.photo_path.is_some() { " [photo]" } else { "" };
        out.push_str(&format!(
            "{:>4}  {}  {}{}\n",
            entry.id,
            format_date(entry.date),
            preview(&entry.content),
            photo
        ));
    }
    out
}

fn format_notice_table(notices: &[Announcement]) -> String {
    if notices.is_empty() {
        return "No announcements.\n".to_string();
    }
    let mut out = String::new();
    for notice in notices {
        out.push_str(&format!(
            "{:>4}  {}  {}\n",
            notice.id,
            format_date(notice.date),
            preview(&notice.content)
        ));
    }
    out
}

/// Handle the add-diary command
pub fn handle_add_diary(
    content: String,
    date: Option<String>,
    photo: Option<PathBuf>,
    session: &Session,
    board: &Board,
) -> Result<(), CliError> {
    let date = parse_date_arg(date.as_deref())?;
    let photo = match photo {
        Some(path) => Some(PhotoUpload::from_path(&path).map_err(|e| CliError::PhotoRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?),
        None => None,
    };

    let ack = board.post_diary(session, DiaryDraft { date, content, photo })?;
    print_ack(&ack);
    Ok(())
}

/// Handle the add-notice command
pub fn handle_add_notice(
    content: String,
    date: Option<String>,
    session: &Session,
    board: &Board,
) -> Result<(), CliError> {
    let date = parse_date_arg(date.as_deref())?;
    let ack = board.post_announcement(session, date, content)?;
    print_ack(&ack);
    Ok(())
}

/// Handle the edit command. Fields left out keep their current value.
pub fn handle_edit(
    kind: Kind,
    id: usize,
    date: Option<String>,
    content: Option<String>,
    session: &mut Session,
    board: &Board,
) -> Result<(), CliError> {
    let new_date = date.as_deref().map(|d| parse_date_arg(Some(d))).transpose()?;

    let (current_date, current_content) = match board.open_edit(session, kind.target(id))? {
        EditState::Idle => {
            let kind = match kind {
                Kind::Diary => "diary entry",
                Kind::Notices => "announcement",
            };
            return Err(CliError::NotFound { kind, id });
        }
        EditState::Diary(entry) => (entry.date, entry.content),
        EditState::Announcement(notice) => (notice.date, notice.content),
    };

    let ack = board.save_edit(
        session,
        new_date.unwrap_or(current_date),
        content.unwrap_or(current_content),
    )?;
    print_ack(&ack);
    Ok(())
}

/// Handle the delete command
pub fn handle_delete(kind: Kind, id: usize, session: &mut Session, board: &Board) -> Result<(), CliError> {
    let ack = board.delete(session, kind.target(id))?;
    print_ack(&ack);
    Ok(())
}
