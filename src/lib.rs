pub mod board;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod photo;
pub mod projection;
pub mod session;
pub mod store;
pub mod tui;
pub mod utils;

pub use board::Board;
pub use config::Config;
pub use models::{Announcement, DiaryEntry};
pub use session::Session;
pub use utils::Profile;
