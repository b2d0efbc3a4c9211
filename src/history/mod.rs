//! Chat history persistence
//!
//! Saves a finished conversation as plain text under
//! `<dir>/<YYYY-MM-DD>/<HH>h_<MM>min.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;

use crate::error::Result;
use crate::llm::Message;

/// Line placed between two saved messages
fn separator() -> String {
    format!("\n\n{}\n\n", "-".repeat(100))
}

/// Render `history` as `role: content` entries split by a dashed rule
pub fn format_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join(&separator())
}

/// Writes conversations to dated text files
#[derive(Debug, Clone)]
pub struct HistorySaver {
    dir: PathBuf,
}

impl HistorySaver {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a conversation saved at `at` is written to
    pub fn path_for(&self, at: &DateTime<Local>) -> PathBuf {
        self.dir
            .join(at.format("%Y-%m-%d").to_string())
            .join(format!("{}.txt", at.format("%Hh_%Mmin")))
    }

    /// Save `history` stamped with the current local time
    pub fn save(&self, history: &[Message]) -> Result<PathBuf> {
        self.save_at(history, &Local::now())
    }

    /// Save `history` stamped with `at`, replacing any file from the same minute
    pub fn save_at(&self, history: &[Message], at: &DateTime<Local>) -> Result<PathBuf> {
        let path = self.path_for(at);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format_history(history))?;
        info!("Saved {} messages to {}", history.len(), path.display());
        Ok(path)
    }
}
