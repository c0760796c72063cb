use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ATTACHMENT_TYPES: [&str; 5] = ["pdf", "png", "jpg", "jpeg", "gif"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse user data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Please enter {0}")]
    Missing(&'static str),
    #[error("Unsupported attachment type: {0}")]
    UnsupportedAttachment(String),
    #[error("No {kind} at position {position}")]
    NotFound { kind: &'static str, position: usize },
    #[error("No journal entry saved at {0}")]
    EntryNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub text: String,
    pub date: String,
    pub id: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub filepath: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(default = "untitled")]
    pub title: String,
    pub date: String,
    pub entry: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

fn untitled() -> String {
    "Untitled".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub journal_entries: Vec<JournalEntry>,
}

fn parse_date(date: &str) -> Result<NaiveDate, SessionError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| SessionError::InvalidDate(date.to_string()))
}

fn safe_user(user: &str) -> String {
    let cleaned: String = user
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() { "default".to_string() } else { cleaned }
}

/// Per-user reminders and journal, saved as JSON after every change.
pub struct UserStore {
    path: PathBuf,
    attachments_dir: PathBuf,
    data: UserData,
}

impl UserStore {
    pub async fn load(data_dir: &Path, user: &str) -> Result<Self, SessionError> {
        let user = safe_user(user);
        let path = data_dir.join(format!("user_data_{}.json", user));
        let attachments_dir = data_dir.join("journal_attachments").join(&user);

        let data = if path.exists() {
            let raw = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&raw)?
        } else {
            UserData::default()
        };

        log::debug!(
            "Loaded {} reminders and {} journal entries from {}",
            data.reminders.len(),
            data.journal_entries.len(),
            path.display()
        );
        Ok(Self { path, attachments_dir, data })
    }

    pub fn data(&self) -> &UserData {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.data.reminders
    }

    pub async fn add_reminder(&mut self, text: &str, date: &str) -> Result<&Reminder, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::Missing("reminder text"));
        }
        let date = parse_date(date)?;

        let id = self.data.reminders.len();
        self.data.reminders.push(Reminder {
            text: text.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            id,
        });
        self.save().await?;
        Ok(&self.data.reminders[id])
    }

    /// Remove by zero-based position in the list.
    pub async fn remove_reminder(&mut self, position: usize) -> Result<Reminder, SessionError> {
        if position >= self.data.reminders.len() {
            return Err(SessionError::NotFound { kind: "reminder", position: position + 1 });
        }
        let removed = self.data.reminders.remove(position);
        self.save().await?;
        Ok(removed)
    }

    pub async fn clear_reminders(&mut self) -> Result<(), SessionError> {
        self.data.reminders.clear();
        self.save().await
    }

    /// Journal entries, newest first.
    pub fn journal(&self) -> Vec<&JournalEntry> {
        self.data.journal_entries.iter().rev().collect()
    }

    pub async fn add_journal_entry(
        &mut self,
        title: &str,
        entry: &str,
        date: NaiveDate,
        attachment: Option<&Path>,
        now: NaiveDateTime,
    ) -> Result<&JournalEntry, SessionError> {
        let (title, entry) = (title.trim(), entry.trim());
        if title.is_empty() || entry.is_empty() {
            return Err(SessionError::Missing("both title and entry"));
        }

        let attachment = match attachment {
            Some(path) => Some(self.store_attachment(path, now).await?),
            None => None,
        };

        self.data.journal_entries.push(JournalEntry {
            title: title.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            entry: entry.to_string(),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            attachment,
        });
        self.save().await?;
        Ok(&self.data.journal_entries[self.data.journal_entries.len() - 1])
    }

    async fn store_attachment(&self, source: &Path, now: NaiveDateTime) -> Result<Attachment, SessionError> {
        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SessionError::UnsupportedAttachment(source.display().to_string()))?;
        let file_type = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !ATTACHMENT_TYPES.contains(&file_type.as_str()) {
            return Err(SessionError::UnsupportedAttachment(filename));
        }

        tokio::fs::create_dir_all(&self.attachments_dir).await?;
        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        let mut target = self.attachments_dir.join(format!("{}_{}", stamp, filename));
        let mut n = 1;
        while tokio::fs::try_exists(&target).await? {
            target = self.attachments_dir.join(format!("{}_{}_{}", stamp, n, filename));
            n += 1;
        }
        tokio::fs::copy(source, &target).await?;

        Ok(Attachment {
            filename,
            filepath: target.display().to_string(),
            file_type,
        })
    }

    /// Delete the newest entry saved at `timestamp`, removing its attachment file if present.
    pub async fn delete_journal_entry(&mut self, timestamp: &str) -> Result<JournalEntry, SessionError> {
        let idx = self
            .data
            .journal_entries
            .iter()
            .rposition(|e| e.timestamp == timestamp)
            .ok_or_else(|| SessionError::EntryNotFound(timestamp.to_string()))?;
        self.remove_journal_at(idx).await
    }

    /// Delete by zero-based position in the newest-first listing of [`UserStore::journal`].
    pub async fn remove_journal_entry(&mut self, position: usize) -> Result<JournalEntry, SessionError> {
        let len = self.data.journal_entries.len();
        if position >= len {
            return Err(SessionError::NotFound { kind: "journal entry", position: position + 1 });
        }
        self.remove_journal_at(len - 1 - position).await
    }

    async fn remove_journal_at(&mut self, idx: usize) -> Result<JournalEntry, SessionError> {
        let removed = self.data.journal_entries.remove(idx);

        if let Some(attachment) = &removed.attachment {
            if let Err(e) = tokio::fs::remove_file(&attachment.filepath).await {
                log::warn!("Could not remove attachment {}: {}", attachment.filepath, e);
            }
        }

        self.save().await?;
        Ok(removed)
    }
}
