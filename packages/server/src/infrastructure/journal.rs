//! Append-only JSON Lines journal backing the in-memory log.
//!
//! One stamped message per line, in append order. Replaying the file restores
//! the log after a restart.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};

use super::dto::MessageDto;
use crate::domain::Message;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode journal record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Open journal file, positioned for appending
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Open (or create) the journal and replay its records.
    ///
    /// Lines that cannot be decoded are skipped with a warning. An incomplete
    /// last line, left by a crash mid-write, is cut off so the next record
    /// starts on a fresh line.
    pub async fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<Message>), JournalError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| JournalError::Io {
            path: path.clone(),
            source,
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(io_err(e)),
        };
        let complete = bytes
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        let messages = Self::replay(&String::from_utf8_lossy(&bytes[..complete]));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;

        if complete < bytes.len() {
            tracing::warn!(
                "Discarding incomplete record at the end of {} ({} bytes)",
                path.display(),
                bytes.len() - complete
            );
            file.set_len(complete as u64).await.map_err(io_err)?;
            file.sync_data().await.map_err(io_err)?;
        }

        tracing::info!(
            "Opened journal {} ({} messages)",
            path.display(),
            messages.len()
        );
        Ok((Self { path, file }, messages))
    }

    fn replay(contents: &str) -> Vec<Message> {
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| {
                let decoded = serde_json::from_str::<MessageDto>(line)
                    .map_err(|e| e.to_string())
                    .and_then(|dto| Message::try_from(dto).map_err(|e| e.to_string()));
                match decoded {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::warn!("Skipping journal line {}: {}", n + 1, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Durably append one record.
    pub async fn append(&mut self, message: &Message) -> Result<(), JournalError> {
        let mut line = serde_json::to_string(&MessageDto::from(message))?;
        line.push('\n');

        let path = &self.path;
        let io_err = |source| JournalError::Io {
            path: path.clone(),
            source,
        };
        self.file.write_all(line.as_bytes()).await.map_err(io_err)?;
        self.file.flush().await.map_err(io_err)?;
        self.file.sync_data().await.map_err(io_err)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
