use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to open download archive at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Failed to record {key} in download archive at {path}: {reason}")]
    Record {
        key: String,
        path: PathBuf,
        reason: String,
    },
}

/// Persisted set of keys marking episodes already fetched, used for cross-run
/// dedup.
///
/// The backing file is UTF-8 text with one key per line, appended in the order
/// keys were recorded. Blank lines are ignored on load. Keys are never
/// removed.
pub struct DownloadArchive {
    path: PathBuf,
    inner: Mutex<ArchiveInner>,
}

struct ArchiveInner {
    keys: HashSet<String>,
    file: File,
}

impl DownloadArchive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ArchiveError::Open {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }

        let keys = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                return Err(ArchiveError::Open {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ArchiveError::Open {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path,
            inner: Mutex::new(ArchiveInner { keys, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.lock().await.keys.contains(key)
    }

    /// Record a key. Recording an already-present key is a no-op success; a
    /// new key is flushed and synced to disk before this returns.
    pub async fn record(&self, key: &str) -> Result<(), ArchiveError> {
        let mut inner = self.inner.lock().await;
        if inner.keys.contains(key) {
            return Ok(());
        }

        writeln!(inner.file, "{key}")
            .and_then(|()| inner.file.sync_data())
            .map_err(|e| ArchiveError::Record {
                key: key.to_string(),
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        inner.keys.insert(key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_then_contains() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = DownloadArchive::open(temp_dir.path().join("archive.txt")).unwrap();

        assert!(!archive.contains("feed-123-ep-1.mp3").await);
        archive.record("feed-123-ep-1.mp3").await.unwrap();
        assert!(archive.contains("feed-123-ep-1.mp3").await);
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("archive.txt");
        let archive = DownloadArchive::open(&path).unwrap();

        archive.record("ep-1").await.unwrap();
        archive.record("ep-1").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().filter(|line| *line == "ep-1").count(),
            1,
            "duplicate records must not append duplicate lines"
        );
    }

    #[tokio::test]
    async fn test_keys_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("archive.txt");

        {
            let archive = DownloadArchive::open(&path).unwrap();
            archive.record("ep-1").await.unwrap();
            archive.record("ep-2").await.unwrap();
        }

        let reopened = DownloadArchive::open(&path).unwrap();
        assert!(reopened.contains("ep-1").await);
        assert!(reopened.contains("ep-2").await);
        assert!(!reopened.contains("ep-3").await);
    }

    #[tokio::test]
    async fn test_load_skips_blank_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("archive.txt");
        std::fs::write(&path, "ep-1\n\n  \nep-2\n").unwrap();

        let archive = DownloadArchive::open(&path).unwrap();
        assert!(archive.contains("ep-1").await);
        assert!(archive.contains("ep-2").await);
    }

    #[tokio::test]
    async fn test_open_creates_missing_parent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("state").join("archive.txt");

        let archive = DownloadArchive::open(&path).unwrap();
        archive.record("ep-1").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_records_do_not_corrupt_the_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("archive.txt");
        let archive = std::sync::Arc::new(DownloadArchive::open(&path).unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let archive = std::sync::Arc::clone(&archive);
            handles.push(tokio::spawn(
                async move { archive.record(&format!("ep-{i}")).await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 32);
        for i in 0..32 {
            assert!(lines.contains(&format!("ep-{i}").as_str()));
        }
    }
}
