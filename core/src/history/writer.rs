use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tokio::io::AsyncWriteExt;

use super::format::render_entry;
use super::HistorySink;
use crate::clock::Clock;
use crate::error::HistoryError;
use crate::model::ConversationRecord;

/// Upper bound for `read_recent` lookbacks.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

/// Contents of one day's history file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLog {
    pub date: NaiveDate,
    pub path: PathBuf,
    pub contents: String,
}

/// Appends entries to `<dir>/<YYYY-MM-DD>.<extension>`, picking the file from
/// the clock's current UTC date.
pub struct HistoryWriter {
    dir: PathBuf,
    extension: String,
    clock: Arc<dyn Clock>,
}

impl HistoryWriter {
    /// Creates the writer and its directory.
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, HistoryError> {
        let extension = extension.into();
        let writer = Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            clock,
        };
        writer.ensure_dir()?;
        Ok(writer)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Idempotent.
    pub fn ensure_dir(&self) -> Result<(), HistoryError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| HistoryError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    async fn ensure_dir_async(&self) -> Result<(), HistoryError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| HistoryError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{}", date.format("%Y-%m-%d"), self.extension))
    }

    #[tracing::instrument(name = "history.append", skip(self, record), fields(id = record.display_id()))]
    pub async fn append_record(&self, record: &ConversationRecord) -> Result<PathBuf, HistoryError> {
        self.ensure_dir_async().await?;

        let now = self.clock.now();
        let path = self.file_for(now.date_naive());
        let entry = render_entry(record, now);

        let write_err = |source| HistoryError::Write {
            path: path.clone(),
            source,
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(write_err)?;
        file.write_all(entry.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        tracing::info!(path = %path.display(), bytes = entry.len(), "saved conversation to history");
        Ok(path)
    }

    /// Logs for the last `days` dates including today, oldest first. Dates
    /// without a file are skipped. `days` is clamped to `1..=MAX_LOOKBACK_DAYS`.
    pub async fn read_recent(&self, days: u32) -> Result<Vec<DayLog>, HistoryError> {
        let days = days.clamp(1, MAX_LOOKBACK_DAYS);
        let today = self.clock.now().date_naive();

        let mut logs = Vec::new();
        for offset in (0..i64::from(days)).rev() {
            let date = today - Duration::days(offset);
            let path = self.file_for(date);
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => logs.push(DayLog {
                    date,
                    path,
                    contents,
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(HistoryError::Read { path, source }),
            }
        }
        Ok(logs)
    }
}

#[async_trait]
impl HistorySink for HistoryWriter {
    async fn append(&self, record: &ConversationRecord) -> Result<PathBuf, HistoryError> {
        self.append_record(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageEntry;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(y: i32, m: u32, d: u32, h: u32) -> Arc<Self> {
            Arc::new(Self(Mutex::new(
                Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
            )))
        }

        fn set(&self, t: DateTime<Utc>) {
            *self.0.lock().unwrap() = t;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn record(id: &str) -> ConversationRecord {
        ConversationRecord {
            id: Some(id.to_string()),
            title: None,
            updated_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            messages: vec![MessageEntry::new("user", format!("from {id}"))],
        }
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("history").join("sessions");
        let writer = HistoryWriter::new(&dir, "md", FixedClock::at(2026, 1, 1, 0)).unwrap();
        writer.ensure_dir().unwrap();
        writer.ensure_dir().unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("history"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn file_follows_write_date_not_record_date() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = FixedClock::at(2026, 5, 1, 23);
        let writer = HistoryWriter::new(tmp.path(), ".md", clock.clone()).unwrap();

        let first = writer.append_record(&record("a")).await.unwrap();
        let second = writer.append_record(&record("b")).await.unwrap();
        clock.set(Utc.with_ymd_and_hms(2026, 5, 2, 0, 30, 0).unwrap());
        let third = writer.append_record(&record("c")).await.unwrap();

        assert_eq!(first, tmp.path().join("2026-05-01.md"));
        assert_eq!(first, second);
        assert_eq!(third, tmp.path().join("2026-05-02.md"));

        let day_one = std::fs::read_to_string(&first).unwrap();
        let a = day_one.find("**Conversation ID:** a").unwrap();
        let b = day_one.find("**Conversation ID:** b").unwrap();
        assert!(a < b);
        assert!(!day_one.contains("**Conversation ID:** c"));
    }

    #[tokio::test]
    async fn append_recreates_a_removed_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let writer = HistoryWriter::new(&dir, "md", FixedClock::at(2026, 1, 1, 0)).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        writer.append_record(&record("x")).await.unwrap();
        assert!(dir.join("2026-01-01.md").exists());

        std::fs::remove_dir_all(tmp.path()).unwrap();
        writer.append_record(&record("y")).await.unwrap();
        let contents = std::fs::read_to_string(dir.join("2026-01-01.md")).unwrap();
        assert!(contents.contains("**Conversation ID:** y"));
        assert!(!contents.contains("**Conversation ID:** x"));
    }

    #[tokio::test]
    async fn append_reports_an_uncreatable_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        let writer =
            HistoryWriter::new(blocker.join("sessions"), "md", FixedClock::at(2026, 1, 1, 0))
                .unwrap();
        std::fs::remove_dir_all(&blocker).unwrap();
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = writer.append_record(&record("z")).await.unwrap_err();
        assert!(matches!(err, HistoryError::CreateDir { .. }));
    }

    #[tokio::test]
    async fn read_recent_returns_existing_days_oldest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = FixedClock::at(2026, 5, 1, 12);
        let writer = HistoryWriter::new(tmp.path(), "md", clock.clone()).unwrap();
        writer.append_record(&record("old")).await.unwrap();
        clock.set(Utc.with_ymd_and_hms(2026, 5, 3, 12, 0, 0).unwrap());
        writer.append_record(&record("new")).await.unwrap();

        let logs = writer.read_recent(7).await.unwrap();
        let dates: Vec<_> = logs.iter().map(|l| l.date.to_string()).collect();
        assert_eq!(dates, vec!["2026-05-01", "2026-05-03"]);

        let today_only = writer.read_recent(0).await.unwrap();
        assert_eq!(today_only.len(), 1);
        assert!(today_only[0].contents.contains("from new"));
    }
}
