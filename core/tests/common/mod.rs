#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use histbridge_core::api::{
    Clock, ConversationRecord, ConversationStore, HistoryError, HistorySink, MessageEntry,
    StoreConnector, StoreError, Watermark,
};

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
}

pub fn record(id: &str, secs: i64) -> ConversationRecord {
    ConversationRecord {
        id: Some(id.to_string()),
        title: None,
        updated_at: ts(secs),
        messages: vec![MessageEntry::new("user", format!("message for {id}"))],
    }
}

pub struct FakeClock(Mutex<DateTime<Utc>>);

impl FakeClock {
    pub fn new(at: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(at)))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap() = at;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeState {
    pub available: bool,
    pub batches: VecDeque<Result<Vec<ConversationRecord>, String>>,
    pub opens: usize,
    pub closes: usize,
    pub queries: Vec<(Watermark, usize)>,
}

/// Connector whose store serves scripted batches.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn available() -> Self {
        let c = Self::default();
        c.state.lock().unwrap().available = true;
        c
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().unwrap().available = available;
    }

    pub fn push_batch(&self, batch: Vec<ConversationRecord>) {
        self.state.lock().unwrap().batches.push_back(Ok(batch));
    }

    pub fn push_failure(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .batches
            .push_back(Err(message.to_string()));
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn queries(&self) -> Vec<(Watermark, usize)> {
        self.state.lock().unwrap().queries.clone()
    }
}

impl StoreConnector for FakeConnector {
    fn location(&self) -> String {
        "fake://conversations".to_string()
    }

    fn open(&self) -> Result<Box<dyn ConversationStore>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if !state.available {
            return Err(StoreError::Unavailable {
                path: PathBuf::from("fake://conversations"),
                reason: "not found".to_string(),
            });
        }
        state.opens += 1;
        Ok(Box::new(FakeStore {
            state: self.state.clone(),
        }))
    }
}

pub struct FakeStore {
    state: Arc<Mutex<FakeState>>,
}

impl ConversationStore for FakeStore {
    fn name(&self) -> &str {
        "fake"
    }

    fn fetch_since(
        &self,
        since: &Watermark,
        limit: usize,
    ) -> Result<Vec<ConversationRecord>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.queries.push((*since, limit));
        match state.batches.pop_front() {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(message)) => Err(StoreError::Query(message)),
            None => Ok(vec![]),
        }
    }
}

impl Drop for FakeStore {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.closes += 1;
        }
    }
}

/// Sink that remembers ids and fails for the ids it is told to.
#[derive(Default)]
pub struct RecordingSink {
    pub written: Mutex<Vec<String>>,
    pub fail_ids: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn fail_on(&self, id: &str) {
        self.fail_ids.lock().unwrap().push(id.to_string());
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySink for RecordingSink {
    async fn append(&self, record: &ConversationRecord) -> Result<PathBuf, HistoryError> {
        let id = record.display_id().to_string();
        let path = PathBuf::from(format!("/dev/null/{id}"));
        if self.fail_ids.lock().unwrap().contains(&id) {
            return Err(HistoryError::Write {
                path,
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.written.lock().unwrap().push(id);
        Ok(path)
    }
}
