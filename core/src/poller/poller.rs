use std::sync::Arc;

use crate::history::HistorySink;
use crate::model::Watermark;
use crate::store::{ConversationStore, StoreConnector};

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No store handle could be opened; nothing was queried.
    StoreUnavailable,
    /// The query failed; the watermark is unchanged and the handle was dropped.
    QueryFailed,
    Processed {
        fetched: usize,
        written: usize,
        watermark: Watermark,
    },
}

/// Fetches conversations newer than the watermark and hands them to the sink.
pub struct Poller {
    connector: Arc<dyn StoreConnector>,
    store: Option<Box<dyn ConversationStore>>,
    sink: Arc<dyn HistorySink>,
    watermark: Watermark,
    batch_size: usize,
}

impl Poller {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        sink: Arc<dyn HistorySink>,
        start: Watermark,
        batch_size: usize,
    ) -> Self {
        Self {
            connector,
            store: None,
            sink,
            watermark: start,
            batch_size: batch_size.max(1),
        }
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    /// Opens the store unless a handle is already held. Failures are logged.
    pub fn connect(&mut self) -> bool {
        if self.store.is_some() {
            return true;
        }
        match self.connector.open() {
            Ok(store) => {
                tracing::info!(
                    store = store.name(),
                    location = %self.connector.location(),
                    "conversation store opened"
                );
                self.store = Some(store);
                true
            }
            Err(e) => {
                tracing::warn!(location = %self.connector.location(), "{e}");
                false
            }
        }
    }

    #[tracing::instrument(name = "poller.tick", skip(self), fields(watermark = %self.watermark))]
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.connect() {
            tracing::debug!("skipping tick, store not available");
            return TickOutcome::StoreUnavailable;
        }
        let fetch = match self.store.as_ref() {
            Some(store) => store.fetch_since(&self.watermark, self.batch_size),
            None => return TickOutcome::StoreUnavailable,
        };

        let records = match fetch {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("{e}");
                self.store = None;
                return TickOutcome::QueryFailed;
            }
        };

        let fetched = records.len();
        let mut written = 0;
        for record in &records {
            match self.sink.append(record).await {
                Ok(_) => written += 1,
                Err(e) => tracing::error!(id = record.display_id(), "{e}"),
            }
        }

        // Batches arrive newest first, so take the max rather than the first row.
        if let Some(newest) = records.iter().map(|r| r.updated_at).max() {
            if self.watermark.advance(newest) {
                tracing::debug!(watermark = %self.watermark, "watermark advanced");
            }
        }

        if fetched > 0 {
            tracing::info!(fetched, written, "poll tick processed conversations");
        }
        TickOutcome::Processed {
            fetched,
            written,
            watermark: self.watermark,
        }
    }

    /// Drops the store handle, closing the connection.
    pub fn close(&mut self) {
        if self.store.take().is_some() {
            tracing::info!(location = %self.connector.location(), "conversation store closed");
        }
    }
}
