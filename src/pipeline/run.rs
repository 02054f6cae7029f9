// src/pipeline/run.rs

//! End-to-end pipeline run: fetch → parse → novelty → store → notify.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Config, EventRecord};
use crate::services::{FeedClient, Notifier, build_notifier};
use crate::storage::EventStore;
use crate::utils::truncate_graphemes;

use super::announce::AnnouncementTemplate;
use super::novelty::NoveltyTracker;
use super::parse::RecordParser;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No feed entry matched the locality
    NoEvents,
    /// Leading event already acted on in this process
    AlreadySeen,
    /// Leading event already in the durable store; row refreshed, not announced
    AlreadyStored,
    /// Stored and announced
    Announced,
    /// Stored, but the notifier rejected the announcement
    NotifyFailed,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Leading record, when the run got as far as the store
    pub record: Option<EventRecord>,
}

impl RunOutcome {
    fn without_record(status: RunStatus) -> Self {
        Self {
            status,
            record: None,
        }
    }

    /// Whether an announcement was delivered.
    pub fn sent(&self) -> bool {
        self.status == RunStatus::Announced
    }
}

/// Long-lived pipeline. Create once per process; novelty state persists
/// across runs and is dropped with the pipeline.
pub struct Pipeline {
    parser: RecordParser,
    tracker: NoveltyTracker,
    store: EventStore,
    feed: FeedClient,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        parser: RecordParser,
        store: EventStore,
        feed: FeedClient,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            parser,
            tracker: NoveltyTracker::new(),
            store,
            feed,
            notifier,
        }
    }

    /// Build every component from configuration.
    pub fn from_config(config: &Config, test_mode: bool) -> Result<Self> {
        let parser = RecordParser::new(
            config.filter.match_mode,
            AnnouncementTemplate::from_config(&config.announcement),
        );
        let store = EventStore::open_with(&config.storage, test_mode)?;
        let feed = FeedClient::new(&config.feed)?;
        let notifier = build_notifier(config)?;
        Ok(Self::new(parser, store, feed, notifier))
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn tracker(&self) -> &NoveltyTracker {
        &self.tracker
    }

    /// Fetch the feed and process it for `locality`.
    ///
    /// The locality is checked before any network access.
    pub async fn run(&mut self, locality: &str) -> Result<RunOutcome> {
        ensure_locality(locality)?;
        let raw = self.feed.fetch_default().await?;
        self.process(locality, &raw).await
    }

    /// Process an injected payload instead of fetching.
    pub async fn run_payload(&mut self, locality: &str, raw: &str) -> Result<RunOutcome> {
        ensure_locality(locality)?;
        self.process(locality, raw).await
    }

    async fn process(&mut self, locality: &str, raw: &str) -> Result<RunOutcome> {
        let records = self.parser.parse(raw, locality)?;

        let Some(leading) = records.first() else {
            log::info!("No events for {}", locality);
            return Ok(RunOutcome::without_record(RunStatus::NoEvents));
        };

        if !self.tracker.peek_is_new(&records) {
            log::info!("Event {} already seen", leading.code);
            return Ok(RunOutcome::without_record(RunStatus::AlreadySeen));
        }

        // Remembered only once the store agrees, so a failed write is retried next run.
        let leading = leading.clone();
        if self.store.contains(&leading.code)? {
            self.store.upsert(&leading)?;
            self.tracker.remember(&leading);
            log::info!("Event {} already stored; refreshed", leading.code);
            return Ok(RunOutcome {
                status: RunStatus::AlreadyStored,
                record: Some(leading),
            });
        }

        self.store.upsert(&leading)?;
        self.tracker.remember(&leading);
        log::info!(
            "New event {}: M{} {}",
            leading.code,
            leading.magnitude,
            leading.place
        );

        let text = truncate_graphemes(&leading.announcement_text, self.notifier.max_length());
        let status = match self.notifier.notify(&text).await {
            Ok(()) => RunStatus::Announced,
            Err(error) => {
                log::error!("Announcement for {} failed: {}", leading.code, error);
                RunStatus::NotifyFailed
            }
        };

        Ok(RunOutcome {
            status,
            record: Some(leading),
        })
    }
}

fn ensure_locality(locality: &str) -> Result<()> {
    if locality.trim().is_empty() {
        return Err(AppError::NoLocality);
    }
    Ok(())
}
