//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Drives one stream at a time through its paginator
//! - `SyncConfig` - Configuration for sync operations
//! - `MessageSink` - Where Singer messages go as soon as they exist
//! - Singer message types for output (Schema, Record, State)

mod types;

pub use types::{Message, SyncConfig, SyncStats};

use crate::decode::RecordDecoder;
use crate::error::Result;
use crate::http::HttpClient;
use crate::state::StateManager;
use crate::streams::{build_request, StreamDescriptor};
use crate::types::Timestamp;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Destination for Singer messages produced during a sync
pub trait MessageSink {
    /// Accept the next message, in emission order
    fn emit(&mut self, message: Message) -> Result<()>;
}

impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// State manager
    state: StateManager,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, state: StateManager) -> Self {
        Self {
            client,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Record a stream failure in the statistics
    pub fn record_error(&mut self) {
        self.stats.add_error();
    }

    /// Sync a single stream to completion
    ///
    /// Messages reach `sink` in emission order: `SCHEMA`, then the records of
    /// each page, then `STATE` for incremental streams. A bookmark is only
    /// stored after the records it covers were handed to the sink, so a
    /// failing page leaves the bookmark at the last page that got through.
    pub async fn sync_stream(
        &mut self,
        stream: &StreamDescriptor,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let span = info_span!("stream", stream = %stream.name);
        self.sync_stream_inner(stream, sink).instrument(span).await
    }

    async fn sync_stream_inner(
        &mut self,
        stream: &StreamDescriptor,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let start = Instant::now();
        let now = self.config.now.unwrap_or_else(Utc::now);

        let bookmark = match &stream.bookmark_field {
            Some(field) => self.state.get_bookmark(&stream.name, field).await?,
            None => None,
        };
        let mut paginator = stream
            .pagination
            .build(bookmark, self.config.start_date.as_deref())?;
        let decoder = stream.decoder();

        info!(?bookmark, horizon = now.timestamp(), "Starting sync");

        sink.emit(Message::schema(
            &stream.name,
            stream.schema(),
            stream.bookmark_field.iter().cloned().collect(),
        ))?;
        let mut page_count = 0usize;
        let mut record_count = 0usize;

        while let Some(token) = paginator.next_page(now) {
            let request = build_request(stream, &token, now)?;
            let response = self
                .client
                .request(request.method.into(), &request.path, request.to_request_config())
                .await?;
            let body = response.text().await?;
            let time_extracted = Utc::now();

            let records = decoder.decode(&body)?;
            let page_records = records.len();
            for record in records {
                sink.emit(Message::record(
                    &stream.name,
                    stream.enrich(record, &token)?,
                    time_extracted,
                ))?;
            }

            page_count += 1;
            record_count += page_records;
            self.stats.add_page();
            self.stats.add_records(page_records);
            debug!(page = page_count, %token, records = page_records, "Page fetched");

            if self.config.emit_state_per_page {
                if let Some(checkpoint) = paginator.checkpoint(&token) {
                    self.persist_bookmark(stream, checkpoint, sink).await?;
                }
            }

            paginator.advance();
        }

        if let Some(final_bookmark) = paginator.bookmark() {
            self.persist_bookmark(stream, final_bookmark, sink).await?;
        }

        self.stats.add_stream();
        #[allow(clippy::cast_possible_truncation)]
        self.stats.add_duration(start.elapsed().as_millis() as u64);

        info!(
            pages = page_count,
            records = record_count,
            bookmark = ?paginator.bookmark(),
            "Completed sync"
        );

        Ok(())
    }

    /// Store a bookmark, save it and emit the matching `STATE` message
    async fn persist_bookmark(
        &self,
        stream: &StreamDescriptor,
        value: Timestamp,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let Some(field) = &stream.bookmark_field else {
            return Ok(());
        };
        self.state.set_bookmark(&stream.name, field, value).await;
        self.state.save().await?;

        let snapshot = self.state.snapshot().await;
        sink.emit(Message::state(serde_json::to_value(&snapshot)?))
    }
}
