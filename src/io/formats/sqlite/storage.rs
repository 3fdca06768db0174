// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Read-only accessor for a single rosbag2 SQLite container.

use std::collections::HashMap;
use std::iter::FusedIterator;
use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::core::Time;
use crate::io::detection::is_sqlite_container;
use crate::io::filter::{MessageFilter, MessageQuery};
use crate::io::metadata::{RawMessage, TopicDefinition};
use crate::io::source::{BlobSource, ByteSource, FileSource};
use crate::io::traits::{MessageStorage, RawMessageStream};
use crate::{Result, StorageError};

use super::catalog::TopicCatalog;
use super::config::StorageConfig;
use super::cursor::{live_statements, Cursor};
use super::engine::engine;

const SELECT_TIME_RANGE: &str = "select min(timestamp), max(timestamp) from messages";

const SELECT_MESSAGE_COUNTS: &str = "select topics.name, count(*) from messages \
     inner join topics on messages.topic_id = topics.id group by topics.id";

/// Connection and catalog of an open container.
struct StorageContext {
    conn: Connection,
    catalog: TopicCatalog,
}

/// Accessor for one `.db3` container.
///
/// The container is loaded fully into memory by [`open`](Self::open) and
/// queried from there; the byte source is only touched again on close.
///
/// # Example
///
/// ```rust,no_run
/// use rosbag2_sqlite::{MessageFilter, SqliteStorage};
///
/// let mut storage = SqliteStorage::from_path("talker/talker_0.db3");
/// storage.open()?;
/// for topic in storage.read_topics()? {
///     println!("{} ({})", topic.name, topic.message_type);
/// }
/// let filter = MessageFilter::new().with_topics(["/rosout"]);
/// for msg in storage.read_messages(&filter)? {
///     let msg = msg?;
///     println!("{} {} bytes", msg.timestamp, msg.len());
/// }
/// storage.close()?;
/// # Ok::<(), rosbag2_sqlite::StorageError>(())
/// ```
pub struct SqliteStorage {
    source: Box<dyn ByteSource>,
    config: StorageConfig,
    context: Option<StorageContext>,
}

impl SqliteStorage {
    /// Create a closed accessor over `source` with the default configuration.
    pub fn new(source: impl ByteSource + 'static) -> Self {
        Self::with_config(source, StorageConfig::default())
    }

    /// Create a closed accessor with an explicit configuration.
    pub fn with_config(source: impl ByteSource + 'static, config: StorageConfig) -> Self {
        Self {
            source: Box::new(source),
            config,
            context: None,
        }
    }

    /// Create a closed accessor reading the file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new(FileSource::new(path))
    }

    /// Create a closed accessor over an in-memory container.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(BlobSource::from(bytes.into()))
    }

    /// Check whether the accessor is open.
    pub fn is_open(&self) -> bool {
        self.context.is_some()
    }

    /// Get the configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Get the topic catalog of the open container.
    pub fn catalog(&self) -> Result<&TopicCatalog> {
        self.context("reading the topic catalog")
            .map(|ctx| &ctx.catalog)
    }

    /// Number of message cursors currently holding a prepared statement.
    ///
    /// Zero when closed.
    pub fn live_cursors(&self) -> usize {
        self.context
            .as_ref()
            .map_or(0, |ctx| live_statements(&ctx.conn))
    }

    fn context(&self, operation: &'static str) -> Result<&StorageContext> {
        self.context
            .as_ref()
            .ok_or_else(|| StorageError::not_open(operation))
    }

    /// Load the container and build the topic catalog.
    ///
    /// Fails without touching the engine when the source holds fewer than
    /// `min_container_size` bytes. Nothing is kept on failure. Opening an
    /// open accessor is a no-op.
    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            debug!("Storage already open");
            return Ok(());
        }

        let bytes = self.source.read_all()?;
        if bytes.len() < self.config.min_container_size {
            let reported_size = self.source.size()?;
            return Err(StorageError::invalid_container(reported_size, bytes.len()));
        }
        if self.config.validate_magic && !is_sqlite_container(&bytes) {
            return Err(StorageError::NotADatabase(
                "missing SQLite header magic".to_string(),
            ));
        }

        let conn = engine().open_buffer(&bytes)?;
        let catalog = TopicCatalog::load(&conn)?;
        info!(
            bytes = bytes.len(),
            topics = catalog.len(),
            "Opened SQLite storage"
        );
        self.context = Some(StorageContext { conn, catalog });
        Ok(())
    }

    /// Release the connection and close the byte source.
    ///
    /// The source is closed even when closing the connection fails. Calling
    /// it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let conn_result = match self.context.take() {
            Some(ctx) => {
                debug!("Closing SQLite storage");
                ctx.conn.close().map_err(|(_, e)| StorageError::Engine(e))
            }
            None => Ok(()),
        };
        let source_result = self.source.close();
        conn_result.and(source_result)
    }

    /// All topics, in container order.
    pub fn read_topics(&self) -> Result<Vec<TopicDefinition>> {
        let ctx = self.context("reading topics")?;
        Ok(ctx.catalog.topics().cloned().collect())
    }

    /// Lazily read the messages matching `filter`, in storage order.
    ///
    /// The returned iterator holds a prepared statement until it is
    /// exhausted or dropped.
    pub fn read_messages(&self, filter: &MessageFilter) -> Result<MessageIter<'_>> {
        let ctx = self.context("reading messages")?;
        let query = MessageQuery::build(filter, |name| ctx.catalog.topic_id(name)).render();
        debug!(sql = %query.sql, params = query.params.len(), "Querying messages");
        let cursor = Cursor::prepare(&ctx.conn, &query)?;
        Ok(MessageIter {
            cursor,
            catalog: &ctx.catalog,
        })
    }

    /// Earliest and latest message timestamps.
    ///
    /// An empty messages table yields `(Time::ZERO, Time::ZERO)`.
    pub fn time_range(&self) -> Result<(Time, Time)> {
        let ctx = self.context("reading the time range")?;
        let (min, max) = ctx
            .conn
            .query_row(SELECT_TIME_RANGE, [], |row| {
                Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?))
            })
            .map_err(StorageError::from_engine)?;
        Ok((decode_bound(min)?, decode_bound(max)?))
    }

    /// Message count per topic name.
    ///
    /// Topics with no messages are absent.
    pub fn message_counts(&self) -> Result<HashMap<String, u64>> {
        let ctx = self.context("counting messages")?;
        let mut stmt = ctx
            .conn
            .prepare(SELECT_MESSAGE_COUNTS)
            .map_err(StorageError::from_engine)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(StorageError::from_engine)?;

        let mut counts = HashMap::new();
        for row in rows {
            let (name, count) = row.map_err(StorageError::from_engine)?;
            counts.insert(name, count.max(0) as u64);
        }
        Ok(counts)
    }
}

fn decode_bound(value: Option<i64>) -> Result<Time> {
    match value {
        None => Ok(Time::ZERO),
        Some(v) => u64::try_from(v)
            .map(Time::from_nanos)
            .map_err(|_| StorageError::InvalidTimestamp { value: v }),
    }
}

impl Drop for SqliteStorage {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                debug!(error = %e, "Error closing storage on drop");
            }
        }
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl MessageStorage for SqliteStorage {
    fn open(&mut self) -> Result<()> {
        SqliteStorage::open(self)
    }

    fn close(&mut self) -> Result<()> {
        SqliteStorage::close(self)
    }

    fn is_open(&self) -> bool {
        SqliteStorage::is_open(self)
    }

    fn read_topics(&self) -> Result<Vec<TopicDefinition>> {
        SqliteStorage::read_topics(self)
    }

    fn read_messages<'a>(&'a self, filter: &MessageFilter) -> Result<RawMessageStream<'a>> {
        Ok(Box::new(SqliteStorage::read_messages(self, filter)?))
    }

    fn time_range(&self) -> Result<(Time, Time)> {
        SqliteStorage::time_range(self)
    }

    fn message_counts(&self) -> Result<HashMap<String, u64>> {
        SqliteStorage::message_counts(self)
    }
}

/// Lazy, single-pass iterator over message rows.
///
/// Borrows its [`SqliteStorage`], so the storage cannot be closed while the
/// iterator is alive. The underlying statement is released when the rows
/// run out, when stepping fails, or when the iterator is dropped.
pub struct MessageIter<'a> {
    cursor: Cursor<'a>,
    catalog: &'a TopicCatalog,
}

impl MessageIter<'_> {
    /// Whether the rows have been fully consumed (or stepping failed).
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_released()
    }

    /// Stop iterating and release the statement now.
    pub fn close(self) {}
}

impl Iterator for MessageIter<'_> {
    type Item = Result<RawMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.cursor.step() {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };
        let Some(topic) = self.catalog.topic(row.topic_id) else {
            return Some(Err(StorageError::UnknownTopicId {
                topic_id: row.topic_id,
            }));
        };
        Some(Ok(RawMessage::new(
            topic.clone(),
            Time::from_nanos(row.timestamp),
            row.data,
        )))
    }
}

impl FusedIterator for MessageIter<'_> {}
