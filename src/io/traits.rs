// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core trait for reading bag storage.
//!
//! [`MessageStorage`] is the contract every storage backend implements and
//! that multi-file bags are built on.

use std::collections::HashMap;

use crate::core::Time;
use crate::io::filter::MessageFilter;
use crate::io::metadata::{RawMessage, TopicDefinition};
use crate::Result;

/// Lazily produced sequence of messages.
///
/// Errors are reported per item; dropping the stream early releases any
/// cursor behind it.
pub type RawMessageStream<'a> = Box<dyn Iterator<Item = Result<RawMessage>> + 'a>;

/// Read-only access to the topics and messages of a bag.
///
/// All read operations fail with a state error until [`open`](Self::open)
/// succeeds and again after [`close`](Self::close).
///
/// # Example
///
/// ```no_run
/// use rosbag2_sqlite::io::filter::MessageFilter;
/// use rosbag2_sqlite::io::traits::MessageStorage;
///
/// fn summarize(storage: &dyn MessageStorage) -> rosbag2_sqlite::Result<()> {
///     let (start, end) = storage.time_range()?;
///     println!("{start} .. {end}");
///     for msg in storage.read_messages(&MessageFilter::new())? {
///         let msg = msg?;
///         println!("{} {} bytes", msg.topic.name, msg.len());
///     }
///     Ok(())
/// }
/// ```
pub trait MessageStorage {
    /// Load the container and build the topic catalog.
    fn open(&mut self) -> Result<()>;

    /// Release the container. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether `open` has succeeded and `close` has not been called since.
    fn is_open(&self) -> bool;

    /// All topics in the bag.
    fn read_topics(&self) -> Result<Vec<TopicDefinition>>;

    /// Messages matching `filter`, in storage order.
    fn read_messages<'a>(&'a self, filter: &MessageFilter) -> Result<RawMessageStream<'a>>;

    /// Earliest and latest message timestamps.
    ///
    /// A bag without messages reports `(Time::ZERO, Time::ZERO)`.
    fn time_range(&self) -> Result<(Time, Time)>;

    /// Message count per topic name. Topics without messages are absent.
    fn message_counts(&self) -> Result<HashMap<String, u64>>;

    /// Total number of messages.
    fn message_count(&self) -> Result<u64> {
        Ok(self.message_counts()?.values().sum())
    }

    /// Topic definition by name.
    fn topic_by_name(&self, name: &str) -> Result<Option<TopicDefinition>> {
        Ok(self.read_topics()?.into_iter().find(|t| t.name == name))
    }
}

impl<S: MessageStorage + ?Sized> MessageStorage for Box<S> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read_topics(&self) -> Result<Vec<TopicDefinition>> {
        (**self).read_topics()
    }

    fn read_messages<'a>(&'a self, filter: &MessageFilter) -> Result<RawMessageStream<'a>> {
        (**self).read_messages(filter)
    }

    fn time_range(&self) -> Result<(Time, Time)> {
        (**self).time_range()
    }

    fn message_counts(&self) -> Result<HashMap<String, u64>> {
        (**self).message_counts()
    }
}
