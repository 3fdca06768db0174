// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message filtering and query construction.
//!
//! A [`MessageFilter`] describes which messages a caller wants. It is turned
//! into a [`MessageQuery`]: a flat list of typed [`Predicate`]s joined with
//! AND. The query is rendered to SQL text plus positional parameters exactly
//! once, when a cursor is prepared.
//!
//! Time bounds form the half-open interval `[start_time, end_time)`.

use std::fmt;

use crate::core::Time;

/// Base statement over the messages table.
pub const SELECT_MESSAGES: &str = "select topic_id, timestamp, data from messages";

/// Which messages to read.
///
/// Every field is optional; an empty filter reads the whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Inclusive lower bound on the message timestamp
    pub start_time: Option<Time>,
    /// Exclusive upper bound on the message timestamp
    pub end_time: Option<Time>,
    /// Topic names to include. Names unknown to the bag are ignored, so a
    /// set containing only unknown names selects nothing.
    pub topics: Option<Vec<String>>,
}

impl MessageFilter {
    /// Create a filter selecting every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive start time.
    pub fn with_start_time(mut self, start: Time) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Set the exclusive end time.
    pub fn with_end_time(mut self, end: Time) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Set both time bounds, `[start, end)`.
    pub fn with_time_range(self, start: Time, end: Time) -> Self {
        self.with_start_time(start).with_end_time(end)
    }

    /// Restrict to the given topic names.
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = Some(topics.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the filter selects every message.
    pub fn is_unfiltered(&self) -> bool {
        self.start_time.is_none() && self.end_time.is_none() && self.topics.is_none()
    }
}

/// Column of the messages table a predicate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    TopicId,
    Timestamp,
}

impl Column {
    /// Column name in SQL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::TopicId => "topic_id",
            Column::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One condition on a message row.
///
/// Values are exact 64-bit integers and are always bound as parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `column >= value`
    Ge(Column, i64),
    /// `column < value`
    Lt(Column, i64),
    /// `column = value`
    Eq(Column, i64),
    /// `column in (values...)`
    In(Column, Vec<i64>),
    /// Matches no row.
    Never(Column),
}

impl Predicate {
    fn render(&self, sql: &mut String, params: &mut Vec<i64>) {
        match self {
            Predicate::Ge(col, v) => {
                sql.push_str(&format!("{col} >= ?"));
                params.push(*v);
            }
            Predicate::Lt(col, v) => {
                sql.push_str(&format!("{col} < ?"));
                params.push(*v);
            }
            Predicate::Eq(col, v) => {
                sql.push_str(&format!("{col} = ?"));
                params.push(*v);
            }
            Predicate::In(col, values) => {
                let marks = vec!["?"; values.len()].join(",");
                sql.push_str(&format!("{col} in ({marks})"));
                params.extend_from_slice(values);
            }
            // NULL never compares equal, so this holds for no row.
            Predicate::Never(col) => sql.push_str(&format!("{col} = NULL")),
        }
    }
}

/// SQL text and its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<i64>,
}

/// Typed query over the messages table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    predicates: Vec<Predicate>,
}

impl MessageQuery {
    /// Build the predicates for `filter`.
    ///
    /// `resolve` maps a topic name to its id; names it does not know are
    /// dropped.
    pub fn build<F>(filter: &MessageFilter, resolve: F) -> Self
    where
        F: Fn(&str) -> Option<i64>,
    {
        let mut predicates = Vec::new();

        if let Some(start) = filter.start_time {
            predicates.push(Predicate::Ge(Column::Timestamp, encode_time(start)));
        }
        if let Some(end) = filter.end_time {
            predicates.push(Predicate::Lt(Column::Timestamp, encode_time(end)));
        }
        if let Some(topics) = &filter.topics {
            let mut ids: Vec<i64> = Vec::with_capacity(topics.len());
            for name in topics {
                match resolve(name) {
                    Some(id) if !ids.contains(&id) => ids.push(id),
                    Some(_) => {}
                    None => tracing::debug!(topic = %name, "Ignoring unknown topic in filter"),
                }
            }
            predicates.push(match ids.as_slice() {
                [] => Predicate::Never(Column::TopicId),
                [id] => Predicate::Eq(Column::TopicId, *id),
                _ => Predicate::In(Column::TopicId, ids),
            });
        }

        Self { predicates }
    }

    /// The accumulated predicates, in render order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Render to SQL with `?` placeholders.
    pub fn render(&self) -> RenderedQuery {
        let mut sql = String::from(SELECT_MESSAGES);
        let mut params = Vec::new();
        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if i == 0 { " where " } else { " and " });
            predicate.render(&mut sql, &mut params);
        }
        RenderedQuery { sql, params }
    }
}

/// Encode a time as the engine's nanosecond integer.
///
/// Counts beyond `i64::MAX` saturate.
pub fn encode_time(time: Time) -> i64 {
    i64::try_from(time.to_nanos()).unwrap_or(i64::MAX)
}
