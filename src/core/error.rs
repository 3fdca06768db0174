// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for rosbag2-sqlite.
//!
//! Every failure surfaces as a [`StorageError`]. Variants fall into five
//! [`ErrorKind`]s so callers can branch on the class of failure without
//! matching every variant:
//! - container format problems
//! - lifecycle (state) misuse
//! - catalog/messages consistency violations
//! - I/O failures from a byte source
//! - SQLite engine failures

use std::fmt;

/// Class of a [`StorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bytes are not a usable container.
    Format,
    /// The operation was called before `open()` or after `close()`.
    State,
    /// The container disagrees with itself.
    Consistency,
    /// The byte source failed.
    Io,
    /// The embedded engine failed to run a query.
    Engine,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Format => "format",
            ErrorKind::State => "state",
            ErrorKind::Consistency => "consistency",
            ErrorKind::Io => "io",
            ErrorKind::Engine => "engine",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while reading a bag container.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Fewer bytes than the smallest valid container.
    #[error(
        "Did not read a valid SQLite container: reported size is {reported_size}, read {bytes_read} bytes"
    )]
    InvalidContainer {
        /// Size the byte source claims to have
        reported_size: u64,
        /// Bytes actually read
        bytes_read: usize,
    },

    /// The engine rejected the bytes as a database.
    #[error("Not a SQLite database: {0}")]
    NotADatabase(String),

    /// The offered QoS profile text of a topic could not be parsed.
    #[error("Invalid QoS profiles for topic '{topic}': {message}")]
    InvalidQos {
        /// Topic the profile belongs to
        topic: String,
        /// Parser message
        message: String,
    },

    /// Operation requires an open accessor.
    #[error("Call open() before {operation}")]
    NotOpen {
        /// What the caller tried to do
        operation: &'static str,
    },

    /// A message row references a topic id missing from the catalog.
    #[error("Message references unknown topic id {topic_id}")]
    UnknownTopicId {
        /// Topic id found in the messages table
        topic_id: i64,
    },

    /// A timestamp column holds a value that is not a valid nanosecond count.
    #[error("Invalid message timestamp {value}")]
    InvalidTimestamp {
        /// Raw column value
        value: i64,
    },

    /// Byte source failure, propagated unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Query failure from SQLite.
    #[error("SQLite error: {0}")]
    Engine(#[from] rusqlite::Error),
}

impl StorageError {
    /// Create a "not open" state error for the named operation.
    pub fn not_open(operation: &'static str) -> Self {
        StorageError::NotOpen { operation }
    }

    /// Create a container-too-small format error.
    pub fn invalid_container(reported_size: u64, bytes_read: usize) -> Self {
        StorageError::InvalidContainer {
            reported_size,
            bytes_read,
        }
    }

    /// Create a QoS parse error.
    pub fn invalid_qos(topic: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::InvalidQos {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Convert an engine error, reclassifying "file is not a database"
    /// failures as format errors.
    pub fn from_engine(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::NotADatabase) => StorageError::NotADatabase(err.to_string()),
            _ => StorageError::Engine(err),
        }
    }

    /// Class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::InvalidContainer { .. }
            | StorageError::NotADatabase(_)
            | StorageError::InvalidQos { .. } => ErrorKind::Format,
            StorageError::NotOpen { .. } => ErrorKind::State,
            StorageError::UnknownTopicId { .. } | StorageError::InvalidTimestamp { .. } => {
                ErrorKind::Consistency
            }
            StorageError::Io(_) => ErrorKind::Io,
            StorageError::Engine(_) => ErrorKind::Engine,
        }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("kind", self.kind().to_string())];
        match self {
            StorageError::InvalidContainer {
                reported_size,
                bytes_read,
            } => {
                fields.push(("reported_size", reported_size.to_string()));
                fields.push(("bytes_read", bytes_read.to_string()));
            }
            StorageError::NotADatabase(msg) => fields.push(("message", msg.clone())),
            StorageError::InvalidQos { topic, message } => {
                fields.push(("topic", topic.clone()));
                fields.push(("message", message.clone()));
            }
            StorageError::NotOpen { operation } => {
                fields.push(("operation", operation.to_string()))
            }
            StorageError::UnknownTopicId { topic_id } => {
                fields.push(("topic_id", topic_id.to_string()))
            }
            StorageError::InvalidTimestamp { value } => fields.push(("value", value.to_string())),
            StorageError::Io(err) => fields.push(("message", err.to_string())),
            StorageError::Engine(err) => fields.push(("message", err.to_string())),
        }
        fields
    }
}

/// Result type for rosbag2-sqlite operations.
pub type Result<T> = std::result::Result<T, StorageError>;
