// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for rosbag2 storage.
//!
//! This module provides the foundational types and traits for reading
//! rosbag2 containers: byte sources, topic and message types, query
//! filters, and the storage implementations built on them.

pub mod detection;
pub mod formats;
pub mod metadata;
pub mod qos;
pub mod source;

// Re-exports
pub use detection::{is_sqlite_container, is_sqlite_file, list_bag_files};
pub use metadata::{RawMessage, TopicDefinition};
pub use qos::QosProfile;
pub use source::{BlobSource, ByteSource, FileSource};

// Trait implemented by every storage backend
pub mod traits;
pub use traits::{MessageStorage, RawMessageStream};

// Filter and query construction
pub mod filter;
pub use filter::{MessageFilter, MessageQuery};

// Multi-file bag reader
pub mod reader;
pub use reader::{Rosbag2, Rosbag2Builder};
