// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # rosbag2-sqlite
//!
//! Read-only access to ROS 2 bags stored in SQLite (`.db3`) containers.
//!
//! The library is organized by layer:
//! - `core/` - Error types and timestamps
//! - `io/source/` - Byte sources (in-memory blobs and files)
//! - `io/formats/sqlite/` - The SQLite storage accessor
//! - `io/reader/` - Multi-file bags
//!
//! A container is loaded whole into an in-memory SQLite database. Topics
//! are read once into a catalog; messages are queried lazily, filtered by
//! time range and topic name.
//!
//! ## Example: Reading a storage file
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rosbag2_sqlite::{MessageFilter, SqliteStorage};
//!
//! let mut storage = SqliteStorage::from_path("talker/talker_0.db3");
//! storage.open()?;
//!
//! let (start, end) = storage.time_range()?;
//! let filter = MessageFilter::new()
//!     .with_time_range(start, end)
//!     .with_topics(["/rosout"]);
//! for msg in storage.read_messages(&filter)? {
//!     let msg = msg?;
//!     println!("{} {} {} bytes", msg.timestamp, msg.topic.name, msg.len());
//! }
//!
//! storage.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Reading a bag directory
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rosbag2_sqlite::Rosbag2;
//!
//! let bag = Rosbag2::open_dir("rosbag2_2020_04_02-21_23_55")?;
//! for (topic, count) in bag.message_counts()? {
//!     println!("{topic}: {count}");
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{ErrorKind, Result, StorageError, Time};

// I/O types (sources, metadata, filters, formats, readers)
pub mod io;

// Re-export key I/O types
pub use io::formats::sqlite::{engine, MessageIter, SqliteStorage, StorageConfig};
pub use io::metadata::{RawMessage, TopicDefinition};
pub use io::qos::QosProfile;
pub use io::source::{BlobSource, ByteSource, FileSource};
pub use io::traits::MessageStorage;
pub use io::{MessageFilter, Rosbag2, Rosbag2Builder};
