// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! SQLite (`.db3`) storage implementation.
//!
//! This module provides a read-only rosbag2 SQLite accessor with:
//! - In-memory loading of the whole container from any byte source
//! - Topic catalog with parsed QoS profiles
//! - Filtered, lazily stepped message queries
//! - Time range and per-topic message count aggregates

// Topic catalog
pub mod catalog;

// Open options
pub mod config;

// Prepared-statement cursor
mod cursor;

// Process-wide engine handle
pub mod engine;

// Storage accessor
pub mod storage;

// Re-exports
pub use catalog::TopicCatalog;
pub use config::{StorageConfig, MIN_CONTAINER_SIZE};
pub use engine::{engine, Engine};
pub use storage::{MessageIter, SqliteStorage};
