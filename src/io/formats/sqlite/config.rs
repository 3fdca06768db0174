// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Configuration for opening SQLite bag containers.

/// Smallest valid SQLite file: one page of the minimum page size.
pub const MIN_CONTAINER_SIZE: usize = 512;

/// Options controlling how a [`SqliteStorage`](super::SqliteStorage) opens
/// its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Containers shorter than this are rejected before the engine sees them.
    /// Default: 512 bytes.
    pub min_container_size: usize,
    /// Check the SQLite header magic before handing bytes to the engine.
    /// Without it, a non-SQLite container is reported by the first query.
    /// Default: false.
    pub validate_magic: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            min_container_size: MIN_CONTAINER_SIZE,
            validate_magic: false,
        }
    }
}

impl StorageConfig {
    /// Set the minimum container size in bytes.
    pub fn with_min_container_size(mut self, size: usize) -> Self {
        self.min_container_size = size;
        self
    }

    /// Set whether the header magic is checked on open.
    pub fn with_validate_magic(mut self, enabled: bool) -> Self {
        self.validate_magic = enabled;
        self
    }
}
