// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builder pattern for assembling multi-file bags.
//!
//! The `Rosbag2Builder` collects `(relative path, byte source)` entries and
//! turns each into a storage accessor through a factory when the bag is
//! built.

use std::path::{Path, PathBuf};

use crate::io::detection::compare_bag_paths;
use crate::io::formats::sqlite::{SqliteStorage, StorageConfig};
use crate::io::source::{ByteSource, FileSource};
use crate::io::traits::MessageStorage;

use super::Rosbag2;

/// Creates the storage accessor for one bag file.
pub type StorageFactory = Box<dyn Fn(&Path, Box<dyn ByteSource>) -> Box<dyn MessageStorage>>;

/// One storage file of a bag, not yet opened.
pub struct BagEntry {
    /// Path of the file relative to the bag root
    pub relative_path: PathBuf,
    /// Where the file's bytes come from
    pub source: Box<dyn ByteSource>,
}

impl BagEntry {
    /// Create an entry.
    pub fn new(relative_path: impl Into<PathBuf>, source: impl ByteSource + 'static) -> Self {
        Self {
            relative_path: relative_path.into(),
            source: Box::new(source),
        }
    }
}

impl std::fmt::Debug for BagEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BagEntry")
            .field("relative_path", &self.relative_path)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Rosbag2`].
///
/// Without an explicit factory every entry becomes a [`SqliteStorage`]
/// using the builder's [`StorageConfig`].
///
/// # Example
///
/// ```rust,no_run
/// use rosbag2_sqlite::io::reader::Rosbag2Builder;
/// use rosbag2_sqlite::StorageConfig;
///
/// let mut bag = Rosbag2Builder::new()
///     .file("bag/bag_0.db3")
///     .file("bag/bag_1.db3")
///     .config(StorageConfig::default().with_validate_magic(true))
///     .build();
/// bag.open()?;
/// # Ok::<(), rosbag2_sqlite::StorageError>(())
/// ```
#[derive(Default)]
pub struct Rosbag2Builder {
    entries: Vec<BagEntry>,
    config: StorageConfig,
    factory: Option<StorageFactory>,
}

impl Rosbag2Builder {
    /// Create a new builder with no entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry reading from `source`.
    pub fn entry(mut self, relative_path: impl Into<PathBuf>, source: impl ByteSource + 'static) -> Self {
        self.entries.push(BagEntry::new(relative_path, source));
        self
    }

    /// Add a file on disk. Its relative path is the file name.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let relative_path = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());
        self.entries.push(BagEntry::new(relative_path, FileSource::new(path)));
        self
    }

    /// Add files on disk, relative to `root`.
    pub fn files_under<P, I>(mut self, root: P, files: I) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = PathBuf>,
    {
        let root = root.as_ref();
        for path in files {
            let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            self.entries.push(BagEntry::new(relative_path, FileSource::new(&path)));
        }
        self
    }

    /// Set the configuration for the default SQLite factory.
    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default SQLite factory.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Path, Box<dyn ByteSource>) -> Box<dyn MessageStorage> + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create the (unopened) bag, ordering its files by split number.
    pub fn build(self) -> Rosbag2 {
        let config = self.config;
        let factory = self.factory.unwrap_or_else(|| {
            Box::new(move |_: &Path, source: Box<dyn ByteSource>| {
                Box::new(SqliteStorage::with_config(source, config.clone())) as Box<dyn MessageStorage>
            })
        });
        let mut entries = self.entries;
        entries.sort_by(|a, b| compare_bag_paths(&a.relative_path, &b.relative_path));
        Rosbag2::new(entries, factory)
    }
}
