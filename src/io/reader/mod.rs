// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Multi-file rosbag2 reader.
//!
//! A recorded bag may be split across several storage files. [`Rosbag2`]
//! presents them as one bag: topics are merged by name, time ranges and
//! counts are combined, and message queries run over every file in split
//! order.
//!
//! # Example
//!
//! ```rust,no_run
//! use rosbag2_sqlite::io::reader::Rosbag2;
//! use rosbag2_sqlite::MessageFilter;
//!
//! let bag = Rosbag2::open_dir("rosbag2_2020_04_02-21_23_55")?;
//! let (start, end) = bag.time_range()?;
//! println!("{} files, {start} .. {end}", bag.len());
//! for msg in bag.read_messages(&MessageFilter::new().with_topics(["/rosout"]))? {
//!     println!("{}", msg?.timestamp);
//! }
//! # Ok::<(), rosbag2_sqlite::StorageError>(())
//! ```

pub mod builder;

pub use builder::{BagEntry, Rosbag2Builder, StorageFactory};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::Time;
use crate::io::detection::list_bag_files;
use crate::io::filter::MessageFilter;
use crate::io::metadata::{RawMessage, TopicDefinition};
use crate::io::traits::{MessageStorage, RawMessageStream};
use crate::{Result, StorageError};

/// One storage file of an assembled bag.
struct BagFile {
    relative_path: PathBuf,
    storage: Box<dyn MessageStorage>,
}

/// A bag made of one or more storage files.
pub struct Rosbag2 {
    files: Vec<BagFile>,
    open: bool,
}

impl Rosbag2 {
    /// Create an unopened bag, building one storage per entry with `factory`.
    ///
    /// Entries keep the given order.
    pub fn new(entries: Vec<BagEntry>, factory: StorageFactory) -> Self {
        let files = entries
            .into_iter()
            .map(|entry| BagFile {
                storage: factory(&entry.relative_path, entry.source),
                relative_path: entry.relative_path,
            })
            .collect();
        Self { files, open: false }
    }

    /// Open a single `.db3` file as a bag.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut bag = Rosbag2Builder::new().file(path).build();
        bag.open()?;
        Ok(bag)
    }

    /// Open every `.db3` file found under `dir`.
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let files = list_bag_files(dir)?;
        debug!(dir = %dir.display(), files = files.len(), "Found bag files");
        let mut bag = Rosbag2Builder::new().files_under(dir, files).build();
        bag.open()?;
        Ok(bag)
    }

    /// Relative paths of the storage files, in query order.
    pub fn files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.files.iter().map(|f| f.relative_path.as_path())
    }

    /// Number of storage files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the bag has no storage files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check whether the bag is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(StorageError::not_open(operation))
        }
    }

    /// Open every storage file.
    ///
    /// If any file fails, the files opened so far are closed again and the
    /// first error is returned.
    pub fn open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }
        for i in 0..self.files.len() {
            if let Err(e) = self.files[i].storage.open() {
                warn!(
                    file = %self.files[i].relative_path.display(),
                    error = %e,
                    "Failed to open bag file"
                );
                for opened in &mut self.files[..i] {
                    if let Err(close_err) = opened.storage.close() {
                        debug!(error = %close_err, "Error closing bag file after failed open");
                    }
                }
                return Err(e);
            }
        }
        self.open = true;
        info!(files = self.files.len(), "Opened bag");
        Ok(())
    }

    /// Close every storage file.
    ///
    /// All files are closed even if some fail; the first error is returned.
    pub fn close(&mut self) -> Result<()> {
        let mut result = Ok(());
        for file in &mut self.files {
            let closed = file.storage.close();
            if result.is_ok() {
                result = closed;
            }
        }
        self.open = false;
        result
    }

    /// Topics of every file, de-duplicated by name. First occurrence wins.
    pub fn read_topics(&self) -> Result<Vec<TopicDefinition>> {
        self.ensure_open("reading topics")?;
        let mut seen = HashSet::new();
        let mut topics = Vec::new();
        for file in &self.files {
            for topic in file.storage.read_topics()? {
                if seen.insert(topic.name.clone()) {
                    topics.push(topic);
                }
            }
        }
        Ok(topics)
    }

    /// Messages matching `filter` from each file in turn.
    ///
    /// Each file's query starts when the previous file is exhausted.
    pub fn read_messages<'a>(
        &'a self,
        filter: &MessageFilter,
    ) -> Result<impl Iterator<Item = Result<RawMessage>> + 'a> {
        self.ensure_open("reading messages")?;
        let filter = filter.clone();
        Ok(self.files.iter().flat_map(move |file| {
            match file.storage.read_messages(&filter) {
                Ok(stream) => stream,
                Err(e) => Box::new(std::iter::once(Err(e))) as RawMessageStream<'a>,
            }
        }))
    }

    /// Earliest start and latest end over files that hold messages.
    ///
    /// A bag without messages reports `(Time::ZERO, Time::ZERO)`.
    pub fn time_range(&self) -> Result<(Time, Time)> {
        self.ensure_open("reading the time range")?;
        let mut range: Option<(Time, Time)> = None;
        for file in &self.files {
            let (start, end) = file.storage.time_range()?;
            if (start, end) == (Time::ZERO, Time::ZERO) {
                continue;
            }
            range = Some(match range {
                Some((s, e)) => (s.min(start), e.max(end)),
                None => (start, end),
            });
        }
        Ok(range.unwrap_or((Time::ZERO, Time::ZERO)))
    }

    /// Message count per topic name, summed over files.
    pub fn message_counts(&self) -> Result<HashMap<String, u64>> {
        self.ensure_open("counting messages")?;
        let mut counts = HashMap::new();
        for file in &self.files {
            for (topic, count) in file.storage.message_counts()? {
                *counts.entry(topic).or_insert(0) += count;
            }
        }
        Ok(counts)
    }
}

impl Drop for Rosbag2 {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.close() {
                debug!(error = %e, "Error closing bag on drop");
            }
        }
    }
}

impl std::fmt::Debug for Rosbag2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rosbag2")
            .field("files", &self.files().collect::<Vec<_>>())
            .field("open", &self.open)
            .finish()
    }
}

impl MessageStorage for Rosbag2 {
    fn open(&mut self) -> Result<()> {
        Rosbag2::open(self)
    }

    fn close(&mut self) -> Result<()> {
        Rosbag2::close(self)
    }

    fn is_open(&self) -> bool {
        Rosbag2::is_open(self)
    }

    fn read_topics(&self) -> Result<Vec<TopicDefinition>> {
        Rosbag2::read_topics(self)
    }

    fn read_messages<'a>(&'a self, filter: &MessageFilter) -> Result<RawMessageStream<'a>> {
        Ok(Box::new(Rosbag2::read_messages(self, filter)?))
    }

    fn time_range(&self) -> Result<(Time, Time)> {
        Rosbag2::time_range(self)
    }

    fn message_counts(&self) -> Result<HashMap<String, u64>> {
        Rosbag2::message_counts(self)
    }
}
