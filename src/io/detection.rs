// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Container detection and bag directory listing.
//!
//! A ROS 2 bag is a directory holding one or more SQLite files (`.db3`)
//! next to a `metadata.yaml`. This module identifies SQLite containers by
//! their header magic and collects the storage files of a bag directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use rosbag2_sqlite::io::detection::list_bag_files;
//!
//! for file in list_bag_files("rosbag2_2020_04_02-21_23_55")? {
//!     println!("{}", file.display());
//! }
//! # Ok::<(), rosbag2_sqlite::StorageError>(())
//! ```

use std::cmp::Ordering;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::Result;

/// Header magic at offset 0 of every SQLite 3 database.
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Header format version marking a database in WAL mode.
pub const WAL_FORMAT_VERSION: u8 = 2;

/// File extension of rosbag2 SQLite storage files.
pub const BAG_FILE_EXTENSION: &str = "db3";

/// Check whether `header` starts with the SQLite magic.
pub fn is_sqlite_container(header: &[u8]) -> bool {
    header.starts_with(SQLITE_MAGIC)
}

/// Check whether the file at `path` is a SQLite database.
///
/// Files too short to hold the magic are not.
pub fn is_sqlite_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    let mut file = File::open(path.as_ref())?;
    let mut header = [0u8; 16];
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..])? {
            0 => return Ok(false),
            n => filled += n,
        }
    }
    Ok(is_sqlite_container(&header))
}

/// Whether `path` has the `.db3` extension.
pub fn has_bag_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(BAG_FILE_EXTENSION))
}

/// Recursively list the `.db3` files under `dir`, in split order.
///
/// See [`compare_bag_paths`] for the ordering.
pub fn list_bag_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_bag_files(dir.as_ref(), &mut files)?;
    files.sort_by(|a, b| compare_bag_paths(a, b));
    Ok(files)
}

/// Order storage file paths the way a recorder numbers its splits.
///
/// Paths compare component by component. Within a component, runs of ASCII
/// digits compare by numeric value, so `bag_2.db3` sorts before
/// `bag_10.db3`. Ties fall back to plain path order.
pub fn compare_bag_paths(a: &Path, b: &Path) -> Ordering {
    let mut left = a.components();
    let mut right = b.components();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_natural(
                    &x.as_os_str().to_string_lossy(),
                    &y.as_os_str().to_string_lossy(),
                );
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_natural(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a.as_bytes(), b.as_bytes());
    while let (Some(&x), Some(&y)) = (a.first(), b.first()) {
        if x.is_ascii_digit() && y.is_ascii_digit() {
            let (run_a, rest_a) = split_digits(a);
            let (run_b, rest_b) = split_digits(b);
            let ord = compare_digit_runs(run_a, run_b);
            if ord != Ordering::Equal {
                return ord;
            }
            (a, b) = (rest_a, rest_b);
        } else {
            if x != y {
                return x.cmp(&y);
            }
            (a, b) = (&a[1..], &b[1..]);
        }
    }
    a.len().cmp(&b.len())
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().position(|&c| c != b'0').unwrap_or(s.len()) };
    let (a, b) = (&a[trim(a)..], &b[trim(b)..]);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn collect_bag_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_bag_files(&path, files)?;
        } else if file_type.is_file() && has_bag_extension(&path) {
            files.push(path);
        }
    }
    Ok(())
}
