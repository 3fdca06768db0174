// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage format implementations for rosbag2 data.
//!
//! - [`sqlite`]: SQLite (`.db3`) storage, the rosbag2 default

pub mod sqlite;
