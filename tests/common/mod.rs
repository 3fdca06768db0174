// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.
//!
//! Fixtures are built with rusqlite and serialized to bytes, mirroring the
//! layout of a `ros2 bag record` talker session: three topics, ten
//! `/rosout` log messages, ten `/topic` strings and no parameter events.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, DatabaseName};

use rosbag2_sqlite::Time;

// ============================================================================
// Talker fixture
// ============================================================================

/// First message timestamp in nanoseconds.
pub const BAG_START: u64 = 1_585_866_235_112_411_371;
/// Last message timestamp in nanoseconds.
pub const BAG_END: u64 = 1_585_866_239_643_508_139;

const HALF_SECOND: u64 = 500_000_000;
const ROSOUT_OFFSET: u64 = 30_000_000;

/// QoS profile text recorded for `/rosout`.
pub const ROSOUT_QOS: &str = "- history: 3
  depth: 0
  reliability: 1
  durability: 1
  deadline:
    sec: 2147483647
    nsec: 4294967295
  lifespan:
    sec: 10
    nsec: 0
  liveliness: 1
  liveliness_lease_duration:
    sec: 2147483647
    nsec: 4294967295
  avoid_ros_namespace_conventions: false
";

/// Topic rows: (id, name, type).
pub const TALKER_TOPICS: [(i64, &str, &str); 3] = [
    (1, "/rosout", "rcl_interfaces/msg/Log"),
    (2, "/parameter_events", "rcl_interfaces/msg/ParameterEvent"),
    (3, "/topic", "std_msgs/msg/String"),
];

pub fn bag_start() -> Time {
    Time::from_nanos(BAG_START)
}

pub fn bag_end() -> Time {
    Time::from_nanos(BAG_END)
}

/// One message row to insert.
#[derive(Debug, Clone)]
pub struct FixtureMessage {
    pub topic_id: i64,
    pub timestamp: i64,
    pub data: Vec<u8>,
}

/// Message rows of the talker fixture, in timestamp order.
pub fn talker_messages() -> Vec<FixtureMessage> {
    let mut messages = Vec::new();
    for k in 0..10u64 {
        messages.push(FixtureMessage {
            topic_id: 3,
            timestamp: (BAG_START + k * HALF_SECOND) as i64,
            data: payload(k as u8, 24),
        });
    }
    for k in 0..9u64 {
        messages.push(FixtureMessage {
            topic_id: 1,
            timestamp: (BAG_START + ROSOUT_OFFSET + k * HALF_SECOND) as i64,
            data: payload(0x80 + k as u8, 24 + 16 * k as usize),
        });
    }
    messages.push(FixtureMessage {
        topic_id: 1,
        timestamp: BAG_END as i64,
        data: payload(0x89, 176),
    });
    messages.sort_by_key(|m| m.timestamp);
    messages
}

fn payload(tag: u8, len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    // CDR little-endian encapsulation header
    data[1] = 0x01;
    for (i, b) in data.iter_mut().enumerate().skip(4) {
        *b = tag.wrapping_add(i as u8);
    }
    data
}

/// Create the bag schema on `conn`.
pub fn create_schema(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE schema(schema_version INTEGER PRIMARY KEY, ros_distro TEXT NOT NULL);
         CREATE TABLE topics(id INTEGER PRIMARY KEY, name TEXT NOT NULL, type TEXT NOT NULL,
             serialization_format TEXT NOT NULL, offered_qos_profiles TEXT NOT NULL);
         CREATE TABLE messages(id INTEGER PRIMARY KEY, topic_id INTEGER NOT NULL,
             timestamp INTEGER NOT NULL, data BLOB NOT NULL);
         CREATE INDEX timestamp_idx ON messages (timestamp ASC);
         INSERT INTO schema VALUES (3, 'foxy');",
    )
    .expect("create schema");
}

/// Insert a topic row.
pub fn insert_topic(conn: &Connection, id: i64, name: &str, message_type: &str, qos: &str) {
    conn.execute(
        "INSERT INTO topics (id, name, type, serialization_format, offered_qos_profiles)
         VALUES (?1, ?2, ?3, 'cdr', ?4)",
        params![id, name, message_type, qos],
    )
    .expect("insert topic");
}

/// Insert message rows.
pub fn insert_messages(conn: &Connection, messages: &[FixtureMessage]) {
    let mut stmt = conn
        .prepare("INSERT INTO messages (topic_id, timestamp, data) VALUES (?1, ?2, ?3)")
        .expect("prepare insert");
    for m in messages {
        stmt.execute(params![m.topic_id, m.timestamp, m.data])
            .expect("insert message");
    }
}

/// Serialize the main database of `conn` to container bytes.
pub fn serialize(conn: &Connection) -> Vec<u8> {
    conn.serialize(DatabaseName::Main)
        .expect("serialize database")
        .to_vec()
}

/// Talker container with the given message rows.
pub fn talker_container_with(messages: &[FixtureMessage]) -> Vec<u8> {
    let conn = Connection::open_in_memory().expect("open in-memory database");
    create_schema(&conn);
    for (id, name, message_type) in TALKER_TOPICS {
        let qos = if name == "/rosout" { ROSOUT_QOS } else { "" };
        insert_topic(&conn, id, name, message_type, qos);
    }
    insert_messages(&conn, messages);
    serialize(&conn)
}

/// The complete talker container.
pub fn talker_container() -> Vec<u8> {
    talker_container_with(&talker_messages())
}

// ============================================================================
// On-disk fixtures
// ============================================================================

/// Write `bytes` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture directory");
    }
    std::fs::write(&path, bytes).expect("write fixture");
    path
}

/// Write a talker bag directory split into two storage files at `split`.
///
/// Messages before `split` go to `talker_0.db3`, the rest to
/// `talker_1.db3`. A `metadata.yaml` is written alongside.
pub fn write_split_talker_bag(dir: &Path, split: u64) {
    let (first, second): (Vec<_>, Vec<_>) = talker_messages()
        .into_iter()
        .partition(|m| (m.timestamp as u64) < split);
    write_file(dir, "talker_0.db3", &talker_container_with(&first));
    write_file(dir, "talker_1.db3", &talker_container_with(&second));
    write_file(dir, "metadata.yaml", b"rosbag2_bagfile_information:\n  version: 4\n");
}
