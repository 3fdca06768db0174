// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Tests for the SQLite storage accessor.
//!
//! Run with: cargo test --test storage_tests

mod common;

use std::collections::HashMap;
use std::time::Duration;

use common::{bag_end, bag_start, talker_container, talker_container_with, BAG_END, BAG_START};
use rosbag2_sqlite::io::qos::{DurabilityPolicy, HistoryPolicy, ReliabilityPolicy};
use rosbag2_sqlite::{
    BlobSource, ErrorKind, FileSource, MessageFilter, MessageStorage, RawMessage, SqliteStorage,
    StorageConfig, StorageError, Time,
};

fn open_talker() -> SqliteStorage {
    let mut storage = SqliteStorage::from_bytes(talker_container());
    storage.open().expect("open talker container");
    storage
}

fn drain(storage: &SqliteStorage, filter: &MessageFilter) -> Vec<RawMessage> {
    storage
        .read_messages(filter)
        .expect("query messages")
        .collect::<rosbag2_sqlite::Result<_>>()
        .expect("read messages")
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn test_read_topics() {
    let storage = open_talker();
    let topics = storage.read_topics().unwrap();
    assert_eq!(topics.len(), 3);

    let names: Vec<_> = topics.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["/rosout", "/parameter_events", "/topic"]);

    let rosout = &topics[0];
    assert_eq!(rosout.message_type, "rcl_interfaces/msg/Log");
    assert_eq!(rosout.serialization_format, "cdr");
    assert_eq!(rosout.offered_qos_profiles.len(), 1);
    let qos = &rosout.offered_qos_profiles[0];
    assert_eq!(qos.history, HistoryPolicy::Unknown);
    assert_eq!(qos.reliability, ReliabilityPolicy::Reliable);
    assert_eq!(qos.durability, DurabilityPolicy::TransientLocal);
    assert_eq!(qos.deadline, None);
    assert_eq!(qos.lifespan, Some(Time::new(10, 0)));

    assert!(topics[2].offered_qos_profiles.is_empty());
    assert_eq!(topics[2].message_type, "std_msgs/msg/String");
}

#[test]
fn test_catalog_lookup() {
    let storage = open_talker();
    let catalog = storage.catalog().unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.topic_id("/topic"), Some(3));
    assert_eq!(catalog.topic(2).unwrap().name, "/parameter_events");
    assert!(catalog.topic_id("/chatter").is_none());
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_time_range() {
    let storage = open_talker();
    let (start, end) = storage.time_range().unwrap();
    assert_eq!(start, Time::new(1_585_866_235, 112_411_371));
    assert_eq!(end, Time::new(1_585_866_239, 643_508_139));
    assert_eq!(start.to_nanos(), BAG_START);
    assert_eq!(end.to_nanos(), BAG_END);
}

#[test]
fn test_time_range_without_messages() {
    let mut storage = SqliteStorage::from_bytes(talker_container_with(&[]));
    storage.open().unwrap();
    assert_eq!(storage.time_range().unwrap(), (Time::ZERO, Time::ZERO));
    assert_eq!(storage.read_topics().unwrap().len(), 3);
}

#[test]
fn test_message_counts() {
    let storage = open_talker();
    let counts = storage.message_counts().unwrap();
    let expected: HashMap<String, u64> =
        HashMap::from([("/rosout".to_string(), 10), ("/topic".to_string(), 10)]);
    assert_eq!(counts, expected);
    assert!(!counts.contains_key("/parameter_events"));
}

#[test]
fn test_message_counts_match_unfiltered_drain() {
    let storage = open_talker();
    let total: u64 = storage.message_counts().unwrap().values().sum();
    let drained = drain(&storage, &MessageFilter::new());
    assert_eq!(drained.len() as u64, total);
    assert_eq!(storage.message_count().unwrap(), total);
}

// ============================================================================
// Message queries
// ============================================================================

#[test]
fn test_read_all_messages() {
    let storage = open_talker();
    let messages = drain(&storage, &MessageFilter::new());
    assert_eq!(messages.len(), 20);

    let first = &messages[0];
    assert_eq!(first.topic.name, "/topic");
    assert_eq!(first.timestamp, bag_start());
    assert_eq!(first.len(), 24);

    let last = messages.last().unwrap();
    assert_eq!(last.topic.name, "/rosout");
    assert_eq!(last.timestamp, bag_end());
    assert_eq!(last.len(), 176);

    assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_filter_by_topic() {
    let storage = open_talker();
    let messages = drain(&storage, &MessageFilter::new().with_topics(["/topic"]));
    assert_eq!(messages.len(), 10);
    assert!(messages.iter().all(|m| m.topic.name == "/topic"));
    assert!(messages
        .iter()
        .all(|m| m.topic.message_type == "std_msgs/msg/String"));
}

#[test]
fn test_filter_by_several_topics() {
    let storage = open_talker();
    let filter = MessageFilter::new().with_topics(["/topic", "/rosout", "/topic"]);
    assert_eq!(drain(&storage, &filter).len(), 20);
}

#[test]
fn test_filter_unknown_topics_is_empty() {
    let storage = open_talker();
    let filter = MessageFilter::new().with_topics(["/chatter", "/does_not_exist"]);
    assert!(drain(&storage, &filter).is_empty());

    let filter = MessageFilter::new().with_topics(["/parameter_events"]);
    assert!(drain(&storage, &filter).is_empty());

    let filter = MessageFilter::new().with_topics(Vec::<String>::new());
    assert!(drain(&storage, &filter).is_empty());
}

#[test]
fn test_filter_start_time_is_inclusive() {
    let storage = open_talker();
    let filter = MessageFilter::new().with_start_time(bag_start() + Duration::from_secs(1));
    assert_eq!(drain(&storage, &filter).len(), 16);

    let filter = MessageFilter::new().with_start_time(bag_end());
    let messages = drain(&storage, &filter);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].timestamp, bag_end());
}

#[test]
fn test_filter_end_time_is_exclusive() {
    let storage = open_talker();
    let filter = MessageFilter::new().with_end_time(bag_end() - Duration::from_secs(2));
    assert_eq!(drain(&storage, &filter).len(), 12);

    let filter = MessageFilter::new().with_end_time(bag_start());
    assert!(drain(&storage, &filter).is_empty());

    let filter = MessageFilter::new().with_end_time(bag_end());
    assert_eq!(drain(&storage, &filter).len(), 19);
}

#[test]
fn test_filter_time_range_and_topic() {
    let storage = open_talker();
    let filter = MessageFilter::new()
        .with_time_range(
            bag_start() + Duration::from_secs(1),
            bag_end() - Duration::from_secs(2),
        )
        .with_topics(["/rosout"]);
    let messages = drain(&storage, &filter);
    assert_eq!(messages.len(), 4);
    assert!(messages.iter().all(|m| m.topic.name == "/rosout"));
}

#[test]
fn test_filter_past_signed_range_saturates() {
    let storage = open_talker();
    let filter = MessageFilter::new().with_start_time(Time::new(i64::MAX, 0));
    assert!(drain(&storage, &filter).is_empty());

    let filter = MessageFilter::new().with_end_time(Time::new(i64::MAX, 0));
    assert_eq!(drain(&storage, &filter).len(), 20);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_operations_before_open_fail() {
    let storage = SqliteStorage::from_bytes(talker_container());
    for err in [
        storage.read_topics().unwrap_err(),
        storage.time_range().unwrap_err(),
        storage.message_counts().unwrap_err(),
        storage.read_messages(&MessageFilter::new()).err().unwrap(),
    ] {
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(err.to_string().starts_with("Call open() before"), "{err}");
    }
}

#[test]
fn test_operations_after_close_fail() {
    let mut storage = open_talker();
    storage.close().unwrap();
    assert!(matches!(
        storage.read_topics(),
        Err(StorageError::NotOpen { .. })
    ));
    storage.close().unwrap();
}

#[test]
fn test_reopen_after_close() {
    let mut storage = open_talker();
    storage.close().unwrap();
    storage.open().unwrap();
    assert_eq!(storage.read_topics().unwrap().len(), 3);
    storage.close().unwrap();
}

#[test]
fn test_close_never_opened() {
    let mut storage = SqliteStorage::from_bytes(talker_container());
    storage.close().unwrap();
    storage.close().unwrap();
}

#[test]
fn test_container_too_small() {
    let mut storage = SqliteStorage::from_bytes(vec![0u8; 511]);
    let err = storage.open().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(
        err.to_string(),
        "Did not read a valid SQLite container: reported size is 511, read 511 bytes"
    );
    assert!(!storage.is_open());

    let mut storage = SqliteStorage::from_bytes(Vec::<u8>::new());
    assert!(matches!(
        storage.open(),
        Err(StorageError::InvalidContainer {
            reported_size: 0,
            bytes_read: 0
        })
    ));
}

#[test]
fn test_container_size_is_configurable() {
    let bytes = talker_container();
    let config = StorageConfig::default().with_min_container_size(bytes.len() + 1);
    let mut storage = SqliteStorage::with_config(BlobSource::from(bytes), config);
    assert_eq!(storage.open().unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_tiny_container_with_header_magic_fails_to_open() {
    let mut bytes = b"SQLite format 3\0".to_vec();
    bytes.extend_from_slice(&[0x10, 0x00, 0x02]);
    let config = StorageConfig::default()
        .with_min_container_size(16)
        .with_validate_magic(true);
    let mut storage = SqliteStorage::with_config(BlobSource::from(bytes), config);
    assert!(storage.open().is_err());
    assert!(!storage.is_open());
}

#[test]
fn test_not_a_database() {
    let mut storage = SqliteStorage::from_bytes(vec![0xa5u8; 8192]);
    let err = storage.open().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format, "{err}");
    assert!(!storage.is_open());

    let config = StorageConfig::default().with_validate_magic(true);
    let mut storage = SqliteStorage::with_config(BlobSource::from(vec![0xa5u8; 8192]), config);
    assert!(matches!(storage.open(), Err(StorageError::NotADatabase(_))));
}

#[test]
fn test_missing_tables_is_engine_error() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE unrelated(x INTEGER); INSERT INTO unrelated VALUES (1);")
        .unwrap();
    let mut storage = SqliteStorage::from_bytes(common::serialize(&conn));
    let err = storage.open().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
    assert!(err.to_string().contains("no such table"), "{err}");
}

#[test]
fn test_invalid_qos_is_format_error() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    common::create_schema(&conn);
    common::insert_topic(&conn, 1, "/bad", "pkg/msg/Bad", "- history: [");
    let mut storage = SqliteStorage::from_bytes(common::serialize(&conn));
    let err = storage.open().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(err, StorageError::InvalidQos { ref topic, .. } if topic == "/bad"));
}

// ============================================================================
// Cursor release
// ============================================================================

#[test]
fn test_early_termination_then_close() {
    let mut storage = open_talker();
    {
        let mut messages = storage.read_messages(&MessageFilter::new()).unwrap();
        let first = messages.next().unwrap().unwrap();
        assert_eq!(first.timestamp, bag_start());
        assert_eq!(storage.live_cursors(), 1);
    }
    assert_eq!(storage.live_cursors(), 0);

    for (i, msg) in storage
        .read_messages(&MessageFilter::new())
        .unwrap()
        .enumerate()
    {
        msg.unwrap();
        if i == 4 {
            break;
        }
    }
    assert_eq!(storage.live_cursors(), 0);
    storage.close().unwrap();
}

#[test]
fn test_exhausted_iterator_releases_immediately() {
    let storage = open_talker();
    let mut messages = storage
        .read_messages(&MessageFilter::new().with_topics(["/topic"]))
        .unwrap();
    let mut n = 0;
    for msg in messages.by_ref() {
        msg.unwrap();
        n += 1;
    }
    assert_eq!(n, 10);
    assert!(messages.is_exhausted());
    assert_eq!(storage.live_cursors(), 0);
    assert!(messages.next().is_none());
}

#[test]
fn test_concurrent_iterators() {
    let storage = open_talker();
    let rosout = storage
        .read_messages(&MessageFilter::new().with_topics(["/rosout"]))
        .unwrap();
    let topic = storage
        .read_messages(&MessageFilter::new().with_topics(["/topic"]))
        .unwrap();
    assert_eq!(storage.live_cursors(), 2);

    let pairs: Vec<_> = rosout.zip(topic).collect();
    assert_eq!(pairs.len(), 10);
    for (a, b) in pairs {
        assert_eq!(a.unwrap().topic.name, "/rosout");
        assert_eq!(b.unwrap().topic.name, "/topic");
    }
}

#[test]
fn test_each_query_is_a_new_pass() {
    let storage = open_talker();
    let filter = MessageFilter::new().with_topics(["/rosout"]);
    let first = drain(&storage, &filter);
    let second = drain(&storage, &filter);
    assert_eq!(first, second);
}

// ============================================================================
// Consistency
// ============================================================================

#[test]
fn test_unknown_topic_id_in_messages() {
    let mut rows = common::talker_messages();
    rows.push(common::FixtureMessage {
        topic_id: 42,
        timestamp: (BAG_END + 1) as i64,
        data: vec![0; 8],
    });
    let mut storage = SqliteStorage::from_bytes(talker_container_with(&rows));
    storage.open().unwrap();

    let results: Vec<_> = storage.read_messages(&MessageFilter::new()).unwrap().collect();
    assert_eq!(results.len(), 21);
    assert!(results[..20].iter().all(|r| r.is_ok()));
    let err = results[20].as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert!(matches!(err, StorageError::UnknownTopicId { topic_id: 42 }));

    // Counts use an inner join, so the orphan row is not counted.
    assert_eq!(storage.message_count().unwrap(), 20);
}

// ============================================================================
// Byte sources
// ============================================================================

#[test]
fn test_file_source_matches_blob_source() {
    let bytes = talker_container();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, &bytes).unwrap();

    let mut from_file = SqliteStorage::new(FileSource::new(file.path()));
    from_file.open().unwrap();
    let mut from_blob = SqliteStorage::new(BlobSource::from(bytes));
    from_blob.open().unwrap();

    assert_eq!(from_file.read_topics().unwrap(), from_blob.read_topics().unwrap());
    assert_eq!(from_file.time_range().unwrap(), from_blob.time_range().unwrap());
    assert_eq!(
        from_file.message_counts().unwrap(),
        from_blob.message_counts().unwrap()
    );
    let filter = MessageFilter::new()
        .with_start_time(bag_start() + Duration::from_secs(1))
        .with_topics(["/rosout"]);
    assert_eq!(drain(&from_file, &filter), drain(&from_blob, &filter));

    from_file.close().unwrap();
    from_blob.close().unwrap();
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::from_path(dir.path().join("missing.db3"));
    let err = storage.open().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!storage.is_open());
}

#[test]
fn test_trait_object_access() {
    let mut storage: Box<dyn MessageStorage> = Box::new(SqliteStorage::from_bytes(talker_container()));
    storage.open().unwrap();
    let count = storage
        .read_messages(&MessageFilter::new().with_topics(["/topic"]))
        .unwrap()
        .count();
    assert_eq!(count, 10);
    assert_eq!(
        storage.topic_by_name("/rosout").unwrap().unwrap().message_type,
        "rcl_interfaces/msg/Log"
    );
    storage.close().unwrap();
}
