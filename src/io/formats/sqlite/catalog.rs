// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topic catalog loaded from the `topics` table.

use std::collections::HashMap;

use rusqlite::Connection;
use tracing::warn;

use crate::io::metadata::TopicDefinition;
use crate::io::qos::parse_qos_profiles;
use crate::{Result, StorageError};

/// Statement reading every topic row.
pub const SELECT_TOPICS: &str =
    "select id, name, type, serialization_format, offered_qos_profiles from topics";

/// Snapshot of a container's topics, indexed by id and by name.
///
/// Built once when a storage is opened and never modified afterwards.
#[derive(Debug, Clone, Default)]
pub struct TopicCatalog {
    /// Topic ids in table order
    order: Vec<i64>,
    id_to_topic: HashMap<i64, TopicDefinition>,
    name_to_id: HashMap<String, i64>,
}

impl TopicCatalog {
    /// Read the topics table of `conn`.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut stmt = conn.prepare(SELECT_TOPICS).map_err(StorageError::from_engine)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(StorageError::from_engine)?;

        let mut catalog = TopicCatalog::default();
        for row in rows {
            let (id, name, message_type, serialization_format, qos) =
                row.map_err(StorageError::from_engine)?;
            let profiles = parse_qos_profiles(qos.as_deref().unwrap_or_default())
                .map_err(|message| StorageError::invalid_qos(&name, message))?;
            let topic =
                TopicDefinition::new(name, message_type, serialization_format).with_qos_profiles(profiles);
            catalog.insert(id, topic);
        }
        Ok(catalog)
    }

    fn insert(&mut self, id: i64, topic: TopicDefinition) {
        if let Some(previous_id) = self.name_to_id.insert(topic.name.clone(), id) {
            if previous_id != id {
                warn!(topic = %topic.name, previous_id, id, "Duplicate topic name in catalog");
            }
        }
        if self.id_to_topic.insert(id, topic).is_none() {
            self.order.push(id);
        }
    }

    /// Look up a topic by id.
    pub fn topic(&self, id: i64) -> Option<&TopicDefinition> {
        self.id_to_topic.get(&id)
    }

    /// Look up a topic id by name.
    pub fn topic_id(&self, name: &str) -> Option<i64> {
        self.name_to_id.get(name).copied()
    }

    /// All topics, in table order.
    pub fn topics(&self) -> impl Iterator<Item = &TopicDefinition> + '_ {
        self.order.iter().filter_map(|id| self.id_to_topic.get(id))
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the catalog has no topics.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
