// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topic and message types shared by every storage implementation.

use serde::{Deserialize, Serialize};

use crate::core::Time;
use crate::io::qos::QosProfile;

/// Description of one topic in a bag.
///
/// A topic is a named, typed channel of messages. Names are unique within
/// a single container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDefinition {
    /// Topic name (e.g., "/rosout", "/tf")
    pub name: String,
    /// Message type name (e.g., "rcl_interfaces/msg/Log")
    #[serde(rename = "type")]
    pub message_type: String,
    /// Payload serialization format (e.g., "cdr")
    pub serialization_format: String,
    /// QoS profiles offered by the recorded publishers
    pub offered_qos_profiles: Vec<QosProfile>,
}

impl TopicDefinition {
    /// Create a new TopicDefinition with no QoS profiles.
    pub fn new(
        name: impl Into<String>,
        message_type: impl Into<String>,
        serialization_format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message_type: message_type.into(),
            serialization_format: serialization_format.into(),
            offered_qos_profiles: Vec::new(),
        }
    }

    /// Set the offered QoS profiles.
    pub fn with_qos_profiles(mut self, profiles: Vec<QosProfile>) -> Self {
        self.offered_qos_profiles = profiles;
        self
    }
}

/// One row of the messages table before its topic is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageRow {
    pub topic_id: i64,
    pub timestamp: u64,
    pub data: Vec<u8>,
}

/// Raw message data with its topic (undecoded).
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    /// Topic the message was recorded on
    pub topic: TopicDefinition,
    /// Receive timestamp
    pub timestamp: Time,
    /// Serialized payload bytes, opaque to this crate
    pub data: Vec<u8>,
}

impl RawMessage {
    /// Create a new RawMessage.
    pub fn new(topic: TopicDefinition, timestamp: Time, data: Vec<u8>) -> Self {
        Self {
            topic,
            timestamp,
            data,
        }
    }

    /// Receive timestamp in nanoseconds since the Unix epoch.
    pub fn log_time(&self) -> u64 {
        self.timestamp.to_nanos()
    }

    /// Get the data length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the message has no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
