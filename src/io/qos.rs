// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Quality-of-service profiles offered by a topic's publishers.
//!
//! rosbag2 stores `offered_qos_profiles` as a YAML sequence, one map per
//! publisher:
//!
//! ```yaml
//! - history: 3
//!   depth: 0
//!   reliability: 1
//!   durability: 2
//!   deadline:
//!     sec: 2147483647
//!     nsec: 4294967295
//!   lifespan:
//!     sec: 10
//!     nsec: 0
//!   liveliness: 1
//!   liveliness_lease_duration:
//!     sec: 2147483647
//!     nsec: 4294967295
//!   avoid_ros_namespace_conventions: false
//! ```
//!
//! Policies are written as integers by older recorders and as names
//! (`keep_last`, `reliable`, ...) by newer ones; both are accepted.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::core::Time;

/// History policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryPolicy {
    /// Use the middleware default
    #[default]
    SystemDefault,
    /// Keep the last `depth` samples
    KeepLast,
    /// Keep all samples
    KeepAll,
    /// Unrecognized value
    Unknown,
}

/// Reliability policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReliabilityPolicy {
    /// Use the middleware default
    #[default]
    SystemDefault,
    /// Guarantee delivery
    Reliable,
    /// Best effort delivery
    BestEffort,
    /// Unrecognized value
    Unknown,
}

/// Durability policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DurabilityPolicy {
    /// Use the middleware default
    #[default]
    SystemDefault,
    /// Late joiners receive past samples
    TransientLocal,
    /// Only live samples are delivered
    Volatile,
    /// Unrecognized value
    Unknown,
}

/// Liveliness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LivelinessPolicy {
    /// Use the middleware default
    #[default]
    SystemDefault,
    /// Asserted by the middleware
    Automatic,
    /// Asserted manually per node (deprecated in ROS 2)
    ManualByNode,
    /// Asserted manually per topic
    ManualByTopic,
    /// Unrecognized value
    Unknown,
}

/// One offered QoS profile.
///
/// Durations equal to the "infinite" or "unset" sentinels are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QosProfile {
    pub history: HistoryPolicy,
    pub depth: u32,
    pub reliability: ReliabilityPolicy,
    pub durability: DurabilityPolicy,
    pub deadline: Option<Time>,
    pub lifespan: Option<Time>,
    pub liveliness: LivelinessPolicy,
    pub liveliness_lease_duration: Option<Time>,
    pub avoid_ros_namespace_conventions: bool,
}

/// Parse the `offered_qos_profiles` text of a topic.
///
/// Empty text yields no profiles. Returns the parser message on failure.
pub fn parse_qos_profiles(text: &str) -> Result<Vec<QosProfile>, String> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(entries) => entries.iter().map(parse_profile).collect(),
        other => Err(format!(
            "expected a sequence of profiles, found {}",
            value_type(&other)
        )),
    }
}

fn parse_profile(entry: &Value) -> Result<QosProfile, String> {
    let Value::Mapping(map) = entry else {
        return Err(format!(
            "expected a profile mapping, found {}",
            value_type(entry)
        ));
    };
    let field = |name: &str| map.get(name);

    Ok(QosProfile {
        history: match policy(field("history"))? {
            Policy::Missing => HistoryPolicy::SystemDefault,
            Policy::Int(0) | Policy::Name("system_default") => HistoryPolicy::SystemDefault,
            Policy::Int(1) | Policy::Name("keep_last") => HistoryPolicy::KeepLast,
            Policy::Int(2) | Policy::Name("keep_all") => HistoryPolicy::KeepAll,
            _ => HistoryPolicy::Unknown,
        },
        depth: match field("depth") {
            None => 0,
            Some(v) => v
                .as_u64()
                .and_then(|d| u32::try_from(d).ok())
                .ok_or_else(|| format!("invalid depth: {v:?}"))?,
        },
        reliability: match policy(field("reliability"))? {
            Policy::Missing => ReliabilityPolicy::SystemDefault,
            Policy::Int(0) | Policy::Name("system_default") => ReliabilityPolicy::SystemDefault,
            Policy::Int(1) | Policy::Name("reliable") => ReliabilityPolicy::Reliable,
            Policy::Int(2) | Policy::Name("best_effort") => ReliabilityPolicy::BestEffort,
            _ => ReliabilityPolicy::Unknown,
        },
        durability: match policy(field("durability"))? {
            Policy::Missing => DurabilityPolicy::SystemDefault,
            Policy::Int(0) | Policy::Name("system_default") => DurabilityPolicy::SystemDefault,
            Policy::Int(1) | Policy::Name("transient_local") => DurabilityPolicy::TransientLocal,
            Policy::Int(2) | Policy::Name("volatile") => DurabilityPolicy::Volatile,
            _ => DurabilityPolicy::Unknown,
        },
        deadline: duration(field("deadline"))?,
        lifespan: duration(field("lifespan"))?,
        liveliness: match policy(field("liveliness"))? {
            Policy::Missing => LivelinessPolicy::SystemDefault,
            Policy::Int(0) | Policy::Name("system_default") => LivelinessPolicy::SystemDefault,
            Policy::Int(1) | Policy::Name("automatic") => LivelinessPolicy::Automatic,
            Policy::Int(2) | Policy::Name("manual_by_node") => LivelinessPolicy::ManualByNode,
            Policy::Int(3) | Policy::Name("manual_by_topic") => LivelinessPolicy::ManualByTopic,
            _ => LivelinessPolicy::Unknown,
        },
        liveliness_lease_duration: duration(field("liveliness_lease_duration"))?,
        avoid_ros_namespace_conventions: match field("avoid_ros_namespace_conventions") {
            None => false,
            Some(v) => v
                .as_bool()
                .ok_or_else(|| format!("invalid avoid_ros_namespace_conventions: {v:?}"))?,
        },
    })
}

enum Policy<'a> {
    Missing,
    Int(u64),
    Name(&'a str),
}

fn policy(value: Option<&Value>) -> Result<Policy<'_>, String> {
    match value {
        None | Some(Value::Null) => Ok(Policy::Missing),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Policy::Int)
            .ok_or_else(|| format!("invalid policy value: {n}")),
        Some(Value::String(s)) => Ok(Policy::Name(s.as_str())),
        Some(other) => Err(format!("invalid policy value: {}", value_type(other))),
    }
}

/// Infinite durations as written by Foxy/Galactic recorders.
const INFINITE_LEGACY: (i64, u64) = (i32::MAX as i64, u32::MAX as u64);
/// Infinite durations as written by Humble and later.
const INFINITE_RMW: (i64, u64) = (9_223_372_036, 854_775_807);

fn duration(value: Option<&Value>) -> Result<Option<Time>, String> {
    let map = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Mapping(map)) => map,
        Some(other) => return Err(format!("invalid duration: {}", value_type(other))),
    };
    let sec = map.get("sec").and_then(Value::as_i64).unwrap_or(0);
    let nsec = map.get("nsec").and_then(Value::as_u64).unwrap_or(0);

    if (sec, nsec) == (0, 0) || (sec, nsec) == INFINITE_LEGACY || (sec, nsec) == INFINITE_RMW {
        return Ok(None);
    }
    let nsec = u32::try_from(nsec).map_err(|_| format!("invalid duration nsec: {nsec}"))?;
    Ok(Some(Time::new(sec, nsec)))
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
