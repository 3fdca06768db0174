// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect commands - show bag information and topics.

use std::path::PathBuf;

use clap::Subcommand;
use regex::Regex;
use serde::Serialize;

use crate::common::{format_duration, format_timestamp, open_bag, Result};
use rosbag2_sqlite::{QosProfile, Time};

/// Inspect bag contents.
#[derive(Subcommand, Clone, Debug)]
pub enum InspectCmd {
    /// Show basic bag information and summary
    Info {
        /// Storage file (.db3) or bag directory
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },

    /// List all topics in the bag
    Topics {
        /// Storage file (.db3) or bag directory
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Only show topics whose name or type matches this regex
        #[arg(short, long)]
        filter: Option<String>,

        /// Show message counts
        #[arg(long)]
        counts: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        match self {
            InspectCmd::Info { input } => cmd_info(input),
            InspectCmd::Topics {
                input,
                filter,
                counts,
                json,
            } => cmd_topics(input, filter, counts, json),
        }
    }
}

/// Topic as printed by `topics --json`.
#[derive(Serialize)]
struct TopicEntry<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    message_type: &'a str,
    serialization_format: &'a str,
    offered_qos_profiles: &'a [QosProfile],
    #[serde(skip_serializing_if = "Option::is_none")]
    message_count: Option<u64>,
}

/// Cmd: Show bag info
fn cmd_info(input: PathBuf) -> Result<()> {
    let bag = open_bag(&input)?;
    let topics = bag.read_topics()?;
    let counts = bag.message_counts()?;
    let (start, end) = bag.time_range()?;

    println!("=== {} ===", input.display());
    println!("Files: {}", bag.len());
    for file in bag.files() {
        println!("  {}", file.display());
    }
    println!("Topics: {}", topics.len());
    println!("Messages: {}", counts.values().sum::<u64>());

    if (start, end) != (Time::ZERO, Time::ZERO) {
        println!("Start: {} ({})", format_timestamp(start), start);
        println!("End: {} ({})", format_timestamp(end), end);
        println!(
            "Duration: {}",
            format_duration(end.to_nanos().saturating_sub(start.to_nanos()))
        );
    }

    println!();
    println!("Topics:");
    for topic in &topics {
        println!(
            "  {} | {} | {} | {} messages",
            topic.name,
            topic.message_type,
            topic.serialization_format,
            counts.get(&topic.name).copied().unwrap_or(0)
        );
    }

    Ok(())
}

/// Cmd: List topics
fn cmd_topics(input: PathBuf, filter: Option<String>, show_counts: bool, json: bool) -> Result<()> {
    let pattern = filter.as_deref().map(Regex::new).transpose()?;
    let bag = open_bag(&input)?;
    let counts = if show_counts {
        Some(bag.message_counts()?)
    } else {
        None
    };

    let topics: Vec<_> = bag
        .read_topics()?
        .into_iter()
        .filter(|t| {
            pattern
                .as_ref()
                .map_or(true, |re| re.is_match(&t.name) || re.is_match(&t.message_type))
        })
        .collect();

    if json {
        let entries: Vec<_> = topics
            .iter()
            .map(|t| TopicEntry {
                name: &t.name,
                message_type: &t.message_type,
                serialization_format: &t.serialization_format,
                offered_qos_profiles: &t.offered_qos_profiles,
                message_count: counts
                    .as_ref()
                    .map(|c| c.get(&t.name).copied().unwrap_or(0)),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("=== Topics in {} ===", input.display());
    println!();

    for topic in &topics {
        println!("Topic: {}", topic.name);
        println!("  Type: {}", topic.message_type);
        println!("  Serialization: {}", topic.serialization_format);
        if let Some(counts) = &counts {
            println!("  Messages: {}", counts.get(&topic.name).copied().unwrap_or(0));
        }
        println!();
    }

    Ok(())
}
