// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Messages command - list or count messages matching a filter.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::common::{open_bag, parse_timestamp, ProgressBar, Result};
use rosbag2_sqlite::{MessageFilter, MessageStorage};

/// List messages in a bag.
#[derive(Args, Clone, Debug)]
pub struct MessagesCmd {
    /// Storage file (.db3) or bag directory
    #[arg(value_name = "PATH")]
    input: PathBuf,

    /// Only include this topic (repeatable)
    #[arg(short, long = "topic", value_name = "TOPIC")]
    topics: Vec<String>,

    /// Inclusive start time (seconds, nanoseconds, or RFC 3339)
    #[arg(long)]
    start: Option<String>,

    /// Exclusive end time (seconds, nanoseconds, or RFC 3339)
    #[arg(long)]
    end: Option<String>,

    /// Stop after this many messages
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Only print per-topic counts of the matching messages
    #[arg(long)]
    count: bool,

    /// Print one JSON object per line
    #[arg(long)]
    json: bool,
}

/// Message summary as printed by `messages --json`.
#[derive(Serialize)]
struct MessageLine<'a> {
    topic: &'a str,
    sec: i64,
    nsec: u32,
    size: usize,
}

impl MessagesCmd {
    /// Number of messages the query will yield, when it is known without
    /// running it. Topic and time filters make it unknown.
    fn expected_matches(&self, total: u64) -> Option<u64> {
        if !self.topics.is_empty() || self.start.is_some() || self.end.is_some() {
            return None;
        }
        Some(match self.limit {
            Some(limit) => total.min(limit as u64),
            None => total,
        })
    }

    pub fn run(self) -> Result<()> {
        let mut filter = MessageFilter::new();
        if let Some(start) = &self.start {
            filter = filter.with_start_time(parse_timestamp(start)?);
        }
        if let Some(end) = &self.end {
            filter = filter.with_end_time(parse_timestamp(end)?);
        }
        if !self.topics.is_empty() {
            filter = filter.with_topics(self.topics.iter().cloned());
        }

        let bag = open_bag(&self.input)?;
        let limit = self.limit.unwrap_or(usize::MAX);
        let messages = bag.read_messages(&filter)?.take(limit);

        if self.count {
            let progress = match self.expected_matches(bag.message_count()?) {
                Some(len) => ProgressBar::new(len, "Counting"),
                None => ProgressBar::spinner("Counting"),
            };
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for msg in messages {
                let msg = msg?;
                *counts.entry(msg.topic.name).or_insert(0) += 1;
                progress.inc();
            }
            let matched: u64 = counts.values().sum();
            progress.finish_with_message(format!("{matched} messages"));
            for (topic, n) in &counts {
                println!("{topic}: {n}");
            }
            println!("Total: {matched}");
            return Ok(());
        }

        for msg in messages {
            let msg = msg?;
            if self.json {
                let line = MessageLine {
                    topic: &msg.topic.name,
                    sec: msg.timestamp.sec,
                    nsec: msg.timestamp.nsec,
                    size: msg.len(),
                };
                println!("{}", serde_json::to_string(&line)?);
            } else {
                println!(
                    "{} {} ({}) {} bytes",
                    msg.timestamp,
                    msg.topic.name,
                    msg.topic.message_type,
                    msg.len()
                );
            }
        }

        Ok(())
    }
}
