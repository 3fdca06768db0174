// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # rosbag2 CLI
//!
//! Command-line tool for inspecting ROS 2 SQLite bags.
//!
//! ## Usage
//!
//! ```sh
//! # Show bag information
//! rosbag2 info talker/
//!
//! # List topics with message counts
//! rosbag2 topics talker/talker_0.db3 --counts
//!
//! # Print messages of one topic in a time window
//! rosbag2 messages talker/ --topic /rosout --start 1585866236 --end 1585866238
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{InspectCmd, MessagesCmd};
use common::{init_logging, Result};

/// rosbag2 - ROS 2 SQLite bag toolkit
///
/// Accepts a single .db3 storage file or a bag directory; every .db3 file
/// below a directory is read as part of one bag.
#[derive(Parser, Clone)]
#[command(name = "rosbag2")]
#[command(about = "Inspect ROS 2 bags stored in SQLite (.db3) files", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    #[command(flatten)]
    Inspect(InspectCmd),

    /// List messages (by topic, time, count)
    Messages(MessagesCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect(cmd) => cmd.run(),
        Commands::Messages(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
