//! Command line arguments for the `barrier` binary.

use barrier_core::{BarrierConfig, Outcome, PeerId};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

/// Exit code when the deadline passes before every peer is heard from.
pub const EXIT_TIMED_OUT: u8 = 124;

#[derive(Parser, Debug)]
#[command(name = "barrier")]
#[command(about = "Wait until every peer in a host list has announced itself")]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Host list: one peer hostname or address per line, self included
    #[arg(short = 'h', long)]
    pub hostfile: PathBuf,

    /// UDP port every peer listens on
    #[arg(long, default_value_t = 12345)]
    pub port: u16,

    /// Milliseconds between heartbeat broadcasts
    #[arg(long, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Milliseconds to wait for every peer before giving up
    #[arg(long, default_value_t = 30_000)]
    pub deadline_ms: u64,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = barrier_core::MAX_DATAGRAM_SIZE)]
    pub buffer_size: usize,

    /// Local identity (read from /etc/hostname if not provided)
    #[arg(long)]
    pub hostname: Option<PeerId>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl Args {
    pub fn barrier_config(&self) -> BarrierConfig {
        BarrierConfig {
            port: self.port,
            broadcast_interval: Duration::from_millis(self.interval_ms),
            deadline: Duration::from_millis(self.deadline_ms),
            buffer_size: self.buffer_size,
        }
    }
}

/// Map an episode outcome onto the process exit status.
pub fn exit_status(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Ready => 0,
        Outcome::TimedOut => EXIT_TIMED_OUT,
    }
}
