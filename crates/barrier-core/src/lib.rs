//! barrier-core: Sans-IO readiness barrier for a fixed set of peers.
//!
//! This crate provides the protocol pieces shared by every peer:
//! - Peer identities and the ordered, immutable peer set
//! - The `HEARTBEAT from <id>` announcement codec
//! - Barrier configuration and its defaults
//! - The episode state machine that decides when to broadcast,
//!   when every peer has been seen, and when to give up
//!
//! Nothing here touches sockets or clocks. Callers feed in received
//! announcements and the current time in milliseconds.

pub mod announcement;
pub mod barrier;
pub mod config;
pub mod peer;

pub use announcement::{Announcement, DecodeError, MAX_DATAGRAM_SIZE};
pub use barrier::{
    BarrierEpisode, BarrierError, EpisodeStep, Outcome, ReceiveOutcome, ReceivedSet,
};
pub use config::BarrierConfig;
pub use peer::{PeerId, PeerIdError, PeerSet, PeerSetError};
