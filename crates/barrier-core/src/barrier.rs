//! Barrier episode state machine.
//!
//! One episode runs from startup until every other peer has announced
//! itself (READY) or the deadline passes (TIMED_OUT):
//! 1. Re-broadcast our announcement to every other peer each interval
//! 2. Record each distinct sender we hear from
//! 3. Resolve as soon as all `N - 1` other peers were heard from
//! 4. Give up once the deadline elapses
//!
//! The caller owns the socket and the clock. It feeds received
//! announcements into [`BarrierEpisode::receive`] and drains
//! [`BarrierEpisode::poll`] after every wakeup.

use crate::announcement::Announcement;
use crate::config::BarrierConfig;
use crate::peer::{PeerId, PeerSet};
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BarrierError {
    #[error("Local peer {0} is not in the peer set")]
    SelfNotInPeerSet(PeerId),
    #[error("Announcement from {peer} needs {len} bytes, buffer is {buffer_size}")]
    IdentityTooLong {
        peer: PeerId,
        len: usize,
        buffer_size: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Terminal result of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every other peer announced itself before the deadline
    Ready,
    /// The deadline elapsed first
    TimedOut,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready => f.write_str("READY"),
            Outcome::TimedOut => f.write_str("TIMED_OUT"),
        }
    }
}

/// What happened to one received announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// First announcement from this peer; counted
    Accepted,
    /// Peer was already counted
    Duplicate,
    /// Stamped with our own identity; never counted
    FromSelf,
    /// Sender is not in the peer set; never counted
    UnknownPeer,
}

/// Next action the event loop should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStep {
    /// Send our announcement to every target in `broadcast_targets()`
    Broadcast,
    /// The episode is over
    Resolved(Outcome),
    /// Nothing to do until a datagram arrives or `next_wakeup_ms()`
    Wait,
}

/// Peers heard from during this episode.
///
/// Only grows: there is no way to remove an entry.
#[derive(Debug, Clone, Default)]
pub struct ReceivedSet {
    peers: HashSet<PeerId>,
}

impl ReceivedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Returns true if it was not already present.
    pub fn insert(&mut self, peer: PeerId) -> bool {
        self.peers.insert(peer)
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.iter()
    }
}

/// State of one barrier episode.
///
/// Timestamps are milliseconds on a caller-chosen monotonic clock; only
/// differences matter.
pub struct BarrierEpisode {
    config: BarrierConfig,
    peers: PeerSet,
    local_peer_id: PeerId,
    received: ReceivedSet,
    last_broadcast_ms: u64,
    deadline_ms: u64,
}

impl BarrierEpisode {
    /// Start an episode at `now_ms`.
    ///
    /// The first broadcast is due one interval after start.
    pub fn new(
        peers: PeerSet,
        local_peer_id: PeerId,
        config: BarrierConfig,
        now_ms: u64,
    ) -> Result<Self, BarrierError> {
        config.validate()?;

        if !peers.contains(&local_peer_id) {
            return Err(BarrierError::SelfNotInPeerSet(local_peer_id));
        }

        for peer in peers.iter() {
            let len = Announcement::new(peer.clone()).encoded_len();
            if len > config.buffer_size {
                return Err(BarrierError::IdentityTooLong {
                    peer: peer.clone(),
                    len,
                    buffer_size: config.buffer_size,
                });
            }
        }

        let deadline_ms = now_ms.saturating_add(config.deadline_ms());

        Ok(Self {
            config,
            peers,
            local_peer_id,
            received: ReceivedSet::new(),
            last_broadcast_ms: now_ms,
            deadline_ms,
        })
    }

    pub fn config(&self) -> &BarrierConfig {
        &self.config
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    pub fn received(&self) -> &ReceivedSet {
        &self.received
    }

    /// Our own announcement.
    pub fn announcement(&self) -> Announcement {
        Announcement::new(self.local_peer_id.clone())
    }

    /// Every peer except ourselves, in host-list order.
    pub fn broadcast_targets(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.others(&self.local_peer_id)
    }

    /// Number of distinct announcements needed for READY.
    pub fn required(&self) -> usize {
        self.peers.len() - 1
    }

    /// Announcements still missing.
    pub fn remaining(&self) -> usize {
        self.required().saturating_sub(self.received.len())
    }

    /// Record an announcement.
    pub fn receive(&mut self, announcement: &Announcement) -> ReceiveOutcome {
        let sender = &announcement.sender;

        if *sender == self.local_peer_id {
            debug!("Ignoring announcement stamped with our own identity");
            return ReceiveOutcome::FromSelf;
        }
        if !self.peers.contains(sender) {
            debug!("Ignoring announcement from unknown peer {}", sender);
            return ReceiveOutcome::UnknownPeer;
        }

        if self.received.insert(sender.clone()) {
            ReceiveOutcome::Accepted
        } else {
            ReceiveOutcome::Duplicate
        }
    }

    pub fn is_ready(&self) -> bool {
        self.received.len() >= self.required()
    }

    pub fn should_broadcast(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_broadcast_ms) >= self.config.broadcast_interval_ms()
    }

    pub fn mark_broadcast(&mut self, now_ms: u64) {
        self.last_broadcast_ms = now_ms;
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// When the loop must wake up even if no datagram arrives.
    pub fn next_wakeup_ms(&self) -> u64 {
        let next_broadcast = self
            .last_broadcast_ms
            .saturating_add(self.config.broadcast_interval_ms());
        next_broadcast.min(self.deadline_ms)
    }

    /// Decide the next action.
    ///
    /// Readiness is checked first, then the broadcast tick, then the
    /// deadline. Returning `Broadcast` marks the tick as done, so call
    /// `poll` repeatedly until it returns `Wait` or `Resolved`.
    pub fn poll(&mut self, now_ms: u64) -> EpisodeStep {
        if self.is_ready() {
            return EpisodeStep::Resolved(Outcome::Ready);
        }

        if self.should_broadcast(now_ms) {
            self.mark_broadcast(now_ms);
            return EpisodeStep::Broadcast;
        }

        if self.is_expired(now_ms) {
            return EpisodeStep::Resolved(Outcome::TimedOut);
        }

        EpisodeStep::Wait
    }
}
