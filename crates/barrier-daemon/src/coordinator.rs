//! Barrier coordinator: drives one episode over a UDP socket.
//!
//! A single task multiplexes three things with one `select!`:
//! - inbound heartbeats on the socket
//! - the broadcast tick
//! - the overall deadline
//!
//! All protocol decisions are delegated to [`BarrierEpisode`]; this module
//! only does the I/O and the logging.

use crate::resolver::PeerResolver;
use barrier_core::{
    Announcement, BarrierConfig, BarrierEpisode, BarrierError, EpisodeStep, Outcome, PeerId,
    PeerSet, ReceiveOutcome, ReceivedSet,
};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Wakeup used when the deadline does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Barrier(#[from] BarrierError),
}

/// Result of a finished episode.
#[derive(Debug, Clone)]
pub struct BarrierReport {
    pub outcome: Outcome,
    /// Peers heard from before the episode resolved
    pub received: ReceivedSet,
    /// Time from start to resolution
    pub elapsed: Duration,
}

/// Owns the socket for the lifetime of one episode.
///
/// `run` consumes the coordinator, so the socket is closed on every exit.
/// The episode clock starts when `run` is called, not at construction.
pub struct Coordinator<R: PeerResolver> {
    episode: BarrierEpisode,
    socket: UdpSocket,
    resolver: R,
}

impl<R: PeerResolver> Coordinator<R> {
    /// Start an episode on an already-bound socket.
    pub fn new(
        peers: PeerSet,
        local_peer_id: PeerId,
        config: BarrierConfig,
        socket: UdpSocket,
        resolver: R,
    ) -> Result<Self, CoordinatorError> {
        if config.interval_exceeds_deadline() {
            warn!(
                "Broadcast interval {:?} is not shorter than deadline {:?}; peers may never hear from us",
                config.broadcast_interval, config.deadline
            );
        }

        let episode = BarrierEpisode::new(peers, local_peer_id, config, 0)?;

        Ok(Self {
            episode,
            socket,
            resolver,
        })
    }

    /// Run until every other peer has announced itself or the deadline passes.
    ///
    /// On READY one last announcement goes out before the socket closes, so
    /// a peer that resolved before its first broadcast tick is still heard.
    pub async fn run(mut self) -> BarrierReport {
        let started = Instant::now();
        let now_ms = move || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut buf = vec![0u8; self.episode.config().buffer_size];

        info!(
            "Waiting for {} peer(s) as {} (deadline {:?})",
            self.episode.required(),
            self.episode.local_peer_id(),
            self.episode.config().deadline
        );

        loop {
            match self.episode.poll(now_ms()) {
                EpisodeStep::Broadcast => {
                    self.broadcast().await;
                }
                EpisodeStep::Resolved(outcome) => {
                    match outcome {
                        Outcome::Ready => {
                            info!("READY");
                            self.broadcast().await;
                        }
                        Outcome::TimedOut => warn!(
                            "Timeout reached. Exiting. ({} of {} peer(s) heard from)",
                            self.episode.received().len(),
                            self.episode.required()
                        ),
                    }
                    return BarrierReport {
                        outcome,
                        received: self.episode.received().clone(),
                        elapsed: started.elapsed(),
                    };
                }
                EpisodeStep::Wait => {
                    let wake_at = started
                        .checked_add(Duration::from_millis(self.episode.next_wakeup_ms()))
                        .unwrap_or_else(|| started + FAR_FUTURE);

                    tokio::select! {
                        result = self.socket.recv_from(&mut buf) => {
                            match result {
                                Ok((len, from)) => self.on_datagram(&buf[..len], from),
                                Err(e) => warn!("Failed to receive datagram: {}", e),
                            }
                        }

                        _ = sleep_until(wake_at) => {}
                    }
                }
            }
        }
    }

    /// Send our announcement to every other peer, skipping any that fail.
    async fn broadcast(&self) {
        let payload = self.episode.announcement().encode();

        for peer in self.episode.broadcast_targets() {
            let addr = match self.resolver.resolve(peer).await {
                Ok(addr) => addr,
                Err(e) => {
                    warn!("Error resolving hostname {}: {}", peer, e);
                    continue;
                }
            };

            info!("Sending heartbeat to {} (IP: {})", peer, addr.ip());
            if let Err(e) = self.socket.send_to(&payload, addr).await {
                warn!("Failed to send heartbeat to {} ({}): {}", peer, addr, e);
            }
        }
    }

    /// Handle one inbound datagram.
    fn on_datagram(&mut self, data: &[u8], from: SocketAddr) {
        let announcement = match Announcement::decode(data) {
            Ok(announcement) => announcement,
            Err(e) => {
                debug!("Discarding malformed datagram from {}: {}", from, e);
                return;
            }
        };

        info!(
            "Received heartbeat from {} (IP: {})",
            announcement.sender,
            from.ip()
        );

        match self.episode.receive(&announcement) {
            ReceiveOutcome::Accepted => {
                info!(
                    "Logged heartbeat from {} ({} remaining)",
                    announcement.sender,
                    self.episode.remaining()
                );
            }
            ReceiveOutcome::Duplicate => {
                debug!("Already logged heartbeat from {}", announcement.sender);
            }
            ReceiveOutcome::FromSelf | ReceiveOutcome::UnknownPeer => {}
        }
    }
}
