//! Peer address resolution.
//!
//! Implementations:
//! - DNS: system resolver via `tokio::net::lookup_host`, fixed port
//! - Static: fixed identity → address table (tests, several peers on one host)

use async_trait::async_trait;
use barrier_core::PeerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::lookup_host;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Lookup failed for {peer}: {source}")]
    Lookup {
        peer: PeerId,
        #[source]
        source: std::io::Error,
    },
    #[error("No address found for {0}")]
    NoAddress(PeerId),
}

/// Maps a peer identity to the address its announcements should go to.
///
/// Called once per peer on every broadcast tick, so a failure only
/// skips that peer until the next tick.
#[async_trait]
pub trait PeerResolver: Send + Sync {
    async fn resolve(&self, peer: &PeerId) -> Result<SocketAddr, ResolveError>;
}

/// Resolves hostnames through the system resolver.
///
/// Prefers an IPv4 address when the name has both families.
#[derive(Debug, Clone)]
pub struct DnsResolver {
    port: u16,
}

impl DnsResolver {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl PeerResolver for DnsResolver {
    async fn resolve(&self, peer: &PeerId) -> Result<SocketAddr, ResolveError> {
        let addrs: Vec<SocketAddr> = lookup_host((peer.as_str(), self.port))
            .await
            .map_err(|source| ResolveError::Lookup {
                peer: peer.clone(),
                source,
            })?
            .collect();

        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| ResolveError::NoAddress(peer.clone()))
    }
}

/// Resolves from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    addrs: HashMap<PeerId, SocketAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, peer: PeerId, addr: SocketAddr) -> Self {
        self.insert(peer, addr);
        self
    }

    pub fn insert(&mut self, peer: PeerId, addr: SocketAddr) {
        self.addrs.insert(peer, addr);
    }
}

#[async_trait]
impl PeerResolver for StaticResolver {
    async fn resolve(&self, peer: &PeerId) -> Result<SocketAddr, ResolveError> {
        self.addrs
            .get(peer)
            .copied()
            .ok_or_else(|| ResolveError::NoAddress(peer.clone()))
    }
}
