//! Peer identities and the static peer set.
//!
//! A peer is identified by the hostname or address string it is listed
//! under in the shared host list. The same string stamps its announcements.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeerIdError {
    #[error("Peer ID must not be empty")]
    Empty,
    #[error("Peer ID must not contain whitespace: {0:?}")]
    Whitespace(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeerSetError {
    #[error("Peer set is empty")]
    Empty,
    #[error("Peer {0} is listed more than once")]
    Duplicate(PeerId),
    #[error(transparent)]
    InvalidPeer(#[from] PeerIdError),
}

/// Identity of one participant, e.g. `node-3` or `10.0.0.7`.
///
/// Never empty and never contains whitespace, so it survives the
/// whitespace-delimited host list and announcement formats unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

impl PeerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerId {
    type Err = PeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PeerIdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(PeerIdError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for PeerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PeerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Ordered list of every participant, self included.
///
/// Built once at startup and never modified. Order follows the host list
/// and determines broadcast order, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSet {
    peers: Vec<PeerId>,
}

impl PeerSet {
    /// Build a peer set, rejecting empty lists and repeated identities.
    pub fn new(peers: Vec<PeerId>) -> Result<Self, PeerSetError> {
        if peers.is_empty() {
            return Err(PeerSetError::Empty);
        }

        let mut seen = HashSet::with_capacity(peers.len());
        for peer in &peers {
            if !seen.insert(peer) {
                return Err(PeerSetError::Duplicate(peer.clone()));
            }
        }

        Ok(Self { peers })
    }

    /// Parse a host list: one identity per whitespace-delimited token.
    pub fn parse(text: &str) -> Result<Self, PeerSetError> {
        let peers = text
            .split_whitespace()
            .map(PeerId::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(peers)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Always false for a constructed set; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.iter()
    }

    /// Every peer except `local`, in host-list order.
    pub fn others<'a>(&'a self, local: &'a PeerId) -> impl Iterator<Item = &'a PeerId> + 'a {
        self.peers.iter().filter(move |peer| *peer != local)
    }
}
