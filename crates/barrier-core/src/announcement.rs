//! Announcement wire format.
//!
//! The only message in the protocol is a plain-text datagram:
//!
//! ```text
//! HEARTBEAT from <identity>
//! ```
//!
//! No framing, version field, or checksum. Anything after the first
//! whitespace-delimited identity token is ignored.

use crate::peer::PeerId;
use thiserror::Error;

/// Default receive buffer size. Announcements must fit in one datagram of this size.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

const PREFIX: &str = "HEARTBEAT from ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Datagram is not valid UTF-8")]
    InvalidUtf8,
    #[error("Datagram does not start with \"HEARTBEAT from \"")]
    MissingPrefix,
    #[error("Announcement carries no sender identity")]
    MissingSender,
}

/// "I am ready" from one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub sender: PeerId,
}

impl Announcement {
    pub fn new(sender: PeerId) -> Self {
        Self { sender }
    }

    /// Serialize to the datagram payload.
    pub fn encode(&self) -> Vec<u8> {
        format!("{PREFIX}{}", self.sender).into_bytes()
    }

    /// Size of the encoded payload in bytes.
    pub fn encoded_len(&self) -> usize {
        PREFIX.len() + self.sender.as_str().len()
    }

    /// Parse a received datagram.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8)?;
        let rest = text.strip_prefix(PREFIX).ok_or(DecodeError::MissingPrefix)?;

        let token = rest.split_whitespace().next().ok_or(DecodeError::MissingSender)?;
        let sender = token.parse().map_err(|_| DecodeError::MissingSender)?;

        Ok(Self { sender })
    }
}
