//! Local peer identity.
//!
//! The local identity is the system's configured hostname, which must
//! match this machine's entry in the host list.

use barrier_core::PeerId;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Where the configured hostname is read from.
pub const HOSTNAME_PATH: &str = "/etc/hostname";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Failed to read hostname from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No hostname configured in {0}")]
    Empty(PathBuf),
}

/// Read the local identity from `/etc/hostname`.
pub async fn self_identity() -> Result<PeerId, IdentityError> {
    identity_from_file(Path::new(HOSTNAME_PATH)).await
}

/// Read the first whitespace-delimited token of `path` as a peer identity.
pub async fn identity_from_file(path: &Path) -> Result<PeerId, IdentityError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| IdentityError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    text.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| IdentityError::Empty(path.to_path_buf()))
}
