//! Host list loading.
//!
//! The host list is a plain text file with one peer identity per
//! whitespace-delimited token. Every participant, including the local
//! peer, must be listed.

use barrier_core::{PeerSet, PeerSetError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum HostfileError {
    #[error("Failed to read host file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid host file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: PeerSetError,
    },
}

/// Read and parse the host list at `path`.
pub async fn read_peer_list(path: &Path) -> Result<PeerSet, HostfileError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| HostfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    PeerSet::parse(&text).map_err(|source| HostfileError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}
