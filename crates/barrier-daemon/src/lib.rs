//! barrier-daemon library: the I/O side of the readiness barrier.
//!
//! Exposes the daemon components for the `barrier` binary and for
//! integration tests.

pub mod cli;
pub mod coordinator;
pub mod hostfile;
pub mod identity;
pub mod resolver;
pub mod socket;

// Re-export key types for convenience
pub use coordinator::{BarrierReport, Coordinator, CoordinatorError};
pub use hostfile::{HostfileError, read_peer_list};
pub use identity::{IdentityError, self_identity};
pub use resolver::{DnsResolver, PeerResolver, ResolveError, StaticResolver};
