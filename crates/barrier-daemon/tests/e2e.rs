//! End-to-end tests for the barrier coordinator.
//!
//! Runs real coordinators on loopback UDP sockets, each on its own
//! ephemeral port, wired together with a `StaticResolver`.

use std::net::SocketAddr;
use std::time::Duration;

use barrier_core::{Announcement, BarrierConfig, Outcome, PeerId, PeerSet};
use barrier_daemon::{BarrierReport, Coordinator, StaticResolver, socket};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::timeout;

// ============================================================================
// Helpers
// ============================================================================

fn id(s: &str) -> PeerId {
    s.parse().unwrap()
}

fn fast_config(deadline_ms: u64) -> BarrierConfig {
    BarrierConfig {
        port: 0,
        broadcast_interval: Duration::from_millis(50),
        deadline: Duration::from_millis(deadline_ms),
        buffer_size: 1024,
    }
}

async fn loopback() -> UdpSocket {
    socket::bind_addr("127.0.0.1:0".parse().unwrap())
        .await
        .expect("Failed to bind")
}

/// A peer whose socket is bound but whose coordinator has not started yet.
struct PendingPeer {
    id: PeerId,
    socket: UdpSocket,
    addr: SocketAddr,
}

async fn pending_peer(name: &str) -> PendingPeer {
    let socket = loopback().await;
    let addr = socket.local_addr().unwrap();
    PendingPeer {
        id: id(name),
        socket,
        addr,
    }
}

/// Start a coordinator for `peer` as a background task.
fn start(
    peer: PendingPeer,
    hosts: &str,
    resolver: StaticResolver,
    config: BarrierConfig,
) -> JoinHandle<BarrierReport> {
    let coordinator = Coordinator::new(
        PeerSet::parse(hosts).unwrap(),
        peer.id,
        config,
        peer.socket,
        resolver,
    )
    .expect("Failed to create coordinator");
    tokio::spawn(coordinator.run())
}

/// Send raw bytes from `from` to `to`.
async fn send_raw(from: &UdpSocket, to: SocketAddr, data: &[u8]) {
    from.send_to(data, to).await.expect("Failed to send");
}

/// Receive one datagram with a timeout.
async fn recv_raw(socket: &UdpSocket, duration: Duration) -> Option<Vec<u8>> {
    let mut buf = [0u8; 1024];
    match timeout(duration, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
        _ => None,
    }
}

// ============================================================================
// Convergence
// ============================================================================

#[tokio::test]
async fn test_three_peers_all_ready() {
    let a = pending_peer("A").await;
    let b = pending_peer("B").await;
    let c = pending_peer("C").await;

    let resolver = StaticResolver::new()
        .with(a.id.clone(), a.addr)
        .with(b.id.clone(), b.addr)
        .with(c.id.clone(), c.addr);

    let hosts = "A\nB\nC\n";
    let config = fast_config(5000);
    let handles = vec![
        start(a, hosts, resolver.clone(), config.clone()),
        start(b, hosts, resolver.clone(), config.clone()),
        start(c, hosts, resolver, config.clone()),
    ];

    for handle in handles {
        let report = handle.await.unwrap();
        assert_eq!(report.outcome, Outcome::Ready);
        assert_eq!(report.received.len(), 2);
        assert!(report.elapsed < config.deadline);
    }
}

#[tokio::test]
async fn test_staggered_start_still_converges() {
    let a = pending_peer("A").await;
    let b = pending_peer("B").await;

    let resolver = StaticResolver::new()
        .with(a.id.clone(), a.addr)
        .with(b.id.clone(), b.addr);

    let config = fast_config(5000);
    let first = start(a, "A B", resolver.clone(), config.clone());
    tokio::time::sleep(Duration::from_millis(300)).await;
    let second = start(b, "A B", resolver, config);

    assert_eq!(first.await.unwrap().outcome, Outcome::Ready);
    assert_eq!(second.await.unwrap().outcome, Outcome::Ready);
}

// ============================================================================
// Timeout
// ============================================================================

#[tokio::test]
async fn test_silent_peer_times_out() {
    let a = pending_peer("A").await;
    let b = pending_peer("B").await;
    // C is bound so its address resolves, but nothing ever runs on it
    let c = pending_peer("C").await;

    let resolver = StaticResolver::new()
        .with(a.id.clone(), a.addr)
        .with(b.id.clone(), b.addr)
        .with(c.id.clone(), c.addr);

    let hosts = "A\nB\nC";
    let config = fast_config(600);
    let a_handle = start(a, hosts, resolver.clone(), config.clone());
    let b_handle = start(b, hosts, resolver, config.clone());

    for handle in [a_handle, b_handle] {
        let report = handle.await.unwrap();
        assert_eq!(report.outcome, Outcome::TimedOut);
        assert_eq!(report.received.len(), 1);
        assert!(!report.received.contains(&id("C")));
        assert!(report.elapsed >= config.deadline);
        assert!(report.elapsed < config.deadline + Duration::from_secs(2));
    }

    // The silent peer still got our heartbeats
    let datagram = recv_raw(&c.socket, Duration::from_millis(100)).await.unwrap();
    let sender = Announcement::decode(&datagram).unwrap().sender;
    assert!(sender == id("A") || sender == id("B"));
}

#[tokio::test]
async fn test_unresolvable_peer_is_skipped() {
    let a = pending_peer("A").await;
    let listener = loopback().await;

    // "ghost" has no address; B is a raw socket that only listens
    let resolver = StaticResolver::new()
        .with(a.id.clone(), a.addr)
        .with(id("B"), listener.local_addr().unwrap());

    let handle = start(a, "A ghost B", resolver, fast_config(400));

    let datagram = recv_raw(&listener, Duration::from_secs(2)).await.unwrap();
    assert_eq!(datagram, b"HEARTBEAT from A");

    let report = handle.await.unwrap();
    assert_eq!(report.outcome, Outcome::TimedOut);
    assert!(report.received.is_empty());
}

// ============================================================================
// Receipt handling
// ============================================================================

#[tokio::test]
async fn test_duplicate_burst_counts_once() {
    let a = pending_peer("A").await;
    let a_addr = a.addr;
    let b = loopback().await;

    let resolver = StaticResolver::new()
        .with(a.id.clone(), a.addr)
        .with(id("B"), b.local_addr().unwrap());

    let handle = start(a, "A\nB", resolver, fast_config(5000));

    for _ in 0..3 {
        send_raw(&b, a_addr, b"HEARTBEAT from B").await;
    }

    let report = handle.await.unwrap();
    assert_eq!(report.outcome, Outcome::Ready);
    assert_eq!(report.received.len(), 1);
    assert!(report.received.contains(&id("B")));
}

#[tokio::test]
async fn test_malformed_datagrams_are_ignored() {
    let a = pending_peer("A").await;
    let a_addr = a.addr;
    let b = loopback().await;

    let resolver = StaticResolver::new()
        .with(a.id.clone(), a.addr)
        .with(id("B"), b.local_addr().unwrap());

    let handle = start(a, "A B", resolver, fast_config(5000));

    send_raw(&b, a_addr, b"garbage").await;
    send_raw(&b, a_addr, &[0xff, 0x00, 0xfe]).await;
    send_raw(&b, a_addr, b"HEARTBEAT from ").await;
    send_raw(&b, a_addr, b"HEARTBEAT from B").await;

    let report = handle.await.unwrap();
    assert_eq!(report.outcome, Outcome::Ready);
    assert_eq!(report.received.len(), 1);
}

#[tokio::test]
async fn test_unknown_and_self_announcements_not_counted() {
    let a = pending_peer("A").await;
    let a_addr = a.addr;
    let stranger = loopback().await;

    let resolver = StaticResolver::new()
        .with(a.id.clone(), a.addr)
        .with(id("B"), stranger.local_addr().unwrap());

    let handle = start(a, "A B", resolver, fast_config(400));

    send_raw(&stranger, a_addr, b"HEARTBEAT from intruder").await;
    send_raw(&stranger, a_addr, b"HEARTBEAT from A").await;

    let report = handle.await.unwrap();
    assert_eq!(report.outcome, Outcome::TimedOut);
    assert!(report.received.is_empty());
}
