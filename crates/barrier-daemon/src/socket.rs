//! UDP socket setup.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::info;

/// Bind the announcement socket on all IPv4 interfaces.
pub async fn bind(port: u16) -> io::Result<UdpSocket> {
    bind_addr(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
}

/// Bind the announcement socket on a specific address.
pub async fn bind_addr(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(addr).await?;
    info!("Listening for heartbeats on {}", socket.local_addr()?);
    Ok(socket)
}
