//! Turmoil-backed network I/O.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};

use async_trait::async_trait;
use bnac_core::transport::{DatagramSocket, DatagramTransport};
use turmoil::net::{TcpStream, UdpSocket};

/// Open a simulated TCP connection to `addr` (`"host:port"`).
///
/// # Errors
///
/// Fails if the host is unknown or nothing listens on the port.
pub async fn connect_to(addr: &str) -> io::Result<TcpStream> {
    TcpStream::connect(addr).await
}

/// Datagram transport that opens a fresh simulated UDP socket per keepalive.
#[derive(Debug, Clone)]
pub struct SimDatagramTransport {
    host: String,
    port: u16,
}

impl SimDatagramTransport {
    /// Transport targeting `port` on simulated host `host`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

/// Simulated UDP socket bound to an ephemeral port, aimed at one peer.
pub struct SimDatagramSocket {
    socket: UdpSocket,
    target: SocketAddr,
}

#[async_trait]
impl DatagramTransport for SimDatagramTransport {
    type Socket = SimDatagramSocket;

    async fn open(&self) -> io::Result<SimDatagramSocket> {
        let target = SocketAddr::new(turmoil::lookup(self.host.as_str()), self.port);
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        Ok(SimDatagramSocket { socket, target })
    }
}

#[async_trait]
impl DatagramSocket for SimDatagramSocket {
    async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        self.socket.send_to(datagram, self.target).await
    }
}
