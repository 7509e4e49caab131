//! UDP keepalive transport.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use async_trait::async_trait;
use bnac_core::transport::{DatagramSocket, DatagramTransport};
use tokio::net::UdpSocket;

/// Opens a fresh UDP socket to the server for every keepalive.
#[derive(Debug, Clone, Copy)]
pub struct UdpTransport {
    server: SocketAddr,
}

impl UdpTransport {
    /// Transport targeting `server`.
    pub fn new(server: SocketAddr) -> Self {
        Self { server }
    }
}

/// UDP socket connected to the server; closed on drop.
#[derive(Debug)]
pub struct UdpHeartbeatSocket(UdpSocket);

#[async_trait]
impl DatagramTransport for UdpTransport {
    type Socket = UdpHeartbeatSocket;

    async fn open(&self) -> io::Result<UdpHeartbeatSocket> {
        let local: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(self.server).await?;
        Ok(UdpHeartbeatSocket(socket))
    }
}

#[async_trait]
impl DatagramSocket for UdpHeartbeatSocket {
    async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        self.0.send(datagram).await
    }
}
