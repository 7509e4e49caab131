//! Client configuration.

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use bnac_core::{handshake::HandshakeConfig, heartbeat::DEFAULT_HEARTBEAT_INTERVAL};

/// Default BNAC server endpoint (TCP for the handshake, UDP for keepalives).
pub const DEFAULT_SERVER_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(172, 22, 1, 144), 10001));

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server endpoint
    pub server_addr: SocketAddr,
    /// Interval between keepalives
    pub heartbeat_interval: Duration,
    /// Constant handshake request fields
    pub handshake: HandshakeConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            handshake: HandshakeConfig::default(),
        }
    }
}
