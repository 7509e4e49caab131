//! BNAC command-line client.
//!
//! Wires the core state machines to real I/O: TCP for the handshake, one UDP
//! socket per keepalive, the system clock, the embedded RSA key, and the
//! terminal for the password.
//!
//! # Components
//!
//! - [`cli`]: command-line arguments
//! - [`config`]: client configuration
//! - [`credentials`]: password input and encryption
//! - [`app`]: authorization and the keepalive loop
//! - [`udp`]: tokio UDP datagram transport
//! - [`env`]: system environment (clock, RNG)
//! - [`error`]: top-level error

pub mod app;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod udp;

pub use app::{authorize, run};
pub use cli::Args;
pub use config::ClientConfig;
pub use env::SystemEnv;
pub use error::ClientError;
pub use udp::UdpTransport;
