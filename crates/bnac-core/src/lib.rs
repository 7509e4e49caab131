//! BNAC client core logic
//!
//! Authorization against a BNAC server happens in two phases. A fixed
//! five-step handshake over one TCP connection produces a [`Session`]; after
//! that, keepalive datagrams are sent on a fixed interval for as long as the
//! process runs.
//!
//! # Architecture
//!
//! Both phases are split into a pure state machine and a thin async driver:
//!
//! - [`handshake::Handshake`] validates responses and decides the next
//!   request, returning [`handshake::HandshakeAction`]s. It never touches a
//!   socket. [`driver::perform_handshake`] executes those actions over any
//!   `AsyncRead + AsyncWrite` stream.
//! - [`heartbeat::HeartbeatScheduler`] numbers and builds keepalives.
//!   [`heartbeat::HeartbeatRunner`] sleeps through the [`env::Environment`]
//!   and fires each keepalive from its own task over a
//!   [`transport::DatagramTransport`].
//!
//! Production plugs in tokio sockets and the system clock; tests plug in
//! in-memory pipes, paused time, or the turmoil simulator.
//!
//! # Components
//!
//! - [`handshake`]: step table and handshake state machine
//! - [`driver`]: async handshake execution over a stream
//! - [`heartbeat`]: keepalive scheduler and runner
//! - [`transport`]: frame reader and datagram transport abstraction
//! - [`mod@env`]: environment abstraction (time, RNG)
//! - [`identity`]: per-run client identifier
//! - [`error`]: handshake and heartbeat errors

pub mod driver;
pub mod env;
pub mod error;
pub mod handshake;
pub mod heartbeat;
pub mod identity;
pub mod session;
pub mod transport;

pub use error::{HandshakeError, HeartbeatError};
pub use session::Session;
