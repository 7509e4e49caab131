//! Deterministic simulation harness for the BNAC client.
//!
//! Turmoil-based implementations of the Environment and datagram transport
//! traits, plus a scripted BNAC server, for reproducible testing of the
//! handshake and heartbeat under simulated network conditions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_server;
pub mod sim_transport;

pub use sim_env::SimEnv;
pub use sim_server::{KeepAliveCollector, Received, SERVER_PORT, ScriptedServer, ServerLog};
pub use sim_transport::{SimDatagramTransport, connect_to};
