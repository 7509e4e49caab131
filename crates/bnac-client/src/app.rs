//! Authorization followed by the keepalive loop.

use bnac_core::{
    Session,
    driver::perform_handshake,
    handshake::{Credentials, Handshake},
    heartbeat::{HeartbeatRunner, HeartbeatScheduler},
    identity::generate_client_id,
};
use bnac_crypto::RsaCipher;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::{
    config::ClientConfig, credentials::seal, env::SystemEnv, error::ClientError,
    udp::UdpTransport,
};

/// Connect to the server and run the handshake.
///
/// # Errors
///
/// `Connect` if the TCP connection fails, `Handshake` for any step failure.
pub async fn authorize(
    config: &ClientConfig,
    credentials: Credentials,
    client_id: &str,
) -> Result<Session, ClientError> {
    info!(server = %config.server_addr, "requesting authorization from BNAC server");
    let stream = TcpStream::connect(config.server_addr).await.map_err(ClientError::Connect)?;
    let local_addr = stream.local_addr()?;
    debug!(%local_addr, client_id, "connected");

    let handshake = Handshake::new(config.handshake.clone(), credentials, client_id, local_addr);
    Ok(perform_handshake(stream, handshake).await?)
}

/// Authorize `user` and send keepalives until the process is killed.
///
/// The password is encrypted before any connection is made, so a bad key
/// never reaches the network. Returns only on failure.
///
/// # Errors
///
/// Cipher, connection, and handshake failures. Heartbeat failures are
/// logged and never end the loop.
pub async fn run(config: ClientConfig, user: &str, password: &str) -> Result<(), ClientError> {
    let cipher = RsaCipher::server()?;
    let credentials = seal(user, password, &cipher)?;

    let env = SystemEnv;
    let client_id = generate_client_id(&env);

    let session = authorize(&config, credentials, &client_id).await?;
    info!(session_id = %session.session_id, role = %session.role, "welcome, {user}");

    let scheduler = HeartbeatScheduler::new(&session, user, &config.handshake.auth_type);
    let transport = UdpTransport::new(config.server_addr);
    HeartbeatRunner::new(env, transport, config.heartbeat_interval, scheduler).run().await;
    Ok(())
}
