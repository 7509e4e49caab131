//! Scripted BNAC server for simulations.
//!
//! [`ScriptedServer`] answers handshake requests from a fixed list of
//! responses; [`KeepAliveCollector`] records keepalive datagrams. Both write
//! into a [`ServerLog`] that the test body inspects after (or during) the run.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use bnac_core::transport::{FrameReader, write_message};
use bnac_proto::Message;
use tracing::debug;
use turmoil::net::{TcpListener, UdpSocket};

/// Port the simulated server listens on, for TCP and UDP alike.
pub const SERVER_PORT: u16 = 10001;

/// One message seen by a simulated server.
#[derive(Debug, Clone)]
pub struct Received {
    /// Sender address
    pub peer: SocketAddr,
    /// Parsed message
    pub message: Message,
    /// Virtual time of arrival
    pub at: Instant,
}

/// Shared record of received messages.
#[derive(Debug, Clone, Default)]
pub struct ServerLog {
    inner: Arc<Mutex<Vec<Received>>>,
}

impl ServerLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Received>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, peer: SocketAddr, message: Message) {
        debug!(%peer, command = message.name(), "server received");
        let at = tokio::time::Instant::now().into_std();
        self.lock().push(Received { peer, message, at });
    }

    /// Everything received so far, in arrival order.
    pub fn entries(&self) -> Vec<Received> {
        self.lock().clone()
    }

    /// Messages received so far, in arrival order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Command names received so far.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.message.name().to_string()).collect()
    }

    /// Number of messages received.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Handshake server that replays a fixed response script.
///
/// Accepts one connection. Request `k` is answered with response `k`; once
/// the script runs out the server keeps reading (and recording) until the
/// client closes.
#[derive(Debug, Clone)]
pub struct ScriptedServer {
    responses: Vec<Message>,
    hang_up_after: Option<usize>,
    log: ServerLog,
}

impl ScriptedServer {
    /// Server answering with `responses` in order.
    pub fn new(responses: Vec<Message>) -> Self {
        Self { responses, hang_up_after: None, log: ServerLog::default() }
    }

    /// Server that accepts every step and grants `session_id` and `role`.
    pub fn accepting(session_id: &str, role: &str) -> Self {
        Self::new(vec![
            Message::new("601"),
            Message::new("603"),
            Message::new("604"),
            Message::new("288").with_param("SESSION_ID", session_id).with_param("ROLE", role),
            Message::new("220"),
        ])
    }

    /// Close the connection on receipt of request `n` (1-based), unanswered.
    #[must_use]
    pub fn hang_up_after(mut self, n: usize) -> Self {
        self.hang_up_after = Some(n);
        self
    }

    /// Log of received requests.
    pub fn log(&self) -> ServerLog {
        self.log.clone()
    }

    /// Listen on [`SERVER_PORT`] and serve one connection.
    ///
    /// # Errors
    ///
    /// Bind, accept, and I/O failures; `InvalidData` for an unparseable
    /// request.
    pub async fn serve(&self) -> io::Result<()> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, SERVER_PORT)).await?;
        let (stream, peer) = listener.accept().await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = FrameReader::new(reader);
        let mut responses = self.responses.iter();
        let mut count = 0;

        while let Some(frame) = reader.read_frame().await? {
            let request = Message::parse(&frame)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.log.record(peer, request);
            count += 1;

            if self.hang_up_after == Some(count) {
                debug!(count, "server hanging up");
                return Ok(());
            }
            if let Some(response) = responses.next() {
                write_message(&mut writer, response).await?;
            }
        }
        Ok(())
    }
}

/// Records every keepalive datagram sent to [`SERVER_PORT`].
#[derive(Debug, Clone, Default)]
pub struct KeepAliveCollector {
    log: ServerLog,
}

impl KeepAliveCollector {
    /// Collector with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log of received keepalives.
    pub fn log(&self) -> ServerLog {
        self.log.clone()
    }

    /// Receive datagrams forever. Unparseable datagrams are skipped.
    ///
    /// # Errors
    ///
    /// Bind and receive failures.
    pub async fn serve(&self) -> io::Result<()> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, SERVER_PORT)).await?;
        let mut buf = vec![0u8; 64 * 1024];

        loop {
            let (len, peer) = socket.recv_from(&mut buf).await?;
            match Message::parse(&buf[..len]) {
                Ok(message) => self.log.record(peer, message),
                Err(e) => debug!(%peer, error = %e, "dropping malformed datagram"),
            }
        }
    }
}
