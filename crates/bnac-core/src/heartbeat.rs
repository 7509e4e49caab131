//! Keepalive scheduling.
//!
//! Once authorized, the client tells the server it is still alive by sending a
//! `KEEP_ALIVE` datagram every interval (one minute by default). Nothing is
//! acknowledged.
//!
//! [`HeartbeatScheduler`] only numbers and builds keepalives.
//! [`HeartbeatRunner`] owns the loop: sleep, tick, spawn a task that opens a
//! fresh socket and sends. The loop never waits for a task, and a failing
//! task only produces a [`HeartbeatReport`]; the next tick goes ahead
//! regardless.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use bnac_proto::Message;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    env::Environment,
    error::HeartbeatError,
    session::Session,
    transport::{DatagramSocket, DatagramTransport},
};

/// Default interval between keepalives.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// One keepalive, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAlive {
    /// Session id from the handshake
    pub session_id: Arc<str>,
    /// Authorized user
    pub user: Arc<str>,
    /// Fixed auth type tag
    pub auth_type: Arc<str>,
    /// Sequence number, starting at 1
    pub index: u64,
}

impl KeepAlive {
    /// `KEEP_ALIVE` message for this keepalive.
    pub fn to_message(&self) -> Message {
        Message::new("KEEP_ALIVE")
            .with_param("SESSIONID", &*self.session_id)
            .with_param("USER", &*self.user)
            .with_param("AUTH_TYPE", &*self.auth_type)
            .with_param("HEARTBEAT_INDEX", self.index.to_string())
    }
}

/// Numbers keepalives for one session.
#[derive(Debug, Clone)]
pub struct HeartbeatScheduler {
    session_id: Arc<str>,
    user: Arc<str>,
    auth_type: Arc<str>,
    /// Keepalives issued so far
    issued: u64,
}

impl HeartbeatScheduler {
    /// Create a scheduler; the first tick is numbered 1.
    pub fn new(session: &Session, user: &str, auth_type: &str) -> Self {
        Self {
            session_id: Arc::from(session.session_id.as_str()),
            user: Arc::from(user),
            auth_type: Arc::from(auth_type),
            issued: 0,
        }
    }

    /// Next keepalive in sequence.
    pub fn tick(&mut self) -> KeepAlive {
        self.issued += 1;
        KeepAlive {
            session_id: Arc::clone(&self.session_id),
            user: Arc::clone(&self.user),
            auth_type: Arc::clone(&self.auth_type),
            index: self.issued,
        }
    }

    /// Number of keepalives issued.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Outcome of one keepalive attempt.
#[derive(Debug)]
pub struct HeartbeatReport {
    /// Sequence number of the keepalive
    pub index: u64,
    /// When the attempt was made
    pub at: Instant,
    /// `Err` if the keepalive was not delivered to the socket
    pub outcome: Result<(), HeartbeatError>,
}

/// Drives a [`HeartbeatScheduler`] forever.
pub struct HeartbeatRunner<E, T> {
    env: E,
    transport: Arc<T>,
    interval: Duration,
    scheduler: HeartbeatScheduler,
    reports: Option<mpsc::UnboundedSender<HeartbeatReport>>,
}

impl<E, T> HeartbeatRunner<E, T>
where
    E: Environment,
    T: DatagramTransport,
{
    /// Create a runner.
    pub fn new(env: E, transport: T, interval: Duration, scheduler: HeartbeatScheduler) -> Self {
        Self { env, transport: Arc::new(transport), interval, scheduler, reports: None }
    }

    /// Publish the outcome of every attempt on `reports`.
    ///
    /// A closed receiver is ignored.
    #[must_use]
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<HeartbeatReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Run until the process exits.
    ///
    /// Sleeps first, so the first keepalive goes out one interval after the
    /// handshake. Each keepalive runs in its own task.
    pub async fn run(mut self) {
        loop {
            self.env.sleep(self.interval).await;

            let keepalive = self.scheduler.tick();
            let transport = Arc::clone(&self.transport);
            let reports = self.reports.clone();
            let at = self.env.now();

            tokio::spawn(async move {
                let index = keepalive.index;
                let outcome = send_keepalive(&*transport, &keepalive).await;
                if let Err(e) = &outcome {
                    warn!(index, error = %e, "heartbeat failed");
                }
                if let Some(reports) = reports {
                    let _ = reports.send(HeartbeatReport { index, at, outcome });
                }
            });
        }
    }
}

/// Open a socket, send one keepalive, drop the socket.
///
/// # Errors
///
/// `Connect` if the socket cannot be opened, `Send` or `ShortWrite` if the
/// datagram does not go out whole.
pub async fn send_keepalive<T>(transport: &T, keepalive: &KeepAlive) -> Result<(), HeartbeatError>
where
    T: DatagramTransport + ?Sized,
{
    info!(index = keepalive.index, "send heartbeat #{}", keepalive.index);

    let socket = transport.open().await.map_err(HeartbeatError::Connect)?;
    let datagram = keepalive.to_message().to_bytes();
    let sent = socket.send(&datagram).await.map_err(HeartbeatError::Send)?;
    if sent != datagram.len() {
        return Err(HeartbeatError::ShortWrite { sent, len: datagram.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        future::Future,
        io,
        sync::{
            Mutex,
            atomic::{AtomicU64, Ordering},
        },
    };

    use async_trait::async_trait;

    use super::*;

    #[derive(Clone)]
    struct TokioEnv;

    impl Environment for TokioEnv {
        fn now(&self) -> Instant {
            tokio::time::Instant::now().into_std()
        }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            tokio::time::sleep(duration)
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0);
        }
    }

    /// Fails to open a socket on the listed attempts; records everything else.
    #[derive(Default)]
    struct FlakyTransport {
        attempts: AtomicU64,
        fail_on: Vec<u64>,
        delivered: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    struct RecordingSocket {
        delivered: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    #[async_trait]
    impl DatagramTransport for FlakyTransport {
        type Socket = RecordingSocket;

        async fn open(&self) -> io::Result<RecordingSocket> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&attempt) {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "unreachable"));
            }
            Ok(RecordingSocket { delivered: Arc::clone(&self.delivered) })
        }
    }

    #[async_trait]
    impl DatagramSocket for RecordingSocket {
        async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
            self.delivered.lock().unwrap().push(datagram.to_vec());
            Ok(datagram.len())
        }
    }

    /// Opens fine, but `send` fails on the listed attempts.
    #[derive(Default)]
    struct DroppingTransport {
        sends: Arc<AtomicU64>,
        fail_on: Vec<u64>,
        delivered: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    struct DroppingSocket {
        sends: Arc<AtomicU64>,
        fail_on: Vec<u64>,
        delivered: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    #[async_trait]
    impl DatagramTransport for DroppingTransport {
        type Socket = DroppingSocket;

        async fn open(&self) -> io::Result<DroppingSocket> {
            Ok(DroppingSocket {
                sends: Arc::clone(&self.sends),
                fail_on: self.fail_on.clone(),
                delivered: Arc::clone(&self.delivered),
            })
        }
    }

    #[async_trait]
    impl DatagramSocket for DroppingSocket {
        async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
            let attempt = self.sends.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&attempt) {
                return Err(io::Error::new(io::ErrorKind::NetworkUnreachable, "no route"));
            }
            self.delivered.lock().unwrap().push(datagram.to_vec());
            Ok(datagram.len())
        }
    }

    struct TruncatingSocket;

    #[async_trait]
    impl DatagramSocket for TruncatingSocket {
        async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
            Ok(datagram.len() / 2)
        }
    }

    struct TruncatingTransport;

    #[async_trait]
    impl DatagramTransport for TruncatingTransport {
        type Socket = TruncatingSocket;

        async fn open(&self) -> io::Result<TruncatingSocket> {
            Ok(TruncatingSocket)
        }
    }

    fn scheduler() -> HeartbeatScheduler {
        HeartbeatScheduler::new(&Session::new("abc", "user"), "alice", "DOMAIN")
    }

    #[test]
    fn sequence_starts_at_one() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.issued(), 0);
        assert_eq!(scheduler.tick().index, 1);
        assert_eq!(scheduler.tick().index, 2);
        assert_eq!(scheduler.tick().index, 3);
        assert_eq!(scheduler.issued(), 3);
    }

    #[test]
    fn keepalive_message_layout() {
        let keepalive = scheduler().tick();
        assert_eq!(
            keepalive.to_message().to_bytes().as_ref(),
            b"KEEP_ALIVE\r\nSESSIONID:abc\r\nUSER:alice\r\nAUTH_TYPE:DOMAIN\r\n\
              HEARTBEAT_INDEX:1\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn short_write_is_reported() {
        let keepalive = scheduler().tick();
        let result = send_keepalive(&TruncatingTransport, &keepalive).await;
        assert!(matches!(result, Err(HeartbeatError::ShortWrite { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_does_not_stop_next_tick() {
        let transport = FlakyTransport { fail_on: vec![2], ..Default::default() };
        let delivered = Arc::clone(&transport.delivered);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let runner =
            HeartbeatRunner::new(TokioEnv, transport, DEFAULT_HEARTBEAT_INTERVAL, scheduler())
                .with_reports(tx);
        let handle = tokio::spawn(runner.run());

        let mut reports = Vec::new();
        for _ in 0..3 {
            reports.push(rx.recv().await.unwrap());
        }
        handle.abort();

        let summary: Vec<(u64, bool)> =
            reports.iter().map(|r| (r.index, r.outcome.is_ok())).collect();
        assert_eq!(summary, [(1, true), (2, false), (3, true)]);
        assert!(matches!(reports[1].outcome, Err(HeartbeatError::Connect(_))));

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        let last = Message::parse(&delivered[1]).unwrap();
        assert_eq!(last.get("HEARTBEAT_INDEX"), Some("3"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_does_not_stop_next_tick() {
        let transport = DroppingTransport { fail_on: vec![2], ..Default::default() };
        let delivered = Arc::clone(&transport.delivered);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let runner =
            HeartbeatRunner::new(TokioEnv, transport, DEFAULT_HEARTBEAT_INTERVAL, scheduler())
                .with_reports(tx);
        let handle = tokio::spawn(runner.run());

        let mut reports = Vec::new();
        for _ in 0..3 {
            reports.push(rx.recv().await.unwrap());
        }
        handle.abort();

        let summary: Vec<(u64, bool)> =
            reports.iter().map(|r| (r.index, r.outcome.is_ok())).collect();
        assert_eq!(summary, [(1, true), (2, false), (3, true)]);
        assert!(matches!(reports[1].outcome, Err(HeartbeatError::Send(_))));

        let indices: Vec<_> = delivered
            .lock()
            .unwrap()
            .iter()
            .map(|d| Message::parse(d).unwrap().get("HEARTBEAT_INDEX").map(str::to_string))
            .collect();
        assert_eq!(indices, [Some("1".to_string()), Some("3".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let interval = Duration::from_secs(60);
        let runner =
            HeartbeatRunner::new(TokioEnv, FlakyTransport::default(), interval, scheduler())
                .with_reports(tx);

        let start = tokio::time::Instant::now();
        let handle = tokio::spawn(runner.run());

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        handle.abort();

        let first_delay = first.at.duration_since(start.into_std());
        let gap = second.at.duration_since(first.at);
        assert!(first_delay >= interval && first_delay < interval * 2, "{first_delay:?}");
        assert!(gap >= interval && gap < interval * 2, "{gap:?}");
    }
}
