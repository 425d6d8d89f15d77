//! Modbus TCP session
//!
//! A [`ModbusSession`] exclusively owns one connected byte stream, the
//! transaction counter and the transport statistics. All of them sit behind a
//! single async mutex, so one request/reply exchange is in flight at a time:
//! concurrent callers sharing a session (for example through an `Arc`) are
//! serialized, and one caller's reply can never be read by another.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --connect()/attach()--> Connected --disconnect()--> Disconnected
//! ```
//!
//! There is no automatic reconnect. After an I/O error, timeout or
//! cancellation the stream position is unknown, and the owner should
//! disconnect and connect again before issuing more requests.
//!
//! # Example
//!
//! ```rust,no_run
//! use voltage_mbap::{ModbusClient, ModbusResult, ModbusSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let session = ModbusSession::open(SessionConfig::new("127.0.0.1", 502)).await?;
//!     let coils = session.read_coils(0, 3).await?;
//!     println!("Coils: {:?}", coils);
//!     session.disconnect().await
//! }
//! ```

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::bytes::ByteOrder;
use crate::config::SessionConfig;
use crate::constants::MAX_REPLY_SIZE;
use crate::error::{ModbusError, ModbusResult};
use crate::frame::{format_hex, Frame, FrameBuilder};

/// Counters for traffic through one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Frames fully written to the transport
    pub requests_sent: u64,
    /// Replies read from the transport, including empty ones
    pub responses_received: u64,
    /// Failed exchanges, timeouts included
    pub errors: u64,
    /// Exchanges that hit the configured deadline
    pub timeouts: u64,
    /// Bytes written
    pub bytes_sent: u64,
    /// Bytes read
    pub bytes_received: u64,
}

/// State guarded by the session lock.
struct SessionInner<S> {
    stream: Option<S>,
    transaction_id: u16,
    stats: TransportStats,
}

impl<S> SessionInner<S> {
    fn new(stream: Option<S>) -> Self {
        Self {
            stream,
            transaction_id: 0,
            stats: TransportStats::default(),
        }
    }

    /// Pre-increment the counter, wrapping 65535 -> 0.
    fn allocate_transaction_id(&mut self) -> u16 {
        self.transaction_id = self.transaction_id.wrapping_add(1);
        self.transaction_id
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> SessionInner<S> {
    /// Write one frame, read one reply, and record the outcome.
    async fn round_trip(
        &mut self,
        frame: &[u8],
        deadline: Option<Duration>,
    ) -> ModbusResult<Vec<u8>> {
        let result = self.write_then_read(frame, deadline).await;
        match &result {
            Ok(reply) => {
                self.stats.responses_received += 1;
                self.stats.bytes_received += reply.len() as u64;
            }
            Err(err) => {
                self.stats.errors += 1;
                if matches!(err, ModbusError::Timeout { .. }) {
                    self.stats.timeouts += 1;
                }
                warn!("Exchange failed: {}", err);
            }
        }
        result
    }

    async fn write_then_read(
        &mut self,
        frame: &[u8],
        deadline: Option<Duration>,
    ) -> ModbusResult<Vec<u8>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ModbusError::connection("session is not connected"))?;

        trace!("TX [{}]: {}", frame.len(), format_hex(frame));
        with_deadline(deadline, "write", async {
            stream.write_all(frame).await?;
            stream.flush().await
        })
        .await?;
        self.stats.requests_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;

        // A single read: short replies are handed back untouched and the
        // decoder reports truncation.
        let mut buf = [0u8; MAX_REPLY_SIZE];
        let received = with_deadline(deadline, "read", stream.read(&mut buf)).await?;
        trace!("RX [{}]: {}", received, format_hex(&buf[..received]));

        Ok(buf[..received].to_vec())
    }
}

/// Await an I/O future, bounded by `deadline` when one is configured.
async fn with_deadline<T>(
    deadline: Option<Duration>,
    operation: &str,
    fut: impl Future<Output = io::Result<T>>,
) -> ModbusResult<T> {
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(ModbusError::from),
            Err(_) => Err(ModbusError::timeout(operation, limit.as_millis() as u64)),
        },
        None => fut.await.map_err(ModbusError::from),
    }
}

/// A serialized Modbus TCP session over a duplex byte stream.
///
/// `S` defaults to [`TcpStream`]; any `AsyncRead + AsyncWrite` stream can be
/// attached instead, which is how tests drive the session.
pub struct ModbusSession<S = TcpStream> {
    config: SessionConfig,
    inner: Mutex<SessionInner<S>>,
}

impl<S> ModbusSession<S> {
    /// Create a disconnected session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(SessionInner::new(None)),
        }
    }

    /// Create a session that already owns a connected stream.
    pub fn with_stream(config: SessionConfig, stream: S) -> Self {
        Self {
            config,
            inner: Mutex::new(SessionInner::new(Some(stream))),
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Unit identifier written into every request
    pub fn unit_id(&self) -> u8 {
        self.config.unit_id
    }

    /// Byte order of every 16-bit field
    pub fn byte_order(&self) -> ByteOrder {
        self.config.byte_order
    }

    /// `host:port` of the device
    pub fn peer(&self) -> String {
        self.config.address()
    }

    /// Whether a stream is currently owned
    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.stream.is_some()
    }

    /// Snapshot of the transport counters
    pub async fn stats(&self) -> TransportStats {
        self.inner.lock().await.stats
    }

    /// Allocate the next transaction identifier.
    ///
    /// The counter starts at 0 and is incremented before use, so a fresh
    /// session hands out 1 first; after 65535 it wraps to 0.
    pub async fn next_transaction_id(&self) -> u16 {
        self.inner.lock().await.allocate_transaction_id()
    }

    /// Take ownership of an already connected stream.
    ///
    /// Fails with [`ModbusError::Connection`] if the session is connected;
    /// the current stream is never replaced silently.
    pub async fn attach(&self, stream: S) -> ModbusResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.stream.is_some() {
            return Err(ModbusError::connection(format!(
                "session to {} is already connected",
                self.peer()
            )));
        }
        inner.stream = Some(stream);
        debug!("Stream attached to session for {}", self.peer());
        Ok(())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> ModbusSession<S> {
    /// Close the stream.
    ///
    /// Fails with [`ModbusError::Connection`] if no stream was established or
    /// the shutdown itself fails. The stream is released either way.
    pub async fn disconnect(&self) -> ModbusResult<()> {
        let mut inner = self.inner.lock().await;
        let mut stream = inner.stream.take().ok_or_else(|| {
            ModbusError::connection(format!("session to {} is not connected", self.peer()))
        })?;

        stream.shutdown().await.map_err(|e| {
            ModbusError::connection(format!("failed to close connection to {}: {}", self.peer(), e))
        })?;
        info!("Disconnected from {}", self.peer());
        Ok(())
    }

    /// Write `frame` and return the single reply read for it.
    ///
    /// The write and the read happen under the session lock. At most
    /// 260 bytes are read and exactly the received bytes are returned; an
    /// empty vector means the peer closed the stream.
    pub async fn exchange(&self, frame: &[u8]) -> ModbusResult<Vec<u8>> {
        let mut inner = self.inner.lock().await;
        inner.round_trip(frame, self.config.timeout).await
    }

    /// [`exchange`](Self::exchange) that gives up when `token` is cancelled.
    ///
    /// Cancellation while waiting for the lock leaves the session untouched;
    /// cancellation mid-exchange leaves the stream in an unknown position.
    pub async fn exchange_with_cancel(
        &self,
        frame: &[u8],
        token: &CancellationToken,
    ) -> ModbusResult<Vec<u8>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Exchange with {} cancelled", self.peer());
                Err(ModbusError::Cancelled)
            }
            result = self.exchange(frame) => result,
        }
    }

    /// Allocate a transaction id, build the frame and exchange it, all under
    /// one lock.
    pub(crate) async fn transact<F>(&self, build: F) -> ModbusResult<(Frame, Vec<u8>)>
    where
        F: FnOnce(FrameBuilder) -> ModbusResult<Frame>,
    {
        let mut inner = self.inner.lock().await;
        if inner.stream.is_none() {
            return Err(ModbusError::connection(format!(
                "session to {} is not connected",
                self.peer()
            )));
        }

        let transaction_id = inner.allocate_transaction_id();
        let frame = build(FrameBuilder::new(
            transaction_id,
            self.config.unit_id,
            self.config.byte_order,
        ))?;
        let reply = inner.round_trip(frame.as_bytes(), self.config.timeout).await?;
        Ok((frame, reply))
    }
}

impl ModbusSession<TcpStream> {
    /// Create a session and connect it.
    pub async fn open(config: SessionConfig) -> ModbusResult<Self> {
        let session = Self::new(config);
        session.connect().await?;
        Ok(session)
    }

    /// Dial the configured device.
    ///
    /// Fails with [`ModbusError::Connection`] when dialing fails or the
    /// session is already connected, and with [`ModbusError::Timeout`] when
    /// a connect deadline is configured and elapses.
    pub async fn connect(&self) -> ModbusResult<()> {
        let mut inner = self.inner.lock().await;
        let addr = self.peer();
        if inner.stream.is_some() {
            return Err(ModbusError::connection(format!(
                "session to {addr} is already connected"
            )));
        }

        debug!("Connecting to Modbus TCP device at {}", addr);
        let dial = TcpStream::connect((self.config.host.as_str(), self.config.port));
        let dialed = match self.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, dial).await.map_err(|_| {
                ModbusError::timeout(format!("connect to {addr}"), limit.as_millis() as u64)
            })?,
            None => dial.await,
        };
        let stream = dialed
            .map_err(|e| ModbusError::connection(format!("failed to connect to {addr}: {e}")))?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }

        inner.stream = Some(stream);
        info!("Connected to Modbus TCP device at {}", addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, DuplexStream};
    use tokio_test::io::Builder;

    fn config() -> SessionConfig {
        SessionConfig::new("127.0.0.1", 502)
    }

    #[test]
    fn test_transaction_id_sequence_and_wrap() {
        let mut inner: SessionInner<()> = SessionInner::new(None);
        for expected in 1..=u16::MAX {
            assert_eq!(inner.allocate_transaction_id(), expected);
        }
        assert_eq!(inner.allocate_transaction_id(), 0);
        assert_eq!(inner.allocate_transaction_id(), 1);
    }

    #[tokio::test]
    async fn test_next_transaction_id_starts_at_one() {
        let session: ModbusSession<DuplexStream> = ModbusSession::new(config());
        assert_eq!(session.next_transaction_id().await, 1);
        assert_eq!(session.next_transaction_id().await, 2);
    }

    #[tokio::test]
    async fn test_exchange_returns_received_bytes() {
        let frame = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x03];
        let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x04, 0x01, 0x01, 0x01, 0x05];
        let mock = Builder::new().write(&frame).read(&reply).build();

        let session = ModbusSession::with_stream(config(), mock);
        let received = session.exchange(&frame).await.unwrap();
        assert_eq!(received, reply);

        let stats = session.stats().await;
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.responses_received, 1);
        assert_eq!(stats.bytes_sent, 12);
        assert_eq!(stats.bytes_received, 10);
    }

    #[tokio::test]
    async fn test_short_reply_is_returned_as_is() {
        let frame = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        let mock = Builder::new().write(&frame).read(&[0x00, 0x01, 0x00]).build();

        let session = ModbusSession::with_stream(config(), mock);
        assert_eq!(session.exchange(&frame).await.unwrap(), vec![0x00, 0x01, 0x00]);
    }

    #[tokio::test]
    async fn test_exchange_requires_connection() {
        let session: ModbusSession<DuplexStream> = ModbusSession::new(config());
        let err = session.exchange(&[0x00]).await.unwrap_err();
        assert!(matches!(err, ModbusError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_read_failure_is_io_error() {
        let frame = [0x00, 0x01];
        let mock = Builder::new()
            .write(&frame)
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        let session = ModbusSession::with_stream(config(), mock);
        let err = session.exchange(&frame).await.unwrap_err();
        assert!(matches!(err, ModbusError::Io(_)));
        assert_eq!(session.stats().await.errors, 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_io_error() {
        let mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"))
            .build();

        let session = ModbusSession::with_stream(config(), mock);
        let err = session.exchange(&[0x00, 0x01]).await.unwrap_err();
        assert!(matches!(err, ModbusError::Io(_)));
        assert_eq!(session.stats().await.requests_sent, 0);
    }

    #[tokio::test]
    async fn test_read_deadline_produces_timeout() {
        // Keep the device end open but silent
        let (client, _device) = duplex(1024);
        let session = ModbusSession::with_stream(
            config().with_timeout(Duration::from_millis(50)),
            client,
        );

        let err = session.exchange(&[0x00, 0x01]).await.unwrap_err();
        assert!(matches!(err, ModbusError::Timeout { ref operation, timeout_ms: 50 } if operation == "read"));

        let stats = session.stats().await;
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_exchange_with_cancel() {
        let (client, _device) = duplex(1024);
        let session = ModbusSession::with_stream(config(), client);
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = session
            .exchange_with_cancel(&[0x00, 0x01], &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::Cancelled));
    }

    #[tokio::test]
    async fn test_closed_peer_yields_empty_reply() {
        let (client, device) = duplex(1024);
        drop(device);
        let session = ModbusSession::with_stream(config(), client);

        // Writes to a closed duplex fail, reads return EOF
        let result = session.exchange(&[0x00, 0x01]).await;
        match result {
            Ok(reply) => assert!(reply.is_empty()),
            Err(err) => assert!(matches!(err, ModbusError::Io(_))),
        }
    }

    #[tokio::test]
    async fn test_attach_rejects_second_stream() {
        let (first, _d1) = duplex(64);
        let (second, _d2) = duplex(64);

        let session = ModbusSession::new(config());
        assert!(!session.is_connected().await);
        session.attach(first).await.unwrap();
        assert!(session.is_connected().await);

        let err = session.attach(second).await.unwrap_err();
        assert!(matches!(err, ModbusError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_disconnect() {
        let (client, _device) = duplex(64);
        let session = ModbusSession::with_stream(config(), client);

        session.disconnect().await.unwrap();
        assert!(!session.is_connected().await);

        let err = session.disconnect().await.unwrap_err();
        assert!(matches!(err, ModbusError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_disconnect_never_connected() {
        let session: ModbusSession<DuplexStream> = ModbusSession::new(config());
        let err = session.disconnect().await.unwrap_err();
        assert!(matches!(err, ModbusError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_transact_skips_counter_when_disconnected() {
        let session: ModbusSession<DuplexStream> = ModbusSession::new(config());
        let result = session
            .transact(|builder| Ok(builder.write_single_coil(0, true)))
            .await;
        assert!(matches!(result, Err(ModbusError::Connection { .. })));
        assert_eq!(session.next_transaction_id().await, 1);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop a listener to get a port nobody is listening on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let session = ModbusSession::new(SessionConfig::new("127.0.0.1", port));
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, ModbusError::Connection { .. }));
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let session = ModbusSession::open(SessionConfig::new("127.0.0.1", port))
            .await
            .unwrap();
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, ModbusError::Connection { .. }));

        session.disconnect().await.unwrap();
        session.connect().await.unwrap();
        assert!(session.is_connected().await);
    }
}
