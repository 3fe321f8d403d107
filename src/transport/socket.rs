//! Token-framed TCP transport for line-oriented log collectors.
//!
//! The transport owns exactly one connection and one reusable frame buffer,
//! both behind a single mutex, so concurrent sends are serialised and each
//! frame reaches the wire whole. A write failure drops the connection; later
//! sends fail until [`FramedSocketTransport::reconnect`] is called.

use std::{
    fmt,
    io::{self, Write},
    mem,
    time::Duration,
};

use log::debug;
use parking_lot::Mutex;

use super::{
    Ack, Transport,
    connection::{self, ActiveConnection, TlsOptions},
    frame::{FrameBuffer, write_frame},
};
use crate::error::DeliveryError;

/// Default collector host.
pub const DEFAULT_HOST: &str = "data.logentries.com";
/// Default collector port.
pub const DEFAULT_PORT: u16 = 514;
/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Initial capacity of the reusable frame buffer.
pub const INITIAL_FRAME_CAPACITY: usize = 1024;
/// Default maximum frame size (in bytes) accepted by the transport.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20; // 1 MiB

/// Configuration for a [`FramedSocketTransport`].
#[derive(Clone)]
pub struct SocketConfig {
    pub host: String,
    pub port: u16,
    /// Token prefixed to every frame.
    pub token: String,
    pub connect_timeout: Duration,
    /// Write timeout; `None` lets writes block indefinitely.
    pub write_timeout: Option<Duration>,
    pub max_frame_size: usize,
    pub tls: Option<TlsOptions>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            token: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            tls: None,
        }
    }
}

impl SocketConfig {
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// The token is a credential; keep it out of debug output.
impl fmt::Debug for SocketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("max_frame_size", &self.max_frame_size)
            .field("tls", &self.tls)
            .finish()
    }
}

#[derive(Debug)]
enum ConnectionState {
    /// Never connected; the next send connects lazily.
    Idle,
    Connected(ActiveConnection),
    /// The connection failed mid-write and was dropped.
    Broken,
    Closed,
}

impl ConnectionState {
    fn active(
        &mut self,
        open: impl FnOnce() -> Result<ActiveConnection, DeliveryError>,
    ) -> Result<&mut ActiveConnection, DeliveryError> {
        match self {
            ConnectionState::Idle => *self = ConnectionState::Connected(open()?),
            ConnectionState::Broken => {
                return Err(DeliveryError::Transport(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "connection lost; reconnect required",
                )));
            }
            ConnectionState::Closed => return Err(DeliveryError::Closed),
            ConnectionState::Connected(_) => {}
        }
        match self {
            ConnectionState::Connected(conn) => Ok(conn),
            _ => Err(DeliveryError::Closed),
        }
    }
}

#[derive(Debug)]
struct SocketState {
    connection: ConnectionState,
    buffer: FrameBuffer,
}

/// Transport writing `TOKEN SP PAYLOAD LF` frames over one TCP connection.
pub struct FramedSocketTransport {
    config: SocketConfig,
    state: Mutex<SocketState>,
}

impl FramedSocketTransport {
    /// Create a transport that connects lazily on the first send.
    pub fn new(config: SocketConfig) -> Self {
        Self::with_state(config, ConnectionState::Idle)
    }

    /// Create a transport and connect immediately.
    pub fn connect_new(config: SocketConfig) -> Result<Self, DeliveryError> {
        let transport = Self::new(config);
        transport.connect()?;
        Ok(transport)
    }

    /// Create a transport writing to an already established stream.
    ///
    /// [`reconnect`](Self::reconnect) replaces the stream with a TCP
    /// connection to the configured endpoint.
    pub fn from_stream<W>(config: SocketConfig, stream: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let conn = ActiveConnection::Stream(Box::new(stream));
        Self::with_state(config, ConnectionState::Connected(conn))
    }

    fn with_state(config: SocketConfig, connection: ConnectionState) -> Self {
        let buffer = FrameBuffer::new(INITIAL_FRAME_CAPACITY, config.max_frame_size);
        Self {
            config,
            state: Mutex::new(SocketState { connection, buffer }),
        }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state.lock().connection, ConnectionState::Connected(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state.lock().connection, ConnectionState::Closed)
    }

    /// Whether a write failure dropped the connection.
    pub fn is_broken(&self) -> bool {
        matches!(self.state.lock().connection, ConnectionState::Broken)
    }

    fn open(&self) -> Result<ActiveConnection, DeliveryError> {
        let cfg = &self.config;
        let mut conn = connection::connect(
            &cfg.host,
            cfg.port,
            cfg.tls.as_ref(),
            cfg.connect_timeout,
        )
        .map_err(|source| DeliveryError::Open {
            endpoint: cfg.endpoint(),
            source,
        })?;
        conn.set_write_timeout(cfg.write_timeout)
            .map_err(|source| DeliveryError::Open {
                endpoint: cfg.endpoint(),
                source,
            })?;
        debug!("connected to {}", cfg.endpoint());
        Ok(conn)
    }

    /// Connect if no connection is currently established.
    pub fn connect(&self) -> Result<(), DeliveryError> {
        let mut state = self.state.lock();
        match state.connection {
            ConnectionState::Connected(_) => Ok(()),
            ConnectionState::Closed => Err(DeliveryError::Closed),
            ConnectionState::Idle | ConnectionState::Broken => {
                state.connection = ConnectionState::Connected(self.open()?);
                Ok(())
            }
        }
    }

    /// Replace the connection with a freshly established one.
    ///
    /// The previous connection, if any, is dropped first. Fails with
    /// [`DeliveryError::Closed`] once the transport has been closed.
    pub fn reconnect(&self) -> Result<(), DeliveryError> {
        let mut state = self.state.lock();
        if matches!(state.connection, ConnectionState::Closed) {
            return Err(DeliveryError::Closed);
        }
        let previous = mem::replace(&mut state.connection, ConnectionState::Broken);
        let fallback = match previous {
            ConnectionState::Connected(mut old) => {
                if let Err(err) = old.shutdown() {
                    debug!("shutting down old connection to {}: {err}", self.config.endpoint());
                }
                ConnectionState::Broken
            }
            ConnectionState::Idle => ConnectionState::Idle,
            _ => ConnectionState::Broken,
        };
        match self.open() {
            Ok(conn) => {
                state.connection = ConnectionState::Connected(conn);
                Ok(())
            }
            Err(err) => {
                state.connection = fallback;
                Err(err)
            }
        }
    }
}

impl Transport for FramedSocketTransport {
    fn send(&self, payload: &[u8]) -> Result<Ack, DeliveryError> {
        let mut state = self.state.lock();
        let SocketState { connection, buffer } = &mut *state;
        if matches!(connection, ConnectionState::Closed) {
            return Err(DeliveryError::Closed);
        }
        let frame = buffer.fill(self.config.token.as_bytes(), payload)?;
        let conn = connection.active(|| self.open())?;
        match write_frame(conn, frame) {
            Ok(written) => Ok(Ack::Written(written)),
            Err(err) => {
                *connection = ConnectionState::Broken;
                Err(DeliveryError::Transport(err))
            }
        }
    }

    fn flush(&self) -> Result<(), DeliveryError> {
        let mut state = self.state.lock();
        match &mut state.connection {
            ConnectionState::Connected(conn) => conn.flush().map_err(DeliveryError::Transport),
            _ => Ok(()),
        }
    }

    fn close(&self) -> Result<(), DeliveryError> {
        let mut state = self.state.lock();
        match mem::replace(&mut state.connection, ConnectionState::Closed) {
            ConnectionState::Connected(mut conn) => conn.shutdown().map_err(DeliveryError::Close),
            _ => Ok(()),
        }
    }

    fn endpoint(&self) -> String {
        self.config.endpoint()
    }
}

impl fmt::Debug for FramedSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedSocketTransport")
            .field("endpoint", &self.config.endpoint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<StdMutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("sink lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Failing;

    impl Write for Failing {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn unreachable_config() -> SocketConfig {
        let port = {
            let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind");
            listener.local_addr().expect("addr").port()
        };
        SocketConfig {
            connect_timeout: Duration::from_millis(200),
            ..SocketConfig::new("127.0.0.1", port, "tok")
        }
    }

    #[test]
    fn writes_token_framed_payloads() {
        let sink = SharedSink::default();
        let transport = FramedSocketTransport::from_stream(
            SocketConfig::new("unused", 1, "abc-123"),
            sink.clone(),
        );
        let ack = transport.send(b"first").expect("send");
        assert_eq!(ack, Ack::Written(14));
        transport.send(b"second").expect("send");
        assert_eq!(
            sink.0.lock().expect("lock").as_slice(),
            b"abc-123 first\nabc-123 second\n"
        );
    }

    #[test]
    fn oversized_payload_is_rejected_without_writing() {
        let sink = SharedSink::default();
        let config = SocketConfig {
            max_frame_size: 8,
            ..SocketConfig::new("unused", 1, "tok")
        };
        let transport = FramedSocketTransport::from_stream(config, sink.clone());
        let err = transport.send(b"0123456789").expect_err("too large");
        assert!(matches!(err, DeliveryError::PayloadTooLarge { .. }));
        assert!(sink.0.lock().expect("lock").is_empty());
        assert!(transport.is_connected());
    }

    #[test]
    fn write_failure_breaks_connection_until_reconnect() {
        let transport = FramedSocketTransport::from_stream(unreachable_config(), Failing);
        let err = transport.send(b"x").expect_err("write fails");
        assert!(matches!(err, DeliveryError::Transport(_)));
        assert!(transport.is_broken());

        let err = transport.send(b"y").expect_err("still broken");
        match err {
            DeliveryError::Transport(source) => {
                assert_eq!(source.kind(), io::ErrorKind::NotConnected)
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn lazy_connect_failure_reports_open_error() {
        let transport = FramedSocketTransport::new(unreachable_config());
        let err = transport.send(b"x").expect_err("connect fails");
        assert!(matches!(err, DeliveryError::Open { .. }));
        assert!(!transport.is_broken());
    }

    #[test]
    fn close_is_idempotent_and_blocks_later_sends() {
        let transport =
            FramedSocketTransport::from_stream(unreachable_config(), SharedSink::default());
        transport.close().expect("first close");
        transport.close().expect("second close is a no-op");
        assert!(transport.is_closed());
        assert!(matches!(transport.send(b"x"), Err(DeliveryError::Closed)));
        assert!(matches!(transport.reconnect(), Err(DeliveryError::Closed)));
        assert!(matches!(transport.connect(), Err(DeliveryError::Closed)));
    }

    #[test]
    fn oversized_payload_after_close_reports_closed() {
        let config = SocketConfig {
            max_frame_size: 8,
            ..unreachable_config()
        };
        let transport = FramedSocketTransport::from_stream(config, SharedSink::default());
        transport.close().expect("close");
        assert!(matches!(
            transport.send(b"0123456789"),
            Err(DeliveryError::Closed)
        ));
    }

    #[test]
    fn failed_reconnect_keeps_lazy_connect_for_idle_transport() {
        let transport = FramedSocketTransport::new(unreachable_config());
        let err = transport.reconnect().expect_err("nothing is listening");
        assert!(matches!(err, DeliveryError::Open { .. }));
        assert!(!transport.is_broken());
        let err = transport.send(b"x").expect_err("still nothing listening");
        assert!(matches!(err, DeliveryError::Open { .. }));
    }

    #[test]
    fn failed_reconnect_leaves_broken_transport_broken() {
        let transport = FramedSocketTransport::from_stream(unreachable_config(), Failing);
        transport.send(b"x").expect_err("write fails");
        transport.reconnect().expect_err("nothing is listening");
        assert!(transport.is_broken());
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = SocketConfig::new("host", 1, "secret-token");
        assert!(!format!("{config:?}").contains("secret-token"));
    }
}
