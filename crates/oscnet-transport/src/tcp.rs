//! TCP transport implementation
//!
//! OSC over TCP needs packet boundaries restored; the framing convention is
//! chosen per connection via [`TcpConfig::framing`] (SLIP by default, PLH for
//! peers that send a length header). Both sides of a connection must agree on
//! the convention out of band.

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use oscnet_core::stream::{self, SocketState, StreamFraming};
use oscnet_core::Packet;

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender, TransportServer};

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Maximum message size (64KB)
const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default channel buffer size for TCP connections
const DEFAULT_CHANNEL_BUFFER_SIZE: usize = 1000;

/// TCP configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TcpConfig {
    /// Stream framing convention (SLIP or packet length header)
    pub framing: StreamFraming,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Read buffer size
    pub read_buffer_size: usize,
    /// Keep-alive interval in seconds (0 = disabled)
    pub keepalive_secs: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            framing: StreamFraming::Slip,
            max_message_size: MAX_MESSAGE_SIZE,
            read_buffer_size: 8192,
            keepalive_secs: 30,
        }
    }
}

/// TCP transport
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            config: TcpConfig::default(),
        }
    }

    pub fn with_config(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Connect to a TCP server
    pub async fn connect(&self, addr: &str) -> Result<(TcpSender, TcpReceiver)> {
        info!("Connecting to TCP: {}", addr);

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        // Enable TCP keepalive if configured
        if self.config.keepalive_secs > 0 {
            let socket = socket2::SockRef::from(&stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(std::time::Duration::from_secs(self.config.keepalive_secs));
            let _ = socket.set_tcp_keepalive(&keepalive);
        }

        let (sender, receiver) = spawn_connection(stream, self.config.clone());

        info!("TCP connected to {}", addr);
        Ok((sender, receiver))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire up the channels and IO task for one established connection
fn spawn_connection(stream: TcpStream, config: TcpConfig) -> (TcpSender, TcpReceiver) {
    let connected = Arc::new(Mutex::new(true));
    let (outgoing_tx, outgoing_rx) = mpsc::channel::<Packet>(DEFAULT_CHANNEL_BUFFER_SIZE);
    let (incoming_tx, incoming_rx) = mpsc::channel::<TransportEvent>(DEFAULT_CHANNEL_BUFFER_SIZE);

    let sender = TcpSender {
        tx: outgoing_tx,
        framing: config.framing,
        connected: connected.clone(),
    };

    let receiver = TcpReceiver { rx: incoming_rx };

    let connected_clone = connected.clone();
    tokio::spawn(async move {
        let (reader, writer) = stream.into_split();
        run_tcp_io_loop(reader, writer, outgoing_rx, incoming_tx, config, connected_clone).await;
    });

    (sender, receiver)
}

/// Shared IO loop for TCP connections.
///
/// Owns the connection's [`SocketState`]; every read chunk is fed through the
/// resumable stream decoder, so packet boundaries may fall anywhere relative
/// to read boundaries. A malformed packet is logged and skipped without
/// dropping the connection.
async fn run_tcp_io_loop(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut outgoing_rx: mpsc::Receiver<Packet>,
    incoming_tx: mpsc::Sender<TransportEvent>,
    config: TcpConfig,
    connected: Arc<Mutex<bool>>,
) {
    let mut read_buf = BytesMut::with_capacity(config.read_buffer_size);
    let mut state = SocketState::new();

    loop {
        tokio::select! {
            Some(packet) = outgoing_rx.recv() => {
                let frame = stream::encode_stream(config.framing, &packet);

                if let Err(e) = writer.write_all(&frame).await {
                    error!("TCP write error: {}", e);
                    break;
                }
            }

            result = reader.read_buf(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        debug!("TCP connection closed");
                        let _ = incoming_tx.send(TransportEvent::Disconnected { reason: None }).await;
                        break;
                    }
                    Ok(n) => {
                        let chunk = read_buf.split_to(n);
                        let mut packets = Vec::new();
                        let decoded = stream::decode_stream(
                            config.framing,
                            &chunk,
                            &mut state,
                            &mut |packet| packets.push(packet),
                        );

                        if let Err(e) = decoded {
                            // One bad packet; the decoder already resynced.
                            warn!("Dropping undecodable packet: {}", e);
                            let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                        }

                        if state.buffer.len() > config.max_message_size {
                            error!(
                                "Message too large: {} > {}",
                                state.buffer.len(),
                                config.max_message_size
                            );
                            let _ = incoming_tx.send(TransportEvent::Disconnected {
                                reason: Some(format!("Message too large: {}", state.buffer.len()))
                            }).await;
                            break;
                        }

                        let mut closed = false;
                        for packet in packets {
                            if incoming_tx.send(TransportEvent::Packet(packet)).await.is_err() {
                                closed = true;
                                break;
                            }
                        }
                        if closed {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("TCP read error: {}", e);
                        let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
        }
    }

    *connected.lock() = false;
}

/// TCP sender for writing packets
pub struct TcpSender {
    tx: mpsc::Sender<Packet>,
    framing: StreamFraming,
    connected: Arc<Mutex<bool>>,
}

impl TcpSender {
    /// Framing convention this connection writes with
    pub fn framing(&self) -> StreamFraming {
        self.framing
    }
}

#[async_trait]
impl TransportSender for TcpSender {
    async fn send(&self, packet: Packet) -> Result<()> {
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }

        self.tx
            .send(packet)
            .await
            .map_err(|_| TransportError::SendFailed("Channel closed".into()))
    }

    fn try_send(&self, packet: Packet) -> Result<()> {
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }

        self.tx.try_send(packet).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::BufferFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::ConnectionClosed,
        })
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// TCP receiver for reading decoded packets
pub struct TcpReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for TcpReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// TCP server for accepting connections
pub struct TcpServer {
    listener: TcpListener,
    config: TcpConfig,
}

impl TcpServer {
    /// Bind to an address and create a new TCP server
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, TcpConfig::default()).await
    }

    /// Bind with custom configuration
    pub async fn bind_with_config(addr: &str, config: TcpConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        info!("TCP server listening on {}", addr);

        Ok(Self { listener, config })
    }
}

#[async_trait]
impl TransportServer for TcpServer {
    type Sender = TcpSender;
    type Receiver = TcpReceiver;

    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::AcceptFailed(e.to_string()))?;

        info!("TCP connection accepted from {}", peer_addr);

        if self.config.keepalive_secs > 0 {
            let socket = socket2::SockRef::from(&stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(std::time::Duration::from_secs(self.config.keepalive_secs));
            let _ = socket.set_tcp_keepalive(&keepalive);
        }

        let (sender, receiver) = spawn_connection(stream, self.config.clone());

        Ok((sender, receiver, peer_addr))
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        // TcpListener closes when dropped
        Ok(())
    }
}
