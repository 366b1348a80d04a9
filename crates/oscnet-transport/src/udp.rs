//! UDP transport implementation
//!
//! UDP is the native OSC transport: datagram boundaries are packet
//! boundaries, so no stream framing is involved. Each datagram is decoded
//! independently; one undecodable datagram never affects the next.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use oscnet_core::{codec, Packet};

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// UDP configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UdpConfig {
    /// Buffer size for receiving
    pub recv_buffer_size: usize,
    /// Maximum packet size
    pub max_packet_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            recv_buffer_size: 65536,
            max_packet_size: 65507, // Max UDP payload
        }
    }
}

/// UDP transport (connectionless)
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    config: UdpConfig,
}

impl UdpTransport {
    /// Bind to a local address
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, UdpConfig::default()).await
    }

    /// Bind with config
    pub async fn bind_with_config(addr: &str, config: UdpConfig) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        info!("UDP bound to {}", socket.local_addr().map_err(TransportError::Io)?);

        Ok(Self {
            socket: Arc::new(socket),
            config,
        })
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    /// Create a sender for a specific remote address
    pub fn sender_to(&self, remote: SocketAddr) -> UdpSender {
        UdpSender {
            socket: self.socket.clone(),
            remote,
            connected: Arc::new(Mutex::new(true)),
        }
    }

    /// Start receiving packets.
    ///
    /// Spawns a task that decodes each datagram and forwards the result with
    /// the source address. Datagrams that fail to decode become `Error`
    /// events.
    pub fn start_receiver(&self) -> UdpReceiver {
        let (tx, rx) = mpsc::channel(100);
        let socket = self.socket.clone();
        let max_size = self.config.max_packet_size;

        tokio::spawn(async move {
            let mut buf = vec![0u8; max_size];

            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, from)) => {
                        debug!("UDP received {} bytes from {}", len, from);
                        let event = match codec::decode(&buf[..len]) {
                            Ok(packet) => TransportEvent::Packet(packet),
                            Err(e) => {
                                warn!("Undecodable datagram from {}: {}", from, e);
                                TransportEvent::Error(e.to_string())
                            }
                        };
                        if tx.send((event, from)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("UDP receive error: {}", e);
                        if tx
                            .send((
                                TransportEvent::Error(e.to_string()),
                                SocketAddr::from(([0, 0, 0, 0], 0)),
                            ))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        UdpReceiver { rx }
    }

    /// Encode a packet and send it as one datagram
    pub async fn send_packet_to(&self, packet: &Packet, target: SocketAddr) -> Result<()> {
        let data = codec::encode(packet);
        self.socket
            .send_to(&data, target)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Enable broadcast
    pub fn set_broadcast(&self, enable: bool) -> Result<()> {
        self.socket
            .set_broadcast(enable)
            .map_err(TransportError::Io)
    }
}

/// UDP sender (to a specific remote)
pub struct UdpSender {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for UdpSender {
    async fn send(&self, packet: Packet) -> Result<()> {
        let data = codec::encode(&packet);
        self.socket
            .send_to(&data, self.remote)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    fn try_send(&self, packet: Packet) -> Result<()> {
        let data = codec::encode(&packet);
        self.socket
            .try_send_to(&data, self.remote)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::WouldBlock => TransportError::BufferFull,
                _ => TransportError::SendFailed(e.to_string()),
            })?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// UDP receiver
pub struct UdpReceiver {
    rx: mpsc::Receiver<(TransportEvent, SocketAddr)>,
}

impl UdpReceiver {
    /// Receive the next event with source address
    pub async fn recv_from(&mut self) -> Option<(TransportEvent, SocketAddr)> {
        self.rx.recv().await
    }
}

#[async_trait]
impl TransportReceiver for UdpReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await.map(|(event, _)| event)
    }
}

/// UDP broadcast sender
pub struct UdpBroadcast {
    socket: Arc<UdpSocket>,
    broadcast_addr: SocketAddr,
}

impl UdpBroadcast {
    /// Create a broadcast sender for a port
    pub async fn new(port: u16) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        socket.set_broadcast(true).map_err(TransportError::Io)?;

        let broadcast_addr = SocketAddr::from(([255, 255, 255, 255], port));

        Ok(Self {
            socket: Arc::new(socket),
            broadcast_addr,
        })
    }

    /// Broadcast one packet
    pub async fn broadcast(&self, packet: &Packet) -> Result<()> {
        let data = codec::encode(packet);
        self.socket
            .send_to(&data, self.broadcast_addr)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }
}
