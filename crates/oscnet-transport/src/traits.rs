//! Transport trait definitions
//!
//! Transports deliver decoded [`Packet`]s rather than raw bytes: framing and
//! codec work happens inside each transport's read task, so applications
//! only ever see whole packets.

use async_trait::async_trait;
use std::net::SocketAddr;

use oscnet_core::Packet;

use crate::error::Result;

/// Events that can occur on a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Connection established
    Connected,
    /// Connection closed (clean or error)
    Disconnected { reason: Option<String> },
    /// A complete OSC packet was received and decoded
    Packet(Packet),
    /// Error occurred
    Error(String),
}

/// Trait for sending packets
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Encode, frame and send a packet
    async fn send(&self, packet: Packet) -> Result<()>;

    /// Non-blocking send; fails with `BufferFull` when the outgoing queue is full
    fn try_send(&self, packet: Packet) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Close the sender
    async fn close(&self) -> Result<()>;
}

/// Trait for receiving events
#[async_trait]
pub trait TransportReceiver: Send {
    /// Receive the next event
    async fn recv(&mut self) -> Option<TransportEvent>;
}

/// Trait for transport servers (listeners)
#[async_trait]
pub trait TransportServer: Send + Sync {
    /// The sender type for accepted connections
    type Sender: TransportSender;
    /// The receiver type for accepted connections
    type Receiver: TransportReceiver;

    /// Accept a new connection
    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)>;

    /// Get the local address
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Stop listening
    async fn close(&self) -> Result<()>;
}
