//! OSC transport layer
//!
//! Transport implementations for oscnet:
//! - UDP (native OSC, one packet per datagram)
//! - TCP (SLIP or packet-length-header stream framing)
//!
//! All transports deliver decoded [`oscnet_core::Packet`]s through
//! [`TransportEvent`]; raw bytes never cross the API boundary.

pub mod error;
pub mod tcp;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use tcp::{TcpConfig, TcpSender, TcpServer, TcpTransport};
pub use traits::{TransportEvent, TransportReceiver, TransportSender, TransportServer};
pub use udp::{UdpBroadcast, UdpConfig, UdpTransport};
