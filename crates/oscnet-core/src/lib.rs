//! oscnet Core
//!
//! Core types, encoding, and protocol primitives for Open Sound Control
//! (OSC 1.0/1.1 wire compatible).
//!
//! This crate provides:
//! - Packet types ([`Packet`], [`Message`], [`Bundle`], [`Argument`])
//! - Binary wire encoding/decoding ([`codec`])
//! - TCP stream framing, SLIP and packet-length-header ([`stream`])
//! - Address pattern matching and dispatch ([`AddressSpace`])
//! - NTP-style time tags ([`TimeTag`])

pub mod address;
pub mod codec;
pub mod error;
pub mod stream;
pub mod time;
pub mod types;

pub use address::{AddressMethod, AddressSpace, MatchPriority};
pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use stream::{SocketState, StreamFraming};
pub use time::TimeTag;
pub use types::{Argument, Bundle, Message, Packet};

/// Default OSC port used by both UDP and TCP transports
pub const DEFAULT_PORT: u16 = 3032;

/// The fixed string prefix of every OSC bundle
pub const BUNDLE_PREFIX: &str = "#bundle";
