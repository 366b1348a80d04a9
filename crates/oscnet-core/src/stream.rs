//! TCP stream framing
//!
//! OSC over a stream transport needs packet boundaries restored. Two
//! incompatible conventions exist in the wild:
//!
//! - **SLIP** (RFC 1055 double-END): packets delimited by `0xC0`, with
//!   `0xC0` and `0xDB` byte-stuffed inside the payload.
//! - **PLH** (packet length header): each packet preceded by a big-endian
//!   `i32` byte count, no delimiter.
//!
//! Both decoders are resumable: a [`SocketState`] carries partial data
//! across arbitrarily-chunked reads, including chunk boundaries that fall
//! inside a SLIP escape sequence or a PLH length header. One state instance
//! belongs to exactly one connection and must only ever see chunks from a
//! single reader at a time.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::types::Packet;
use crate::Result;

/// SLIP framing bytes, RFC 1055
pub const SLIP_END: u8 = 0xC0;
pub const SLIP_ESC: u8 = 0xDB;
pub const SLIP_ESC_END: u8 = 0xDC;
pub const SLIP_ESC_ESC: u8 = 0xDD;

/// Stream framing convention, selected per connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFraming {
    /// RFC 1055 double-END byte stuffing
    #[default]
    Slip,
    /// Big-endian i32 packet length header
    Plh,
}

/// Per-connection decoder state.
///
/// `dangling_esc` is only meaningful for SLIP framing; it records that the
/// previous chunk ended in the middle of an escape sequence. `discarded`
/// counts the bytes dropped by PLH resynchronization, as a diagnostic.
#[derive(Debug, Default)]
pub struct SocketState {
    pub buffer: BytesMut,
    pub dangling_esc: bool,
    pub discarded: u64,
}

impl SocketState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Feed a chunk through the decoder for the given framing convention.
///
/// Complete packets are handed to `dispatch` in order; leftover bytes stay
/// in `state` for the next chunk.
pub fn decode_stream(
    framing: StreamFraming,
    chunk: &[u8],
    state: &mut SocketState,
    dispatch: &mut dyn FnMut(Packet),
) -> Result<()> {
    match framing {
        StreamFraming::Slip => decode_slip(chunk, state, dispatch),
        StreamFraming::Plh => decode_plh(chunk, state, dispatch),
    }
}

/// SLIP decoder.
///
/// On a codec failure at a packet boundary the pending buffer is cleared
/// and the error returned; the decoder stays usable for later packets.
pub fn decode_slip(
    chunk: &[u8],
    state: &mut SocketState,
    dispatch: &mut dyn FnMut(Packet),
) -> Result<()> {
    let mut index = 0;
    // A while loop rather than an iterator: an ESC consumes the following
    // byte as well, so the cursor sometimes advances by two.
    while index < chunk.len() {
        let byte = chunk[index];
        index += 1;
        if state.dangling_esc {
            state.dangling_esc = false;
            push_escaped(&mut state.buffer, byte);
        } else {
            match byte {
                SLIP_END => {
                    // Empty payloads come from the doubled ENDs senders use
                    // to flush line noise (RFC 1055 page 5); ignore them.
                    if state.buffer.is_empty() {
                        continue;
                    }
                    let result = codec::decode(&state.buffer);
                    state.buffer.clear();
                    dispatch(result?);
                }
                SLIP_ESC => {
                    if index < chunk.len() {
                        push_escaped(&mut state.buffer, chunk[index]);
                        index += 1;
                    } else {
                        // Chunk stopped mid-escape; the next chunk's first
                        // byte completes it.
                        state.dangling_esc = true;
                    }
                }
                _ => state.buffer.put_u8(byte),
            }
        }
    }
    Ok(())
}

/// Resolve the byte following an ESC.
///
/// A follower other than ESC_END/ESC_ESC is a protocol violation; RFC 1055
/// (page 6) says to leave the byte alone and stuff it into the packet.
fn push_escaped(buffer: &mut BytesMut, byte: u8) {
    match byte {
        SLIP_ESC_END => buffer.put_u8(SLIP_END),
        SLIP_ESC_ESC => buffer.put_u8(SLIP_ESC),
        other => buffer.put_u8(other),
    }
}

/// PLH decoder.
///
/// A header that cannot be satisfied (non-positive length, or a packet body
/// that fails to decode) causes exactly one leading byte to be discarded
/// before retrying, resynchronizing on the next plausible header. Each
/// discarded byte is counted in `state.discarded`. The loop terminates
/// because every iteration either consumes a whole packet or shrinks the
/// buffer by one byte.
pub fn decode_plh(
    chunk: &[u8],
    state: &mut SocketState,
    dispatch: &mut dyn FnMut(Packet),
) -> Result<()> {
    state.buffer.extend_from_slice(chunk);
    while state.buffer.len() > 4 {
        let length = i32::from_be_bytes(
            state.buffer[..4].try_into().expect("4-byte slice"),
        );
        if length > 0 && state.buffer.len() >= length as usize + 4 {
            let body = &state.buffer[4..4 + length as usize];
            match codec::decode(body) {
                Ok(packet) => {
                    state.buffer.advance(4 + length as usize);
                    dispatch(packet);
                }
                Err(_) => {
                    state.buffer.advance(1);
                    state.discarded += 1;
                }
            }
        } else if length > 0 {
            // Not enough data yet; wait for the next chunk.
            break;
        } else {
            // Corrupt header.
            state.buffer.advance(1);
            state.discarded += 1;
        }
    }
    Ok(())
}

// ============================================================================
// ENCODING
// ============================================================================

/// Frame an encoded packet for a stream transport.
pub fn encode_stream(framing: StreamFraming, packet: &Packet) -> Bytes {
    match framing {
        StreamFraming::Slip => encode_slip(packet),
        StreamFraming::Plh => encode_plh(packet),
    }
}

/// SLIP-frame a packet: END, byte-stuffed payload, END.
///
/// The leading END flushes any noise accumulated in the receiver.
pub fn encode_slip(packet: &Packet) -> Bytes {
    let payload = codec::encode(packet);
    let mut out = BytesMut::with_capacity(payload.len() + 2);
    out.put_u8(SLIP_END);
    for &byte in payload.iter() {
        match byte {
            SLIP_END => {
                out.put_u8(SLIP_ESC);
                out.put_u8(SLIP_ESC_END);
            }
            SLIP_ESC => {
                out.put_u8(SLIP_ESC);
                out.put_u8(SLIP_ESC_ESC);
            }
            _ => out.put_u8(byte),
        }
    }
    out.put_u8(SLIP_END);
    out.freeze()
}

/// PLH-frame a packet: big-endian i32 length, then the payload.
pub fn encode_plh(packet: &Packet) -> Bytes {
    let payload = codec::encode(packet);
    let mut out = BytesMut::with_capacity(payload.len() + 4);
    out.put_i32(payload.len() as i32);
    out.extend_from_slice(&payload);
    out.freeze()
}
