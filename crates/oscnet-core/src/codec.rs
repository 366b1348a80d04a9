//! OSC binary codec
//!
//! Encodes and decodes [`Packet`]s to and from the OSC 1.0/1.1 wire format:
//! big-endian scalars, NUL-terminated strings and length-prefixed blobs, each
//! padded to a 4-byte boundary.
//!
//! Wire layout:
//! ```text
//! Message:  /address\0.. ,tags\0.. arg0 arg1 ...
//! Bundle:   #bundle\0 timetag(8) [len(i32) element] ...
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::time::TimeTag;
use crate::types::{Argument, Bundle, Message, Packet};
use crate::{Error, Result, BUNDLE_PREFIX};

/// Round a byte count up to the next multiple of 4
#[inline(always)]
fn align(n: usize) -> usize {
    (n + 3) & !3
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode a packet to its binary wire form
pub fn encode(packet: &Packet) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(packet));
    encode_into(&mut buf, packet);
    buf.freeze()
}

/// Exact encoded size of a packet, used for buffer pre-allocation
pub fn encoded_len(packet: &Packet) -> usize {
    match packet {
        Packet::Message(m) => message_len(m),
        Packet::Bundle(b) => bundle_len(b),
    }
}

fn message_len(msg: &Message) -> usize {
    let mut len = osc_string_len(msg.address_pattern().len());
    len += osc_string_len(1 + msg.arguments().len()); // "," + tags
    for arg in msg.arguments() {
        len += match arg {
            Argument::Int(_) | Argument::Float(_) => 4,
            Argument::String(s) => osc_string_len(s.len()),
            Argument::Blob(b) => 4 + align(b.len()),
            Argument::TimeTag(_) => 8,
            Argument::True | Argument::False | Argument::Nil | Argument::Impulse => 0,
        };
    }
    len
}

fn bundle_len(bundle: &Bundle) -> usize {
    let mut len = osc_string_len(BUNDLE_PREFIX.len()) + 8;
    for element in &bundle.elements {
        len += 4 + encoded_len(element);
    }
    len
}

/// Encoded size of an OSC string with the given raw UTF-8 length.
/// Always at least one NUL terminator, then padding to a 4-byte boundary.
#[inline(always)]
fn osc_string_len(raw: usize) -> usize {
    align(raw + 1)
}

fn encode_into(buf: &mut BytesMut, packet: &Packet) {
    match packet {
        Packet::Message(m) => encode_message(buf, m),
        Packet::Bundle(b) => encode_bundle(buf, b),
    }
}

fn encode_message(buf: &mut BytesMut, msg: &Message) {
    put_osc_string(buf, msg.address_pattern());
    put_osc_string(buf, &msg.type_tag_string());
    for arg in msg.arguments() {
        match arg {
            Argument::Int(i) => buf.put_i32(*i),
            Argument::Float(f) => buf.put_f32(*f),
            Argument::String(s) => put_osc_string(buf, s),
            Argument::Blob(b) => put_osc_blob(buf, b),
            Argument::TimeTag(t) => t.encode(buf),
            // Markers carry their value in the type tag alone
            Argument::True | Argument::False | Argument::Nil | Argument::Impulse => {}
        }
    }
}

fn encode_bundle(buf: &mut BytesMut, bundle: &Bundle) {
    put_osc_string(buf, BUNDLE_PREFIX);
    bundle.time_tag.encode(buf);
    for element in &bundle.elements {
        buf.put_i32(encoded_len(element) as i32);
        encode_into(buf, element);
    }
}

/// UTF-8 bytes, at least one NUL, zero-padded to a 4-byte boundary.
/// A string whose raw length is already a multiple of 4 gets 4 NULs.
fn put_osc_string(buf: &mut BytesMut, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    let pad = osc_string_len(s.len()) - s.len();
    buf.put_bytes(0, pad);
}

/// Big-endian i32 byte count, payload, payload-only padding to 4 bytes.
fn put_osc_blob(buf: &mut BytesMut, b: &[u8]) {
    buf.put_i32(b.len() as i32);
    buf.extend_from_slice(b);
    buf.put_bytes(0, align(b.len()) - b.len());
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode a packet from its binary wire form
pub fn decode(data: &[u8]) -> Result<Packet> {
    match data.first() {
        Some(b'/') => {
            let mut index = 0;
            Ok(Packet::Message(decode_message(data, &mut index)?))
        }
        Some(b'#') => Ok(Packet::Bundle(decode_bundle(data)?)),
        Some(&other) => Err(Error::UnrecognisedData(other)),
        None => Err(Error::truncated("packet", 1, 0)),
    }
}

fn decode_message(data: &[u8], index: &mut usize) -> Result<Message> {
    let address = read_osc_string(data, index, "address pattern")?;
    let type_tags = read_osc_string(data, index, "type tag string")?;

    let mut arguments = Vec::new();
    if let Some(tags) = type_tags.strip_prefix(',') {
        arguments.reserve(tags.len());
        for tag in tags.chars() {
            match tag {
                'i' => arguments.push(Argument::Int(read_i32(data, index, "int32")?)),
                'f' => arguments.push(Argument::Float(read_f32(data, index)?)),
                's' => {
                    arguments.push(Argument::String(read_osc_string(data, index, "string")?))
                }
                'b' => arguments.push(Argument::Blob(read_osc_blob(data, index)?)),
                't' => {
                    let mut rest = &data[(*index).min(data.len())..];
                    let tag = TimeTag::decode(&mut rest)?;
                    *index += 8;
                    arguments.push(Argument::TimeTag(tag));
                }
                'T' => arguments.push(Argument::True),
                'F' => arguments.push(Argument::False),
                'N' => arguments.push(Argument::Nil),
                'I' => arguments.push(Argument::Impulse),
                // Unknown tags are skipped without an argument: senders may
                // use tags from later OSC revisions we do not understand.
                _ => continue,
            }
        }
    }
    Ok(Message::new(address, arguments))
}

fn decode_bundle(data: &[u8]) -> Result<Bundle> {
    // The fixed prefix is the OSC-string form of "#bundle": 8 bytes total.
    const PREFIX: &[u8; 8] = b"#bundle\0";
    if data.len() < 8 {
        return Err(Error::truncated("bundle prefix", 8, data.len()));
    }
    if &data[..8] != PREFIX {
        return Err(Error::MalformedBundlePrefix);
    }

    let mut index = 8;
    let mut rest = &data[index..];
    let time_tag = TimeTag::decode(&mut rest)?;
    index += 8;

    // An empty remainder is a valid bundle with no elements.
    let mut elements = Vec::new();
    while index < data.len() {
        let size = read_i32(data, &mut index, "element size")?;
        if size <= 0 || index + size as usize > data.len() {
            return Err(Error::InvalidElementLength(size));
        }
        let body = &data[index..index + size as usize];
        elements.push(decode(body)?);
        index += size as usize;
    }
    Ok(Bundle::new(elements, time_tag))
}

/// Scan for the NUL terminator and advance past the 4-byte-aligned padding.
fn read_osc_string(data: &[u8], index: &mut usize, field: &'static str) -> Result<String> {
    let start = *index;
    if start >= data.len() {
        return Err(Error::truncated(field, 1, 0));
    }
    let nul = data[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::TruncatedField {
            field,
            needed: data.len() - start + 1,
            have: data.len() - start,
        })?;

    let s = std::str::from_utf8(&data[start..start + nul])
        .map_err(|e| Error::InvalidString(e.to_string()))?
        .to_string();

    // Consumed bytes include the terminator, then round up to alignment.
    // The padding must actually be present in the buffer.
    let end = start + align(nul + 1);
    if end > data.len() {
        return Err(Error::truncated(field, end - start, data.len() - start));
    }
    *index = end;
    Ok(s)
}

fn read_i32(data: &[u8], index: &mut usize, field: &'static str) -> Result<i32> {
    let have = data.len().saturating_sub(*index);
    if have < 4 {
        return Err(Error::truncated(field, 4, have));
    }
    let bytes: [u8; 4] = data[*index..*index + 4].try_into().expect("4-byte slice");
    *index += 4;
    Ok(i32::from_be_bytes(bytes))
}

fn read_f32(data: &[u8], index: &mut usize) -> Result<f32> {
    let bits = read_i32(data, index, "float32")?;
    Ok(f32::from_bits(bits as u32))
}

fn read_osc_blob(data: &[u8], index: &mut usize) -> Result<Vec<u8>> {
    let size = read_i32(data, index, "blob size")?;
    if size < 0 {
        return Err(Error::InvalidElementLength(size));
    }
    let size = size as usize;
    let have = data.len().saturating_sub(*index);
    if have < size {
        return Err(Error::truncated("blob", size, have));
    }
    let blob = data[*index..*index + size].to_vec();

    // Padding is computed on payload length only, the count is excluded.
    let end = *index + align(size);
    if end > data.len() {
        return Err(Error::truncated("blob padding", align(size), have));
    }
    *index = end;
    Ok(blob)
}
