//! OSC packet types
//!
//! A [`Packet`] is either a [`Message`] (an address pattern plus typed
//! arguments) or a [`Bundle`] (a time tag plus nested packets). The type tag
//! string of a message is derived from its arguments and never stored
//! independently.

use crate::time::TimeTag;

/// A single OSC argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// 32-bit big-endian two's complement integer, tag 'i'
    Int(i32),
    /// 32-bit big-endian IEEE 754 float, tag 'f'
    Float(f32),
    /// NUL-terminated, 4-byte padded UTF-8 string, tag 's'
    String(String),
    /// Length-prefixed, 4-byte padded binary blob, tag 'b'
    Blob(Vec<u8>),
    /// 64-bit NTP-style time tag, tag 't'
    TimeTag(TimeTag),
    /// Marker with no payload, tag 'T'
    True,
    /// Marker with no payload, tag 'F'
    False,
    /// Marker with no payload, tag 'N'
    Nil,
    /// Marker with no payload, tag 'I'
    Impulse,
}

impl Argument {
    /// The type tag character for this argument
    pub fn type_tag(&self) -> char {
        match self {
            Argument::Int(_) => 'i',
            Argument::Float(_) => 'f',
            Argument::String(_) => 's',
            Argument::Blob(_) => 'b',
            Argument::TimeTag(_) => 't',
            Argument::True => 'T',
            Argument::False => 'F',
            Argument::Nil => 'N',
            Argument::Impulse => 'I',
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Argument::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Argument::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Argument::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::True => Some(true),
            Argument::False => Some(false),
            _ => None,
        }
    }
}

impl From<i32> for Argument {
    fn from(v: i32) -> Self {
        Argument::Int(v)
    }
}

impl From<f32> for Argument {
    fn from(v: f32) -> Self {
        Argument::Float(v)
    }
}

impl From<&str> for Argument {
    fn from(v: &str) -> Self {
        Argument::String(v.to_string())
    }
}

impl From<String> for Argument {
    fn from(v: String) -> Self {
        Argument::String(v)
    }
}

impl From<Vec<u8>> for Argument {
    fn from(v: Vec<u8>) -> Self {
        Argument::Blob(v)
    }
}

impl From<TimeTag> for Argument {
    fn from(v: TimeTag) -> Self {
        Argument::TimeTag(v)
    }
}

impl From<bool> for Argument {
    fn from(v: bool) -> Self {
        if v {
            Argument::True
        } else {
            Argument::False
        }
    }
}

/// An OSC message: an address pattern and an ordered argument list
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    address_pattern: String,
    arguments: Vec<Argument>,
}

impl Message {
    /// Create a message.
    ///
    /// An empty address or one without a leading '/' is normalized to "/".
    pub fn new(address_pattern: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            address_pattern: normalize_address(address_pattern.into()),
            arguments,
        }
    }

    /// The address pattern, always starting with '/'
    pub fn address_pattern(&self) -> &str {
        &self.address_pattern
    }

    /// Address components split on '/', leading empty component dropped
    pub fn address_parts(&self) -> Vec<&str> {
        self.address_pattern.split('/').skip(1).collect()
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// The derived type tag string: "," plus one tag character per argument
    pub fn type_tag_string(&self) -> String {
        let mut tags = String::with_capacity(1 + self.arguments.len());
        tags.push(',');
        for arg in &self.arguments {
            tags.push(arg.type_tag());
        }
        tags
    }

    /// Replace the address pattern, normalizing as in [`Message::new`].
    pub fn readdress(&mut self, address_pattern: impl Into<String>) {
        self.address_pattern = normalize_address(address_pattern.into());
    }
}

fn normalize_address(address: String) -> String {
    if address.is_empty() || !address.starts_with('/') {
        "/".to_string()
    } else {
        address
    }
}

/// An OSC bundle: a time tag and a list of nested packets
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub time_tag: TimeTag,
    pub elements: Vec<Packet>,
}

impl Bundle {
    pub fn new(elements: Vec<Packet>, time_tag: TimeTag) -> Self {
        Self { time_tag, elements }
    }

    /// An empty bundle with the immediate time tag
    pub fn immediate(elements: Vec<Packet>) -> Self {
        Self {
            time_tag: TimeTag::immediate(),
            elements,
        }
    }
}

/// A decoded OSC packet
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Message(Message),
    Bundle(Bundle),
}

impl From<Message> for Packet {
    fn from(m: Message) -> Self {
        Packet::Message(m)
    }
}

impl From<Bundle> for Packet {
    fn from(b: Bundle) -> Self {
        Packet::Bundle(b)
    }
}
