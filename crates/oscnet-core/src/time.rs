//! OSC time tags
//!
//! A time tag is a 64-bit NTP-style timestamp: 32 bits of seconds since
//! 1900-01-01 and 32 bits of fractional seconds (1/2^32 units). The special
//! value seconds=0, fraction=1 means "immediately".

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};

use crate::{Error, Result};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01)
pub const EPOCH_OFFSET_1900: u64 = 2_208_988_800;

/// An OSC time tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeTag {
    seconds: u32,
    fraction: u32,
}

impl TimeTag {
    /// Create a time tag from raw NTP words
    pub fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// The canonical "immediately" time tag: seconds 0, fraction 1
    pub fn immediate() -> Self {
        Self {
            seconds: 0,
            fraction: 1,
        }
    }

    /// True only for the exact seconds=0, fraction=1 pair
    pub fn is_immediate(&self) -> bool {
        self.seconds == 0 && self.fraction == 1
    }

    /// Seconds since 1900-01-01
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Fractional seconds in 1/2^32 units
    pub fn fraction(&self) -> u32 {
        self.fraction
    }

    /// Time tag for the current wall-clock time
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert from a wall-clock time.
    ///
    /// Times before the Unix epoch saturate to the epoch.
    pub fn from_system_time(time: SystemTime) -> Self {
        let since_unix = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let seconds = (since_unix.as_secs() + EPOCH_OFFSET_1900) as u32;
        let fraction = (since_unix.subsec_nanos() as u64 * (1u64 << 32) / 1_000_000_000) as u32;
        Self { seconds, fraction }
    }

    /// Convert back to a wall-clock time.
    ///
    /// Returns `None` for time tags before the Unix epoch (including the
    /// immediate tag, which is not a calendar time).
    pub fn to_system_time(&self) -> Option<SystemTime> {
        let unix_secs = (self.seconds as u64).checked_sub(EPOCH_OFFSET_1900)?;
        let nanos = (self.fraction as u64 * 1_000_000_000) >> 32;
        Some(UNIX_EPOCH + Duration::new(unix_secs, nanos as u32))
    }

    /// Write the 8-byte big-endian wire form: seconds, then fraction.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.seconds);
        buf.put_u32(self.fraction);
    }

    /// Read the 8-byte big-endian wire form.
    pub fn decode(buf: &mut &[u8]) -> Result<Self> {
        if buf.remaining() < 8 {
            return Err(Error::truncated("time tag", 8, buf.remaining()));
        }
        let seconds = buf.get_u32();
        let fraction = buf.get_u32();
        Ok(Self { seconds, fraction })
    }

    /// Uppercase hex rendering of the raw 64 bits, for logs and debugging
    pub fn hex(&self) -> String {
        format!("{:08X}{:08X}", self.seconds, self.fraction)
    }
}

impl Default for TimeTag {
    fn default() -> Self {
        Self::immediate()
    }
}

impl std::fmt::Display for TimeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_immediate() {
            write!(f, "immediate")
        } else {
            write!(f, "{}+{}/2^32s", self.seconds, self.fraction)
        }
    }
}
