use crate::encoding::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Block time, as reported by consensus.
#[derive(
    Encode, Decode, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Time {
    /// Unix seconds
    pub seconds: i64,
    /// Non-negative fractions of a second at nanosecond resolution.
    pub nanos: i32,
}

impl Time {
    /// Create a time from unix seconds, assuming 0 nanoseconds.
    pub fn from_seconds<T: Into<i64>>(seconds: T) -> Self {
        let seconds = seconds.into();
        Self { seconds, nanos: 0 }
    }

    pub fn add_seconds(&self, seconds: i64) -> Self {
        Time {
            seconds: self.seconds.saturating_add(seconds),
            nanos: self.nanos,
        }
    }

    /// Byte key which sorts in the same order as the time itself.
    pub fn key_bytes(&self) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        let seconds = (self.seconds as u64) ^ (1 << 63);
        bytes[..8].copy_from_slice(&seconds.to_be_bytes());
        bytes[8..].copy_from_slice(&(self.nanos.max(0) as u32).to_be_bytes());
        bytes
    }
}

impl<T: Into<i64>> From<T> for Time {
    fn from(seconds: T) -> Self {
        Self::from_seconds(seconds)
    }
}

/// The block being executed. Every keeper operation takes the context
/// explicitly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub height: i64,
    pub time: Time,
    /// Hash of the transaction being delivered, zero outside of transactions.
    pub tx_hash: [u8; 32],
}

impl Context {
    pub fn new<T: Into<Time>>(height: i64, time: T) -> Self {
        Context {
            height,
            time: time.into(),
            tx_hash: [0; 32],
        }
    }

    pub fn with_height(&self, height: i64) -> Self {
        Context { height, ..*self }
    }

    pub fn with_time<T: Into<Time>>(&self, time: T) -> Self {
        Context {
            time: time.into(),
            ..*self
        }
    }

    pub fn with_tx_hash(&self, tx_hash: [u8; 32]) -> Self {
        Context { tx_hash, ..*self }
    }
}

/// Encodes a height so that byte order matches numeric order, including for
/// negative heights.
pub fn height_key(height: i64) -> [u8; 8] {
    ((height as u64) ^ (1 << 63)).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_keys_sort() {
        let times = [
            Time::from_seconds(-5),
            Time::from_seconds(0),
            Time { seconds: 0, nanos: 1 },
            Time::from_seconds(100),
        ];
        for pair in times.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].key_bytes() < pair[1].key_bytes());
        }
    }

    #[test]
    fn height_keys_sort() {
        assert!(height_key(-1) < height_key(0));
        assert!(height_key(0) < height_key(1));
        assert!(height_key(255) < height_key(256));
    }
}
