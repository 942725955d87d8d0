use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A cell write time: seconds since the epoch in the high 32 bits,
/// microseconds within the second in the low 32 bits.
///
/// Packed timestamps compare as plain integers and still round-trip to wall
/// clock time. Persisted references to a write's timestamp use this packing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall clock time, packed.
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_parts(now.as_secs(), now.subsec_micros())
    }

    pub fn from_parts(seconds: u64, micros: u32) -> Self {
        Self((seconds << 32) | u64::from(micros))
    }

    pub fn seconds(self) -> u64 {
        self.0 >> 32
    }

    pub fn micros(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }
}

impl From<u64> for Timestamp {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
