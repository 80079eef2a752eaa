use crate::context::Time;
use crate::encoding::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Liveness record of a validator which has been bonded at least once.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorSigningInfo {
    /// Height the validator first became bonded.
    pub start_height: i64,
    /// Blocks seen since the window was last reset. The missed-block bit
    /// array is indexed by this value modulo the window.
    pub index_offset: i64,
    pub jailed_until: Time,
    /// Number of set bits in the missed-block bit array.
    pub missed_blocks_counter: i64,
}

impl ValidatorSigningInfo {
    pub fn new(start_height: i64) -> Self {
        ValidatorSigningInfo {
            start_height,
            ..Default::default()
        }
    }
}
