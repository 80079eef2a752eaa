use crate::coins::{ConsAddress, Decimal};
use crate::encoding::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A span of heights during which a validator was continuously bonded.
/// Infractions committed within one period are only punished once, at the
/// largest fraction.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashingPeriod {
    pub cons: ConsAddress,
    pub start_height: i64,
    /// Zero while the period is open.
    pub end_height: i64,
    pub slashed_so_far: Decimal,
}

impl SlashingPeriod {
    pub fn new(cons: ConsAddress, start_height: i64) -> Self {
        SlashingPeriod {
            cons,
            start_height,
            end_height: 0,
            slashed_so_far: Decimal::zero(),
        }
    }
}
