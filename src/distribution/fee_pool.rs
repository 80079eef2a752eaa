use super::TotalAccum;
use crate::coins::Decimal;
use crate::encoding::{Decode, Encode};
use crate::Result;
use serde::{Deserialize, Serialize};

/// The global pool of rewards which validators have yet to take, and the
/// community pool.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeePool {
    /// Accumulated bonded power of all validators since their last take.
    pub total_val_accum: TotalAccum,
    pub val_pool: Decimal,
    pub community_pool: Decimal,
}

impl FeePool {
    pub fn update_total_val_accum(&mut self, height: i64, total_power: Decimal) -> Result<()> {
        self.total_val_accum
            .update_for_new_height(height, total_power)
    }

    pub fn total_val_accum(&self, height: i64, total_power: Decimal) -> Result<Decimal> {
        self.total_val_accum.get_accum(height, total_power)
    }
}
