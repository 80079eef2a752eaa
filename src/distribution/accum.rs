use crate::coins::Decimal;
use crate::encoding::{Decode, Encode};
use crate::Result;
use serde::{Deserialize, Serialize};

/// A time-weighted accumulation factor. Every block adds the accumulating
/// power, and the value is only brought up to date when it is read or
/// consumed.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TotalAccum {
    pub update_height: i64,
    pub accum: Decimal,
}

impl TotalAccum {
    pub fn new(height: i64) -> Self {
        TotalAccum {
            update_height: height,
            accum: Decimal::zero(),
        }
    }

    /// The accumulation at `height` without updating.
    pub fn get_accum(&self, height: i64, per_block: Decimal) -> Result<Decimal> {
        let blocks = Decimal::from(height - self.update_height);
        self.accum + (per_block * blocks)?
    }

    /// Brings the accumulation up to `height`, adding `per_block` for each
    /// block since the last update.
    pub fn update_for_new_height(&mut self, height: i64, per_block: Decimal) -> Result<()> {
        let blocks = height - self.update_height;
        if blocks < 0 {
            panic!(
                "Accumulation updated to height {} from later height {}",
                height, self.update_height
            );
        }
        self.accum = (self.accum + (per_block * blocks)?)?;
        self.update_height = height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_block() -> Result<()> {
        let mut accum = TotalAccum::new(5);
        assert_eq!(accum.get_accum(8, 10u64.into())?, 30u64.into());

        accum.update_for_new_height(8, 10u64.into())?;
        accum.update_for_new_height(10, 3u64.into())?;
        assert_eq!(accum.accum, 36u64.into());
        assert_eq!(accum.update_height, 10);
        assert_eq!(accum.get_accum(10, 100u64.into())?, 36u64.into());
        Ok(())
    }

    #[test]
    #[should_panic(expected = "from later height")]
    fn going_back_panics() {
        let mut accum = TotalAccum::new(5);
        accum.update_for_new_height(4, 1u64.into()).unwrap();
    }
}
