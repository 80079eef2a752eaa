use crate::coins::{Amount, Decimal};
use crate::encoding::{Decode, Encode};
use crate::{Error, Result};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const TWO_DAYS: i64 = 60 * 60 * 24 * 2;

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Params {
    /// Evidence older than this many blocks is ignored.
    pub max_evidence_age: i64,
    /// Number of blocks in the missed-block window.
    pub signed_blocks_window: i64,
    /// Fraction of the window a validator must sign.
    pub min_signed_per_window: Decimal,
    /// Seconds.
    pub double_sign_jail_duration: i64,
    /// Seconds.
    pub downtime_jail_duration: i64,
    /// Seconds.
    pub censorship_jail_duration: i64,
    pub slash_fraction_double_sign: Decimal,
    pub slash_fraction_downtime: Decimal,
    pub slash_fraction_censorship: Decimal,
    /// Self-delegated tokens an operator needs to unjail.
    pub min_self_delegation: Amount,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_evidence_age: 51_840,
            signed_blocks_window: 100,
            min_signed_per_window: dec!(0.5).into(),
            double_sign_jail_duration: TWO_DAYS,
            downtime_jail_duration: TWO_DAYS,
            censorship_jail_duration: TWO_DAYS,
            slash_fraction_double_sign: dec!(0.05).into(),
            slash_fraction_downtime: dec!(0.01).into(),
            slash_fraction_censorship: dec!(0.02).into(),
            min_self_delegation: 1.into(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        if self.signed_blocks_window <= 0 {
            return Err(Error::InvalidParameters(
                "Signed blocks window must be positive".into(),
            ));
        }
        if self.max_evidence_age < 0 {
            return Err(Error::InvalidParameters(
                "Max evidence age must not be negative".into(),
            ));
        }
        if self.double_sign_jail_duration < 0
            || self.downtime_jail_duration < 0
            || self.censorship_jail_duration < 0
        {
            return Err(Error::InvalidParameters(
                "Jail durations must not be negative".into(),
            ));
        }

        let fractions = [
            self.min_signed_per_window,
            self.slash_fraction_double_sign,
            self.slash_fraction_downtime,
            self.slash_fraction_censorship,
        ];
        if fractions
            .iter()
            .any(|fraction| fraction.is_negative() || *fraction > Decimal::one())
        {
            return Err(Error::InvalidParameters(
                "Fractions must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }

    /// Blocks of the window a validator must sign, rounded.
    pub fn min_signed_blocks(&self) -> Result<i64> {
        let blocks = (self.min_signed_per_window * self.signed_blocks_window)?.amount()?;
        i64::try_from(u64::from(blocks)).map_err(|_| Error::Overflow)
    }

    /// Blocks of the window a validator may miss before being jailed.
    pub fn max_missed_blocks(&self) -> Result<i64> {
        Ok(self.signed_blocks_window - self.min_signed_blocks()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missed_block_threshold() -> Result<()> {
        let params = Params::default();
        params.validate()?;
        assert_eq!(params.min_signed_blocks()?, 50);
        assert_eq!(params.max_missed_blocks()?, 50);

        let params = Params {
            signed_blocks_window: 5,
            min_signed_per_window: dec!(0.7).into(),
            ..Default::default()
        };
        // 3.5 rounds to even
        assert_eq!(params.max_missed_blocks()?, 1);
        Ok(())
    }

    #[test]
    fn validate() {
        Params {
            signed_blocks_window: 0,
            ..Default::default()
        }
        .validate()
        .expect_err("Empty window should be rejected");

        Params {
            slash_fraction_downtime: dec!(1.01).into(),
            ..Default::default()
        }
        .validate()
        .expect_err("Fraction above 1 should be rejected");
    }
}
