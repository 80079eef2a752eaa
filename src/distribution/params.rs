use crate::coins::Decimal;
use crate::encoding::{Decode, Encode};
use crate::{Error, Result};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Params {
    /// Share of collected fees sent to the community pool.
    pub community_tax: Decimal,
    /// Share of collected fees always given to the block proposer.
    pub base_proposer_reward: Decimal,
    /// Additional proposer share, scaled by the fraction of power which
    /// signed the previous block.
    pub bonus_proposer_reward: Decimal,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            community_tax: dec!(0.02).into(),
            base_proposer_reward: dec!(0.01).into(),
            bonus_proposer_reward: dec!(0.04).into(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        let unit = |value: Decimal| !value.is_negative() && value <= Decimal::one();
        if !unit(self.community_tax) {
            return Err(Error::InvalidParameters(
                "Community tax must be between 0 and 1".into(),
            ));
        }
        if !unit(self.base_proposer_reward) || !unit(self.bonus_proposer_reward) {
            return Err(Error::InvalidParameters(
                "Proposer rewards must be between 0 and 1".into(),
            ));
        }
        let total = ((self.base_proposer_reward + self.bonus_proposer_reward)? + self.community_tax)?;
        if total > Decimal::one() {
            return Err(Error::InvalidParameters(
                "Proposer rewards and community tax may not exceed 1 in total".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate() -> Result<()> {
        Params::default().validate()?;

        let params = Params {
            community_tax: dec!(1.5).into(),
            ..Default::default()
        };
        params.validate().expect_err("Tax above 1 should be rejected");

        let params = Params {
            base_proposer_reward: dec!(0.5).into(),
            bonus_proposer_reward: dec!(0.5).into(),
            ..Default::default()
        };
        params
            .validate()
            .expect_err("Rewards above the fee total should be rejected");

        let params: Params = serde_json::from_str(r#"{ "community_tax": "0" }"#)?;
        assert!(params.community_tax.is_zero());
        assert_eq!(params.base_proposer_reward, dec!(0.01).into());
        Ok(())
    }
}
