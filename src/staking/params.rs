use crate::encoding::{Decode, Encode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_UNBONDING_SECONDS: i64 = 60 * 60 * 24 * 21; // 3 weeks

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Params {
    /// Seconds between the start and completion of an unbonding.
    pub unbonding_time: i64,
    /// Maximum size of the bonded validator set.
    pub max_validators: u16,
    /// Tokens per unit of consensus power.
    pub power_reduction: u64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            unbonding_time: DEFAULT_UNBONDING_SECONDS,
            max_validators: 100,
            power_reduction: 1,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        if self.unbonding_time < 0 {
            return Err(Error::InvalidParameters(
                "Unbonding time must not be negative".into(),
            ));
        }
        if self.max_validators == 0 {
            return Err(Error::InvalidParameters(
                "Max validators must be positive".into(),
            ));
        }
        if self.power_reduction == 0 {
            return Err(Error::InvalidParameters(
                "Power reduction must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate() {
        assert!(Params::default().validate().is_ok());
        Params {
            max_validators: 0,
            ..Default::default()
        }
        .validate()
        .expect_err("Should reject an empty validator set");
        Params {
            power_reduction: 0,
            ..Default::default()
        }
        .validate()
        .expect_err("Should reject zero power reduction");
    }

    #[test]
    fn json_defaults() -> Result<()> {
        let params: Params = serde_json::from_str(r#"{ "max_validators": 4 }"#)?;
        assert_eq!(params.max_validators, 4);
        assert_eq!(params.unbonding_time, DEFAULT_UNBONDING_SECONDS);
        Ok(())
    }
}
