use crate::encoding::{Decode, Encode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A whole number of tokens.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Default, Clone, Copy)]
#[serde(transparent)]
pub struct Amount(pub(crate) u64);

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Eq for Amount {}

impl Amount {
    pub fn new(value: u64) -> Self {
        Amount(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn zero() -> Self {
        Amount(0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl<I: Into<Amount> + Copy> PartialEq<I> for Amount {
    fn eq(&self, other: &I) -> bool {
        self.0 == (*other).into().0
    }
}

impl<I: Into<Self>> Add<I> for Amount {
    type Output = Result<Self>;

    fn add(self, other: I) -> Result<Self> {
        let other = other.into();
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Self>> Sub<I> for Amount {
    type Output = Result<Self>;

    fn sub(self, other: I) -> Result<Self> {
        let other = other.into();
        self.0.checked_sub(other.0).map(Amount).ok_or_else(|| {
            Error::Coins(format!("Insufficient amount: {} < {}", self.0, other.0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops() -> Result<()> {
        let a: Amount = 7.into();
        assert_eq!((a + 3)?, 10);
        assert_eq!((a - 7)?, 0);
        (a - 8).expect_err("Should not underflow");
        (Amount::new(u64::MAX) + 1).expect_err("Should not overflow");
        Ok(())
    }
}
