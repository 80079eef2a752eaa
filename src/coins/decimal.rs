use super::Amount;
use crate::encoding::{Decode, Encode, Terminated};
use crate::{Error, Result};
use rust_decimal::{prelude::ToPrimitive, Decimal as NumDecimal};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// A fixed-point decimal used for shares, token balances which may carry
/// fractional parts, rates and accumulation factors. Arithmetic is checked
/// and returns a `Result`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decimal {
    pub(crate) value: NumDecimal,
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

impl Encode for Decimal {
    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        dest.write_all(&self.value.serialize())?;

        Ok(())
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(16)
    }
}

impl Decode for Decimal {
    fn decode<R: std::io::Read>(mut source: R) -> ed::Result<Self> {
        let mut bytes = [0u8; 16];
        source.read_exact(&mut bytes)?;
        Ok(Decimal {
            value: NumDecimal::deserialize(bytes),
        })
    }
}

impl Terminated for Decimal {}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal {
            value: value.into(),
        }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal {
            value: value.into(),
        }
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Decimal {
    /// Rounds to the nearest whole amount, with ties to even.
    pub fn amount(&self) -> Result<Amount> {
        if self.value.is_sign_negative() && !self.value.is_zero() {
            Err(Error::Coins("Amounts may not be negative".into()))
        } else {
            match self.value.round().to_u64() {
                Some(value) => Ok(value.into()),
                None => Err(Error::Coins(
                    "Amounts may not be greater than u64::MAX".into(),
                )),
            }
        }
    }

    /// Drops the fractional part.
    pub fn truncate(&self) -> Self {
        Decimal {
            value: self.value.trunc(),
        }
    }

    pub fn is_integer(&self) -> bool {
        self.value.fract().is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.value > NumDecimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.value < NumDecimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Decimal {
            value: self.value.abs(),
        }
    }

    pub fn zero() -> Self {
        Decimal {
            value: NumDecimal::ZERO,
        }
    }

    pub fn one() -> Self {
        Decimal {
            value: NumDecimal::ONE,
        }
    }

    /// `self × num / den`. The product is taken first while it fits, and
    /// the ratio `num / den` is taken first when it does not.
    pub fn mul_div(self, num: Decimal, den: Decimal) -> Result<Decimal> {
        if den.is_zero() {
            return Err(Error::Coins("Cannot divide by zero".into()));
        }
        if num == den {
            return Ok(self);
        }
        match self.value.checked_mul(num.value) {
            Some(product) => Decimal::from(product) / den,
            None => self * (num / den)?,
        }
    }
}

impl From<NumDecimal> for Decimal {
    fn from(value: NumDecimal) -> Self {
        Decimal { value }
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        Self {
            value: amount.0.into(),
        }
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self {
            value: NumDecimal::from_str(s)?,
        })
    }
}

impl<I: Into<Decimal>> Add<I> for Decimal {
    type Output = Result<Decimal>;

    fn add(self, other: I) -> Result<Decimal> {
        let other = other.into();
        self.value
            .checked_add(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Decimal>> Sub<I> for Decimal {
    type Output = Result<Decimal>;

    fn sub(self, other: I) -> Result<Decimal> {
        let other = other.into();
        self.value
            .checked_sub(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Decimal>> Mul<I> for Decimal {
    type Output = Result<Decimal>;

    fn mul(self, other: I) -> Result<Decimal> {
        let other = other.into();
        self.value
            .checked_mul(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Decimal>> Div<I> for Decimal {
    type Output = Result<Decimal>;

    fn div(self, other: I) -> Result<Decimal> {
        let other = other.into();
        if other.value.is_zero() {
            return Err(Error::Coins("Cannot divide by zero".into()));
        }
        self.value
            .checked_div(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format() {
        let formatted: Decimal = dec!(1.23).into();
        assert_eq!(format!("{}", formatted), "1.23");
    }

    #[test]
    fn ops() -> Result<()> {
        let a: Decimal = dec!(2.5).into();
        assert_eq!((a * 4u64)?, Decimal::from(10u64));
        assert_eq!((a - 3u64)?, dec!(-0.5).into());
        assert_eq!(a.truncate(), Decimal::from(2u64));
        assert_eq!(a.amount()?, 2);
        assert_eq!(Decimal::from(dec!(3.5)).amount()?, 4);
        (a / Decimal::zero()).expect_err("Should not divide by zero");
        Decimal::from(dec!(-1)).amount().expect_err("Should not be negative");
        Ok(())
    }

    #[test]
    fn mul_div() -> Result<()> {
        let pool = Decimal::from(90u64);
        assert_eq!(pool.mul_div(10u64.into(), 30u64.into())?, 30u64.into());
        assert_eq!(pool.mul_div(7u64.into(), 7u64.into())?, pool);

        // the product alone is past the 96-bit mantissa
        let pool = Decimal::from(950_000_000_000u64);
        let total = Decimal::from(200_000_000_000_000_000u64);
        (pool * total).expect_err("Product should overflow");
        assert_eq!(pool.mul_div(total, total)?, pool);
        let half = Decimal::from(100_000_000_000_000_000u64);
        assert_eq!(pool.mul_div(half, total)?, 475_000_000_000u64.into());

        pool.mul_div(half, Decimal::zero())
            .expect_err("Should not divide by zero");
        Ok(())
    }

    #[test]
    fn encoding() -> Result<()> {
        let value: Decimal = dec!(123.456).into();
        let bytes = value.encode()?;
        assert_eq!(bytes.len(), 16);
        assert_eq!(Decimal::decode(bytes.as_slice())?, value);
        Ok(())
    }
}
