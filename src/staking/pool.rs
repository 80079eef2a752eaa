use crate::coins::{Amount, Decimal};
use crate::encoding::{Decode, Encode};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Tokens held by bonded validators. Loose tokens are tracked by the bank.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BondedPool {
    pub bonded_tokens: Decimal,
}

/// A snapshot of the token supply split between loose and bonded tokens.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub loose_tokens: Decimal,
    pub bonded_tokens: Decimal,
}

impl PoolStatus {
    pub fn new(loose_tokens: Amount, pool: BondedPool) -> Self {
        PoolStatus {
            loose_tokens: loose_tokens.into(),
            bonded_tokens: pool.bonded_tokens,
        }
    }

    pub fn token_supply(&self) -> Result<Decimal> {
        self.loose_tokens + self.bonded_tokens
    }

    /// Fraction of the supply which is bonded, zero for an empty supply.
    pub fn bonded_ratio(&self) -> Result<Decimal> {
        let supply = self.token_supply()?;
        if supply.is_positive() {
            self.bonded_tokens / supply
        } else {
            Ok(Decimal::zero())
        }
    }
}
