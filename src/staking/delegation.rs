use crate::coins::{Address, Amount, Decimal};
use crate::context::{Context, Time};
use crate::encoding::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A delegator's share of a validator.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Delegation {
    pub delegator: Address,
    pub validator: Address,
    pub shares: Decimal,
    /// Height of the last change to the delegation.
    pub height: i64,
}

impl Delegation {
    pub fn new(delegator: Address, validator: Address) -> Self {
        Delegation {
            delegator,
            validator,
            shares: Decimal::zero(),
            height: 0,
        }
    }
}

/// Tokens which have left a validator and are waiting to be paid out to the
/// delegator. Only one may be pending per delegator and validator.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UnbondingDelegation {
    pub delegator: Address,
    pub validator: Address,
    pub tx_hash: [u8; 32],
    pub creation_height: i64,
    pub min_time: Time,
    pub initial_balance: Amount,
    /// What remains to be paid out after slashing.
    pub balance: Amount,
}

impl UnbondingDelegation {
    pub fn is_mature(&self, now: Time) -> bool {
        self.min_time <= now
    }
}

/// Stake moved from a source to a destination validator, which stays
/// slashable for infractions of the source until it matures.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Redelegation {
    pub delegator: Address,
    pub src: Address,
    pub dst: Address,
    pub creation_height: i64,
    pub min_time: Time,
    pub initial_balance: Amount,
    pub balance: Amount,
    pub shares_src: Decimal,
    pub shares_dst: Decimal,
}

impl Redelegation {
    pub fn is_mature(&self, now: Time) -> bool {
        self.min_time <= now
    }
}

/// When an unbonding or redelegation out of a validator completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct BeginInfo {
    pub min_time: Time,
    pub height: i64,
    pub complete_now: bool,
}

impl BeginInfo {
    pub fn after_unbonding_time(ctx: &Context, unbonding_time: i64) -> Self {
        BeginInfo {
            min_time: ctx.time.add_seconds(unbonding_time),
            height: ctx.height,
            complete_now: false,
        }
    }
}
