use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Modules;
use crate::coins::{Address, Amount, Bank, Decimal, FeeCollector, PubKey};
use crate::context::Context;
use crate::staking::{Commission, Description};
use crate::Result;

/// A state transition requested by a transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    Send {
        from: Address,
        to: Address,
        amount: Amount,
    },
    CreateValidator {
        operator: Address,
        pubkey: PubKey,
        self_bond: Amount,
        #[serde(default)]
        description: Description,
        commission: Commission,
    },
    EditValidator {
        operator: Address,
        #[serde(default)]
        description: Option<Description>,
        #[serde(default)]
        commission_rate: Option<Decimal>,
    },
    Delegate {
        delegator: Address,
        validator: Address,
        amount: Amount,
    },
    BeginUnbonding {
        delegator: Address,
        validator: Address,
        shares: Decimal,
    },
    BeginRedelegation {
        delegator: Address,
        src: Address,
        dst: Address,
        shares: Decimal,
    },
    CompleteUnbonding {
        delegator: Address,
        validator: Address,
    },
    CompleteRedelegation {
        delegator: Address,
        src: Address,
        dst: Address,
    },
    SetWithdrawAddress {
        delegator: Address,
        withdraw_address: Address,
    },
    WithdrawDelegationReward {
        delegator: Address,
        validator: Address,
    },
    WithdrawDelegationRewardsAll {
        delegator: Address,
    },
    WithdrawValidatorRewardsAll {
        operator: Address,
    },
    Unjail {
        operator: Address,
    },
}

/// A fee paid into the block's collected fees before the message runs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fee {
    pub payer: Address,
    pub amount: Amount,
}

/// A message with an optional fee. If the message fails, the fee is rolled
/// back along with the rest of the transaction's writes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tx {
    #[serde(default)]
    pub fee: Option<Fee>,
    pub msg: Msg,
}

impl Tx {
    pub fn with_fee(msg: Msg, payer: Address, amount: Amount) -> Self {
        Tx {
            fee: Some(Fee { payer, amount }),
            msg,
        }
    }

    /// SHA-256 of the transaction's JSON encoding.
    pub fn hash(&self) -> Result<[u8; 32]> {
        let bytes = serde_json::to_vec(self)?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&Sha256::digest(bytes));
        Ok(hash)
    }
}

impl From<Msg> for Tx {
    fn from(msg: Msg) -> Self {
        Tx { fee: None, msg }
    }
}

/// Outcome of a delivered transaction. A code of zero means success, any
/// other code is the failing error's [`code`](crate::Error::code).
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct TxResult {
    pub code: u32,
    pub log: String,
}

impl TxResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl Modules {
    pub(super) fn collect_fee(&mut self, fee: &Fee) -> Result<()> {
        self.accounts.subtract_coins(fee.payer, fee.amount)?;
        self.accounts.decrease_loosen_token(fee.amount)?;
        self.fees.add_collected_fees(fee.amount)
    }

    /// Runs a message, returning a short log line on success.
    pub(super) fn handle(&mut self, ctx: &Context, msg: Msg) -> Result<String> {
        Ok(match msg {
            Msg::Send { from, to, amount } => {
                self.accounts.transfer(from, to, amount)?;
                format!("sent {}", amount)
            }
            Msg::CreateValidator {
                operator,
                pubkey,
                self_bond,
                description,
                commission,
            } => {
                self.staking.create_validator(
                    ctx,
                    operator,
                    pubkey,
                    self_bond,
                    description,
                    commission,
                )?;
                format!("created validator {}", hex::encode(operator))
            }
            Msg::EditValidator {
                operator,
                description,
                commission_rate,
            } => {
                self.staking
                    .edit_validator(ctx, operator, description, commission_rate)?;
                format!("edited validator {}", hex::encode(operator))
            }
            Msg::Delegate {
                delegator,
                validator,
                amount,
            } => {
                if amount.is_zero() {
                    return Err(crate::Error::InvalidAmount(
                        "Delegation amount must be positive".into(),
                    ));
                }
                let shares = self
                    .staking
                    .delegate(ctx, delegator, amount, validator, true)?;
                format!("received {} shares", shares)
            }
            Msg::BeginUnbonding {
                delegator,
                validator,
                shares,
            } => match self
                .staking
                .begin_unbonding(ctx, delegator, validator, shares)?
            {
                Some(ubd) => format!("unbonding {} until {}", ubd.balance, ubd.min_time.seconds),
                None => "unbonded".to_string(),
            },
            Msg::BeginRedelegation {
                delegator,
                src,
                dst,
                shares,
            } => match self
                .staking
                .begin_redelegation(ctx, delegator, src, dst, shares)?
            {
                Some(red) => format!("redelegating {} until {}", red.balance, red.min_time.seconds),
                None => "redelegated".to_string(),
            },
            Msg::CompleteUnbonding {
                delegator,
                validator,
            } => {
                self.staking.complete_unbonding(ctx, delegator, validator)?;
                "completed unbonding".to_string()
            }
            Msg::CompleteRedelegation {
                delegator,
                src,
                dst,
            } => {
                self.staking
                    .complete_redelegation(ctx, delegator, src, dst)?;
                "completed redelegation".to_string()
            }
            Msg::SetWithdrawAddress {
                delegator,
                withdraw_address,
            } => {
                self.distribution
                    .set_withdraw_address(delegator, withdraw_address)?;
                format!("withdraw address set to {}", hex::encode(withdraw_address))
            }
            Msg::WithdrawDelegationReward {
                delegator,
                validator,
            } => {
                let reward = self
                    .distribution
                    .withdraw_delegation_reward(ctx, delegator, validator)?;
                format!("withdrew {}", reward)
            }
            Msg::WithdrawDelegationRewardsAll { delegator } => {
                let reward = self
                    .distribution
                    .withdraw_delegation_rewards_all(ctx, delegator)?;
                format!("withdrew {}", reward)
            }
            Msg::WithdrawValidatorRewardsAll { operator } => {
                let reward = self
                    .distribution
                    .withdraw_validator_rewards_all(ctx, operator)?;
                format!("withdrew {}", reward)
            }
            Msg::Unjail { operator } => {
                self.slashing.unjail(ctx, operator)?;
                format!("unjailed {}", hex::encode(operator))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_msg() -> Result<()> {
        let tx: Tx = serde_json::from_str(
            r#"{
                "fee": { "payer": [1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1], "amount": 5 },
                "msg": {
                    "type": "begin_unbonding",
                    "delegator": [1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1],
                    "validator": [2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2],
                    "shares": "2.5"
                }
            }"#,
        )?;
        assert_eq!(tx.fee.map(|fee| fee.amount), Some(5.into()));
        assert_eq!(
            tx.msg,
            Msg::BeginUnbonding {
                delegator: [1; 20],
                validator: [2; 20],
                shares: rust_decimal_macros::dec!(2.5).into(),
            }
        );

        let plain: Tx = Msg::Unjail { operator: [1; 20] }.into();
        assert_ne!(plain.hash()?, tx.hash()?);
        Ok(())
    }
}
