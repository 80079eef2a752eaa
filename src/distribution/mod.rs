//! Fee distribution. Rewards are settled lazily with accumulation factors:
//! validators take their share of the global fee pool, and delegators take
//! theirs from the validator's delegator pool, only when their stake is
//! about to change or they withdraw.

use crate::coins::{Address, Bank, ConsAddress, Decimal, FeeCollector};
use crate::context::Context;
use crate::staking::Staking;
use crate::store::{Store, Write};
use crate::{Error, Result};
use log::debug;

mod accum;
mod allocation;
mod delegation_info;
mod fee_pool;
mod hooks;
mod params;
mod validator_info;
mod withdraw;

pub use accum::*;
pub use delegation_info::*;
pub use fee_pool::*;
pub use hooks::*;
pub use params::*;
pub use validator_info::*;

const FEE_POOL_KEY: &[u8] = &[0x00];
const PARAMS_KEY: &[u8] = &[0x01];
const PROPOSER_KEY: &[u8] = &[0x02];
const VALIDATOR_INFO_PREFIX: u8 = 0x11;
const DELEGATION_INFO_PREFIX: u8 = 0x12;
const WITHDRAW_ADDR_PREFIX: u8 = 0x13;

fn validator_info_key(operator: &Address) -> Vec<u8> {
    [&[VALIDATOR_INFO_PREFIX][..], &operator[..]].concat()
}

fn delegation_info_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    [&[DELEGATION_INFO_PREFIX][..], &delegator[..], &validator[..]].concat()
}

fn withdraw_addr_key(delegator: &Address) -> Vec<u8> {
    [&[WITHDRAW_ADDR_PREFIX][..], &delegator[..]].concat()
}

/// Handle to the distribution state. Reads staking state through a handle
/// which fires no hooks.
#[derive(Clone)]
pub struct Distribution<B, F> {
    store: Store,
    staking: Staking<B>,
    bank: B,
    fees: F,
}

impl<B: Bank + Clone, F: FeeCollector> Distribution<B, F> {
    pub fn new(store: Store, staking: &Staking<B>, bank: B, fees: F) -> Self {
        Distribution {
            store,
            staking: staking.without_hooks(),
            bank,
            fees,
        }
    }

    pub fn params(&self) -> Result<Params> {
        Ok(self.store.get_decoded(PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        self.store.put_encoded(PARAMS_KEY.to_vec(), &params)
    }

    pub fn fee_pool(&self) -> Result<FeePool> {
        Ok(self.store.get_decoded(FEE_POOL_KEY)?.unwrap_or_default())
    }

    fn set_fee_pool(&mut self, fee_pool: &FeePool) -> Result<()> {
        self.store.put_encoded(FEE_POOL_KEY.to_vec(), fee_pool)
    }

    /// The proposer of the previous block, whose reward is allocated at the
    /// start of the next one.
    pub fn previous_proposer(&self) -> Result<Option<ConsAddress>> {
        self.store.get_decoded(PROPOSER_KEY)
    }

    pub fn set_previous_proposer(&mut self, proposer: ConsAddress) -> Result<()> {
        self.store.put_encoded(PROPOSER_KEY.to_vec(), &proposer)
    }

    pub fn get_validator_info(&self, operator: &Address) -> Result<Option<ValidatorDistInfo>> {
        self.store
            .get_decoded(validator_info_key(operator).as_slice())
    }

    /// Gets a validator's distribution info, failing with `NotFound` if it
    /// has none.
    pub fn validator_info(&self, operator: &Address) -> Result<ValidatorDistInfo> {
        self.get_validator_info(operator)?.ok_or_else(|| {
            Error::NotFound(format!(
                "No distribution info for validator {}",
                hex::encode(operator)
            ))
        })
    }

    fn set_validator_info(&mut self, info: &ValidatorDistInfo) -> Result<()> {
        self.store
            .put_encoded(validator_info_key(&info.operator), info)
    }

    fn remove_validator_info(&mut self, operator: &Address) -> Result<()> {
        self.store.delete(validator_info_key(operator).as_slice())
    }

    pub fn get_delegation_info(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<DelegationDistInfo>> {
        self.store
            .get_decoded(delegation_info_key(delegator, validator).as_slice())
    }

    fn set_delegation_info(&mut self, info: &DelegationDistInfo) -> Result<()> {
        self.store.put_encoded(
            delegation_info_key(&info.delegator, &info.validator),
            info,
        )
    }

    fn remove_delegation_info(&mut self, delegator: &Address, validator: &Address) -> Result<()> {
        self.store
            .delete(delegation_info_key(delegator, validator).as_slice())
    }

    /// Where the delegator's rewards are paid, defaulting to the delegator.
    pub fn withdraw_address(&self, delegator: &Address) -> Result<Address> {
        let addr: Option<Address> = self
            .store
            .get_decoded(withdraw_addr_key(delegator).as_slice())?;
        Ok(addr.unwrap_or(*delegator))
    }

    pub fn set_withdraw_address(&mut self, delegator: Address, withdraw_addr: Address) -> Result<()> {
        let key = withdraw_addr_key(&delegator);
        if withdraw_addr == delegator {
            self.store.delete(key.as_slice())
        } else {
            self.store.put_encoded(key, &withdraw_addr)
        }
    }

    fn withdraw_context(&self, ctx: &Context, operator: &Address) -> Result<WithdrawContext> {
        let validator = self.staking.validator(operator)?;
        Ok(WithdrawContext {
            height: ctx.height,
            total_power: self.staking.last_total_power()?.into(),
            val_power: self.staking.last_validator_power(operator)?.into(),
            commission_rate: validator.commission.rate,
        })
    }

    /// Pays whole tokens to the delegator's withdraw address. The fractional
    /// remainder goes to the community pool.
    fn withdraw_to_delegator(&mut self, delegator: Address, amount: Decimal) -> Result<()> {
        let paid = amount.truncate();
        let change = (amount - paid)?;
        if change.is_positive() {
            let mut fee_pool = self.fee_pool()?;
            fee_pool.community_pool = (fee_pool.community_pool + change)?;
            self.set_fee_pool(&fee_pool)?;
        }

        let coins = paid.amount()?;
        if coins.is_zero() {
            return Ok(());
        }
        let recipient = self.withdraw_address(&delegator)?;
        self.bank.add_coins(recipient, coins)?;
        self.bank.increase_loosen_token(coins)?;
        debug!(
            "Paid {} in rewards of {} to {}",
            coins,
            hex::encode(delegator),
            hex::encode(recipient)
        );
        Ok(())
    }

    /// Withdraws a delegation's rewards without paying them out. Returns the
    /// withdrawn amount.
    fn settle_delegation(
        &mut self,
        ctx: &Context,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Decimal> {
        let mut info = self
            .get_delegation_info(delegator, validator)?
            .ok_or_else(|| Error::NotFound("No distribution info for this delegation".into()))?;
        let delegation = self
            .staking
            .get_delegation(delegator, validator)?
            .ok_or_else(|| Error::NotFound("No delegation for this (address, validator) pair".into()))?;
        let total_del_shares = self.staking.validator(validator)?.delegator_shares;

        let mut fee_pool = self.fee_pool()?;
        let mut vi = self.validator_info(validator)?;
        let wc = self.withdraw_context(ctx, validator)?;
        let withdrawn = info.withdraw_rewards(
            &mut fee_pool,
            &mut vi,
            &wc,
            total_del_shares,
            delegation.shares,
        )?;

        self.set_fee_pool(&fee_pool)?;
        self.set_validator_info(&vi)?;
        self.set_delegation_info(&info)?;
        Ok(withdrawn)
    }

    /// Brings a validator's pools up to date before its power or delegator
    /// shares change. Delegators whose rewards are settled here are paid.
    pub fn take_validator_fee_pool_rewards(&mut self, ctx: &Context, operator: &Address) -> Result<()> {
        // existence check
        self.validator_info(operator)?;

        if self.get_delegation_info(operator, operator)?.is_some() {
            let withdrawn = self.settle_delegation(ctx, operator, operator)?;
            self.withdraw_to_delegator(*operator, withdrawn)?;
        } else {
            let delegations = self.staking.validator_delegations(operator)?;
            if delegations.is_empty() {
                let mut vi = self.validator_info(operator)?;
                vi.del_accum.update_height = ctx.height;
                vi.fee_pool_withdrawal_height = ctx.height;
                self.set_validator_info(&vi)?;
            }
            for delegation in delegations {
                let withdrawn = self.settle_delegation(ctx, &delegation.delegator, operator)?;
                self.withdraw_to_delegator(delegation.delegator, withdrawn)?;
            }
        }

        let mut fee_pool = self.fee_pool()?;
        let mut vi = self.validator_info(operator)?;
        let wc = self.withdraw_context(ctx, operator)?;
        vi.take_fee_pool_rewards(&mut fee_pool, &wc)?;
        self.set_fee_pool(&fee_pool)?;
        self.set_validator_info(&vi)
    }
}

#[cfg(test)]
mod tests;
