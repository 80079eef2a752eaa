//! The staking ledger: validators, delegations, unbonding and redelegation
//! queues, and the bonded validator set.

use crate::coins::{Address, Bank, ConsAddress, Decimal};
use crate::context::Context;
use crate::store::{Shared, Store, Write};
use crate::{Error, Result};
use log::debug;

mod delegate;
mod delegation;
mod hooks;
pub mod keys;
mod params;
mod pool;
mod queries;
mod slash;
mod validator;
mod validator_set;

pub use delegate::*;
pub use delegation::*;
pub use hooks::*;
pub use params::*;
pub use pool::*;
pub use queries::*;
pub use validator::*;
pub use validator_set::*;

use keys::*;

/// Blocks between a validator set change and it taking effect in consensus.
pub const VALIDATOR_UPDATE_DELAY: i64 = 1;

/// Handle to the staking ledger's state. Cloning is cheap and clones refer
/// to the same store.
#[derive(Clone)]
pub struct Staking<B> {
    store: Store,
    bank: B,
    hooks: Option<Shared<dyn StakingHooks>>,
}

impl<B: Bank + Clone> Staking<B> {
    pub fn new(store: Store, bank: B) -> Self {
        Staking {
            store,
            bank,
            hooks: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Shared<dyn StakingHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// A handle to the same state which fires no hooks, used by hook
    /// implementations to read staking state.
    pub fn without_hooks(&self) -> Self {
        Staking {
            store: self.store.clone(),
            bank: self.bank.clone(),
            hooks: None,
        }
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    fn call_hooks<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn StakingHooks) -> Result<()>,
    {
        match &self.hooks {
            Some(hooks) => f(&mut *hooks.borrow_mut()),
            None => Ok(()),
        }
    }

    pub fn params(&self) -> Result<Params> {
        Ok(self.store.get_decoded(PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        self.store.put_encoded(PARAMS_KEY.to_vec(), &params)
    }

    pub fn pool(&self) -> Result<BondedPool> {
        Ok(self.store.get_decoded(BONDED_POOL_KEY)?.unwrap_or_default())
    }

    fn set_pool(&mut self, pool: BondedPool) -> Result<()> {
        self.store.put_encoded(BONDED_POOL_KEY.to_vec(), &pool)
    }

    pub fn pool_status(&self) -> Result<PoolStatus> {
        Ok(PoolStatus::new(self.bank.get_loosen_coins()?, self.pool()?))
    }

    /// Moves tokens from the loose supply into the bonded pool.
    fn loose_tokens_to_bonded(&mut self, tokens: Decimal) -> Result<()> {
        let amount = integral_amount(tokens);
        let mut pool = self.pool()?;
        pool.bonded_tokens = (pool.bonded_tokens + tokens)?;
        self.set_pool(pool)?;
        self.bank.decrease_loosen_token(amount.into())
    }

    /// Moves tokens from the bonded pool back into the loose supply.
    fn bonded_tokens_to_loose(&mut self, tokens: Decimal) -> Result<()> {
        let amount = integral_amount(tokens);
        let mut pool = self.pool()?;
        pool.bonded_tokens = (pool.bonded_tokens - tokens)?;
        if pool.bonded_tokens.is_negative() {
            panic!("Bonded pool would become negative");
        }
        self.set_pool(pool)?;
        self.bank.increase_loosen_token(amount.into())
    }

    pub fn get_validator(&self, operator: &Address) -> Result<Option<Validator>> {
        self.store.get_decoded(validator_key(operator).as_slice())
    }

    /// Gets a validator, failing with `NotFound` if it does not exist.
    pub fn validator(&self, operator: &Address) -> Result<Validator> {
        self.get_validator(operator)?.ok_or_else(|| {
            Error::NotFound(format!("Validator {} does not exist", hex::encode(operator)))
        })
    }

    pub fn get_validator_by_cons(&self, cons: &ConsAddress) -> Result<Option<Validator>> {
        let operator: Option<Address> = self
            .store
            .get_decoded(validator_by_cons_key(cons).as_slice())?;
        match operator {
            Some(operator) => self.get_validator(&operator),
            None => Ok(None),
        }
    }

    fn set_validator(&mut self, validator: &Validator) -> Result<()> {
        self.store
            .put_encoded(validator_key(&validator.operator), validator)
    }

    fn set_validator_by_cons(&mut self, validator: &Validator) -> Result<()> {
        self.store.put_encoded(
            validator_by_cons_key(&validator.cons_address()),
            &validator.operator,
        )
    }

    /// Re-indexes the validator by its current power. Jailed validators are
    /// left out of the index.
    fn set_power_index(&mut self, validator: &Validator) -> Result<()> {
        self.delete_power_index(&validator.operator)?;
        if validator.jailed {
            return Ok(());
        }
        let power = validator.consensus_power(self.params()?.power_reduction)?;
        self.store
            .put(power_index_key(power, &validator.operator), vec![])?;
        self.store
            .put_encoded(indexed_power_key(&validator.operator), &power)
    }

    fn delete_power_index(&mut self, operator: &Address) -> Result<()> {
        let indexed: Option<u64> = self
            .store
            .get_decoded(indexed_power_key(operator).as_slice())?;
        if let Some(power) = indexed {
            self.store
                .delete(power_index_key(power, operator).as_slice())?;
            self.store.delete(indexed_power_key(operator).as_slice())?;
        }
        Ok(())
    }

    /// Deletes a validator which has no tokens and no shares left.
    fn remove_validator(&mut self, ctx: &Context, operator: &Address) -> Result<()> {
        let validator = match self.get_validator(operator)? {
            Some(validator) => validator,
            None => return Ok(()),
        };
        if validator.tokens.is_positive() {
            panic!("Attempted to remove a validator which still holds tokens");
        }

        let cons = validator.cons_address();
        self.store.delete(validator_key(operator).as_slice())?;
        self.store.delete(validator_by_cons_key(&cons).as_slice())?;
        self.delete_power_index(operator)?;
        debug!("Removed validator {}", hex::encode(operator));

        self.call_hooks(|hooks| hooks.on_validator_removed(ctx, cons, *operator))
    }

    pub fn last_validator_power(&self, operator: &Address) -> Result<u64> {
        Ok(self
            .store
            .get_decoded(last_power_key(operator).as_slice())?
            .unwrap_or_default())
    }

    fn set_last_validator_power(&mut self, operator: &Address, power: u64) -> Result<()> {
        self.store.put_encoded(last_power_key(operator), &power)
    }

    fn delete_last_validator_power(&mut self, operator: &Address) -> Result<()> {
        self.store.delete(last_power_key(operator).as_slice())
    }

    /// Operators of the last bonded validator set, with their powers.
    pub fn last_validator_powers(&self) -> Result<Vec<(Address, u64)>> {
        self.store
            .collect_prefix::<u64>(&[LAST_POWER_PREFIX])?
            .into_iter()
            .map(|(key, power)| {
                let [operator] = split_addresses::<1>(&key[1..])
                    .ok_or_else(|| Error::Store("Invalid last power key".into()))?;
                Ok((operator, power))
            })
            .collect()
    }

    pub fn last_total_power(&self) -> Result<u64> {
        Ok(self
            .store
            .get_decoded(LAST_TOTAL_POWER_KEY)?
            .unwrap_or_default())
    }

    fn set_last_total_power(&mut self, power: u64) -> Result<()> {
        self.store
            .put_encoded(LAST_TOTAL_POWER_KEY.to_vec(), &power)
    }

    pub fn get_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<Delegation>> {
        self.store
            .get_decoded(delegation_key(delegator, validator).as_slice())
    }

    fn set_delegation(&mut self, delegation: &Delegation) -> Result<()> {
        self.store.put_encoded(
            delegation_key(&delegation.delegator, &delegation.validator),
            delegation,
        )?;
        self.store.put(
            delegation_by_val_key(&delegation.validator, &delegation.delegator),
            vec![],
        )
    }

    fn remove_delegation(&mut self, ctx: &Context, delegation: &Delegation) -> Result<()> {
        let (delegator, validator) = (delegation.delegator, delegation.validator);
        self.call_hooks(|hooks| hooks.on_delegation_removed(ctx, delegator, validator))?;
        self.store
            .delete(delegation_key(&delegator, &validator).as_slice())?;
        self.store
            .delete(delegation_by_val_key(&validator, &delegator).as_slice())
    }

    pub fn delegator_delegations(&self, delegator: &Address) -> Result<Vec<Delegation>> {
        self.collect_values(&delegations_key(delegator))
    }

    pub fn validator_delegations(&self, validator: &Address) -> Result<Vec<Delegation>> {
        let prefix = delegations_by_val_key(validator);
        let mut delegations = vec![];
        for entry in self.store.iter_prefix(&prefix) {
            let (key, _) = entry?;
            let [delegator] = split_addresses::<1>(&key[prefix.len()..])
                .ok_or_else(|| Error::Store("Invalid delegation index key".into()))?;
            let delegation = self
                .get_delegation(&delegator, validator)?
                .ok_or_else(|| Error::Store("Delegation index points to nothing".into()))?;
            delegations.push(delegation);
        }
        Ok(delegations)
    }

    pub fn get_unbonding_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<UnbondingDelegation>> {
        self.store
            .get_decoded(ubd_key(delegator, validator).as_slice())
    }

    fn set_unbonding_delegation(&mut self, ubd: &UnbondingDelegation) -> Result<()> {
        self.store
            .put_encoded(ubd_key(&ubd.delegator, &ubd.validator), ubd)?;
        self.store
            .put(ubd_by_val_key(&ubd.validator, &ubd.delegator), vec![])
    }

    fn remove_unbonding_delegation(&mut self, ubd: &UnbondingDelegation) -> Result<()> {
        self.store
            .delete(ubd_key(&ubd.delegator, &ubd.validator).as_slice())?;
        self.store
            .delete(ubd_by_val_key(&ubd.validator, &ubd.delegator).as_slice())
    }

    pub fn delegator_unbonding_delegations(
        &self,
        delegator: &Address,
    ) -> Result<Vec<UnbondingDelegation>> {
        self.collect_values(&ubds_key(delegator))
    }

    pub fn validator_unbonding_delegations(
        &self,
        validator: &Address,
    ) -> Result<Vec<UnbondingDelegation>> {
        let prefix = ubds_by_val_key(validator);
        let mut ubds = vec![];
        for entry in self.store.iter_prefix(&prefix) {
            let (key, _) = entry?;
            let [delegator] = split_addresses::<1>(&key[prefix.len()..])
                .ok_or_else(|| Error::Store("Invalid unbonding index key".into()))?;
            let ubd = self
                .get_unbonding_delegation(&delegator, validator)?
                .ok_or_else(|| Error::Store("Unbonding index points to nothing".into()))?;
            ubds.push(ubd);
        }
        Ok(ubds)
    }

    pub fn get_redelegation(
        &self,
        delegator: &Address,
        src: &Address,
        dst: &Address,
    ) -> Result<Option<Redelegation>> {
        self.store
            .get_decoded(red_key(delegator, src, dst).as_slice())
    }

    fn set_redelegation(&mut self, red: &Redelegation) -> Result<()> {
        self.store
            .put_encoded(red_key(&red.delegator, &red.src, &red.dst), red)?;
        self.store
            .put(red_by_src_key(&red.src, &red.delegator, &red.dst), vec![])?;
        self.store
            .put(red_by_dst_key(&red.dst, &red.delegator, &red.src), vec![])
    }

    fn remove_redelegation(&mut self, red: &Redelegation) -> Result<()> {
        self.store
            .delete(red_key(&red.delegator, &red.src, &red.dst).as_slice())?;
        self.store
            .delete(red_by_src_key(&red.src, &red.delegator, &red.dst).as_slice())?;
        self.store
            .delete(red_by_dst_key(&red.dst, &red.delegator, &red.src).as_slice())
    }

    pub fn delegator_redelegations(&self, delegator: &Address) -> Result<Vec<Redelegation>> {
        self.collect_values(&reds_key(delegator))
    }

    /// Redelegations out of `src`.
    pub fn redelegations_from_validator(&self, src: &Address) -> Result<Vec<Redelegation>> {
        let prefix = reds_by_src_key(src);
        let mut reds = vec![];
        for entry in self.store.iter_prefix(&prefix) {
            let (key, _) = entry?;
            let [delegator, dst] = split_addresses::<2>(&key[prefix.len()..])
                .ok_or_else(|| Error::Store("Invalid redelegation index key".into()))?;
            let red = self
                .get_redelegation(&delegator, src, &dst)?
                .ok_or_else(|| Error::Store("Redelegation index points to nothing".into()))?;
            reds.push(red);
        }
        Ok(reds)
    }

    /// Whether the delegator has a pending redelegation into `dst`.
    pub fn has_receiving_redelegation(&self, delegator: &Address, dst: &Address) -> Result<bool> {
        let prefix = reds_by_dst_delegator_key(dst, delegator);
        match self.store.iter_prefix(&prefix).next() {
            Some(entry) => entry.map(|_| true),
            None => Ok(false),
        }
    }

    fn collect_values<T: crate::encoding::Decode>(&self, prefix: &[u8]) -> Result<Vec<T>> {
        Ok(self
            .store
            .collect_prefix::<T>(prefix)?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }
}

/// Pool movements are always whole tokens.
fn integral_amount(tokens: Decimal) -> u64 {
    if !tokens.is_integer() || tokens.is_negative() {
        panic!("Pool movement of {} is not a whole amount", tokens);
    }
    match tokens.amount() {
        Ok(amount) => amount.into(),
        Err(_) => panic!("Pool movement of {} is out of range", tokens),
    }
}
