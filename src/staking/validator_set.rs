use std::collections::BTreeMap;

use super::keys::*;
use super::*;
use crate::coins::PubKey;
use crate::context::Time;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// A change to the consensus validator set. A power of zero removes the
/// validator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorUpdate {
    pub pubkey: PubKey,
    pub power: u64,
}

impl<B: Bank + Clone> Staking<B> {
    /// Runs the end-of-block steps: matured validators become unbonded, the
    /// validator set is recomputed, and matured unbonding delegations and
    /// redelegations complete.
    pub fn end_block(&mut self, ctx: &Context) -> Result<Vec<ValidatorUpdate>> {
        self.unbond_all_mature_validator_queue(ctx)?;
        let updates = self.apply_and_return_validator_set_updates(ctx)?;

        for key in self.dequeue_mature(UBD_QUEUE_PREFIX, ctx.time)? {
            let addresses = split_addresses::<2>(queue_entry_addresses(&key));
            let [delegator, validator] = match addresses {
                Some(addresses) => addresses,
                None => return Err(Error::Store("Invalid unbonding queue key".into())),
            };
            if let Err(err) = self.complete_unbonding(ctx, delegator, validator) {
                warn!(
                    "Skipped unbonding of {} from {}: {}",
                    hex::encode(delegator),
                    hex::encode(validator),
                    err
                );
            }
        }

        for key in self.dequeue_mature(RED_QUEUE_PREFIX, ctx.time)? {
            let addresses = split_addresses::<3>(queue_entry_addresses(&key));
            let [delegator, src, dst] = match addresses {
                Some(addresses) => addresses,
                None => return Err(Error::Store("Invalid redelegation queue key".into())),
            };
            if let Err(err) = self.complete_redelegation(ctx, delegator, src, dst) {
                warn!(
                    "Skipped redelegation of {} from {} to {}: {}",
                    hex::encode(delegator),
                    hex::encode(src),
                    hex::encode(dst),
                    err
                );
            }
        }

        Ok(updates)
    }

    /// Removes and returns every queue key of the given queue whose time is
    /// at or before `now`.
    fn dequeue_mature(&mut self, prefix: u8, now: Time) -> Result<Vec<Vec<u8>>> {
        let keys = self
            .store
            .iter_range(vec![prefix], Some(queue_end_key(prefix, now)))
            .map(|entry| entry.map(|(key, _)| key))
            .collect::<Result<Vec<_>>>()?;
        for key in keys.iter() {
            self.store.delete(key.as_slice())?;
        }
        Ok(keys)
    }

    /// Finishes unbonding every validator whose unbonding time has passed,
    /// removing those left without shares.
    pub fn unbond_all_mature_validator_queue(&mut self, ctx: &Context) -> Result<()> {
        for key in self.dequeue_mature(VALIDATOR_QUEUE_PREFIX, ctx.time)? {
            let [operator] = split_addresses::<1>(queue_entry_addresses(&key))
                .ok_or_else(|| Error::Store("Invalid validator queue key".into()))?;
            let mut validator = match self.get_validator(&operator)? {
                Some(validator) => validator,
                None => panic!("Queued validator {} does not exist", hex::encode(operator)),
            };
            if validator.status != Status::Unbonding {
                panic!(
                    "Unexpected validator {} in unbonding queue, status was {:?}",
                    hex::encode(operator),
                    validator.status
                );
            }

            validator.status = Status::Unbonded;
            self.set_validator(&validator)?;
            info!("Validator {} is now unbonded", hex::encode(operator));

            if validator.delegator_shares.is_zero() {
                self.remove_validator(ctx, &operator)?;
            }
        }
        Ok(())
    }

    /// Brings the bonded set in line with the power index and returns the
    /// changes for consensus.
    pub fn apply_and_return_validator_set_updates(
        &mut self,
        ctx: &Context,
    ) -> Result<Vec<ValidatorUpdate>> {
        let params = self.params()?;
        let mut last: BTreeMap<Address, u64> = self.last_validator_powers()?.into_iter().collect();
        let mut updates = vec![];
        let mut count = 0;
        let mut total_power = 0u64;

        let ranked = self
            .store
            .iter_prefix(&[POWER_INDEX_PREFIX])
            .map(|entry| {
                let (key, _) = entry?;
                parse_power_index_key(&key[1..])
                    .ok_or_else(|| Error::Store("Invalid power index key".into()))
            })
            .collect::<Result<Vec<_>>>()?;

        for (power, operator) in ranked {
            if count >= params.max_validators {
                break;
            }
            if power == 0 {
                break;
            }

            let mut validator = match self.get_validator(&operator)? {
                Some(validator) => validator,
                None => panic!("Indexed validator {} does not exist", hex::encode(operator)),
            };
            if validator.jailed {
                panic!("Jailed validator {} found in power index", hex::encode(operator));
            }

            match validator.status {
                Status::Unbonded | Status::Unbonding => {
                    self.bond_validator(ctx, &mut validator)?;
                }
                Status::Bonded => {}
            }

            if last.remove(&operator) != Some(power) {
                updates.push(ValidatorUpdate {
                    pubkey: validator.pubkey,
                    power,
                });
                let cons = validator.cons_address();
                self.call_hooks(|hooks| hooks.on_validator_power_did_change(ctx, cons, operator))?;
                self.set_last_validator_power(&operator, power)?;
            }

            count += 1;
            total_power = total_power.checked_add(power).ok_or(Error::Overflow)?;
        }

        for operator in last.into_keys() {
            let mut validator = match self.get_validator(&operator)? {
                Some(validator) => validator,
                None => panic!("Previously bonded validator {} does not exist", hex::encode(operator)),
            };
            if validator.status == Status::Bonded {
                self.begin_unbonding_validator(ctx, &mut validator)?;
            }
            self.delete_last_validator_power(&operator)?;
            updates.push(ValidatorUpdate {
                pubkey: validator.pubkey,
                power: 0,
            });
        }

        self.set_last_total_power(total_power)?;
        Ok(updates)
    }

    fn bond_validator(&mut self, ctx: &Context, validator: &mut Validator) -> Result<()> {
        if validator.status == Status::Unbonding {
            self.store.delete(
                validator_queue_key(validator.unbonding_min_time, &validator.operator).as_slice(),
            )?;
        }

        validator.bond_height = ctx.height;
        validator.status = Status::Bonded;
        self.loose_tokens_to_bonded(validator.tokens)?;
        self.set_validator(validator)?;
        self.set_power_index(validator)?;

        info!("Validator {} is now bonded", hex::encode(validator.operator));
        let (cons, operator) = (validator.cons_address(), validator.operator);
        self.call_hooks(|hooks| hooks.on_validator_bonded(ctx, cons, operator))
    }

    fn begin_unbonding_validator(&mut self, ctx: &Context, validator: &mut Validator) -> Result<()> {
        if validator.status != Status::Bonded {
            panic!(
                "Should not already be unbonded or unbonding, validator: {}",
                hex::encode(validator.operator)
            );
        }
        let params = self.params()?;

        validator.status = Status::Unbonding;
        self.bonded_tokens_to_loose(validator.tokens)?;
        validator.unbonding_min_time = ctx.time.add_seconds(params.unbonding_time);
        validator.unbonding_height = ctx.height;
        self.set_validator(validator)?;
        self.set_power_index(validator)?;
        self.store.put(
            validator_queue_key(validator.unbonding_min_time, &validator.operator),
            vec![],
        )?;

        info!("Validator {} began unbonding", hex::encode(validator.operator));
        let (cons, operator) = (validator.cons_address(), validator.operator);
        self.call_hooks(|hooks| hooks.on_validator_begin_unbonding(ctx, cons, operator))
    }

    /// Jails the validator with the given consensus address, removing it
    /// from the power index.
    pub fn jail(&mut self, cons: &ConsAddress) -> Result<()> {
        let mut validator = self.must_get_validator_by_cons(cons)?;
        self.jail_validator(&mut validator)?;
        info!("Validator {} jailed", hex::encode(validator.operator));
        Ok(())
    }

    /// Releases the validator with the given consensus address from jail.
    pub fn unjail(&mut self, cons: &ConsAddress) -> Result<()> {
        let mut validator = self.must_get_validator_by_cons(cons)?;
        if !validator.jailed {
            panic!("Cannot unjail already unjailed validator, validator: {}", hex::encode(validator.operator));
        }
        validator.jailed = false;
        self.set_validator(&validator)?;
        self.set_power_index(&validator)?;
        info!("Validator {} unjailed", hex::encode(validator.operator));
        Ok(())
    }

    pub(super) fn jail_validator(&mut self, validator: &mut Validator) -> Result<()> {
        if validator.jailed {
            panic!("Cannot jail already jailed validator, validator: {}", hex::encode(validator.operator));
        }
        validator.jailed = true;
        self.set_validator(validator)?;
        self.delete_power_index(&validator.operator)
    }

    fn must_get_validator_by_cons(&self, cons: &ConsAddress) -> Result<Validator> {
        match self.get_validator_by_cons(cons)? {
            Some(validator) => Ok(validator),
            None => panic!("Validator with consensus address {} does not exist", hex::encode(cons)),
        }
    }
}
