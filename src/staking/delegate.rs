use super::delegation::BeginInfo;
use super::keys::*;
use super::*;
use crate::coins::{Amount, PubKey};
use crate::store::Write;
use log::info;

fn check_accepts_delegations(validator: &Validator) -> Result<()> {
    if validator.delegator_shares.is_positive() && validator.exchange_rate()?.is_zero() {
        return Err(Error::InvalidAmount(
            "Validator exchange rate is zero, cannot delegate".into(),
        ));
    }
    Ok(())
}

impl<B: Bank + Clone> Staking<B> {
    /// Declares a new validator and delegates its self-bond from the
    /// operator's account.
    pub fn create_validator(
        &mut self,
        ctx: &Context,
        operator: Address,
        pubkey: PubKey,
        self_bond: Amount,
        description: Description,
        commission: Commission,
    ) -> Result<Validator> {
        if self.get_validator(&operator)?.is_some() {
            return Err(Error::Conflict("Validator is already declared".into()));
        }
        if self
            .get_validator_by_cons(&crate::coins::cons_address(&pubkey))?
            .is_some()
        {
            return Err(Error::Conflict(
                "Consensus public key is already in use".into(),
            ));
        }
        commission.validate()?;
        description.validate()?;
        if self_bond.is_zero() {
            return Err(Error::InvalidAmount("Self-bond must be positive".into()));
        }

        let commission = Commission {
            update_time: ctx.time,
            ..commission
        };
        let validator = Validator::new(operator, pubkey, description, commission);
        self.set_validator(&validator)?;
        self.set_validator_by_cons(&validator)?;
        self.set_power_index(&validator)?;
        self.call_hooks(|hooks| hooks.on_validator_created(ctx, &validator))?;

        self.delegate(ctx, operator, self_bond, operator, true)?;
        info!(
            "Created validator {} with self-bond {}",
            hex::encode(operator),
            self_bond
        );

        self.validator(&operator)
    }

    /// Updates a validator's description and commission rate.
    pub fn edit_validator(
        &mut self,
        ctx: &Context,
        operator: Address,
        description: Option<Description>,
        commission_rate: Option<Decimal>,
    ) -> Result<()> {
        let mut validator = self.validator(&operator)?;

        if let Some(description) = description {
            description.validate()?;
            validator.description = description;
        }

        if let Some(rate) = commission_rate {
            validator.commission.validate_new_rate(rate, ctx.time)?;
            self.call_hooks(|hooks| hooks.on_validator_modified(ctx, operator))?;
            validator.commission.rate = rate;
            validator.commission.update_time = ctx.time;
        }

        self.set_validator(&validator)
    }

    /// Delegates `amount` tokens to a validator, optionally taking them from
    /// the delegator's account. Returns the issued shares.
    pub fn delegate(
        &mut self,
        ctx: &Context,
        delegator: Address,
        amount: Amount,
        validator_addr: Address,
        subtract_account: bool,
    ) -> Result<Decimal> {
        let mut validator = self.validator(&validator_addr)?;
        check_accepts_delegations(&validator)?;

        let existing = self.get_delegation(&delegator, &validator_addr)?;
        if existing.is_some() {
            self.call_hooks(|hooks| {
                hooks.on_delegation_shares_modified(ctx, delegator, validator_addr)
            })?;
        } else {
            self.call_hooks(|hooks| hooks.on_delegation_created(ctx, delegator, validator_addr))?;
        }
        let mut delegation =
            existing.unwrap_or_else(|| Delegation::new(delegator, validator_addr));

        if subtract_account {
            self.bank.subtract_coins(delegator, amount)?;
        }

        let shares = self.add_validator_tokens_and_shares(&mut validator, amount.into())?;
        delegation.shares = (delegation.shares + shares)?;
        delegation.height = ctx.height;
        self.set_delegation(&delegation)?;

        Ok(shares)
    }

    /// Removes shares from a delegation, returning the tokens they were
    /// redeemed for.
    pub(super) fn unbond(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator_addr: Address,
        shares: Decimal,
    ) -> Result<Decimal> {
        let mut delegation = self
            .get_delegation(&delegator, &validator_addr)?
            .ok_or_else(|| Error::NotFound("No delegation for this (address, validator) pair".into()))?;

        if delegation.shares < shares {
            return Err(Error::InvalidAmount(
                "Not enough shares in the delegation".into(),
            ));
        }

        self.call_hooks(|hooks| {
            hooks.on_delegation_shares_modified(ctx, delegator, validator_addr)
        })?;

        let mut validator = self.validator(&validator_addr)?;
        delegation.shares = (delegation.shares - shares)?;

        if delegation.shares.is_zero() {
            // an operator withdrawing its whole self-bond is jailed
            if delegator == validator.operator && !validator.jailed {
                self.jail_validator(&mut validator)?;
            }
            self.remove_delegation(ctx, &delegation)?;
        } else {
            delegation.height = ctx.height;
            self.set_delegation(&delegation)?;
        }

        let tokens = self.remove_validator_tokens_and_shares(&mut validator, shares)?;

        if validator.delegator_shares.is_zero() && validator.status == Status::Unbonded {
            self.remove_validator(ctx, &validator_addr)?;
        }

        Ok(tokens)
    }

    pub(super) fn begin_info(&self, ctx: &Context, validator_addr: &Address) -> Result<BeginInfo> {
        let params = self.params()?;
        let validator = match self.get_validator(validator_addr)? {
            Some(validator) => validator,
            None => return Ok(BeginInfo::after_unbonding_time(ctx, params.unbonding_time)),
        };

        Ok(match validator.status {
            Status::Bonded => BeginInfo::after_unbonding_time(ctx, params.unbonding_time),
            Status::Unbonded => BeginInfo {
                min_time: ctx.time,
                height: ctx.height,
                complete_now: true,
            },
            Status::Unbonding => BeginInfo {
                min_time: validator.unbonding_min_time,
                height: validator.unbonding_height,
                complete_now: false,
            },
        })
    }

    /// Starts unbonding `shares` from a validator. Returns `None` if the
    /// tokens were paid out immediately because the validator is unbonded.
    pub fn begin_unbonding(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator_addr: Address,
        shares: Decimal,
    ) -> Result<Option<UnbondingDelegation>> {
        if !shares.is_positive() {
            return Err(Error::InvalidAmount("Shares must be positive".into()));
        }
        if self
            .get_unbonding_delegation(&delegator, &validator_addr)?
            .is_some()
        {
            return Err(Error::Conflict(
                "An unbonding delegation already exists for this (address, validator) pair"
                    .into(),
            ));
        }

        let begin = self.begin_info(ctx, &validator_addr)?;
        let tokens = self.unbond(ctx, delegator, validator_addr, shares)?;
        let balance = tokens.amount()?;

        if begin.complete_now {
            self.bank.add_coins(delegator, balance)?;
            return Ok(None);
        }

        let ubd = UnbondingDelegation {
            delegator,
            validator: validator_addr,
            tx_hash: ctx.tx_hash,
            creation_height: begin.height,
            min_time: begin.min_time,
            initial_balance: balance,
            balance,
        };
        self.set_unbonding_delegation(&ubd)?;
        self.store.put(
            ubd_queue_key(ubd.min_time, &delegator, &validator_addr),
            vec![],
        )?;

        Ok(Some(ubd))
    }

    /// Moves `shares` from `src` to `dst`. Returns `None` if the source
    /// validator is unbonded and no record needs to be kept.
    pub fn begin_redelegation(
        &mut self,
        ctx: &Context,
        delegator: Address,
        src: Address,
        dst: Address,
        shares: Decimal,
    ) -> Result<Option<Redelegation>> {
        if src == dst {
            return Err(Error::Conflict(
                "Cannot redelegate to the same validator".into(),
            ));
        }
        if !shares.is_positive() {
            return Err(Error::InvalidAmount("Shares must be positive".into()));
        }
        if self.get_redelegation(&delegator, &src, &dst)?.is_some() {
            return Err(Error::Conflict(
                "A redelegation already exists for this (address, source, destination) triple"
                    .into(),
            ));
        }
        if self.has_receiving_redelegation(&delegator, &src)? {
            return Err(Error::Conflict(
                "Redelegation to the source validator is still in progress".into(),
            ));
        }

        let dst_validator = self.get_validator(&dst)?.ok_or_else(|| {
            Error::NotFound(format!(
                "Destination validator {} does not exist",
                hex::encode(dst)
            ))
        })?;
        check_accepts_delegations(&dst_validator)?;

        let tokens = self.unbond(ctx, delegator, src, shares)?;
        let amount = tokens.amount()?;
        let shares_dst = self.delegate(ctx, delegator, amount, dst, false)?;

        let begin = self.begin_info(ctx, &src)?;
        if begin.complete_now {
            return Ok(None);
        }

        let red = Redelegation {
            delegator,
            src,
            dst,
            creation_height: begin.height,
            min_time: begin.min_time,
            initial_balance: amount,
            balance: amount,
            shares_src: shares,
            shares_dst,
        };
        self.set_redelegation(&red)?;
        self.store.put(
            red_queue_key(red.min_time, &delegator, &src, &dst),
            vec![],
        )?;

        Ok(Some(red))
    }

    /// Pays out a matured unbonding delegation.
    pub fn complete_unbonding(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator_addr: Address,
    ) -> Result<()> {
        let ubd = self
            .get_unbonding_delegation(&delegator, &validator_addr)?
            .ok_or_else(|| Error::NotFound("No unbonding delegation found".into()))?;
        if !ubd.is_mature(ctx.time) {
            return Err(Error::NotMature(
                "Unbonding delegation is not yet mature".into(),
            ));
        }

        self.bank.add_coins(delegator, ubd.balance)?;
        self.remove_unbonding_delegation(&ubd)?;
        info!(
            "Completed unbonding of {} from {} to {}",
            ubd.balance,
            hex::encode(validator_addr),
            hex::encode(delegator)
        );
        Ok(())
    }

    /// Forgets a matured redelegation. The tokens already live at the
    /// destination.
    pub fn complete_redelegation(
        &mut self,
        ctx: &Context,
        delegator: Address,
        src: Address,
        dst: Address,
    ) -> Result<()> {
        let red = self
            .get_redelegation(&delegator, &src, &dst)?
            .ok_or_else(|| Error::NotFound("No redelegation found".into()))?;
        if !red.is_mature(ctx.time) {
            return Err(Error::NotMature("Redelegation is not yet mature".into()));
        }

        self.remove_redelegation(&red)
    }

    /// Adds delegated tokens to a validator, bonding them if the validator
    /// is bonded.
    pub(super) fn add_validator_tokens_and_shares(
        &mut self,
        validator: &mut Validator,
        tokens: Decimal,
    ) -> Result<Decimal> {
        if validator.is_bonded() {
            self.loose_tokens_to_bonded(tokens)?;
        }
        let shares = validator.add_tokens_from_del(tokens)?;
        self.set_validator(validator)?;
        self.set_power_index(validator)?;
        Ok(shares)
    }

    /// Removes delegator shares from a validator, unbonding the redeemed
    /// tokens from the pool if the validator is bonded.
    pub(super) fn remove_validator_tokens_and_shares(
        &mut self,
        validator: &mut Validator,
        shares: Decimal,
    ) -> Result<Decimal> {
        let tokens = validator.remove_del_shares(shares)?;
        if validator.is_bonded() {
            self.bonded_tokens_to_loose(tokens)?;
        }
        self.set_validator(validator)?;
        self.set_power_index(validator)?;
        Ok(tokens)
    }

    /// Removes tokens from a validator without touching its shares.
    pub(super) fn remove_validator_tokens(
        &mut self,
        validator: &mut Validator,
        tokens: Decimal,
    ) -> Result<()> {
        validator.remove_tokens(tokens)?;
        if validator.is_bonded() {
            self.bonded_tokens_to_loose(tokens)?;
        }
        self.set_validator(validator)?;
        self.set_power_index(validator)
    }
}
