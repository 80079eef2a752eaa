use super::*;
use crate::coins::Amount;
use log::info;

impl<B: Bank + Clone, F: FeeCollector> Distribution<B, F> {
    /// Withdraws the delegator's rewards from one validator and pays them to
    /// its withdraw address. Returns the withdrawn amount before truncation.
    pub fn withdraw_delegation_reward(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<Decimal> {
        let withdrawn = self.settle_delegation(ctx, &delegator, &validator)?;
        self.withdraw_to_delegator(delegator, withdrawn)?;
        info!(
            "Withdrew {} in rewards of {} from {}",
            withdrawn,
            hex::encode(delegator),
            hex::encode(validator)
        );
        Ok(withdrawn)
    }

    /// Withdraws the delegator's rewards from every validator it delegates
    /// to, paid out as a single amount.
    pub fn withdraw_delegation_rewards_all(&mut self, ctx: &Context, delegator: Address) -> Result<Decimal> {
        let withdrawn = self.settle_delegations(ctx, &delegator)?;
        self.withdraw_to_delegator(delegator, withdrawn)?;
        Ok(withdrawn)
    }

    /// Withdraws the operator's delegation rewards and the validator's
    /// commission.
    pub fn withdraw_validator_rewards_all(&mut self, ctx: &Context, operator: Address) -> Result<Decimal> {
        // existence check
        self.validator_info(&operator)?;

        let rewards = self.settle_delegations(ctx, &operator)?;

        let mut fee_pool = self.fee_pool()?;
        let mut vi = self.validator_info(&operator)?;
        let wc = self.withdraw_context(ctx, &operator)?;
        let commission = vi.withdraw_commission(&mut fee_pool, &wc)?;
        self.set_fee_pool(&fee_pool)?;
        self.set_validator_info(&vi)?;

        let withdrawn = (rewards + commission)?;
        self.withdraw_to_delegator(operator, withdrawn)?;
        info!(
            "Validator {} withdrew {} in rewards and {} in commission",
            hex::encode(operator),
            rewards,
            commission
        );
        Ok(withdrawn)
    }

    fn settle_delegations(&mut self, ctx: &Context, delegator: &Address) -> Result<Decimal> {
        let mut withdrawn = Decimal::zero();
        for delegation in self.staking.delegator_delegations(delegator)? {
            let amount = self.settle_delegation(ctx, delegator, &delegation.validator)?;
            withdrawn = (withdrawn + amount)?;
        }
        Ok(withdrawn)
    }

    /// The rewards the delegator could withdraw from a validator now.
    pub fn current_delegation_reward(
        &self,
        ctx: &Context,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Decimal> {
        let info = self
            .get_delegation_info(delegator, validator)?
            .ok_or_else(|| Error::NotFound("No distribution info for this delegation".into()))?;
        let delegation = self
            .staking
            .get_delegation(delegator, validator)?
            .ok_or_else(|| Error::NotFound("No delegation for this (address, validator) pair".into()))?;
        let total_del_shares = self.staking.validator(validator)?.delegator_shares;

        info.current_rewards(
            &self.fee_pool()?,
            &self.validator_info(validator)?,
            &self.withdraw_context(ctx, validator)?,
            total_del_shares,
            delegation.shares,
        )
    }

    pub fn current_delegation_rewards_all(&self, ctx: &Context, delegator: &Address) -> Result<Decimal> {
        self.staking
            .delegator_delegations(delegator)?
            .iter()
            .try_fold(Decimal::zero(), |sum, delegation| {
                sum + self.current_delegation_reward(ctx, delegator, &delegation.validator)?
            })
    }

    /// Whole tokens the operator would receive from
    /// `withdraw_validator_rewards_all` now.
    pub fn current_validator_rewards_all(&self, ctx: &Context, operator: &Address) -> Result<Amount> {
        let vi = self.validator_info(operator)?;
        let rewards = self.current_delegation_rewards_all(ctx, operator)?;
        let commission = vi.current_commission_rewards(
            &self.fee_pool()?,
            &self.withdraw_context(ctx, operator)?,
        )?;
        (rewards + commission)?.truncate().amount()
    }
}
