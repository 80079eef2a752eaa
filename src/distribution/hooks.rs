use super::*;
use crate::staking::{StakingHooks, Validator};

/// Settles rewards whenever stake is about to change.
#[derive(Clone)]
pub struct Hooks<B, F> {
    distribution: Distribution<B, F>,
}

impl<B, F> Hooks<B, F> {
    pub fn new(distribution: Distribution<B, F>) -> Self {
        Hooks { distribution }
    }
}

impl<B: Bank + Clone, F: FeeCollector> Distribution<B, F> {
    fn create_validator_info(&mut self, ctx: &Context, operator: Address) -> Result<()> {
        self.set_validator_info(&ValidatorDistInfo::new(operator, ctx.height))
    }

    /// Pays out a removed validator's remaining commission and sends what is
    /// left in its delegator pool to the community pool.
    fn remove_validator_rewards(&mut self, operator: Address) -> Result<()> {
        let vi = match self.get_validator_info(&operator)? {
            Some(vi) => vi,
            None => return Ok(()),
        };
        if vi.del_accum.accum.is_positive() {
            panic!("Should not remove a validator with unwithdrawn delegator accum");
        }

        self.withdraw_to_delegator(operator, vi.val_commission)?;

        let mut fee_pool = self.fee_pool()?;
        fee_pool.community_pool = (fee_pool.community_pool + vi.del_pool)?;
        self.set_fee_pool(&fee_pool)?;

        debug!(
            "Removed distribution info of {}, {} left to the community pool",
            hex::encode(operator),
            vi.del_pool
        );
        self.remove_validator_info(&operator)
    }
}

impl<B: Bank + Clone, F: FeeCollector> StakingHooks for Hooks<B, F> {
    fn on_validator_created(&mut self, ctx: &Context, validator: &Validator) -> Result<()> {
        self.distribution
            .create_validator_info(ctx, validator.operator)
    }

    fn on_validator_modified(&mut self, ctx: &Context, operator: Address) -> Result<()> {
        self.distribution
            .take_validator_fee_pool_rewards(ctx, &operator)
    }

    fn on_validator_removed(
        &mut self,
        _ctx: &Context,
        _cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.distribution.remove_validator_rewards(operator)
    }

    fn on_validator_bonded(
        &mut self,
        ctx: &Context,
        _cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.distribution
            .take_validator_fee_pool_rewards(ctx, &operator)
    }

    fn on_validator_power_did_change(
        &mut self,
        ctx: &Context,
        _cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.distribution
            .take_validator_fee_pool_rewards(ctx, &operator)
    }

    fn on_validator_begin_unbonding(
        &mut self,
        ctx: &Context,
        _cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.distribution
            .take_validator_fee_pool_rewards(ctx, &operator)
    }

    fn on_delegation_created(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        self.distribution
            .take_validator_fee_pool_rewards(ctx, &validator)?;
        self.distribution
            .set_delegation_info(&DelegationDistInfo::new(delegator, validator, ctx.height))
    }

    fn on_delegation_shares_modified(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        self.distribution
            .take_validator_fee_pool_rewards(ctx, &validator)?;
        self.distribution
            .withdraw_delegation_reward(ctx, delegator, validator)?;
        Ok(())
    }

    fn on_delegation_removed(
        &mut self,
        _ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        self.distribution
            .remove_delegation_info(&delegator, &validator)
    }
}
