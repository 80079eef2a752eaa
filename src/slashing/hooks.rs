use super::*;
use crate::coins::Address;
use crate::staking::{StakingHooks, Validator};

/// Tracks signing info, slashing periods and consensus keys as validators
/// come and go.
#[derive(Clone)]
pub struct Hooks<B> {
    slashing: Slashing<B>,
}

impl<B> Hooks<B> {
    pub fn new(slashing: Slashing<B>) -> Self {
        Hooks { slashing }
    }
}

impl<B: Bank + Clone> StakingHooks for Hooks<B> {
    fn on_validator_created(&mut self, _ctx: &Context, validator: &Validator) -> Result<()> {
        self.slashing.set_pubkey(&validator.pubkey)
    }

    fn on_validator_removed(
        &mut self,
        _ctx: &Context,
        cons: ConsAddress,
        _operator: Address,
    ) -> Result<()> {
        self.slashing.delete_pubkey(&cons)
    }

    fn on_validator_bonded(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        _operator: Address,
    ) -> Result<()> {
        if self.slashing.signing_info(&cons)?.is_none() {
            self.slashing
                .set_signing_info(&cons, &ValidatorSigningInfo::new(ctx.height))?;
        }
        self.slashing
            .set_slashing_period(&SlashingPeriod::new(cons, ctx.height))
    }

    fn on_validator_begin_unbonding(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        _operator: Address,
    ) -> Result<()> {
        let mut period = self.slashing.slashing_period_for_height(&cons, ctx.height)?;
        period.end_height = ctx.height;
        self.slashing.set_slashing_period(&period)
    }
}
