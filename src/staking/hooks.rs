use std::cell::RefCell;
use std::rc::Rc;

use super::Validator;
use crate::coins::{Address, ConsAddress};
use crate::context::Context;
use crate::store::Shared;
use crate::Result;

/// Callbacks fired by the staking ledger before and after stake changes.
/// Distribution uses them to settle rewards before any stake moves, and
/// slashing uses them to track signing info and slashing periods.
///
/// Every callback defaults to doing nothing.
#[allow(unused_variables)]
pub trait StakingHooks {
    fn on_validator_created(&mut self, ctx: &Context, validator: &Validator) -> Result<()> {
        Ok(())
    }

    fn on_validator_modified(&mut self, ctx: &Context, operator: Address) -> Result<()> {
        Ok(())
    }

    fn on_validator_removed(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn on_validator_bonded(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn on_validator_power_did_change(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn on_validator_begin_unbonding(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn on_delegation_created(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn on_delegation_shares_modified(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        Ok(())
    }

    fn on_delegation_removed(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        Ok(())
    }
}

/// Wraps a hooks implementation so it can be handed to the staking ledger.
pub fn share_hooks<H: StakingHooks + 'static>(hooks: H) -> Shared<dyn StakingHooks> {
    let inner: Rc<RefCell<dyn StakingHooks>> = Rc::new(RefCell::new(hooks));
    Shared::from(inner)
}

/// Calls `A`'s hooks, then `B`'s.
impl<A: StakingHooks, B: StakingHooks> StakingHooks for (A, B) {
    fn on_validator_created(&mut self, ctx: &Context, validator: &Validator) -> Result<()> {
        self.0.on_validator_created(ctx, validator)?;
        self.1.on_validator_created(ctx, validator)
    }

    fn on_validator_modified(&mut self, ctx: &Context, operator: Address) -> Result<()> {
        self.0.on_validator_modified(ctx, operator)?;
        self.1.on_validator_modified(ctx, operator)
    }

    fn on_validator_removed(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.0.on_validator_removed(ctx, cons, operator)?;
        self.1.on_validator_removed(ctx, cons, operator)
    }

    fn on_validator_bonded(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.0.on_validator_bonded(ctx, cons, operator)?;
        self.1.on_validator_bonded(ctx, cons, operator)
    }

    fn on_validator_power_did_change(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.0.on_validator_power_did_change(ctx, cons, operator)?;
        self.1.on_validator_power_did_change(ctx, cons, operator)
    }

    fn on_validator_begin_unbonding(
        &mut self,
        ctx: &Context,
        cons: ConsAddress,
        operator: Address,
    ) -> Result<()> {
        self.0.on_validator_begin_unbonding(ctx, cons, operator)?;
        self.1.on_validator_begin_unbonding(ctx, cons, operator)
    }

    fn on_delegation_created(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        self.0.on_delegation_created(ctx, delegator, validator)?;
        self.1.on_delegation_created(ctx, delegator, validator)
    }

    fn on_delegation_shares_modified(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        self.0.on_delegation_shares_modified(ctx, delegator, validator)?;
        self.1.on_delegation_shares_modified(ctx, delegator, validator)
    }

    fn on_delegation_removed(
        &mut self,
        ctx: &Context,
        delegator: Address,
        validator: Address,
    ) -> Result<()> {
        self.0.on_delegation_removed(ctx, delegator, validator)?;
        self.1.on_delegation_removed(ctx, delegator, validator)
    }
}
