use std::cmp::Ordering;

use super::*;
use log::{error, info};

impl<B: Bank + Clone> Staking<B> {
    /// Slashes the validator with consensus address `cons` for an infraction
    /// committed at `infraction_height` while it had `power` consensus power.
    ///
    /// Unbonding delegations and redelegations which began after the
    /// infraction are slashed first, and whatever remains of the slash
    /// amount is burned from the validator's tokens.
    pub fn slash(
        &mut self,
        ctx: &Context,
        cons: &ConsAddress,
        infraction_height: i64,
        power: u64,
        fraction: Decimal,
    ) -> Result<()> {
        if fraction.is_negative() {
            panic!("Attempted to slash with a negative slash factor: {}", fraction);
        }

        let params = self.params()?;
        let amount = ((Decimal::from(power) * params.power_reduction)? * fraction)?.truncate();

        let validator = match self.get_validator_by_cons(cons)? {
            Some(validator) => validator,
            None => {
                // may have been slashed down to nothing and removed
                error!(
                    "Ignored attempt to slash a nonexistent validator with address {}",
                    hex::encode(cons)
                );
                return Ok(());
            }
        };
        if validator.status == Status::Unbonded {
            panic!("Should not be slashing an unbonded validator: {}", hex::encode(validator.operator));
        }

        let operator = validator.operator;
        self.call_hooks(|hooks| hooks.on_validator_modified(ctx, operator))?;

        let mut remaining = amount;
        match infraction_height.cmp(&ctx.height) {
            Ordering::Greater => panic!(
                "Impossible attempt to slash future infraction at height {} but we are at height {}",
                infraction_height, ctx.height
            ),
            Ordering::Equal => info!(
                "Slashing at current height {}, not scanning unbonding delegations & redelegations",
                infraction_height
            ),
            Ordering::Less => {
                for ubd in self.validator_unbonding_delegations(&operator)? {
                    let slashed =
                        self.slash_unbonding_delegation(ctx, ubd, infraction_height, fraction)?;
                    remaining = (remaining - slashed)?;
                }
                for red in self.redelegations_from_validator(&operator)? {
                    let slashed = self.slash_redelegation(ctx, red, infraction_height, fraction)?;
                    remaining = (remaining - slashed)?;
                }
            }
        }

        let mut validator = self.validator(&operator)?;
        let to_burn = remaining.min(validator.tokens).max(Decimal::zero());
        self.remove_validator_tokens(&mut validator, to_burn)?;
        self.bank.decrease_loosen_token(to_burn.amount()?)?;

        info!(
            "Validator {} slashed by fraction {}, burned {} tokens",
            hex::encode(operator),
            fraction,
            to_burn
        );
        Ok(())
    }

    /// Slashes an unbonding delegation which began at or after the
    /// infraction. Returns the full slash amount, even if the remaining
    /// balance could not cover it.
    fn slash_unbonding_delegation(
        &mut self,
        ctx: &Context,
        mut ubd: UnbondingDelegation,
        infraction_height: i64,
        fraction: Decimal,
    ) -> Result<Decimal> {
        if ubd.creation_height < infraction_height || ubd.min_time < ctx.time {
            return Ok(Decimal::zero());
        }

        let slash = (Decimal::from(ubd.initial_balance) * fraction)?.truncate();
        let from_balance = slash.min(ubd.balance.into());
        if from_balance.is_zero() {
            return Ok(slash);
        }

        let burned = from_balance.amount()?;
        ubd.balance = (ubd.balance - burned)?;
        self.set_unbonding_delegation(&ubd)?;
        self.bank.decrease_loosen_token(burned)?;

        Ok(slash)
    }

    /// Slashes a redelegation which began at or after the infraction, and
    /// burns the matching share of the destination delegation. Returns the
    /// full slash amount.
    fn slash_redelegation(
        &mut self,
        ctx: &Context,
        mut red: Redelegation,
        infraction_height: i64,
        fraction: Decimal,
    ) -> Result<Decimal> {
        if red.creation_height < infraction_height || red.min_time < ctx.time {
            return Ok(Decimal::zero());
        }

        let slash = (Decimal::from(red.initial_balance) * fraction)?.truncate();
        let from_balance = slash.min(red.balance.into());
        if from_balance.is_positive() {
            red.balance = (red.balance - from_balance.amount()?)?;
            self.set_redelegation(&red)?;
        }

        let mut shares_to_unbond = (fraction * red.shares_dst)?;
        if shares_to_unbond.is_zero() {
            return Ok(slash);
        }
        let delegation = match self.get_delegation(&red.delegator, &red.dst)? {
            Some(delegation) => delegation,
            // the delegator has already unbonded everything
            None => return Ok(slash),
        };
        if shares_to_unbond > delegation.shares {
            shares_to_unbond = delegation.shares;
        }

        let tokens = match self.unbond(ctx, red.delegator, red.dst, shares_to_unbond) {
            Ok(tokens) => tokens,
            Err(err) => panic!("Error unbonding delegator: {}", err),
        };
        self.bank.decrease_loosen_token(tokens.amount()?)?;

        Ok(slash)
    }
}
