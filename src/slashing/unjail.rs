use super::*;
use crate::coins::Address;
use log::info;

impl<B: Bank + Clone> Slashing<B> {
    /// Releases a jailed validator once its jail time is over, as long as
    /// the operator still holds enough self-delegation.
    pub fn unjail(&mut self, ctx: &Context, operator: Address) -> Result<()> {
        let validator = self.staking.validator(&operator)?;

        let self_delegation = self
            .staking
            .get_delegation(&operator, &operator)?
            .ok_or_else(|| Error::InvalidAmount("Validator has no self-delegation".into()))?;
        let self_bond = validator
            .tokens_from_shares(self_delegation.shares)?
            .truncate();
        let min_self_delegation = self.params()?.min_self_delegation;
        if self_bond < min_self_delegation.into() {
            return Err(Error::InvalidAmount(format!(
                "Self-delegation of {} is below the minimum of {}",
                self_bond, min_self_delegation
            )));
        }

        if !validator.jailed {
            return Err(Error::NotJailed);
        }

        let cons = validator.cons_address();
        let signing_info = self.signing_info(&cons)?.ok_or_else(|| {
            Error::NotFound(format!(
                "No signing info for validator {}",
                hex::encode(operator)
            ))
        })?;
        if ctx.time < signing_info.jailed_until {
            return Err(Error::StillJailed(format!(
                "Validator is jailed until {} seconds",
                signing_info.jailed_until.seconds
            )));
        }

        self.staking.unjail(&cons)?;
        info!("Validator {} unjailed", hex::encode(operator));
        Ok(())
    }
}
