use super::*;
use crate::staking::{Status, VALIDATOR_UPDATE_DELAY};
use log::{info, warn};

impl<B: Bank + Clone> Slashing<B> {
    /// Records whether a validator signed the last block, and slashes and
    /// jails it once it has missed too many blocks of the window. Must be
    /// called once per bonded validator per block.
    pub fn handle_validator_signature(
        &mut self,
        ctx: &Context,
        cons: &ConsAddress,
        power: u64,
        signed: bool,
    ) -> Result<()> {
        self.must_get_pubkey(cons)?;
        let params = self.params()?;
        let mut info = self.must_get_signing_info(cons)?;

        let index = info.index_offset % params.signed_blocks_window;
        info.index_offset += 1;

        let previous = self.missed_block(cons, index)?;
        let missed = !signed;
        if !previous && missed {
            self.set_missed_block(cons, index, true)?;
            info.missed_blocks_counter += 1;
        } else if previous && !missed {
            self.set_missed_block(cons, index, false)?;
            info.missed_blocks_counter -= 1;
        }

        let max_missed = params.max_missed_blocks()?;
        if missed {
            info!(
                "Absent validator {}, missed {} of max {}",
                hex::encode(cons),
                info.missed_blocks_counter,
                max_missed
            );
        }

        let min_height = info.start_height + params.signed_blocks_window;
        if ctx.height > min_height && info.missed_blocks_counter > max_missed {
            match self.staking.get_validator_by_cons(cons)? {
                Some(validator) if !validator.jailed => {
                    info!(
                        "Validator {} was down for too long, slashing and jailing",
                        hex::encode(validator.operator)
                    );
                    // the last commit was signed by the set from before the
                    // update delay
                    let distribution_height = ctx.height - VALIDATOR_UPDATE_DELAY - 1;
                    self.staking.slash(
                        ctx,
                        cons,
                        distribution_height,
                        power,
                        params.slash_fraction_downtime,
                    )?;
                    self.staking.jail(cons)?;

                    info.jailed_until = ctx.time.add_seconds(params.downtime_jail_duration);
                    info.missed_blocks_counter = 0;
                    info.index_offset = 0;
                    self.clear_missed_blocks(cons)?;
                }
                _ => info!(
                    "Validator {} would have been slashed for downtime, but was either not found or already jailed",
                    hex::encode(cons)
                ),
            }
        }

        self.set_signing_info(cons, &info)
    }

    /// Slashes and jails a validator for signing two blocks at the same
    /// height. `power` is the validator's power at the infraction height.
    pub fn handle_double_sign(
        &mut self,
        ctx: &Context,
        cons: &ConsAddress,
        infraction_height: i64,
        power: u64,
    ) -> Result<()> {
        let validator = match self.staking.get_validator_by_cons(cons)? {
            Some(validator) if validator.status != Status::Unbonded => validator,
            _ => return Ok(()),
        };
        self.must_get_pubkey(cons)?;
        let params = self.params()?;

        let age = ctx.height - infraction_height;
        if age > params.max_evidence_age {
            warn!(
                "Ignored double sign of {} at height {}, age {} is greater than max age {}",
                hex::encode(cons),
                infraction_height,
                age,
                params.max_evidence_age
            );
            return Ok(());
        }
        info!(
            "Confirmed double sign of {} at height {}, age {}",
            hex::encode(cons),
            infraction_height,
            age
        );

        let distribution_height = infraction_height - VALIDATOR_UPDATE_DELAY;
        let fraction = self.cap_by_slashing_period(
            cons,
            params.slash_fraction_double_sign,
            distribution_height,
        )?;
        info!(
            "Double sign fraction {} capped by slashing period to {}",
            params.slash_fraction_double_sign, fraction
        );

        self.staking
            .slash(ctx, cons, distribution_height, power, fraction)?;
        if !validator.jailed {
            self.staking.jail(cons)?;
        }

        let mut info = self.must_get_signing_info(cons)?;
        info.jailed_until = ctx.time.add_seconds(params.double_sign_jail_duration);
        self.set_signing_info(cons, &info)
    }

    /// Slashes and jails a proposer which proposed an invalid block.
    pub fn handle_proposer_censorship(
        &mut self,
        ctx: &Context,
        cons: &ConsAddress,
        infraction_height: i64,
    ) -> Result<()> {
        let validator = match self.staking.get_validator_by_cons(cons)? {
            Some(validator) if validator.status != Status::Unbonded => validator,
            _ => return Ok(()),
        };
        self.must_get_pubkey(cons)?;
        let params = self.params()?;
        info!(
            "Proposer {} proposed an invalid block at height {}",
            hex::encode(validator.operator),
            ctx.height
        );

        let power = validator.consensus_power(self.staking.params()?.power_reduction)?;
        let distribution_height = infraction_height - VALIDATOR_UPDATE_DELAY;
        self.staking.slash(
            ctx,
            cons,
            distribution_height,
            power,
            params.slash_fraction_censorship,
        )?;
        if !validator.jailed {
            self.staking.jail(cons)?;
        }

        let mut info = self.must_get_signing_info(cons)?;
        info.jailed_until = ctx.time.add_seconds(params.censorship_jail_duration);
        self.set_signing_info(cons, &info)
    }
}
