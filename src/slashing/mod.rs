//! Punishment of validator faults: downtime, double signing and proposer
//! censorship. Slashed validators are jailed through the staking ledger.

use crate::coins::{Bank, ConsAddress, Decimal, PubKey};
use crate::context::{height_key, Context};
use crate::staking::Staking;
use crate::store::{Read, Store, Write};
use crate::{Error, Result};

mod handlers;
mod hooks;
mod params;
mod period;
mod signing_info;
mod unjail;

pub use hooks::*;
pub use params::*;
pub use period::*;
pub use signing_info::*;

const PARAMS_KEY: &[u8] = &[0x00];
const SIGNING_INFO_PREFIX: u8 = 0x01;
const MISSED_BLOCK_PREFIX: u8 = 0x02;
const SLASHING_PERIOD_PREFIX: u8 = 0x03;
const PUBKEY_PREFIX: u8 = 0x04;

fn signing_info_key(cons: &ConsAddress) -> Vec<u8> {
    [&[SIGNING_INFO_PREFIX][..], &cons[..]].concat()
}

fn missed_blocks_key(cons: &ConsAddress) -> Vec<u8> {
    [&[MISSED_BLOCK_PREFIX][..], &cons[..]].concat()
}

fn missed_block_key(cons: &ConsAddress, index: i64) -> Vec<u8> {
    [missed_blocks_key(cons).as_slice(), &index.to_be_bytes()].concat()
}

fn slashing_periods_key(cons: &ConsAddress) -> Vec<u8> {
    [&[SLASHING_PERIOD_PREFIX][..], &cons[..]].concat()
}

fn slashing_period_key(cons: &ConsAddress, start_height: i64) -> Vec<u8> {
    [slashing_periods_key(cons).as_slice(), &height_key(start_height)].concat()
}

fn pubkey_key(cons: &ConsAddress) -> Vec<u8> {
    [&[PUBKEY_PREFIX][..], &cons[..]].concat()
}

/// Handle to the slashing state, punishing through the given staking
/// handle.
#[derive(Clone)]
pub struct Slashing<B> {
    store: Store,
    staking: Staking<B>,
}

impl<B: Bank + Clone> Slashing<B> {
    pub fn new(store: Store, staking: Staking<B>) -> Self {
        Slashing { store, staking }
    }

    pub fn params(&self) -> Result<Params> {
        Ok(self.store.get_decoded(PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        self.store.put_encoded(PARAMS_KEY.to_vec(), &params)
    }

    pub fn signing_info(&self, cons: &ConsAddress) -> Result<Option<ValidatorSigningInfo>> {
        self.store
            .get_decoded(signing_info_key(cons).as_slice())
    }

    pub fn set_signing_info(&mut self, cons: &ConsAddress, info: &ValidatorSigningInfo) -> Result<()> {
        self.store.put_encoded(signing_info_key(cons), info)
    }

    fn must_get_signing_info(&self, cons: &ConsAddress) -> Result<ValidatorSigningInfo> {
        match self.signing_info(cons)? {
            Some(info) => Ok(info),
            None => panic!(
                "Expected signing info for validator {} but not found",
                hex::encode(cons)
            ),
        }
    }

    pub fn missed_block(&self, cons: &ConsAddress, index: i64) -> Result<bool> {
        self.store
            .contains(missed_block_key(cons, index).as_slice())
    }

    fn set_missed_block(&mut self, cons: &ConsAddress, index: i64, missed: bool) -> Result<()> {
        let key = missed_block_key(cons, index);
        if missed {
            self.store.put(key, vec![])
        } else {
            self.store.delete(key.as_slice())
        }
    }

    fn clear_missed_blocks(&mut self, cons: &ConsAddress) -> Result<()> {
        let keys = self
            .store
            .iter_prefix(&missed_blocks_key(cons))
            .map(|entry| entry.map(|(key, _)| key))
            .collect::<Result<Vec<_>>>()?;
        for key in keys {
            self.store.delete(key.as_slice())?;
        }
        Ok(())
    }

    pub fn pubkey(&self, cons: &ConsAddress) -> Result<Option<PubKey>> {
        self.store.get_decoded(pubkey_key(cons).as_slice())
    }

    fn set_pubkey(&mut self, pubkey: &PubKey) -> Result<()> {
        let cons = crate::coins::cons_address(pubkey);
        self.store.put_encoded(pubkey_key(&cons), pubkey)
    }

    fn delete_pubkey(&mut self, cons: &ConsAddress) -> Result<()> {
        self.store.delete(pubkey_key(cons).as_slice())
    }

    fn must_get_pubkey(&self, cons: &ConsAddress) -> Result<PubKey> {
        match self.pubkey(cons)? {
            Some(pubkey) => Ok(pubkey),
            None => panic!("Validator consensus address {} not found", hex::encode(cons)),
        }
    }

    fn set_slashing_period(&mut self, period: &SlashingPeriod) -> Result<()> {
        self.store.put_encoded(
            slashing_period_key(&period.cons, period.start_height),
            period,
        )
    }

    /// The latest slashing period which started at or before `height`.
    pub fn slashing_period_for_height(&self, cons: &ConsAddress, height: i64) -> Result<SlashingPeriod> {
        let period = self
            .store
            .collect_prefix::<SlashingPeriod>(&slashing_periods_key(cons))?
            .into_iter()
            .map(|(_, period)| period)
            .filter(|period| period.start_height <= height)
            .last();
        match period {
            Some(period) => Ok(period),
            None => panic!(
                "Slashing period ended before infraction: validator {}, infraction height {}",
                hex::encode(cons),
                height
            ),
        }
    }

    /// Caps `fraction` so that infractions within one slashing period are
    /// only punished at the largest fraction. Returns the fraction still to
    /// be slashed.
    fn cap_by_slashing_period(
        &mut self,
        cons: &ConsAddress,
        fraction: Decimal,
        infraction_height: i64,
    ) -> Result<Decimal> {
        let mut period = self.slashing_period_for_height(cons, infraction_height)?;
        if period.end_height > 0 && period.end_height < infraction_height {
            panic!(
                "Slashing period ended before infraction: validator {}, infraction height {}",
                hex::encode(cons),
                infraction_height
            );
        }

        let slashed_so_far = period.slashed_so_far;
        period.slashed_so_far = slashed_so_far.max(fraction);
        self.set_slashing_period(&period)?;

        period.slashed_so_far - slashed_so_far
    }
}
