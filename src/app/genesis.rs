use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Modules;
use crate::coins::{Address, Amount, PubKey};
use crate::context::{Context, Time};
use crate::staking::{Commission, Description, ValidatorUpdate};
use crate::{distribution, slashing, staking, Result};
use log::info;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenesisAccount {
    pub address: Address,
    pub coins: Amount,
}

/// A validator declared at genesis. Its self-bond is taken from its
/// operator's genesis account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenesisValidator {
    pub operator: Address,
    pub pubkey: PubKey,
    pub self_bond: Amount,
    #[serde(default)]
    pub description: Description,
    pub commission: Commission,
}

/// Initial chain state. Every field may be omitted from the JSON form, in
/// which case defaults apply.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Genesis {
    pub genesis_time: Time,
    pub staking: staking::Params,
    pub distribution: distribution::Params,
    pub slashing: slashing::Params,
    pub accounts: Vec<GenesisAccount>,
    pub validators: Vec<GenesisValidator>,
}

impl Genesis {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a genesis JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(json.as_str())
    }
}

impl Modules {
    /// Writes the genesis state and returns the initial validator set.
    pub(super) fn init_genesis(&mut self, genesis: Genesis) -> Result<Vec<ValidatorUpdate>> {
        let ctx = Context::new(0, genesis.genesis_time);

        self.staking.set_params(genesis.staking)?;
        self.distribution.set_params(genesis.distribution)?;
        self.slashing.set_params(genesis.slashing)?;

        for account in genesis.accounts {
            self.accounts.mint(account.address, account.coins)?;
        }

        for validator in genesis.validators {
            self.staking.create_validator(
                &ctx,
                validator.operator,
                validator.pubkey,
                validator.self_bond,
                validator.description,
                validator.commission,
            )?;
        }

        let updates = self.staking.apply_and_return_validator_set_updates(&ctx)?;
        info!("Initialized chain with {} validators", updates.len());
        Ok(updates)
    }
}
