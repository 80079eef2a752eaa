use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Modules;
use crate::coins::{Address, Bank, ConsAddress};
use crate::context::Context;
use crate::staking::Page;
use crate::{Error, Result};

/// Arguments of a query. Each path reads the fields it needs and fails
/// with `InvalidParameters` if one is missing.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct QueryArgs {
    pub address: Option<Address>,
    pub operator: Option<Address>,
    pub delegator: Option<Address>,
    pub validator: Option<Address>,
    pub src: Option<Address>,
    pub cons: Option<ConsAddress>,
    pub page: Page,
}

fn required(field: Option<Address>, name: &str) -> Result<Address> {
    field.ok_or_else(|| Error::InvalidParameters(format!("Missing query field '{}'", name)))
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn not_found(what: &str) -> Error {
    Error::NotFound(format!("No {} found", what))
}

impl Modules {
    pub(super) fn query(&self, ctx: &Context, path: &str, args: QueryArgs) -> Result<Value> {
        let staking = &self.staking;
        let distribution = &self.distribution;

        let value = match path {
            "accounts/balance" => {
                to_json(self.accounts.get_coins(required(args.address, "address")?)?)?
            }

            "staking/params" => to_json(staking.params()?)?,
            "staking/pool" => {
                let status = staking.pool_status()?;
                json!({
                    "loose_tokens": status.loose_tokens,
                    "bonded_tokens": status.bonded_tokens,
                    "bonded_ratio": status.bonded_ratio()?,
                })
            }
            "staking/validator" => {
                to_json(staking.validator(&required(args.operator, "operator")?)?)?
            }
            "staking/validators" => to_json(staking.validators_paged(args.page)?)?,
            "staking/bonded_validators" => to_json(staking.bonded_validators()?)?,
            "staking/delegation" => {
                let delegator = required(args.delegator, "delegator")?;
                let validator = required(args.validator, "validator")?;
                let delegation = staking
                    .get_delegation(&delegator, &validator)?
                    .ok_or_else(|| not_found("delegation"))?;
                to_json(delegation)?
            }
            "staking/delegator_delegations" => to_json(args
                .page
                .apply(staking.delegator_delegations(&required(args.delegator, "delegator")?)?))?,
            "staking/validator_delegations" => to_json(args
                .page
                .apply(staking.validator_delegations(&required(args.validator, "validator")?)?))?,
            "staking/delegator_validators" => to_json(args
                .page
                .apply(staking.delegator_validators(&required(args.delegator, "delegator")?)?))?,
            "staking/unbonding_delegation" => {
                let delegator = required(args.delegator, "delegator")?;
                let validator = required(args.validator, "validator")?;
                let ubd = staking
                    .get_unbonding_delegation(&delegator, &validator)?
                    .ok_or_else(|| not_found("unbonding delegation"))?;
                to_json(ubd)?
            }
            "staking/delegator_unbonding_delegations" => to_json(staking
                .delegator_unbonding_delegations(&required(args.delegator, "delegator")?)?)?,
            "staking/validator_unbonding_delegations" => to_json(staking
                .validator_unbonding_delegations(&required(args.validator, "validator")?)?)?,
            "staking/delegator_redelegations" => {
                to_json(staking.delegator_redelegations(&required(args.delegator, "delegator")?)?)?
            }
            "staking/validator_redelegations" => {
                to_json(staking.redelegations_from_validator(&required(args.src, "src")?)?)?
            }

            "distribution/params" => to_json(distribution.params()?)?,
            "distribution/fee_pool" => to_json(distribution.fee_pool()?)?,
            "distribution/withdraw_address" => {
                to_json(distribution.withdraw_address(&required(args.delegator, "delegator")?)?)?
            }
            "distribution/delegation_reward" => {
                let delegator = required(args.delegator, "delegator")?;
                let validator = required(args.validator, "validator")?;
                to_json(distribution.current_delegation_reward(ctx, &delegator, &validator)?)?
            }
            "distribution/delegation_rewards" => to_json(distribution
                .current_delegation_rewards_all(ctx, &required(args.delegator, "delegator")?)?)?,
            "distribution/validator_rewards" => to_json(distribution
                .current_validator_rewards_all(ctx, &required(args.operator, "operator")?)?)?,

            "slashing/params" => to_json(self.slashing.params()?)?,
            "slashing/signing_info" => {
                let cons = required(args.cons, "cons")?;
                let info = self
                    .slashing
                    .signing_info(&cons)?
                    .ok_or_else(|| not_found("signing info"))?;
                to_json(info)?
            }

            _ => return Err(Error::NotFound(format!("Unknown query path '{}'", path))),
        };

        Ok(value)
    }
}
