use crate::coins::{cons_address, Address, ConsAddress, Decimal, PubKey};
use crate::context::Time;
use crate::encoding::{decode_str, encode_str, str_encoding_length, Decode, Encode, Terminated};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const MAX_MONIKER_LENGTH: usize = 70;
const MAX_IDENTITY_LENGTH: usize = 3000;
const MAX_WEBSITE_LENGTH: usize = 140;
const MAX_DETAILS_LENGTH: usize = 280;

const COMMISSION_EDIT_INTERVAL_SECONDS: i64 = 60 * 60 * 24; // 1 day

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unbonded,
    Unbonding,
    Bonded,
}

impl Encode for Status {
    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        let byte: u8 = match self {
            Status::Unbonded => 0,
            Status::Unbonding => 1,
            Status::Bonded => 2,
        };
        byte.encode_into(dest)
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(1)
    }
}

impl Decode for Status {
    fn decode<R: std::io::Read>(source: R) -> ed::Result<Self> {
        match u8::decode(source)? {
            0 => Ok(Status::Unbonded),
            1 => Ok(Status::Unbonding),
            2 => Ok(Status::Bonded),
            byte => Err(ed::Error::UnexpectedByte(byte)),
        }
    }
}

impl Terminated for Status {}

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commission {
    pub rate: Decimal,
    pub max_rate: Decimal,
    pub max_change_rate: Decimal,
    #[serde(default)]
    pub update_time: Time,
}

impl Commission {
    pub fn new(rate: Decimal, max_rate: Decimal, max_change_rate: Decimal) -> Self {
        Commission {
            rate,
            max_rate,
            max_change_rate,
            update_time: Time::default(),
        }
    }

    /// Checks the initial commission settings of a new validator.
    pub fn validate(&self) -> Result<()> {
        if self.max_rate < Decimal::zero() || self.max_rate > Decimal::one() {
            return Err(Error::InvalidParameters(
                "Max commission must be between 0 and 1".into(),
            ));
        }
        if self.rate < Decimal::zero() || self.rate > self.max_rate {
            return Err(Error::InvalidParameters(
                "Initial commission must be between 0 and max commission".into(),
            ));
        }
        if self.max_change_rate < Decimal::zero() || self.max_change_rate > self.max_rate {
            return Err(Error::InvalidParameters(
                "Max commission change must be between 0 and max commission".into(),
            ));
        }
        Ok(())
    }

    /// Checks a commission rate change requested at `now`.
    pub fn validate_new_rate(&self, new_rate: Decimal, now: Time) -> Result<()> {
        if now.seconds - COMMISSION_EDIT_INTERVAL_SECONDS < self.update_time.seconds {
            return Err(Error::InvalidParameters(
                "Commission may only be changed once per 24 hours".into(),
            ));
        }
        if new_rate < Decimal::zero() || new_rate > self.max_rate {
            return Err(Error::InvalidParameters(
                "Commission must be between 0 and max commission".into(),
            ));
        }
        let change = (new_rate - self.rate)?.abs();
        if change > self.max_change_rate {
            return Err(Error::InvalidParameters(
                "Commission change is greater than the validator's max change rate".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub details: String,
}

impl Description {
    pub fn new<S: Into<String>>(moniker: S) -> Self {
        Description {
            moniker: moniker.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("moniker", &self.moniker, MAX_MONIKER_LENGTH),
            ("identity", &self.identity, MAX_IDENTITY_LENGTH),
            ("website", &self.website, MAX_WEBSITE_LENGTH),
            ("details", &self.details, MAX_DETAILS_LENGTH),
        ];
        for (name, value, max) in fields {
            if value.len() > max {
                return Err(Error::InvalidParameters(format!(
                    "Invalid {} length; got: {}, max: {}",
                    name,
                    value.len(),
                    max
                )));
            }
        }
        Ok(())
    }
}

impl Encode for Description {
    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        encode_str(&self.moniker, dest)?;
        encode_str(&self.identity, dest)?;
        encode_str(&self.website, dest)?;
        encode_str(&self.details, dest)
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(str_encoding_length(&self.moniker)
            + str_encoding_length(&self.identity)
            + str_encoding_length(&self.website)
            + str_encoding_length(&self.details))
    }
}

impl Decode for Description {
    fn decode<R: std::io::Read>(mut source: R) -> ed::Result<Self> {
        Ok(Description {
            moniker: decode_str(&mut source)?,
            identity: decode_str(&mut source)?,
            website: decode_str(&mut source)?,
            details: decode_str(&mut source)?,
        })
    }
}

impl Terminated for Description {}

#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub operator: Address,
    pub pubkey: PubKey,
    pub jailed: bool,
    pub status: Status,
    pub tokens: Decimal,
    pub delegator_shares: Decimal,
    pub bond_height: i64,
    pub unbonding_height: i64,
    pub unbonding_min_time: Time,
    pub commission: Commission,
    pub description: Description,
}

impl Validator {
    pub fn new(
        operator: Address,
        pubkey: PubKey,
        description: Description,
        commission: Commission,
    ) -> Self {
        Validator {
            operator,
            pubkey,
            jailed: false,
            status: Status::Unbonded,
            tokens: Decimal::zero(),
            delegator_shares: Decimal::zero(),
            bond_height: 0,
            unbonding_height: 0,
            unbonding_min_time: Time::default(),
            commission,
            description,
        }
    }

    pub fn cons_address(&self) -> ConsAddress {
        cons_address(&self.pubkey)
    }

    pub fn is_bonded(&self) -> bool {
        self.status == Status::Bonded
    }

    /// Tokens held per delegator share. One when no shares exist.
    pub fn exchange_rate(&self) -> Result<Decimal> {
        if self.delegator_shares.is_zero() {
            return Ok(Decimal::one());
        }
        self.tokens / self.delegator_shares
    }

    /// Shares issued for a delegation of `amount` tokens.
    pub fn shares_from_tokens(&self, amount: Decimal) -> Result<Decimal> {
        if self.delegator_shares.is_zero() {
            return Ok(amount);
        }
        if self.tokens.is_zero() {
            return Err(Error::InvalidAmount(
                "Validator has no tokens backing its shares".into(),
            ));
        }
        amount.mul_div(self.delegator_shares, self.tokens)
    }

    /// Whole tokens represented by `shares`. Redeeming every share yields
    /// every token.
    pub fn tokens_from_shares(&self, shares: Decimal) -> Result<Decimal> {
        if shares >= self.delegator_shares {
            return Ok(self.tokens);
        }
        Ok(shares.mul_div(self.tokens, self.delegator_shares)?.truncate())
    }

    /// Consensus power, the tokens divided by the power reduction and
    /// truncated.
    pub fn consensus_power(&self, power_reduction: u64) -> Result<u64> {
        let power = (self.tokens / power_reduction)?.truncate();
        Ok(power.amount()?.into())
    }

    pub fn bonded_tokens(&self) -> Decimal {
        if self.is_bonded() {
            self.tokens
        } else {
            Decimal::zero()
        }
    }

    /// Adds delegated tokens, returning the newly issued shares.
    pub(super) fn add_tokens_from_del(&mut self, amount: Decimal) -> Result<Decimal> {
        let shares = self.shares_from_tokens(amount)?;
        self.tokens = (self.tokens + amount)?;
        self.delegator_shares = (self.delegator_shares + shares)?;
        Ok(shares)
    }

    /// Removes delegator shares, returning the tokens they were redeemed
    /// for.
    pub(super) fn remove_del_shares(&mut self, shares: Decimal) -> Result<Decimal> {
        let tokens = self.tokens_from_shares(shares)?;
        self.tokens = (self.tokens - tokens)?;
        self.delegator_shares = (self.delegator_shares - shares)?;
        Ok(tokens)
    }

    pub(super) fn remove_tokens(&mut self, tokens: Decimal) -> Result<()> {
        if tokens > self.tokens {
            return Err(Error::InvalidAmount(
                "Cannot remove more tokens than the validator holds".into(),
            ));
        }
        self.tokens = (self.tokens - tokens)?;
        Ok(())
    }
}
