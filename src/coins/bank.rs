use super::{Address, Amount};
use crate::Result;

/// Account balances and the loose token total, as seen by the staking,
/// distribution and slashing keepers.
///
/// Loose tokens are every token which is not bonded to a bonded validator:
/// account balances, tokens held by unbonded or unbonding validators, and
/// pending unbonding balances.
pub trait Bank {
    fn get_coins(&self, address: Address) -> Result<Amount>;

    fn add_coins(&mut self, address: Address, amount: Amount) -> Result<()>;

    /// Fails if the account holds less than `amount`.
    fn subtract_coins(&mut self, address: Address, amount: Amount) -> Result<()>;

    fn get_loosen_coins(&self) -> Result<Amount>;

    fn increase_loosen_token(&mut self, amount: Amount) -> Result<()>;

    fn decrease_loosen_token(&mut self, amount: Amount) -> Result<()>;
}

/// Fees collected during the current block.
pub trait FeeCollector {
    fn get_collected_fees(&self) -> Result<Amount>;

    fn add_collected_fees(&mut self, amount: Amount) -> Result<()>;

    fn clear_collected_fees(&mut self) -> Result<()>;
}
