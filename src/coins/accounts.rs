use super::{Address, Amount, Bank, FeeCollector};
use crate::store::{Store, Write};
use crate::{Error, Result};
use log::debug;

const BALANCE_PREFIX: u8 = 0x01;
const LOOSE_TOKENS_KEY: &[u8] = &[0x02];
const COLLECTED_FEES_KEY: &[u8] = &[0x01];

/// Store-backed account balances. Clones share the same store.
#[derive(Clone)]
pub struct Accounts {
    store: Store,
}

impl Accounts {
    pub fn new(store: Store) -> Self {
        Accounts { store }
    }

    fn balance_key(address: Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(21);
        key.push(BALANCE_PREFIX);
        key.extend_from_slice(&address);
        key
    }

    fn set_balance(&mut self, address: Address, amount: Amount) -> Result<()> {
        let key = Self::balance_key(address);
        if amount.is_zero() {
            self.store.delete(key.as_slice())
        } else {
            self.store.put_encoded(key, &amount)
        }
    }

    fn set_loose(&mut self, amount: Amount) -> Result<()> {
        self.store.put_encoded(LOOSE_TOKENS_KEY.to_vec(), &amount)
    }

    /// Credits genesis coins, which also enter the loose supply.
    pub fn mint(&mut self, address: Address, amount: Amount) -> Result<()> {
        self.add_coins(address, amount)?;
        self.increase_loosen_token(amount)
    }

    /// Moves coins between two accounts.
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        self.subtract_coins(from, amount)?;
        self.add_coins(to, amount)
    }
}

impl Bank for Accounts {
    fn get_coins(&self, address: Address) -> Result<Amount> {
        Ok(self
            .store
            .get_decoded(Self::balance_key(address).as_slice())?
            .unwrap_or_default())
    }

    fn add_coins(&mut self, address: Address, amount: Amount) -> Result<()> {
        let balance = (self.get_coins(address)? + amount)?;
        self.set_balance(address, balance)
    }

    fn subtract_coins(&mut self, address: Address, amount: Amount) -> Result<()> {
        let balance = self.get_coins(address)?;
        if balance < amount {
            return Err(Error::Coins("Insufficient funds".into()));
        }
        self.set_balance(address, (balance - amount)?)
    }

    fn get_loosen_coins(&self) -> Result<Amount> {
        Ok(self
            .store
            .get_decoded(LOOSE_TOKENS_KEY)?
            .unwrap_or_default())
    }

    fn increase_loosen_token(&mut self, amount: Amount) -> Result<()> {
        let loose = (self.get_loosen_coins()? + amount)?;
        debug!("Loose tokens increased by {} to {}", amount, loose);
        self.set_loose(loose)
    }

    fn decrease_loosen_token(&mut self, amount: Amount) -> Result<()> {
        let loose = (self.get_loosen_coins()? - amount)?;
        debug!("Loose tokens decreased by {} to {}", amount, loose);
        self.set_loose(loose)
    }
}

/// Store-backed fee collector.
#[derive(Clone)]
pub struct FeeCollection {
    store: Store,
}

impl FeeCollection {
    pub fn new(store: Store) -> Self {
        FeeCollection { store }
    }
}

impl FeeCollector for FeeCollection {
    fn get_collected_fees(&self) -> Result<Amount> {
        Ok(self
            .store
            .get_decoded(COLLECTED_FEES_KEY)?
            .unwrap_or_default())
    }

    fn add_collected_fees(&mut self, amount: Amount) -> Result<()> {
        let fees = (self.get_collected_fees()? + amount)?;
        self.store.put_encoded(COLLECTED_FEES_KEY.to_vec(), &fees)
    }

    fn clear_collected_fees(&mut self) -> Result<()> {
        self.store.delete(COLLECTED_FEES_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MapStore;

    #[test]
    fn balances() -> Result<()> {
        let mut accounts = Accounts::new(Store::new(MapStore::new()));
        let alice = [1; 20];
        let bob = [2; 20];

        accounts.mint(alice, 100.into())?;
        assert_eq!(accounts.get_coins(alice)?, 100);
        assert_eq!(accounts.get_loosen_coins()?, 100);

        accounts.transfer(alice, bob, 30.into())?;
        assert_eq!(accounts.get_coins(alice)?, 70);
        assert_eq!(accounts.get_coins(bob)?, 30);

        accounts
            .subtract_coins(bob, 31.into())
            .expect_err("Should not overdraw");
        accounts
            .decrease_loosen_token(101.into())
            .expect_err("Loose tokens should not go negative");

        let shared = accounts.clone();
        accounts.add_coins(bob, 1.into())?;
        assert_eq!(shared.get_coins(bob)?, 31);
        Ok(())
    }

    #[test]
    fn fees() -> Result<()> {
        let mut fees = FeeCollection::new(Store::new(MapStore::new()));
        fees.add_collected_fees(5.into())?;
        fees.add_collected_fees(7.into())?;
        assert_eq!(fees.get_collected_fees()?, 12);
        fees.clear_collected_fees()?;
        assert_eq!(fees.get_collected_fees()?, 0);
        Ok(())
    }
}
