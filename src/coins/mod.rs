//! Token amounts, decimals and the bank interface.

use sha2::{Digest, Sha256};

pub mod accounts;
pub use accounts::*;

pub mod amount;
pub use amount::*;

pub mod bank;
pub use bank::*;

pub mod decimal;
pub use decimal::*;

/// An account or validator operator address.
pub type Address = [u8; 20];

/// A validator's consensus address, derived from its consensus public key.
pub type ConsAddress = [u8; 20];

/// A validator's consensus public key.
pub type PubKey = [u8; 32];

/// The first 20 bytes of the SHA-256 hash of a consensus public key.
pub fn cons_address(pubkey: &PubKey) -> ConsAddress {
    let mut hasher = Sha256::new();
    hasher.update(pubkey);
    let hash = hasher.finalize();

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[..20]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cons_address_is_hash_prefix() {
        let a = cons_address(&[1; 32]);
        let b = cons_address(&[2; 32]);
        assert_ne!(a, b);
        assert_eq!(a, cons_address(&[1; 32]));
    }
}
