//! Key layout of the staking store.

use crate::coins::{Address, ConsAddress};
use crate::context::Time;

pub const PARAMS_KEY: &[u8] = &[0x00];
pub const BONDED_POOL_KEY: &[u8] = &[0x01];

pub const LAST_POWER_PREFIX: u8 = 0x11;
pub const LAST_TOTAL_POWER_KEY: &[u8] = &[0x12];

pub const VALIDATOR_PREFIX: u8 = 0x21;
pub const VALIDATOR_BY_CONS_PREFIX: u8 = 0x22;
pub const POWER_INDEX_PREFIX: u8 = 0x23;
pub const INDEXED_POWER_PREFIX: u8 = 0x24;

pub const DELEGATION_PREFIX: u8 = 0x31;
pub const DELEGATION_BY_VAL_PREFIX: u8 = 0x37;
pub const UBD_PREFIX: u8 = 0x32;
pub const UBD_BY_VAL_PREFIX: u8 = 0x33;
pub const RED_PREFIX: u8 = 0x34;
pub const RED_BY_SRC_PREFIX: u8 = 0x35;
pub const RED_BY_DST_PREFIX: u8 = 0x36;

pub const UBD_QUEUE_PREFIX: u8 = 0x41;
pub const RED_QUEUE_PREFIX: u8 = 0x42;
pub const VALIDATOR_QUEUE_PREFIX: u8 = 0x43;

const ADDR_LEN: usize = 20;
const TIME_LEN: usize = 12;

fn key(prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|part| part.len()).sum::<usize>() + 1;
    let mut key = Vec::with_capacity(len);
    key.push(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// Splits a key suffix made of concatenated addresses.
pub fn split_addresses<const N: usize>(bytes: &[u8]) -> Option<[Address; N]> {
    if bytes.len() != N * ADDR_LEN {
        return None;
    }
    let mut addresses = [[0u8; ADDR_LEN]; N];
    for (i, address) in addresses.iter_mut().enumerate() {
        address.copy_from_slice(&bytes[i * ADDR_LEN..(i + 1) * ADDR_LEN]);
    }
    Some(addresses)
}

pub fn last_power_key(operator: &Address) -> Vec<u8> {
    key(LAST_POWER_PREFIX, &[operator])
}

pub fn validator_key(operator: &Address) -> Vec<u8> {
    key(VALIDATOR_PREFIX, &[operator])
}

pub fn validator_by_cons_key(cons: &ConsAddress) -> Vec<u8> {
    key(VALIDATOR_BY_CONS_PREFIX, &[cons])
}

/// Power index entries sort by descending power, then ascending operator.
pub fn power_index_key(power: u64, operator: &Address) -> Vec<u8> {
    let inverted = (u64::MAX - power).to_be_bytes();
    key(POWER_INDEX_PREFIX, &[&inverted, operator])
}

/// Decodes the power and operator of a power index key (without its prefix
/// byte).
pub fn parse_power_index_key(suffix: &[u8]) -> Option<(u64, Address)> {
    if suffix.len() != 8 + ADDR_LEN {
        return None;
    }
    let mut inverted = [0u8; 8];
    inverted.copy_from_slice(&suffix[..8]);
    let [operator] = split_addresses::<1>(&suffix[8..])?;
    Some((u64::MAX - u64::from_be_bytes(inverted), operator))
}

pub fn indexed_power_key(operator: &Address) -> Vec<u8> {
    key(INDEXED_POWER_PREFIX, &[operator])
}

pub fn delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    key(DELEGATION_PREFIX, &[delegator, validator])
}

pub fn delegations_key(delegator: &Address) -> Vec<u8> {
    key(DELEGATION_PREFIX, &[delegator])
}

pub fn delegation_by_val_key(validator: &Address, delegator: &Address) -> Vec<u8> {
    key(DELEGATION_BY_VAL_PREFIX, &[validator, delegator])
}

pub fn delegations_by_val_key(validator: &Address) -> Vec<u8> {
    key(DELEGATION_BY_VAL_PREFIX, &[validator])
}

pub fn ubd_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    key(UBD_PREFIX, &[delegator, validator])
}

pub fn ubds_key(delegator: &Address) -> Vec<u8> {
    key(UBD_PREFIX, &[delegator])
}

pub fn ubd_by_val_key(validator: &Address, delegator: &Address) -> Vec<u8> {
    key(UBD_BY_VAL_PREFIX, &[validator, delegator])
}

pub fn ubds_by_val_key(validator: &Address) -> Vec<u8> {
    key(UBD_BY_VAL_PREFIX, &[validator])
}

pub fn red_key(delegator: &Address, src: &Address, dst: &Address) -> Vec<u8> {
    key(RED_PREFIX, &[delegator, src, dst])
}

pub fn reds_key(delegator: &Address) -> Vec<u8> {
    key(RED_PREFIX, &[delegator])
}

pub fn red_by_src_key(src: &Address, delegator: &Address, dst: &Address) -> Vec<u8> {
    key(RED_BY_SRC_PREFIX, &[src, delegator, dst])
}

pub fn reds_by_src_key(src: &Address) -> Vec<u8> {
    key(RED_BY_SRC_PREFIX, &[src])
}

pub fn red_by_dst_key(dst: &Address, delegator: &Address, src: &Address) -> Vec<u8> {
    key(RED_BY_DST_PREFIX, &[dst, delegator, src])
}

pub fn reds_by_dst_delegator_key(dst: &Address, delegator: &Address) -> Vec<u8> {
    key(RED_BY_DST_PREFIX, &[dst, delegator])
}

pub fn ubd_queue_key(time: Time, delegator: &Address, validator: &Address) -> Vec<u8> {
    key(UBD_QUEUE_PREFIX, &[&time.key_bytes(), delegator, validator])
}

pub fn red_queue_key(time: Time, delegator: &Address, src: &Address, dst: &Address) -> Vec<u8> {
    key(RED_QUEUE_PREFIX, &[&time.key_bytes(), delegator, src, dst])
}

pub fn validator_queue_key(time: Time, operator: &Address) -> Vec<u8> {
    key(VALIDATOR_QUEUE_PREFIX, &[&time.key_bytes(), operator])
}

/// Exclusive upper bound of queue entries whose time is at or before `time`.
pub fn queue_end_key(prefix: u8, time: Time) -> Vec<u8> {
    let mut end = key(prefix, &[&time.key_bytes()]);
    end.extend_from_slice(&[0xff; 3 * ADDR_LEN + 1]);
    end
}

/// Strips the prefix byte and time bucket from a queue key.
pub fn queue_entry_addresses(key: &[u8]) -> &[u8] {
    key.get(1 + TIME_LEN..).unwrap_or_default()
}
