//! A proof-of-stake state machine core: a staking ledger of validators and
//! delegations, lazy fee distribution to validators and delegators, and
//! slashing of validator faults, wired together by [`app::App`].

pub mod app;
pub mod coins;
pub mod context;
pub mod distribution;
pub mod encoding;
mod error;
pub mod slashing;
pub mod staking;
pub mod store;

pub use error::*;
