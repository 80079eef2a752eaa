//! The application: wires the keepers together over one store and runs
//! them through the consensus callbacks.
//!
//! Writes made during a block accumulate in a block buffer over the
//! committed store and reach it on [`App::commit`]. Each transaction runs in
//! its own buffer over the block buffer, flushed if the transaction
//! succeeds and dropped if it fails.

use serde::{Deserialize, Serialize};

use crate::coins::{Accounts, ConsAddress, Decimal, FeeCollection};
use crate::context::Context;
use crate::distribution::{self, Distribution};
use crate::slashing::{self, Slashing};
use crate::staking::{share_hooks, Staking, ValidatorUpdate};
use crate::store::{BufStore, MapStore, Shared, Store};
use crate::Result;
use log::{debug, info, warn};

mod genesis;
mod msg;
mod query;

pub use genesis::*;
pub use msg::*;
pub use query::*;

const ACCOUNTS_PREFIX: u8 = 0;
const FEES_PREFIX: u8 = 1;
const STAKING_PREFIX: u8 = 2;
const DISTRIBUTION_PREFIX: u8 = 3;
const SLASHING_PREFIX: u8 = 4;

/// A validator's vote on the previous block.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteInfo {
    pub cons: ConsAddress,
    pub power: u64,
    pub signed: bool,
}

/// Evidence that a validator signed two blocks at the same height.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evidence {
    pub cons: ConsAddress,
    pub height: i64,
    pub power: u64,
}

/// A report that a proposer censored transactions at `height`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Censorship {
    pub cons: ConsAddress,
    pub height: i64,
}

/// Consensus information delivered at the start of a block.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BeginBlock {
    pub proposer: ConsAddress,
    pub votes: Vec<VoteInfo>,
    pub evidence: Vec<Evidence>,
    pub censorships: Vec<Censorship>,
}

impl BeginBlock {
    /// Fraction of the voting power which signed the previous block.
    pub fn percent_votes(&self) -> Result<Decimal> {
        let (mut total, mut signed) = (0u64, 0u64);
        for vote in self.votes.iter() {
            total = total.checked_add(vote.power).ok_or(crate::Error::Overflow)?;
            if vote.signed {
                signed = signed.checked_add(vote.power).ok_or(crate::Error::Overflow)?;
            }
        }
        if total == 0 {
            return Ok(Decimal::zero());
        }
        Decimal::from(signed) / Decimal::from(total)
    }
}

/// Every keeper, over one store. Staking fires the distribution hooks,
/// then the slashing hooks.
pub struct Modules {
    pub accounts: Accounts,
    pub fees: FeeCollection,
    pub staking: Staking<Accounts>,
    pub distribution: Distribution<Accounts, FeeCollection>,
    pub slashing: Slashing<Accounts>,
}

impl Modules {
    pub fn new(store: Store) -> Self {
        let accounts = Accounts::new(store.sub(&[ACCOUNTS_PREFIX]));
        let fees = FeeCollection::new(store.sub(&[FEES_PREFIX]));
        let staking = Staking::new(store.sub(&[STAKING_PREFIX]), accounts.clone());
        let distribution = Distribution::new(
            store.sub(&[DISTRIBUTION_PREFIX]),
            &staking,
            accounts.clone(),
            fees.clone(),
        );

        let hooks = share_hooks((
            distribution::Hooks::new(distribution.clone()),
            slashing::Hooks::new(Slashing::new(
                store.sub(&[SLASHING_PREFIX]),
                staking.clone(),
            )),
        ));
        let staking = staking.with_hooks(hooks);
        let slashing = Slashing::new(store.sub(&[SLASHING_PREFIX]), staking.clone());

        Modules {
            accounts,
            fees,
            staking,
            distribution,
            slashing,
        }
    }

    fn begin_block(&mut self, ctx: &Context, req: &BeginBlock) -> Result<()> {
        if let Some(previous) = self.distribution.previous_proposer()? {
            self.distribution
                .allocate_tokens(req.percent_votes()?, &previous)?;
        }
        self.distribution.set_previous_proposer(req.proposer)?;

        for vote in req.votes.iter() {
            self.slashing
                .handle_validator_signature(ctx, &vote.cons, vote.power, vote.signed)?;
        }
        for evidence in req.evidence.iter() {
            self.slashing
                .handle_double_sign(ctx, &evidence.cons, evidence.height, evidence.power)?;
        }
        for censorship in req.censorships.iter() {
            self.slashing
                .handle_proposer_censorship(ctx, &censorship.cons, censorship.height)?;
        }
        Ok(())
    }
}

type BlockStore = BufStore<Shared<MapStore>>;

/// The state machine driven by consensus.
pub struct App {
    store: Shared<MapStore>,
    block: Shared<BlockStore>,
    ctx: Context,
}

impl Default for App {
    fn default() -> Self {
        Self::new(MapStore::new())
    }
}

impl App {
    pub fn new(store: MapStore) -> Self {
        let store = Shared::new(store);
        let block = Shared::new(BufStore::wrap(store.clone()));
        App {
            store,
            block,
            ctx: Context::default(),
        }
    }

    /// The context of the current (or last) block.
    pub fn context(&self) -> Context {
        self.ctx
    }

    /// Runs `op` against a buffer over the block buffer, keeping its writes
    /// only if it succeeds.
    fn step_atomic<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Modules, &Context) -> Result<T>,
    {
        let buffer = Shared::new(BufStore::wrap(self.block.clone()));
        let mut modules = Modules::new(Store::from_shared(buffer.clone()));
        let res = op(&mut modules, &self.ctx)?;
        drop(modules);

        let pending = buffer.borrow().pending();
        buffer.borrow_mut().flush()?;
        debug!("Flushed {} writes into the block buffer", pending);
        Ok(res)
    }

    /// Writes the genesis state and commits it. Returns the initial
    /// validator set.
    pub fn init_chain(&mut self, genesis: Genesis) -> Result<Vec<ValidatorUpdate>> {
        self.ctx = Context::new(0, genesis.genesis_time);
        let updates = self.step_atomic(|modules, _| modules.init_genesis(genesis))?;
        self.commit()?;
        Ok(updates)
    }

    /// Starts a block: fees collected in the previous block are allocated
    /// to the previous proposer and the fee pool, then votes, double-sign
    /// evidence and censorship reports are processed.
    pub fn begin_block(&mut self, ctx: Context, req: BeginBlock) -> Result<()> {
        self.ctx = Context { tx_hash: [0; 32], ..ctx };
        self.step_atomic(|modules, ctx| modules.begin_block(ctx, &req))
    }

    /// Runs a transaction. A failing transaction leaves no trace in the
    /// state, and its error is reported in the result.
    pub fn deliver_tx<T: Into<Tx>>(&mut self, tx: T) -> TxResult {
        let tx = tx.into();
        let tx_hash = match tx.hash() {
            Ok(hash) => hash,
            Err(err) => {
                return TxResult {
                    code: err.code(),
                    log: err.to_string(),
                }
            }
        };

        let block_ctx = self.ctx;
        self.ctx = block_ctx.with_tx_hash(tx_hash);
        let res = self.step_atomic(|modules, ctx| {
            if let Some(fee) = tx.fee.as_ref() {
                modules.collect_fee(fee)?;
            }
            modules.handle(ctx, tx.msg)
        });
        self.ctx = block_ctx;

        match res {
            Ok(log) => TxResult { code: 0, log },
            Err(err) => {
                warn!("Transaction {} failed: {}", hex::encode(tx_hash), err);
                TxResult {
                    code: err.code(),
                    log: err.to_string(),
                }
            }
        }
    }

    /// Ends the block, returning the changes to the consensus validator
    /// set.
    pub fn end_block(&mut self) -> Result<Vec<ValidatorUpdate>> {
        self.step_atomic(|modules, ctx| modules.staking.end_block(ctx))
    }

    /// Writes the block's changes into the committed store.
    pub fn commit(&mut self) -> Result<()> {
        let pending = self.block.borrow().pending();
        self.block.borrow_mut().flush()?;
        info!("Committed block {} ({} writes)", self.ctx.height, pending);
        Ok(())
    }

    /// Answers a read-only query against the committed state. `data` holds
    /// the JSON-encoded [`QueryArgs`], and may be empty.
    pub fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let args: QueryArgs = if data.is_empty() {
            QueryArgs::default()
        } else {
            serde_json::from_slice(data)?
        };
        let modules = Modules::new(Store::from_shared(self.store.clone()));
        let value = modules.query(&self.ctx, path, args)?;
        Ok(serde_json::to_vec(&value)?)
    }

    /// Runs `f` with keepers over the block's uncommitted state. Writes
    /// made by `f` are kept.
    pub fn with_modules<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Modules, &Context) -> Result<T>,
    {
        self.step_atomic(f)
    }
}
