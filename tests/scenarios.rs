use std::io::Write as _;

use posledger::app::{
    App, BeginBlock, Evidence, Genesis, GenesisAccount, GenesisValidator, Msg, QueryArgs, Tx,
    VoteInfo,
};
use posledger::coins::{cons_address, Address, Amount, ConsAddress, Decimal, PubKey};
use posledger::context::Context;
use posledger::slashing::ValidatorSigningInfo;
use posledger::staking::{Commission, Description, Validator, ValidatorUpdate};
use posledger::{distribution, slashing, staking, Error, Result};
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serial_test::serial;

fn addr(n: u8) -> Address {
    [n; 20]
}

fn pubkey(n: u8) -> PubKey {
    [n; 32]
}

fn cons(n: u8) -> ConsAddress {
    cons_address(&pubkey(n))
}

fn validator(n: u8, self_bond: u64, rate: Decimal) -> GenesisValidator {
    GenesisValidator {
        operator: addr(n),
        pubkey: pubkey(n),
        self_bond: self_bond.into(),
        description: Description::new(format!("validator {}", n)),
        commission: Commission::new(rate, Decimal::one(), Decimal::one()),
    }
}

fn genesis(coins: u64, validators: Vec<GenesisValidator>) -> Genesis {
    Genesis {
        staking: staking::Params {
            unbonding_time: 60,
            ..Default::default()
        },
        distribution: distribution::Params {
            community_tax: Decimal::zero(),
            ..Default::default()
        },
        slashing: slashing::Params {
            signed_blocks_window: 10,
            downtime_jail_duration: 60,
            ..Default::default()
        },
        accounts: (1..=4)
            .map(|n| GenesisAccount {
                address: addr(n),
                coins: coins.into(),
            })
            .collect(),
        validators,
        ..Default::default()
    }
}

fn new_app() -> App {
    let _ = pretty_env_logger::try_init();
    App::default()
}

fn vote(n: u8, power: u64, signed: bool) -> VoteInfo {
    VoteInfo {
        cons: cons(n),
        power,
        signed,
    }
}

/// Runs a block at `height` (with block time equal to the height) which
/// delivers `txs` and asserts that each succeeds.
fn block(app: &mut App, height: i64, req: BeginBlock, txs: Vec<Tx>) -> Result<Vec<ValidatorUpdate>> {
    app.begin_block(Context::new(height, height), req)?;
    for tx in txs {
        let res = app.deliver_tx(tx);
        assert!(res.is_ok(), "transaction failed: {}", res.log);
    }
    let updates = app.end_block()?;
    app.commit()?;
    Ok(updates)
}

fn query<T: DeserializeOwned>(app: &App, path: &str, args: QueryArgs) -> Result<T> {
    let data = serde_json::to_vec(&args)?;
    Ok(serde_json::from_slice(&app.query(path, &data)?)?)
}

fn balance(app: &App, n: u8) -> Result<Amount> {
    query(
        app,
        "accounts/balance",
        QueryArgs {
            address: Some(addr(n)),
            ..Default::default()
        },
    )
}

fn validator_state(app: &App, n: u8) -> Result<Validator> {
    query(
        app,
        "staking/validator",
        QueryArgs {
            operator: Some(addr(n)),
            ..Default::default()
        },
    )
}

/// A validator self-bonded with 10 and a delegator bonded with 10, with
/// 100 in fees paid in the first block and allocated in the second.
fn rewards_scenario(rate: Decimal) -> Result<App> {
    let mut app = new_app();
    app.init_chain(genesis(100, vec![validator(1, 10, rate)]))?;

    let delegate = Tx::with_fee(
        Msg::Delegate {
            delegator: addr(2),
            validator: addr(1),
            amount: 10.into(),
        },
        addr(3),
        100.into(),
    );
    let proposed = |power| BeginBlock {
        proposer: cons(1),
        votes: vec![vote(1, power, true)],
        ..Default::default()
    };
    let updates = block(&mut app, 1, proposed(10), vec![delegate])?;
    assert_eq!(
        updates,
        vec![ValidatorUpdate {
            pubkey: pubkey(1),
            power: 20
        }]
    );
    block(&mut app, 2, proposed(20), vec![])?;
    Ok(app)
}

#[test]
#[serial]
fn delegator_rewards() -> Result<()> {
    let mut app = rewards_scenario(Decimal::zero())?;

    let reward: Decimal = query(
        &app,
        "distribution/delegation_reward",
        QueryArgs {
            delegator: Some(addr(2)),
            validator: Some(addr(1)),
            ..Default::default()
        },
    )?;
    assert_eq!(reward, 50u64.into());

    let withdraw = Msg::WithdrawDelegationReward {
        delegator: addr(2),
        validator: addr(1),
    };
    block(&mut app, 3, BeginBlock::default(), vec![withdraw.into()])?;
    assert_eq!(balance(&app, 2)?, 90 + 50);
    Ok(())
}

#[test]
#[serial]
fn delegator_rewards_with_commission() -> Result<()> {
    let mut app = rewards_scenario(dec!(0.1).into())?;

    let withdraw = Msg::WithdrawDelegationReward {
        delegator: addr(2),
        validator: addr(1),
    };
    block(&mut app, 3, BeginBlock::default(), vec![withdraw.into()])?;
    assert_eq!(balance(&app, 2)?, 90 + 45);

    let commission: Amount = query(
        &app,
        "distribution/validator_rewards",
        QueryArgs {
            operator: Some(addr(1)),
            ..Default::default()
        },
    )?;
    assert_eq!(commission, 10 + 45);
    Ok(())
}

#[test]
#[serial]
fn downtime_jail_and_unjail() -> Result<()> {
    let mut app = new_app();
    app.init_chain(genesis(1_000, vec![validator(1, 100, Decimal::zero()), validator(2, 100, Decimal::zero())]))?;

    let absent = BeginBlock {
        proposer: cons(2),
        votes: vec![vote(1, 100, false), vote(2, 100, true)],
        ..Default::default()
    };
    for height in 1..=10 {
        assert!(block(&mut app, height, absent.clone(), vec![])?.is_empty());
    }
    let updates = block(&mut app, 11, absent, vec![])?;
    assert_eq!(
        updates,
        vec![ValidatorUpdate {
            pubkey: pubkey(1),
            power: 0
        }]
    );

    let jailed = validator_state(&app, 1)?;
    assert!(jailed.jailed);
    assert_eq!(jailed.tokens, 99u64.into());

    let only_two = BeginBlock {
        proposer: cons(2),
        votes: vec![vote(2, 100, true)],
        ..Default::default()
    };
    app.begin_block(Context::new(12, 12), only_two.clone())?;
    let res = app.deliver_tx(Msg::Unjail { operator: addr(1) });
    assert_eq!(res.code, Error::StillJailed(String::new()).code());
    app.end_block()?;
    app.commit()?;

    let updates = block(
        &mut app,
        71,
        only_two,
        vec![Msg::Unjail { operator: addr(1) }.into()],
    )?;
    assert_eq!(
        updates,
        vec![ValidatorUpdate {
            pubkey: pubkey(1),
            power: 99
        }]
    );

    let info: ValidatorSigningInfo = query(
        &app,
        "slashing/signing_info",
        QueryArgs {
            cons: Some(cons(1)),
            ..Default::default()
        },
    )?;
    assert_eq!(info.missed_blocks_counter, 0);
    assert_eq!(info.index_offset, 0);
    Ok(())
}

#[test]
#[serial]
fn slashing_source_reaches_redelegation() -> Result<()> {
    let mut app = new_app();
    app.init_chain(genesis(1_000, vec![validator(1, 100, Decimal::zero()), validator(2, 100, Decimal::zero())]))?;

    let delegate = Msg::Delegate {
        delegator: addr(3),
        validator: addr(1),
        amount: 100.into(),
    };
    block(&mut app, 1, BeginBlock::default(), vec![delegate.into()])?;

    let redelegate = Msg::BeginRedelegation {
        delegator: addr(3),
        src: addr(1),
        dst: addr(2),
        shares: 100u64.into(),
    };
    block(&mut app, 2, BeginBlock::default(), vec![redelegate.into()])?;
    assert_eq!(validator_state(&app, 2)?.tokens, 200u64.into());

    let evidence = BeginBlock {
        evidence: vec![Evidence {
            cons: cons(1),
            height: 2,
            power: 200,
        }],
        ..Default::default()
    };
    block(&mut app, 3, evidence, vec![])?;

    let src = validator_state(&app, 1)?;
    assert!(src.jailed);
    assert_eq!(src.tokens, 95u64.into());
    assert_eq!(validator_state(&app, 2)?.tokens, 195u64.into());
    Ok(())
}

#[test]
#[serial]
fn genesis_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    let json = serde_json::to_string(&genesis(50, vec![validator(4, 20, Decimal::zero())]))?;
    file.write_all(json.as_bytes())?;

    let genesis = Genesis::load(file.path())?;
    assert_eq!(genesis.staking.unbonding_time, 60);

    let mut app = new_app();
    let updates = app.init_chain(genesis)?;
    assert_eq!(updates.len(), 1);

    let validators: Vec<Validator> = query(&app, "staking/validators", QueryArgs::default())?;
    assert_eq!(validators.len(), 1);
    assert_eq!(validators[0].operator, addr(4));
    assert_eq!(balance(&app, 4)?, 30);
    Ok(())
}
