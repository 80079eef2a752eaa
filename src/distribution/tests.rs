use super::*;
use crate::coins::{Accounts, FeeCollection, PubKey};
use crate::staking::{self, share_hooks, Commission, Description};
use crate::store::MapStore;
use rust_decimal_macros::dec;

fn addr(n: u8) -> Address {
    [n; 20]
}

fn pubkey(n: u8) -> PubKey {
    [n; 32]
}

fn cons(n: u8) -> ConsAddress {
    crate::coins::cons_address(&pubkey(n))
}

struct Fixture {
    staking: Staking<Accounts>,
    distribution: Distribution<Accounts, FeeCollection>,
    fees: FeeCollection,
}

impl Fixture {
    fn new() -> Result<Self> {
        Self::with_coins(1_000)
    }

    fn with_coins(coins: u64) -> Result<Self> {
        let store = Store::new(MapStore::new());
        let mut accounts = Accounts::new(store.sub(&[0]));
        for n in 0..10 {
            accounts.mint(addr(n), coins.into())?;
        }
        let fees = FeeCollection::new(store.sub(&[1]));

        let mut staking = Staking::new(store.sub(&[2]), accounts.clone());
        staking.set_params(staking::Params {
            unbonding_time: 60,
            max_validators: 100,
            power_reduction: 1,
        })?;

        let mut distribution =
            Distribution::new(store.sub(&[3]), &staking, accounts, fees.clone());
        distribution.set_params(Params {
            community_tax: Decimal::zero(),
            ..Default::default()
        })?;

        let hooks = share_hooks(Hooks::new(distribution.clone()));
        Ok(Fixture {
            staking: staking.with_hooks(hooks),
            distribution,
            fees,
        })
    }

    fn create(&mut self, ctx: &Context, n: u8, bond: u64, rate: Decimal) -> Result<()> {
        self.staking.create_validator(
            ctx,
            addr(n),
            pubkey(n),
            bond.into(),
            Description::new(format!("validator {}", n)),
            Commission::new(rate, Decimal::one(), Decimal::one()),
        )?;
        Ok(())
    }

    fn delegate(&mut self, ctx: &Context, delegator: u8, validator: u8, amount: u64) -> Result<()> {
        self.staking
            .delegate(ctx, addr(delegator), amount.into(), addr(validator), true)?;
        Ok(())
    }

    fn collect_and_allocate(&mut self, fees: u64, proposer: u8) -> Result<()> {
        self.fees.add_collected_fees(fees.into())?;
        self.distribution
            .allocate_tokens(Decimal::one(), &cons(proposer))
    }

    fn balance(&self, n: u8) -> Result<u64> {
        Ok(self.staking.bank().get_coins(addr(n))?.into())
    }
}

/// One validator self-bonded with 10 and one delegator with 10, with 100
/// in fees allocated at height 0.
fn single_validator(rate: Decimal) -> Result<Fixture> {
    let mut fixture = Fixture::new()?;
    let ctx = Context::new(0, 0);
    fixture.create(&ctx, 1, 10, rate)?;
    fixture.staking.apply_and_return_validator_set_updates(&ctx)?;
    fixture.delegate(&ctx, 2, 1, 10)?;
    assert_eq!(fixture.balance(2)?, 990);

    fixture.collect_and_allocate(100, 1)?;
    Ok(fixture)
}

#[test]
fn withdraw_delegation_reward() -> Result<()> {
    let mut fixture = single_validator(Decimal::zero())?;

    let ctx = Context::new(1, 0);
    let withdrawn = fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(2), addr(1))?;
    assert_eq!(withdrawn, 50u64.into());
    assert_eq!(fixture.balance(2)?, 990 + 50);
    assert!(fixture.fees.get_collected_fees()?.is_zero());
    Ok(())
}

#[test]
fn withdraw_delegation_reward_with_commission() -> Result<()> {
    let mut fixture = single_validator(dec!(0.1).into())?;

    let ctx = Context::new(1, 0);
    assert_eq!(
        fixture
            .distribution
            .current_delegation_reward(&ctx, &addr(2), &addr(1))?,
        45u64.into()
    );

    fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(2), addr(1))?;
    assert_eq!(fixture.balance(2)?, 990 + 45);
    assert!(fixture
        .distribution
        .current_delegation_reward(&ctx, &addr(2), &addr(1))?
        .is_zero());
    Ok(())
}

#[test]
fn withdraw_two_delegators() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let ctx = Context::new(0, 0);
    fixture.create(&ctx, 1, 10, dec!(0.1).into())?;
    fixture.staking.apply_and_return_validator_set_updates(&ctx)?;
    fixture.delegate(&ctx, 2, 1, 10)?;
    fixture.delegate(&ctx, 3, 1, 20)?;
    fixture.collect_and_allocate(100, 1)?;

    let ctx = Context::new(1, 0);
    fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(2), addr(1))?;
    // 90 × 10/40 = 22.5, the half token is left to the community pool
    assert_eq!(fixture.balance(2)?, 990 + 22);
    assert_eq!(
        fixture.distribution.fee_pool()?.community_pool,
        dec!(0.5).into()
    );
    Ok(())
}

#[test]
fn withdraw_two_delegators_uneven() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let ctx = Context::new(0, 0);
    fixture.create(&ctx, 1, 10, Decimal::zero())?;
    fixture.staking.apply_and_return_validator_set_updates(&ctx)?;
    fixture.delegate(&ctx, 2, 1, 10)?;
    fixture.delegate(&ctx, 3, 1, 10)?;
    fixture.collect_and_allocate(90, 1)?;

    // the first delegator withdraws early, the second keeps accumulating
    let ctx = Context::new(1, 0);
    fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(2), addr(1))?;
    assert_eq!(fixture.balance(2)?, 990 + 30);

    fixture.collect_and_allocate(180, 1)?;

    let ctx = Context::new(2, 0);
    fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(3), addr(1))?;
    assert_eq!(fixture.balance(3)?, 990 + 96);

    fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(2), addr(1))?;
    assert_eq!(fixture.balance(2)?, 990 + 30 + 48);
    Ok(())
}

#[test]
fn withdraw_delegation_rewards_all() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let ctx = Context::new(0, 0);
    fixture.create(&ctx, 1, 10, dec!(0.1).into())?;
    fixture.create(&ctx, 2, 50, dec!(0.2).into())?;
    fixture.create(&ctx, 3, 40, dec!(0.3).into())?;
    fixture.delegate(&ctx, 4, 1, 10)?;
    fixture.delegate(&ctx, 4, 2, 20)?;
    fixture.delegate(&ctx, 4, 3, 30)?;
    fixture.staking.apply_and_return_validator_set_updates(&ctx)?;
    assert_eq!(fixture.staking.last_total_power()?, 160);

    fixture.collect_and_allocate(1_000, 1)?;

    // 950 × (10/160 × 0.9 + 20/160 × 0.8 + 30/160 × 0.7) + 50 × 10/20 × 0.9
    let ctx = Context::new(1, 0);
    let withdrawn = fixture
        .distribution
        .withdraw_delegation_rewards_all(&ctx, addr(4))?;
    assert_eq!(withdrawn, dec!(295.625).into());
    assert_eq!(fixture.balance(4)?, 940 + 295);
    Ok(())
}

#[test]
fn withdraw_validator_rewards_all() -> Result<()> {
    let mut fixture = single_validator(dec!(0.1).into())?;

    let ctx = Context::new(1, 0);
    assert_eq!(
        fixture
            .distribution
            .current_validator_rewards_all(&ctx, &addr(1))?,
        55
    );

    let withdrawn = fixture
        .distribution
        .withdraw_validator_rewards_all(&ctx, addr(1))?;
    assert_eq!(withdrawn, 55u64.into());
    assert_eq!(fixture.balance(1)?, 990 + 55);
    assert!(fixture.distribution.validator_info(&addr(1))?.val_commission.is_zero());

    fixture
        .distribution
        .withdraw_validator_rewards_all(&ctx, addr(2))
        .expect_err("Non-validators have no rewards to withdraw");
    Ok(())
}

#[test]
fn withdraw_address() -> Result<()> {
    let mut fixture = single_validator(Decimal::zero())?;
    assert_eq!(fixture.distribution.withdraw_address(&addr(2))?, addr(2));

    fixture
        .distribution
        .set_withdraw_address(addr(2), addr(7))?;
    assert_eq!(fixture.distribution.withdraw_address(&addr(2))?, addr(7));

    let ctx = Context::new(1, 0);
    fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(2), addr(1))?;
    assert_eq!(fixture.balance(2)?, 990);
    assert_eq!(fixture.balance(7)?, 1_000 + 50);

    fixture
        .distribution
        .set_withdraw_address(addr(2), addr(2))?;
    assert_eq!(fixture.distribution.withdraw_address(&addr(2))?, addr(2));
    Ok(())
}

#[test]
fn withdraw_without_delegation() -> Result<()> {
    let mut fixture = single_validator(Decimal::zero())?;
    let ctx = Context::new(1, 0);
    let err = fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(5), addr(1))
        .expect_err("Should not withdraw without a delegation");
    assert!(matches!(err, Error::NotFound(_)));
    Ok(())
}

#[test]
fn allocate_without_power() -> Result<()> {
    let mut fixture = Fixture::new()?;
    let ctx = Context::new(0, 0);
    fixture.create(&ctx, 1, 10, Decimal::zero())?;

    fixture.collect_and_allocate(100, 1)?;
    let fee_pool = fixture.distribution.fee_pool()?;
    assert_eq!(fee_pool.community_pool, 100u64.into());
    assert!(fee_pool.val_pool.is_zero());
    assert!(fixture.fees.get_collected_fees()?.is_zero());
    Ok(())
}

#[test]
fn allocate_with_community_tax() -> Result<()> {
    let mut fixture = Fixture::new()?;
    fixture.distribution.set_params(Params::default())?;
    let ctx = Context::new(0, 0);
    fixture.create(&ctx, 1, 10, dec!(0.1).into())?;
    fixture.staking.apply_and_return_validator_set_updates(&ctx)?;

    // half of the power signed
    fixture.fees.add_collected_fees(100.into())?;
    fixture
        .distribution
        .allocate_tokens(dec!(0.5).into(), &cons(1))?;

    let fee_pool = fixture.distribution.fee_pool()?;
    assert_eq!(fee_pool.community_pool, 2u64.into());
    assert_eq!(fee_pool.val_pool, 95u64.into());
    let info = fixture.distribution.validator_info(&addr(1))?;
    assert_eq!(info.val_commission, dec!(0.3).into());
    assert_eq!(info.del_pool, dec!(2.7).into());
    Ok(())
}

#[test]
fn removed_validator_pays_commission() -> Result<()> {
    let mut fixture = single_validator(dec!(0.1).into())?;

    let ctx = Context::new(1, 0);
    fixture
        .staking
        .begin_unbonding(&ctx, addr(2), addr(1), 10u64.into())?;
    assert_eq!(fixture.balance(2)?, 990 + 45);
    fixture
        .staking
        .begin_unbonding(&ctx, addr(1), addr(1), 10u64.into())?;
    assert_eq!(fixture.balance(1)?, 990 + 45);
    fixture.staking.end_block(&ctx)?;

    let ctx = Context::new(2, 60);
    fixture.staking.end_block(&ctx)?;
    assert!(fixture.staking.get_validator(&addr(1))?.is_none());
    assert!(fixture.distribution.get_validator_info(&addr(1))?.is_none());
    assert!(fixture
        .distribution
        .get_delegation_info(&addr(2), &addr(1))?
        .is_none());

    // commission and the matured unbondings are paid out
    assert_eq!(fixture.balance(1)?, 990 + 45 + 10 + 10);
    assert_eq!(fixture.balance(2)?, 990 + 45 + 10);
    Ok(())
}

#[test]
fn rewards_at_mainnet_scale() -> Result<()> {
    const COINS: u64 = 1_000_000_000_000_000;
    const FEES: u64 = 10_000_000_000;
    const BLOCKS: i64 = 200;

    let mut fixture = Fixture::with_coins(COINS)?;
    let ctx = Context::new(0, 0);
    fixture.create(&ctx, 1, 600_000_000_000_000, dec!(0.1).into())?;
    fixture.create(&ctx, 2, 400_000_000_000_000, dec!(0.05).into())?;
    fixture.delegate(&ctx, 3, 1, 400_000_000_000_000)?;
    fixture.staking.end_block(&ctx)?;
    assert_eq!(fixture.staking.last_total_power()?, 1_400_000_000_000_000);

    let mut bonded = vec![
        (1, 600_000_000_000_000u64),
        (2, 400_000_000_000_000),
        (3, 400_000_000_000_000),
    ];
    for height in 1..=BLOCKS {
        let ctx = Context::new(height, 0);
        fixture.collect_and_allocate(FEES, 1)?;
        if height == BLOCKS / 2 {
            // settles validator 2 against accumulation from the first half
            fixture.delegate(&ctx, 4, 2, 100_000_000_000_000)?;
            bonded.push((4, 100_000_000_000_000));
        }
        fixture.staking.end_block(&ctx)?;
    }

    let ctx = Context::new(BLOCKS + 1, 0);
    let expected = fixture
        .distribution
        .current_delegation_reward(&ctx, &addr(3), &addr(1))?;
    let withdrawn = fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(3), addr(1))?;
    assert_eq!(withdrawn, expected);
    assert!(withdrawn.is_positive());
    fixture
        .distribution
        .withdraw_delegation_reward(&ctx, addr(4), addr(2))?;
    fixture
        .distribution
        .withdraw_validator_rewards_all(&ctx, addr(1))?;
    fixture
        .distribution
        .withdraw_validator_rewards_all(&ctx, addr(2))?;

    let mut paid = Decimal::zero();
    for (n, bond) in bonded {
        let gained = (Decimal::from(fixture.balance(n)? + bond) - COINS)?;
        paid = (paid + gained)?;
    }
    let fee_pool = fixture.distribution.fee_pool()?;
    let mut remaining = (fee_pool.val_pool + fee_pool.community_pool)?;
    for n in [1, 2] {
        let info = fixture.distribution.validator_info(&addr(n))?;
        remaining = ((remaining + info.del_pool)? + info.val_commission)?;
    }

    let allocated = Decimal::from(FEES * BLOCKS as u64);
    let drift = ((paid + remaining)? - allocated)?.abs();
    assert!(drift < Decimal::from(dec!(0.000001)), "drift of {}", drift);
    assert!(paid > (allocated * dec!(0.9))?);
    Ok(())
}
