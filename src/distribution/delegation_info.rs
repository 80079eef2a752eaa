use super::{FeePool, ValidatorDistInfo, WithdrawContext};
use crate::coins::{Address, Decimal};
use crate::encoding::{Decode, Encode};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Per-delegation reward bookkeeping.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationDistInfo {
    pub delegator: Address,
    pub validator: Address,
    /// Last height the delegator withdrew from the validator's pool.
    pub del_pool_withdrawal_height: i64,
}

impl DelegationDistInfo {
    pub fn new(delegator: Address, validator: Address, height: i64) -> Self {
        DelegationDistInfo {
            delegator,
            validator,
            del_pool_withdrawal_height: height,
        }
    }

    pub fn del_accum(&self, height: i64, shares: Decimal) -> Result<Decimal> {
        shares * (height - self.del_pool_withdrawal_height)
    }

    /// Settles the validator against the fee pool and withdraws the
    /// delegator's share of the validator's delegator pool.
    pub fn withdraw_rewards(
        &mut self,
        fee_pool: &mut FeePool,
        vi: &mut ValidatorDistInfo,
        wc: &WithdrawContext,
        total_del_shares: Decimal,
        shares: Decimal,
    ) -> Result<Decimal> {
        vi.update_total_del_accum(wc.height, total_del_shares)?;
        if vi.del_accum.accum.is_zero() {
            return Ok(Decimal::zero());
        }

        vi.take_fee_pool_rewards(fee_pool, wc)?;

        let accum = self.del_accum(wc.height, shares)?;
        self.del_pool_withdrawal_height = wc.height;

        let total = vi.del_accum.accum;
        if accum > total {
            panic!("Individual accum should never be greater than the total");
        }
        let withdrawal = vi.del_pool.mul_div(accum, total)?;

        vi.del_pool = (vi.del_pool - withdrawal)?;
        vi.del_accum.accum = (total - accum)?;

        Ok(withdrawal)
    }

    /// The rewards `withdraw_rewards` would return now, without changing
    /// any state.
    pub fn current_rewards(
        &self,
        fee_pool: &FeePool,
        vi: &ValidatorDistInfo,
        wc: &WithdrawContext,
        total_del_shares: Decimal,
        shares: Decimal,
    ) -> Result<Decimal> {
        let total = vi.total_del_accum(wc.height, total_del_shares)?;
        if total.is_zero() {
            return Ok(Decimal::zero());
        }
        let rewards = vi.current_pool_rewards(fee_pool, wc)?;
        let accum = self.del_accum(wc.height, shares)?;
        if accum > total {
            panic!("Individual accum should never be greater than the total");
        }
        rewards.mul_div(accum, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdraw_prorates_by_accum() -> Result<()> {
        let mut fee_pool = FeePool::default();
        let mut vi = ValidatorDistInfo::new([9; 20], 0);
        vi.del_pool = 90u64.into();
        let wc = WithdrawContext {
            height: 1,
            total_power: 10u64.into(),
            val_power: 10u64.into(),
            commission_rate: Decimal::zero(),
        };

        let mut first = DelegationDistInfo::new([1; 20], [9; 20], 0);
        let mut second = DelegationDistInfo::new([2; 20], [9; 20], 0);
        let total_shares = Decimal::from(30u64);

        let expected = first.current_rewards(&fee_pool, &vi, &wc, total_shares, 10u64.into())?;
        let withdrawn =
            first.withdraw_rewards(&mut fee_pool, &mut vi, &wc, total_shares, 10u64.into())?;
        assert_eq!(withdrawn, 30u64.into());
        assert_eq!(expected, withdrawn);
        assert_eq!(first.del_pool_withdrawal_height, 1);
        assert_eq!(vi.del_pool, 60u64.into());
        assert_eq!(vi.del_accum.accum, 20u64.into());

        let withdrawn =
            second.withdraw_rewards(&mut fee_pool, &mut vi, &wc, total_shares, 20u64.into())?;
        assert_eq!(withdrawn, 60u64.into());
        assert!(vi.del_pool.is_zero());
        Ok(())
    }

    #[test]
    fn nothing_accumulated() -> Result<()> {
        let mut fee_pool = FeePool::default();
        let mut vi = ValidatorDistInfo::new([9; 20], 4);
        vi.del_pool = 90u64.into();
        let wc = WithdrawContext {
            height: 4,
            total_power: 10u64.into(),
            val_power: 10u64.into(),
            commission_rate: Decimal::zero(),
        };

        let mut info = DelegationDistInfo::new([1; 20], [9; 20], 0);
        let withdrawn = info.withdraw_rewards(&mut fee_pool, &mut vi, &wc, 10u64.into(), 10u64.into())?;
        assert!(withdrawn.is_zero());
        assert_eq!(info.del_pool_withdrawal_height, 0);
        Ok(())
    }
}
