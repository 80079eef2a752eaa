use super::{FeePool, TotalAccum};
use crate::coins::{Address, Decimal};
use crate::encoding::{Decode, Encode};
use crate::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// The state a validator's share of the fee pool is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawContext {
    pub height: i64,
    /// Power of the whole last bonded set.
    pub total_power: Decimal,
    /// The validator's power in the last bonded set.
    pub val_power: Decimal,
    pub commission_rate: Decimal,
}

/// Per-validator reward bookkeeping.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorDistInfo {
    pub operator: Address,
    /// Last height the validator took its share of the fee pool.
    pub fee_pool_withdrawal_height: i64,
    /// Accumulated delegator shares since the delegators' last withdrawals.
    pub del_accum: TotalAccum,
    /// Rewards owed to delegators, commission already charged.
    pub del_pool: Decimal,
    /// Commission owed to the operator.
    pub val_commission: Decimal,
}

impl ValidatorDistInfo {
    pub fn new(operator: Address, height: i64) -> Self {
        ValidatorDistInfo {
            operator,
            fee_pool_withdrawal_height: height,
            del_accum: TotalAccum::new(height),
            del_pool: Decimal::zero(),
            val_commission: Decimal::zero(),
        }
    }

    pub fn update_total_del_accum(&mut self, height: i64, total_del_shares: Decimal) -> Result<()> {
        self.del_accum.update_for_new_height(height, total_del_shares)
    }

    pub fn total_del_accum(&self, height: i64, total_del_shares: Decimal) -> Result<Decimal> {
        self.del_accum.get_accum(height, total_del_shares)
    }

    /// The validator's accumulation against the fee pool at `height`.
    pub fn val_accum(&self, height: i64, val_power: Decimal) -> Result<Decimal> {
        val_power * (height - self.fee_pool_withdrawal_height)
    }

    /// Moves the validator's accumulated share of the fee pool into its
    /// delegator pool and commission. This must run before every change to
    /// the validator's power.
    pub fn take_fee_pool_rewards(&mut self, fee_pool: &mut FeePool, wc: &WithdrawContext) -> Result<()> {
        fee_pool.update_total_val_accum(wc.height, wc.total_power)?;

        if fee_pool.total_val_accum.accum.is_zero() {
            self.fee_pool_withdrawal_height = wc.height;
            return Ok(());
        }

        let accum = self.val_accum(wc.height, wc.val_power)?;
        self.fee_pool_withdrawal_height = wc.height;

        let total = fee_pool.total_val_accum.accum;
        if accum > total {
            panic!("Individual accum should never be greater than the total");
        }
        let withdrawal = fee_pool.val_pool.mul_div(accum, total)?;
        let commission = (withdrawal * wc.commission_rate)?;
        let after_commission = (withdrawal - commission)?;

        fee_pool.total_val_accum.accum = (total - accum)?;
        fee_pool.val_pool = (fee_pool.val_pool - withdrawal)?;
        self.val_commission = (self.val_commission + commission)?;
        self.del_pool = (self.del_pool + after_commission)?;

        debug!(
            "Validator {} took {} from the fee pool, commission {}",
            hex::encode(self.operator),
            withdrawal,
            commission
        );
        Ok(())
    }

    /// Takes the fee pool rewards, then empties and returns the commission.
    pub fn withdraw_commission(&mut self, fee_pool: &mut FeePool, wc: &WithdrawContext) -> Result<Decimal> {
        self.take_fee_pool_rewards(fee_pool, wc)?;
        let commission = self.val_commission;
        self.val_commission = Decimal::zero();
        Ok(commission)
    }

    /// Share of the fee pool the validator could take now, before
    /// commission.
    fn pending_withdrawal(&self, fee_pool: &FeePool, wc: &WithdrawContext) -> Result<Decimal> {
        let total = fee_pool.total_val_accum(wc.height, wc.total_power)?;
        let accum = self.val_accum(wc.height, wc.val_power)?;
        if accum > total {
            panic!("Individual accum should never be greater than the total");
        }
        if total.is_zero() {
            return Ok(Decimal::zero());
        }
        fee_pool.val_pool.mul_div(accum, total)
    }

    /// The delegator pool as it would be after taking the fee pool rewards.
    pub fn current_pool_rewards(&self, fee_pool: &FeePool, wc: &WithdrawContext) -> Result<Decimal> {
        let withdrawal = self.pending_withdrawal(fee_pool, wc)?;
        let commission = (withdrawal * wc.commission_rate)?;
        self.del_pool + (withdrawal - commission)?
    }

    /// The commission as it would be after taking the fee pool rewards.
    pub fn current_commission_rewards(&self, fee_pool: &FeePool, wc: &WithdrawContext) -> Result<Decimal> {
        let withdrawal = self.pending_withdrawal(fee_pool, wc)?;
        self.val_commission + (withdrawal * wc.commission_rate)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn context(height: i64, commission_rate: Decimal) -> WithdrawContext {
        WithdrawContext {
            height,
            total_power: 10u64.into(),
            val_power: 5u64.into(),
            commission_rate,
        }
    }

    #[test]
    fn take_fee_pool_rewards() -> Result<()> {
        let mut fee_pool = FeePool {
            val_pool: 100u64.into(),
            ..Default::default()
        };
        let mut info = ValidatorDistInfo::new([1; 20], 0);
        let wc = context(2, dec!(0.1).into());

        assert_eq!(info.current_pool_rewards(&fee_pool, &wc)?, 45u64.into());
        assert_eq!(info.current_commission_rewards(&fee_pool, &wc)?, 5u64.into());

        info.take_fee_pool_rewards(&mut fee_pool, &wc)?;
        assert_eq!(info.del_pool, 45u64.into());
        assert_eq!(info.val_commission, 5u64.into());
        assert_eq!(info.fee_pool_withdrawal_height, 2);
        assert_eq!(fee_pool.val_pool, 50u64.into());
        assert_eq!(fee_pool.total_val_accum.accum, 10u64.into());

        let commission = info.withdraw_commission(&mut fee_pool, &wc)?;
        assert_eq!(commission, 5u64.into());
        assert!(info.val_commission.is_zero());
        assert_eq!(fee_pool.val_pool, 50u64.into());
        Ok(())
    }

    #[test]
    fn empty_total_only_moves_height() -> Result<()> {
        let mut fee_pool = FeePool {
            val_pool: 100u64.into(),
            ..Default::default()
        };
        let mut info = ValidatorDistInfo::new([1; 20], 0);
        let wc = WithdrawContext {
            total_power: Decimal::zero(),
            ..context(3, Decimal::zero())
        };

        info.take_fee_pool_rewards(&mut fee_pool, &wc)?;
        assert_eq!(info.fee_pool_withdrawal_height, 3);
        assert!(info.del_pool.is_zero());
        assert_eq!(fee_pool.val_pool, 100u64.into());
        Ok(())
    }

    #[test]
    #[should_panic(expected = "greater than the total")]
    fn accum_above_total_panics() {
        let mut fee_pool = FeePool::default();
        let mut info = ValidatorDistInfo::new([1; 20], 0);
        let wc = WithdrawContext {
            total_power: 1u64.into(),
            ..context(2, Decimal::zero())
        };
        info.take_fee_pool_rewards(&mut fee_pool, &wc).unwrap();
    }
}
