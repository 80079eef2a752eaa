use super::*;
use log::{info, warn};

impl<B: Bank + Clone, F: FeeCollector> Distribution<B, F> {
    /// Allocates the fees collected in the previous block. The proposer
    /// receives `base + bonus × percent_votes` of the fees, the community
    /// pool receives the community tax, and the rest goes to the fee pool
    /// shared by all bonded validators.
    pub fn allocate_tokens(&mut self, percent_votes: Decimal, proposer: &ConsAddress) -> Result<()> {
        let fees: Decimal = self.fees.get_collected_fees()?.into();
        let mut fee_pool = self.fee_pool()?;

        if self.staking.last_total_power()? == 0 {
            fee_pool.community_pool = (fee_pool.community_pool + fees)?;
            self.set_fee_pool(&fee_pool)?;
            return self.fees.clear_collected_fees();
        }

        let params = self.params()?;
        let multiplier =
            (params.base_proposer_reward + (params.bonus_proposer_reward * percent_votes)?)?;
        let proposer_reward = (fees * multiplier)?;

        match self.staking.get_validator_by_cons(proposer)? {
            Some(validator) => {
                let mut vi = self.validator_info(&validator.operator)?;
                let commission = (proposer_reward * validator.commission.rate)?;
                vi.val_commission = (vi.val_commission + commission)?;
                vi.del_pool = (vi.del_pool + (proposer_reward - commission)?)?;
                self.set_validator_info(&vi)?;
            }
            None => {
                warn!(
                    "Proposer {} no longer exists, its reward goes to the community pool",
                    hex::encode(proposer)
                );
                fee_pool.community_pool = (fee_pool.community_pool + proposer_reward)?;
            }
        }

        let community_funding = (fees * params.community_tax)?;
        fee_pool.community_pool = (fee_pool.community_pool + community_funding)?;
        let pool_received = ((fees - proposer_reward)? - community_funding)?;
        fee_pool.val_pool = (fee_pool.val_pool + pool_received)?;
        self.set_fee_pool(&fee_pool)?;

        info!(
            "Allocated {} in fees: {} to proposer {}, {} to validators, {} to the community pool",
            fees,
            proposer_reward,
            hex::encode(proposer),
            pool_received,
            community_funding
        );
        self.fees.clear_collected_fees()
    }
}
