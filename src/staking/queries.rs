use super::keys::*;
use super::*;

/// Page selection for list queries. Pages start at 1.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Page { page: 1, limit: 100 }
    }
}

impl Page {
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let start = self.page.saturating_sub(1).saturating_mul(self.limit);
        items.into_iter().skip(start).take(self.limit).collect()
    }
}

impl<B: Bank + Clone> Staking<B> {
    /// All validators ordered by operator address.
    pub fn validators(&self) -> Result<Vec<Validator>> {
        self.collect_values(&[VALIDATOR_PREFIX])
    }

    pub fn validators_paged(&self, page: Page) -> Result<Vec<Validator>> {
        Ok(page.apply(self.validators()?))
    }

    /// The validators of the last bonded set, in power order.
    pub fn bonded_validators(&self) -> Result<Vec<Validator>> {
        let mut powers = self.last_validator_powers()?;
        powers.sort_by(|(a_addr, a), (b_addr, b)| b.cmp(a).then(a_addr.cmp(b_addr)));
        powers
            .into_iter()
            .map(|(operator, _)| self.validator(&operator))
            .collect()
    }

    /// Validators the delegator holds a delegation with.
    pub fn delegator_validators(&self, delegator: &Address) -> Result<Vec<Validator>> {
        self.delegator_delegations(delegator)?
            .into_iter()
            .map(|delegation| self.validator(&delegation.validator))
            .collect()
    }

    /// The delegator's current token value of its delegation to a validator.
    pub fn delegation_tokens(&self, delegation: &Delegation) -> Result<Decimal> {
        let validator = self.validator(&delegation.validator)?;
        if validator.delegator_shares.is_zero() {
            return Ok(Decimal::zero());
        }
        delegation
            .shares
            .mul_div(validator.tokens, validator.delegator_shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(Page { page: 1, limit: 3 }.apply(items.clone()), vec![0, 1, 2]);
        assert_eq!(Page { page: 4, limit: 3 }.apply(items.clone()), vec![9]);
        assert!(Page { page: 5, limit: 3 }.apply(items).is_empty());
    }
}
