//! Conversion between paid amounts and generation credits.

use crate::{EngineError, Provider, ResultEngine};

/// Linear conversion from minor units to credits, configured per provider.
///
/// A value of `n` means `n` minor units buy one credit; the result is
/// floored. The default is 1:1 for both providers (one star = one credit,
/// one kopek = one credit); a deployment that wants 1 ruble = 1 credit sets
/// `yookassa_minor_per_credit = 100` in its settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditPolicy {
    pub stars_minor_per_credit: i64,
    pub yookassa_minor_per_credit: i64,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            stars_minor_per_credit: 1,
            yookassa_minor_per_credit: 1,
        }
    }
}

impl CreditPolicy {
    /// Rejects non-positive divisors before the engine accepts the policy.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.stars_minor_per_credit <= 0 || self.yookassa_minor_per_credit <= 0 {
            return Err(EngineError::InvalidAmount(
                "credit rate must be > 0 minor units per credit".to_string(),
            ));
        }
        Ok(())
    }

    /// Credits granted for a settled amount from `provider`.
    #[must_use]
    pub fn credits_for(&self, provider: Provider, amount_minor: i64) -> i64 {
        let rate = match provider {
            Provider::Stars => self.stars_minor_per_credit,
            Provider::Yookassa => self.yookassa_minor_per_credit,
        };
        amount_minor / rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_to_one() {
        let policy = CreditPolicy::default();
        assert_eq!(policy.credits_for(Provider::Stars, 5), 5);
        assert_eq!(policy.credits_for(Provider::Yookassa, 500), 500);
    }

    #[test]
    fn rate_divides_and_floors() {
        let policy = CreditPolicy {
            stars_minor_per_credit: 1,
            yookassa_minor_per_credit: 100,
        };
        assert_eq!(policy.credits_for(Provider::Yookassa, 10000), 100);
        assert_eq!(policy.credits_for(Provider::Yookassa, 10099), 100);
        assert_eq!(policy.credits_for(Provider::Stars, 7), 7);
    }

    #[test]
    fn non_positive_rate_is_rejected() {
        let policy = CreditPolicy {
            stars_minor_per_credit: 0,
            yookassa_minor_per_credit: 100,
        };
        assert!(policy.validate().is_err());
    }
}
