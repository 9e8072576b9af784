//! Canonical payment notification.
//!
//! The webhook gateways translate each provider's payload into this
//! provider-agnostic record before it reaches the reconciliation engine, so
//! provider-specific shapes never leak past the HTTP boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Currency, EngineError, ResultEngine};

/// Payment provider a transaction originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Stars,
    Yookassa,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Yookassa => "yookassa",
        }
    }
}

impl TryFrom<&str> for Provider {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "stars" => Ok(Self::Stars),
            "yookassa" => Ok(Self::Yookassa),
            other => Err(EngineError::KeyNotFound(format!(
                "unknown provider: {other}"
            ))),
        }
    }
}

/// Coarse event classification extracted by a gateway.
///
/// Providers only deliver `Succeeded`/`Canceled` today; `Failed` is accepted
/// so a provider that distinguishes failure from cancellation can be wired
/// in without touching the state machine. `Other` covers event types the
/// gateway does not recognize: they are acknowledged but change nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEvent {
    Succeeded,
    Canceled,
    Failed,
    Other,
}

/// Provider-agnostic payment notification.
///
/// `user_id` is the value the product itself attached when the payment was
/// created (forwarded provider metadata), not free text from the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentNotification {
    pub provider: Provider,
    pub external_id: String,
    pub user_id: i64,
    pub amount_minor: i64,
    pub currency: Currency,
    pub event: PaymentEvent,
    /// Opaque key/value pairs forwarded by the provider (invoice payload,
    /// originating username and the like). Stored on the transaction row.
    pub metadata: HashMap<String, String>,
}

impl PaymentNotification {
    /// Checks the fields a gateway cannot guarantee by construction.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.external_id.trim().is_empty() {
            return Err(EngineError::InvalidAmount(
                "external_id must not be empty".to_string(),
            ));
        }
        if self.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> PaymentNotification {
        PaymentNotification {
            provider: Provider::Yookassa,
            external_id: "pay-1".to_string(),
            user_id: 42,
            amount_minor: 10000,
            currency: Currency::Rub,
            event: PaymentEvent::Succeeded,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn valid_notification_passes() {
        assert!(notification().validate().is_ok());
    }

    #[test]
    fn empty_external_id_is_rejected() {
        let mut n = notification();
        n.external_id = "  ".to_string();
        assert!(n.validate().is_err());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut n = notification();
        n.amount_minor = 0;
        assert!(n.validate().is_err());
        n.amount_minor = -5;
        assert!(n.validate().is_err());
    }

    #[test]
    fn provider_round_trips() {
        assert_eq!(Provider::try_from("stars").unwrap(), Provider::Stars);
        assert_eq!(Provider::Yookassa.as_str(), "yookassa");
        assert!(Provider::try_from("paypal").is_err());
    }
}
