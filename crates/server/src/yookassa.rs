//! YooKassa webhook intake gateway.
//!
//! Terminates the provider-specific payload shape and the shared-secret
//! check, then hands a canonical notification to the reconciliation engine.
//! No ledger mutation happens in this module.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::collections::HashMap;

use engine::{
    ApplyOutcome, Currency, EngineError, PaymentEvent, PaymentNotification, Provider,
    parse_minor_units,
};

use crate::{ServerError, secret, server::ServerState};

#[derive(Debug, Deserialize)]
pub(crate) struct YookassaNotification {
    pub event: String,
    pub object: Option<YookassaPaymentObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YookassaPaymentObject {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub paid: bool,
    pub amount: Option<YookassaAmount>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YookassaAmount {
    pub value: String,
    pub currency: String,
}

#[derive(serde::Serialize)]
pub(crate) struct WebhookAck {
    pub status: &'static str,
}

pub(crate) fn ack(status: &'static str) -> (StatusCode, Json<WebhookAck>) {
    (StatusCode::OK, Json(WebhookAck { status }))
}

/// Coarse event classification.
///
/// `payment.succeeded` counts only when the object also says so; a succeeded
/// event wrapping an unpaid object is treated as unrecognized (acknowledged,
/// no state change) the way the provider's own retries expect.
fn coarse_event(payload: &YookassaNotification) -> PaymentEvent {
    match payload.event.as_str() {
        "payment.succeeded" => {
            let settled = payload.object.as_ref().is_some_and(|object| {
                object.paid && object.status.as_deref() == Some("succeeded")
            });
            if settled {
                PaymentEvent::Succeeded
            } else {
                PaymentEvent::Other
            }
        }
        "payment.canceled" => PaymentEvent::Canceled,
        _ => PaymentEvent::Other,
    }
}

fn canonicalize(
    payload: YookassaNotification,
    event: PaymentEvent,
) -> Result<PaymentNotification, ServerError> {
    let object = payload
        .object
        .ok_or_else(|| ServerError::Malformed("missing payment object".to_string()))?;

    let amount = object
        .amount
        .ok_or_else(|| ServerError::Malformed("missing amount".to_string()))?;
    let currency = Currency::try_from(amount.currency.as_str())
        .map_err(|_| ServerError::Malformed(format!("unsupported currency: {}", amount.currency)))?;
    let amount_minor = parse_minor_units(&amount.value, currency)
        .map_err(|err| ServerError::Malformed(format!("invalid amount: {err}")))?;

    // The user id is the value we attached as metadata when the payment was
    // created, not provider free text.
    let user_id = object
        .metadata
        .get("user_id")
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| ServerError::Malformed("missing or invalid metadata.user_id".to_string()))?;

    Ok(PaymentNotification {
        provider: Provider::Yookassa,
        external_id: object.id,
        user_id,
        amount_minor,
        currency,
        event,
        metadata: object.metadata,
    })
}

pub async fn notify(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<WebhookAck>), ServerError> {
    secret::require_secret(state.webhooks.yookassa_secret.as_deref(), &headers)?;

    let payload: YookassaNotification = serde_json::from_str(&body)
        .map_err(|err| ServerError::Malformed(format!("invalid payload: {err}")))?;

    let event = coarse_event(&payload);
    if event == PaymentEvent::Other {
        tracing::info!(event = %payload.event, "ignoring yookassa event");
        return Ok(ack("ignored"));
    }

    let notification = canonicalize(payload, event)?;
    match state.engine.apply(&notification).await {
        Ok(ApplyOutcome::Applied { credited, .. }) => {
            tracing::info!(
                external_id = %notification.external_id,
                user_id = notification.user_id,
                credited,
                "yookassa notification applied"
            );
            Ok(ack("applied"))
        }
        Ok(ApplyOutcome::AlreadyApplied { .. }) => Ok(ack("already_applied")),
        Ok(ApplyOutcome::Ignored) => Ok(ack("ignored")),
        Err(EngineError::Conflict(msg)) => {
            // First terminal transition wins; acknowledge so the provider
            // stops retrying a notification that can never apply.
            tracing::warn!(
                external_id = %notification.external_id,
                "conflicting yookassa notification discarded: {msg}"
            );
            Ok(ack("discarded"))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> YookassaNotification {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn succeeded_event_requires_paid_object() {
        let settled = payload(
            r#"{"event":"payment.succeeded","object":{"id":"p1","status":"succeeded","paid":true,
                "amount":{"value":"100.00","currency":"RUB"},"metadata":{"user_id":"42"}}}"#,
        );
        assert_eq!(coarse_event(&settled), PaymentEvent::Succeeded);

        let unpaid = payload(
            r#"{"event":"payment.succeeded","object":{"id":"p1","status":"pending","paid":false}}"#,
        );
        assert_eq!(coarse_event(&unpaid), PaymentEvent::Other);
    }

    #[test]
    fn unknown_event_is_other() {
        let refund = payload(r#"{"event":"refund.succeeded","object":{"id":"r1"}}"#);
        assert_eq!(coarse_event(&refund), PaymentEvent::Other);
    }

    #[test]
    fn canonicalize_parses_amount_and_user() {
        let p = payload(
            r#"{"event":"payment.succeeded","object":{"id":"p1","status":"succeeded","paid":true,
                "amount":{"value":"100.00","currency":"RUB"},
                "metadata":{"user_id":"42","telegram_username":"alice"}}}"#,
        );
        let n = canonicalize(p, PaymentEvent::Succeeded).unwrap();
        assert_eq!(n.provider, Provider::Yookassa);
        assert_eq!(n.external_id, "p1");
        assert_eq!(n.user_id, 42);
        assert_eq!(n.amount_minor, 10000);
        assert_eq!(n.currency, Currency::Rub);
        assert_eq!(n.metadata.get("telegram_username").unwrap(), "alice");
    }

    #[test]
    fn canonicalize_rejects_missing_user_id() {
        let p = payload(
            r#"{"event":"payment.succeeded","object":{"id":"p1","status":"succeeded","paid":true,
                "amount":{"value":"100.00","currency":"RUB"}}}"#,
        );
        assert!(canonicalize(p, PaymentEvent::Succeeded).is_err());
    }

    #[test]
    fn canonicalize_rejects_foreign_currency() {
        let p = payload(
            r#"{"event":"payment.succeeded","object":{"id":"p1","status":"succeeded","paid":true,
                "amount":{"value":"10.00","currency":"USD"},"metadata":{"user_id":"42"}}}"#,
        );
        assert!(canonicalize(p, PaymentEvent::Succeeded).is_err());
    }
}
