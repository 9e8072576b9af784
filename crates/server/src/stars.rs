//! Telegram Stars intake gateway.
//!
//! Telegram delivers Stars payments to the bot process, not to a public
//! webhook; the bot forwards each `successful_payment` update here over a
//! pre-shared-secret link. The forwarded charge id is the provider-assigned
//! external id.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use std::collections::HashMap;

use engine::{ApplyOutcome, Currency, EngineError, PaymentEvent, PaymentNotification, Provider};

use crate::{
    ServerError, secret,
    server::ServerState,
    yookassa::{WebhookAck, ack},
};

#[derive(Debug, Deserialize)]
pub(crate) struct StarsNotification {
    /// Update kind as forwarded by the bot; only `successful_payment` maps
    /// to a settlement, anything else is acknowledged as a no-op.
    pub kind: String,
    pub telegram_payment_charge_id: Option<String>,
    pub from_user_id: Option<i64>,
    /// Whole stars; XTR has no fraction digits.
    pub total_amount: Option<i64>,
    pub currency: Option<String>,
    pub invoice_payload: Option<String>,
}

fn coarse_event(payload: &StarsNotification) -> PaymentEvent {
    match payload.kind.as_str() {
        "successful_payment" => PaymentEvent::Succeeded,
        _ => PaymentEvent::Other,
    }
}

fn canonicalize(payload: StarsNotification) -> Result<PaymentNotification, ServerError> {
    let external_id = payload
        .telegram_payment_charge_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ServerError::Malformed("missing telegram_payment_charge_id".to_string()))?;
    let user_id = payload
        .from_user_id
        .ok_or_else(|| ServerError::Malformed("missing from_user_id".to_string()))?;
    let amount_minor = payload
        .total_amount
        .ok_or_else(|| ServerError::Malformed("missing total_amount".to_string()))?;

    let currency = match payload.currency.as_deref() {
        None => Currency::Xtr,
        Some(code) => Currency::try_from(code)
            .map_err(|_| ServerError::Malformed(format!("unsupported currency: {code}")))?,
    };

    let mut metadata = HashMap::new();
    if let Some(invoice_payload) = payload.invoice_payload {
        metadata.insert("invoice_payload".to_string(), invoice_payload);
    }

    Ok(PaymentNotification {
        provider: Provider::Stars,
        external_id,
        user_id,
        amount_minor,
        currency,
        event: PaymentEvent::Succeeded,
        metadata,
    })
}

pub async fn notify(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<WebhookAck>), ServerError> {
    secret::check_optional_secret(state.webhooks.stars_secret.as_deref(), &headers)?;

    let payload: StarsNotification = serde_json::from_str(&body)
        .map_err(|err| ServerError::Malformed(format!("invalid payload: {err}")))?;

    if coarse_event(&payload) == PaymentEvent::Other {
        tracing::info!(kind = %payload.kind, "ignoring stars update");
        return Ok(ack("ignored"));
    }

    let notification = canonicalize(payload)?;
    match state.engine.apply(&notification).await {
        Ok(ApplyOutcome::Applied { credited, .. }) => {
            tracing::info!(
                external_id = %notification.external_id,
                user_id = notification.user_id,
                credited,
                "stars payment applied"
            );
            Ok(ack("applied"))
        }
        Ok(ApplyOutcome::AlreadyApplied { .. }) => Ok(ack("already_applied")),
        Ok(ApplyOutcome::Ignored) => Ok(ack("ignored")),
        Err(EngineError::Conflict(msg)) => {
            tracing::warn!(
                external_id = %notification.external_id,
                "conflicting stars notification discarded: {msg}"
            );
            Ok(ack("discarded"))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> StarsNotification {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn successful_payment_maps_to_succeeded() {
        let p = payload(
            r#"{"kind":"successful_payment","telegram_payment_charge_id":"ch-1",
                "from_user_id":42,"total_amount":5,"currency":"XTR","invoice_payload":"topup:5"}"#,
        );
        assert_eq!(coarse_event(&p), PaymentEvent::Succeeded);
        let n = canonicalize(p).unwrap();
        assert_eq!(n.provider, Provider::Stars);
        assert_eq!(n.external_id, "ch-1");
        assert_eq!(n.amount_minor, 5);
        assert_eq!(n.currency, Currency::Xtr);
        assert_eq!(n.metadata.get("invoice_payload").unwrap(), "topup:5");
    }

    #[test]
    fn other_update_kinds_are_ignored() {
        let p = payload(r#"{"kind":"refunded_payment","telegram_payment_charge_id":"ch-1"}"#);
        assert_eq!(coarse_event(&p), PaymentEvent::Other);
    }

    #[test]
    fn missing_charge_id_is_malformed() {
        let p = payload(r#"{"kind":"successful_payment","from_user_id":42,"total_amount":5}"#);
        assert!(canonicalize(p).is_err());
    }

    #[test]
    fn currency_defaults_to_stars() {
        let p = payload(
            r#"{"kind":"successful_payment","telegram_payment_charge_id":"ch-2",
                "from_user_id":42,"total_amount":3}"#,
        );
        assert_eq!(canonicalize(p).unwrap().currency, Currency::Xtr);
    }
}
