use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, AuditEntry, EngineError, PaymentEvent, PaymentNotification, ResultEngine, Transaction,
    TransactionStatus, transactions,
};

use super::{Engine, transactions::parse_transaction_id, with_tx};

/// What a reconciliation run did, for the gateway to acknowledge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The terminal transition happened now; `credited` is 0 for
    /// canceled/failed events.
    Applied { transaction_id: Uuid, credited: i64 },
    /// Redelivery of an event that already settled this key; nothing changed.
    AlreadyApplied { transaction_id: Uuid },
    /// Unrecognized event; acknowledged so the provider stops retrying.
    Ignored,
}

impl Engine {
    /// Applies one canonical payment notification, exactly once per
    /// `(provider, external_id)`.
    ///
    /// Status update, balance credit and audit entry commit as one database
    /// transaction or not at all, so a redelivered notification either finds
    /// the settled row (and reports [`ApplyOutcome::AlreadyApplied`]) or
    /// finds the pending row untouched and retries cleanly. A notification
    /// that contradicts an already-settled row fails with
    /// [`EngineError::Conflict`]; the first terminal transition wins.
    pub async fn apply(&self, notification: &PaymentNotification) -> ResultEngine<ApplyOutcome> {
        if notification.event == PaymentEvent::Other {
            return Ok(ApplyOutcome::Ignored);
        }
        notification.validate()?;

        with_tx!(self, |db_tx| {
            self.apply_in_tx(&db_tx, notification).await
        })
    }

    async fn apply_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        notification: &PaymentNotification,
    ) -> ResultEngine<ApplyOutcome> {
        let now = Utc::now();

        // Locate the transaction for this key, or create it pending: some
        // providers notify before any local record exists, in which case the
        // notification itself constrains amount and currency. A concurrent
        // delivery for the same key loses the insert on the unique index and
        // joins the winner's row.
        let model = match Self::find_by_key(db_tx, notification.provider, &notification.external_id)
            .await?
        {
            Some(model) => model,
            None => {
                let tx = Transaction::topup(
                    notification.provider,
                    notification.external_id.clone(),
                    notification.user_id,
                    notification.amount_minor,
                    notification.currency,
                    TransactionStatus::Pending,
                    metadata_json(notification),
                    now,
                )?;
                match transactions::ActiveModel::from(&tx).insert(db_tx).await {
                    Ok(inserted) => inserted,
                    Err(err) => {
                        match Self::find_by_key(
                            db_tx,
                            notification.provider,
                            &notification.external_id,
                        )
                        .await?
                        {
                            Some(model) => model,
                            None => return Err(err.into()),
                        }
                    }
                }
            }
        };

        let transaction_id = parse_transaction_id(&model.id)?;
        let status = TransactionStatus::try_from(model.status.as_str())?;

        if status.is_terminal() {
            let same_event = matches!(
                (status, notification.event),
                (TransactionStatus::Succeeded, PaymentEvent::Succeeded)
                    | (TransactionStatus::Canceled, PaymentEvent::Canceled)
                    | (TransactionStatus::Failed, PaymentEvent::Failed)
            );
            if same_event {
                return Ok(ApplyOutcome::AlreadyApplied { transaction_id });
            }
            return Err(EngineError::Conflict(format!(
                "transaction {} is already {}",
                notification.external_id,
                status.as_str()
            )));
        }

        match notification.event {
            PaymentEvent::Succeeded => {
                // The provider is authoritative for the captured amount: a
                // pending row registered with a different amount is updated
                // before crediting.
                let user_id = model.user_id;
                let mut active: transactions::ActiveModel = model.into();
                active.status =
                    ActiveValue::Set(TransactionStatus::Succeeded.as_str().to_string());
                active.amount_minor = ActiveValue::Set(notification.amount_minor);
                active.currency =
                    ActiveValue::Set(Some(notification.currency.code().to_string()));
                active.updated_at = ActiveValue::Set(now);
                active.update(db_tx).await?;

                let credited = self
                    .credits
                    .credits_for(notification.provider, notification.amount_minor);
                Self::apply_balance_delta(db_tx, user_id, credited, now).await?;
                Self::append_audit_entry(
                    db_tx,
                    &AuditEntry::new(
                        Actor::System,
                        "topup_credit",
                        user_id,
                        credited,
                        None,
                        Some(transaction_id),
                        now,
                    ),
                )
                .await?;

                Ok(ApplyOutcome::Applied {
                    transaction_id,
                    credited,
                })
            }
            PaymentEvent::Canceled | PaymentEvent::Failed => {
                // Failed topups never affect the balance.
                let final_status = if notification.event == PaymentEvent::Canceled {
                    TransactionStatus::Canceled
                } else {
                    TransactionStatus::Failed
                };
                let mut active: transactions::ActiveModel = model.into();
                active.status = ActiveValue::Set(final_status.as_str().to_string());
                active.updated_at = ActiveValue::Set(now);
                active.update(db_tx).await?;

                Ok(ApplyOutcome::Applied {
                    transaction_id,
                    credited: 0,
                })
            }
            PaymentEvent::Other => Ok(ApplyOutcome::Ignored),
        }
    }
}

fn metadata_json(notification: &PaymentNotification) -> Option<serde_json::Value> {
    if notification.metadata.is_empty() {
        return None;
    }
    serde_json::to_value(&notification.metadata).ok()
}
