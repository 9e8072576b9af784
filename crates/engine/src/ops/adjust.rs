use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Actor, AuditEntry, EngineError, ResultEngine, Transaction, transactions};

use super::{Engine, normalize_required_text, with_tx};

/// A discretionary balance change made by an administrator.
#[derive(Clone, Debug)]
pub struct AdjustCmd {
    pub user_id: i64,
    /// Signed credit delta; negative debits are rejected if they would push
    /// the balance below zero.
    pub delta_credits: i64,
    /// Mandatory free-text justification, recorded on the audit entry.
    pub reason: String,
    pub admin_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adjustment {
    pub transaction_id: Uuid,
    pub new_balance: i64,
}

impl Engine {
    /// Applies a manual adjustment through the same mutation primitive the
    /// webhook path uses: one adjustment transaction (already settled), one
    /// balance delta, one audit entry, committed together or not at all.
    pub async fn adjust(&self, cmd: AdjustCmd) -> ResultEngine<Adjustment> {
        let reason = normalize_required_text(&cmd.reason, "reason")?;
        let admin_id = normalize_required_text(&cmd.admin_id, "admin id")?;
        if cmd.delta_credits == 0 {
            return Err(EngineError::InvalidAdjustment(
                "delta must not be zero".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let tx = Transaction::adjustment(
                cmd.user_id,
                cmd.delta_credits,
                Some(reason.clone()),
                now,
            );
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            let new_balance =
                Self::apply_balance_delta(&db_tx, cmd.user_id, cmd.delta_credits, now).await?;

            Self::append_audit_entry(
                &db_tx,
                &AuditEntry::new(
                    Actor::Admin(admin_id),
                    "balance_adjust",
                    cmd.user_id,
                    cmd.delta_credits,
                    Some(reason),
                    Some(tx.id),
                    now,
                ),
            )
            .await?;

            Ok(Adjustment {
                transaction_id: tx.id,
                new_balance,
            })
        })
    }
}
