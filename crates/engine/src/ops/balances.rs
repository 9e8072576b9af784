use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, prelude::*};

use crate::{EngineError, ResultEngine, balances};

use super::Engine;

impl Engine {
    /// Current credit balance for a user (0 if the user has no row yet).
    pub async fn balance(&self, user_id: i64) -> ResultEngine<i64> {
        let model = balances::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?;
        Ok(model.map(|m| m.credits).unwrap_or(0))
    }

    /// Applies a signed credit delta inside the caller's open transaction.
    ///
    /// Creates the row at zero on first touch. A delta that would drive the
    /// balance below zero is rejected before anything is written, so the
    /// enclosing transaction rolls back untouched. There is deliberately no
    /// "set absolute balance" primitive: only deltas, which keeps every
    /// mutation attributable to one ledger/audit record.
    pub(crate) async fn apply_balance_delta(
        db_tx: &DatabaseTransaction,
        user_id: i64,
        delta: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<i64> {
        let existing = balances::Entity::find_by_id(user_id).one(db_tx).await?;
        let current = existing.as_ref().map(|m| m.credits).unwrap_or(0);

        let new_balance = current.checked_add(delta).ok_or_else(|| {
            EngineError::InvalidAmount("balance overflow".to_string())
        })?;
        if new_balance < 0 {
            return Err(EngineError::InsufficientCredits(format!(
                "balance {current} cannot absorb {delta}"
            )));
        }

        match existing {
            Some(model) => {
                let mut active: balances::ActiveModel = model.into();
                active.credits = ActiveValue::Set(new_balance);
                active.updated_at = ActiveValue::Set(now);
                active.update(db_tx).await?;
            }
            None => {
                let active = balances::ActiveModel {
                    user_id: ActiveValue::Set(user_id),
                    credits: ActiveValue::Set(new_balance),
                    updated_at: ActiveValue::Set(now),
                };
                active.insert(db_tx).await?;
            }
        }

        Ok(new_balance)
    }
}
