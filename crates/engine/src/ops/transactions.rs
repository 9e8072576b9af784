use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Provider, ResultEngine, Transaction, TransactionStatus, transactions,
};

use super::{Engine, with_tx};

/// Records a payment attempt before the user is sent to the provider.
#[derive(Clone, Debug)]
pub struct RegisterTopupCmd {
    pub provider: Provider,
    pub external_id: String,
    pub user_id: i64,
    pub amount_minor: i64,
    pub currency: Currency,
    pub metadata: Option<serde_json::Value>,
}

impl Engine {
    /// Creates a `pending` topup keyed by `(provider, external_id)`.
    ///
    /// Idempotent: registering the same key twice returns the first row's id
    /// without touching it, so the user-facing workflow can safely retry.
    pub async fn register_topup(&self, cmd: RegisterTopupCmd) -> ResultEngine<Uuid> {
        if cmd.external_id.trim().is_empty() {
            return Err(EngineError::InvalidAmount(
                "external_id must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            Self::register_in_tx(&db_tx, &cmd).await
        })
    }

    async fn register_in_tx(
        db_tx: &DatabaseTransaction,
        cmd: &RegisterTopupCmd,
    ) -> ResultEngine<Uuid> {
        if let Some(existing) = Self::find_by_key(db_tx, cmd.provider, &cmd.external_id).await? {
            return parse_transaction_id(&existing.id);
        }

        let tx = Transaction::topup(
            cmd.provider,
            cmd.external_id.clone(),
            cmd.user_id,
            cmd.amount_minor,
            cmd.currency,
            TransactionStatus::Pending,
            cmd.metadata.clone(),
            Utc::now(),
        )?;

        if let Err(err) = transactions::ActiveModel::from(&tx).insert(db_tx).await {
            // A concurrent registration for the same key won the insert;
            // join the winner's row instead of failing the caller.
            if let Some(existing) = Self::find_by_key(db_tx, cmd.provider, &cmd.external_id).await?
            {
                return parse_transaction_id(&existing.id);
            }
            return Err(err.into());
        }

        Ok(tx.id)
    }

    /// Looks up one transaction by its idempotency key.
    pub async fn transaction_by_key(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find()
            .filter(transactions::Column::Provider.eq(provider.as_str()))
            .filter(transactions::Column::ExternalId.eq(external_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

        Transaction::try_from(model)
    }

    /// Lists a user's most recent payment attempts and adjustments.
    pub async fn list_transactions_for_user(
        &self,
        user_id: i64,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;

        models.into_iter().map(Transaction::try_from).collect()
    }

    pub(crate) async fn find_by_key(
        db_tx: &DatabaseTransaction,
        provider: Provider,
        external_id: &str,
    ) -> ResultEngine<Option<transactions::Model>> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::Provider.eq(provider.as_str()))
            .filter(transactions::Column::ExternalId.eq(external_id))
            .one(db_tx)
            .await?)
    }
}

pub(crate) fn parse_transaction_id(raw: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| EngineError::InvalidAmount("invalid transaction id".to_string()))
}
