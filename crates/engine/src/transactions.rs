//! Payment-attempt ledger primitives.
//!
//! A `Transaction` records one payment attempt (or one manual adjustment)
//! and the state it settled in. Rows are never deleted: terminal states are
//! kept for audit and reporting. The current balance is **not** derived from
//! this table — see the balances store.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Provider, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Topup,
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topup => "topup",
            Self::Adjustment => "adjustment",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "topup" => Ok(Self::Topup),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Succeeded,
    Canceled,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }

    /// Terminal statuses admit no further transition.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "canceled" => Ok(Self::Canceled),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    /// Present for topups; manual adjustments have no provider.
    pub provider: Option<Provider>,
    /// Provider-assigned id, unique per provider. `(provider, external_id)`
    /// is the idempotency key for webhook redelivery.
    pub external_id: Option<String>,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    /// Minor units for topups; signed credit delta for adjustments.
    pub amount_minor: i64,
    pub currency: Option<Currency>,
    pub note: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// A topup attempt against a provider.
    pub fn topup(
        provider: Provider,
        external_id: String,
        user_id: i64,
        amount_minor: i64,
        currency: Currency,
        status: TransactionStatus,
        metadata: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            provider: Some(provider),
            external_id: Some(external_id),
            user_id,
            kind: TransactionKind::Topup,
            status,
            amount_minor,
            currency: Some(currency),
            note: None,
            metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// A manual adjustment, settled the moment it is created.
    pub fn adjustment(
        user_id: i64,
        delta_credits: i64,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: None,
            external_id: None,
            user_id,
            kind: TransactionKind::Adjustment,
            status: TransactionStatus::Succeeded,
            amount_minor: delta_credits,
            currency: None,
            note,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub provider: Option<String>,
    pub external_id: Option<String>,
    pub user_id: i64,
    pub kind: String,
    pub status: String,
    pub amount_minor: i64,
    pub currency: Option<String>,
    pub note: Option<String>,
    pub metadata: Option<Json>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            provider: ActiveValue::Set(tx.provider.map(|p| p.as_str().to_string())),
            external_id: ActiveValue::Set(tx.external_id.clone()),
            user_id: ActiveValue::Set(tx.user_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            currency: ActiveValue::Set(tx.currency.map(|c| c.code().to_string())),
            note: ActiveValue::Set(tx.note.clone()),
            metadata: ActiveValue::Set(tx.metadata.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            provider: model
                .provider
                .as_deref()
                .map(Provider::try_from)
                .transpose()?,
            external_id: model.external_id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            amount_minor: model.amount_minor,
            currency: model
                .currency
                .as_deref()
                .map(Currency::try_from)
                .transpose()?,
            note: model.note,
            metadata: model.metadata,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Succeeded.is_terminal());
        assert!(TransactionStatus::Canceled.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn kind_and_status_round_trip() {
        for kind in [TransactionKind::Topup, TransactionKind::Adjustment] {
            assert_eq!(TransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Succeeded,
            TransactionStatus::Canceled,
            TransactionStatus::Failed,
        ] {
            assert_eq!(TransactionStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(TransactionStatus::try_from("refunded").is_err());
    }

    #[test]
    fn topup_rejects_non_positive_amount() {
        let res = Transaction::topup(
            Provider::Stars,
            "charge-1".to_string(),
            42,
            0,
            Currency::Xtr,
            TransactionStatus::Pending,
            None,
            Utc::now(),
        );
        assert!(res.is_err());
    }
}
