//! Balance-mutation provenance records.
//!
//! Every balance change — webhook-driven or manual — appends exactly one
//! entry here, inside the same database transaction that performs the
//! mutation. Entries are immutable once written and survive independently of
//! how ledger semantics evolve.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// Who caused a balance mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// Automated crediting from a provider notification.
    System,
    /// A named administrator acting through the manual adjustment path.
    Admin(String),
}

impl Actor {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::Admin(id) => id.as_str(),
        }
    }
}

impl From<&str> for Actor {
    fn from(value: &str) -> Self {
        match value {
            "system" => Self::System,
            other => Self::Admin(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: Actor,
    pub action: String,
    pub target_user_id: i64,
    pub amount_delta: i64,
    pub reason: Option<String>,
    pub related_transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: Actor,
        action: &str,
        target_user_id: i64,
        amount_delta: i64,
        reason: Option<String>,
        related_transaction_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor,
            action: action.to_string(),
            target_user_id,
            amount_delta,
            reason,
            related_transaction_id,
            created_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub actor: String,
    pub action: String,
    pub target_user_id: i64,
    pub amount_delta: i64,
    pub reason: Option<String>,
    pub related_transaction_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AuditEntry> for ActiveModel {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            actor: ActiveValue::Set(entry.actor.as_str().to_string()),
            action: ActiveValue::Set(entry.action.clone()),
            target_user_id: ActiveValue::Set(entry.target_user_id),
            amount_delta: ActiveValue::Set(entry.amount_delta),
            reason: ActiveValue::Set(entry.reason.clone()),
            related_transaction_id: ActiveValue::Set(
                entry.related_transaction_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for AuditEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("audit entry not exists".to_string()))?,
            actor: Actor::from(model.actor.as_str()),
            action: model.action,
            target_user_id: model.target_user_id,
            amount_delta: model.amount_delta,
            reason: model.reason,
            related_transaction_id: model
                .related_transaction_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: model.created_at,
        })
    }
}
