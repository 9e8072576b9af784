use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{AuditEntry, ResultEngine, audit_entries};

use super::Engine;

impl Engine {
    /// Appends one provenance record inside the caller's open transaction.
    pub(crate) async fn append_audit_entry(
        db_tx: &DatabaseTransaction,
        entry: &AuditEntry,
    ) -> ResultEngine<()> {
        audit_entries::ActiveModel::from(entry).insert(db_tx).await?;
        Ok(())
    }

    /// Lists the most recent audit entries touching a user's balance.
    pub async fn list_audit_for_user(
        &self,
        user_id: i64,
        limit: u64,
    ) -> ResultEngine<Vec<AuditEntry>> {
        let models = audit_entries::Entity::find()
            .filter(audit_entries::Column::TargetUserId.eq(user_id))
            .order_by_desc(audit_entries::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;

        models.into_iter().map(AuditEntry::try_from).collect()
    }
}
