//! Initial schema migration - creates all tables from scratch.
//!
//! Three durable relations back the credit ledger:
//!
//! - `transactions`: every payment attempt and manual adjustment, unique on
//!   `(provider, external_id)` so webhook redelivery cannot double-apply
//! - `balances`: current credit balance per user (the source of truth;
//!   never recomputed by summing transactions)
//! - `audit_entries`: provenance of every balance mutation

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Provider,
    ExternalId,
    UserId,
    Kind,
    Status,
    AmountMinor,
    Currency,
    Note,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Balances {
    Table,
    UserId,
    Credits,
    UpdatedAt,
}

#[derive(Iden)]
enum AuditEntries {
    Table,
    Id,
    Actor,
    Action,
    TargetUserId,
    AmountDelta,
    Reason,
    RelatedTransactionId,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Provider).string())
                    .col(ColumnDef::new(Transactions::ExternalId).string())
                    .col(
                        ColumnDef::new(Transactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Currency).string())
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(ColumnDef::new(Transactions::Metadata).json())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The idempotency key: one row per provider-assigned payment id.
        // NULLs (manual adjustments) are distinct, so adjustments do not
        // collide with each other.
        manager
            .create_index(
                Index::create()
                    .name("uidx-transactions-provider-external_id")
                    .table(Transactions::Table)
                    .col(Transactions::Provider)
                    .col(Transactions::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Balances
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Balances::Credits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Balances::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Audit entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AuditEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditEntries::Actor).string().not_null())
                    .col(ColumnDef::new(AuditEntries::Action).string().not_null())
                    .col(
                        ColumnDef::new(AuditEntries::TargetUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuditEntries::AmountDelta)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuditEntries::Reason).string())
                    .col(ColumnDef::new(AuditEntries::RelatedTransactionId).string())
                    .col(
                        ColumnDef::new(AuditEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-audit_entries-target_user_id")
                    .table(AuditEntries::Table)
                    .col(AuditEntries::TargetUserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;

        Ok(())
    }
}
