use sea_orm::DatabaseConnection;

use crate::{CreditPolicy, EngineError, ResultEngine};

mod adjust;
mod audit;
mod balances;
mod reconcile;
mod transactions;

pub use adjust::{AdjustCmd, Adjustment};
pub use reconcile::ApplyOutcome;
pub use transactions::RegisterTopupCmd;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Single authority for every balance-affecting operation.
///
/// Both entry points — webhook-driven reconciliation and manual
/// administrator adjustments — go through the same mutation primitive, so
/// atomicity and audit guarantees cannot diverge between them.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    credits: CreditPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAdjustment(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    credits: CreditPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default 1:1 credit conversion.
    pub fn credit_policy(mut self, credits: CreditPolicy) -> EngineBuilder {
        self.credits = credits;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        self.credits.validate()?;
        Ok(Engine {
            database: self.database,
            credits: self.credits,
        })
    }
}
