pub use audit_entries::{Actor, AuditEntry};
pub use credits::CreditPolicy;
pub use currency::Currency;
pub use error::EngineError;
pub use money::{format_minor_units, parse_minor_units};
pub use notification::{PaymentEvent, PaymentNotification, Provider};
pub use ops::{AdjustCmd, Adjustment, ApplyOutcome, Engine, EngineBuilder, RegisterTopupCmd};
pub use transactions::{Transaction, TransactionKind, TransactionStatus};

mod audit_entries;
mod balances;
mod credits;
mod currency;
mod error;
mod money;
mod notification;
mod ops;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
