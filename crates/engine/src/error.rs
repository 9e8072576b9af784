//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InsufficientCredits`] thrown when a debit would push a balance below zero.
//! - [`Conflict`] thrown when a notification contradicts a settled transaction.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`InsufficientCredits`]: EngineError::InsufficientCredits
//!  [`Conflict`]: EngineError::Conflict
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient credits: {0}")]
    InsufficientCredits(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid adjustment: {0}")]
    InvalidAdjustment(String),
    #[error("Conflicting event: {0}")]
    Conflict(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientCredits(a), Self::InsufficientCredits(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidAdjustment(a), Self::InvalidAdjustment(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
