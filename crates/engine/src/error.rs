//! The module contains the errors the engine can throw.
//!
//! Every fallible engine operation returns one of these. The first violated
//! precondition wins: operations never report more than one.
//!
//! - [`KeyNotFound`] a referenced user, category, account or record is absent.
//! - [`NoAccount`] a spending request names a user that owns no account.
//! - [`InsufficientFunds`] a withdrawal would drive a balance below zero.
//! - [`Contention`] a concurrent writer won the race and retries ran out.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`NoAccount`]: EngineError::NoAccount
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`Contention`]: EngineError::Contention
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("{0} not found")]
    KeyNotFound(String),
    #[error("{0} already exists")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("User has no account: {0}")]
    NoAccount(String),
    #[error("Concurrent update: {0}")]
    Contention(String),
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Whether the failed transaction may succeed when replayed against
    /// fresh state.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            Self::Contention(_) => true,
            Self::Database(err) => is_contended(err),
            _ => false,
        }
    }
}

/// Store-level contention: a locked SQLite database, or two writers picking
/// the same gap-filling id.
fn is_contended(err: &DbErr) -> bool {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return is_id_collision(&detail);
    }
    // sea-orm leaves SQLITE_BUSY / SQLITE_LOCKED unclassified.
    let message = err.to_string();
    message.contains("database is locked") || message.contains("database table is locked")
}

/// `detail` is the store's message, e.g. `UNIQUE constraint failed: records.id`.
fn is_id_collision(detail: &str) -> bool {
    detail.trim_end().ends_with(".id")
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::NoAccount(a), Self::NoAccount(b)) => a == b,
            (Self::Contention(a), Self::Contention(b)) => a == b,
            (Self::InvalidDuration(a), Self::InvalidDuration(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
