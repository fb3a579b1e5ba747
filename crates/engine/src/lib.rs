//! Ledger core: users, categories, accounts and spending records.
//!
//! The [`Engine`] owns every write to the store. Balances only change through
//! [`Account::deposit`] and [`Account::withdraw`], and a [`Record`] is only
//! created by [`Engine::create_record_with_withdrawal`], which debits the
//! owner's account in the same transaction.

pub use accounts::Account;
pub use categories::Category;
pub use credentials::{CredentialHasher, PlainCredentials};
pub use error::EngineError;
pub use ids::IdStrategy;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder};
pub use records::{Record, RecordFilter};
pub use sessions::{Session, SessionState};
pub use users::User;

mod accounts;
mod categories;
mod credentials;
mod error;
mod ids;
mod money;
mod ops;
mod records;
mod sessions;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
