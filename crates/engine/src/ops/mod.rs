use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

use crate::{CredentialHasher, EngineError, IdStrategy, PlainCredentials, ResultEngine};

mod accounts;
mod categories;
mod records;
mod sessions;
mod users;

const DEFAULT_MAX_RETRIES: u32 = 5;
const NAME_MAX_LEN: usize = 80;

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
///
/// The block is replayed from scratch on a fresh transaction when it fails
/// with a retryable error (a stale balance or a locked store), up to the
/// engine's `max_retries`. `?` and `return` inside the block leave the block,
/// not the enclosing function.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let mut attempt: u32 = 0;
        loop {
            let $tx = $self.database.begin().await?;
            let result = async {
                let value: $crate::ResultEngine<_> = $body;
                value
            }
            .await;
            let outcome = match result {
                Ok(value) => $tx
                    .commit()
                    .await
                    .map(|()| value)
                    .map_err($crate::EngineError::from),
                Err(err) => {
                    if let Err(rollback_err) = $tx.rollback().await {
                        tracing::error!("rollback failed: {rollback_err}");
                    }
                    Err(err)
                }
            };
            match outcome {
                Err(err) if err.is_retryable() && attempt < $self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, "retrying transaction after conflict: {err}");
                    $crate::ops::backoff(attempt).await;
                }
                Err(err) if err.is_retryable() => {
                    break Err($crate::EngineError::Contention(err.to_string()));
                }
                other => break other,
            }
        }
    }};
}

pub(crate) use with_tx;

pub(crate) async fn backoff(attempt: u32) {
    tokio::time::sleep(Duration::from_millis(5 * u64::from(attempt))).await;
}

/// The ledger.
///
/// Every public operation runs in its own database transaction; nothing is
/// cached between calls, so several engines (or processes) may share one
/// database.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    ids: IdStrategy,
    max_retries: u32,
    credentials: Arc<dyn CredentialHasher>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(EngineError::InvalidName(format!(
            "{label} name must be at most {NAME_MAX_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    ids: IdStrategy,
    max_retries: u32,
    credentials: Arc<dyn CredentialHasher>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            ids: IdStrategy::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            credentials: Arc::new(PlainCredentials),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn id_strategy(mut self, ids: IdStrategy) -> EngineBuilder {
        self.ids = ids;
        self
    }

    /// How many times a conflicting transaction is replayed before giving up.
    pub fn max_retries(mut self, max_retries: u32) -> EngineBuilder {
        self.max_retries = max_retries;
        self
    }

    /// Replace the default [`PlainCredentials`].
    pub fn credential_hasher(mut self, hasher: impl CredentialHasher + 'static) -> EngineBuilder {
        self.credentials = Arc::new(hasher);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            ids: self.ids,
            max_retries: self.max_retries,
            credentials: self.credentials,
        })
    }
}
