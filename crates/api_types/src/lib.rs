//! Request and response bodies of the ledger HTTP API.
//!
//! Request fields are optional so the server can report every missing field
//! at once instead of failing on the first one.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Plain acknowledgement, e.g. after a delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserNew {
        pub name: Option<String>,
        /// Optional secret used by `POST /login`.
        pub password: Option<String>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: i64,
        pub name: String,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountNew {
        pub user_id: Option<i64>,
        /// Defaults to zero.
        pub initial_balance: Option<Decimal>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Deposit {
        pub amount: Option<Decimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Account {
        pub id: i64,
        pub user_id: i64,
        #[serde(with = "rust_decimal::serde::float")]
        pub balance: Decimal,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Balance {
        #[serde(with = "rust_decimal::serde::float")]
        pub balance: Decimal,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: Option<String>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Category {
        pub id: i64,
        pub name: String,
    }
}

pub mod record {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecordNew {
        pub user_id: Option<i64>,
        pub category_id: Option<i64>,
        /// Must be > 0, at most two decimals.
        pub amount: Option<Decimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Record {
        pub id: i64,
        pub user_id: i64,
        pub category_id: i64,
        #[serde(with = "rust_decimal::serde::float")]
        pub amount: Decimal,
        /// Server-assigned, RFC3339.
        pub date_time: DateTime<Utc>,
    }

    /// Query string of `GET /records`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecordQuery {
        pub user_id: Option<i64>,
        pub category_id: Option<i64>,
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct Login {
        pub name: Option<String>,
        pub password: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Token {
        pub token: Uuid,
        pub expires_at: DateTime<Utc>,
    }
}
