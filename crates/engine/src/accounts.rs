//! The module contains `Account` and the balance rules of the ledger.
//!
//! [`Account::deposit`] and [`Account::withdraw`] are pure arithmetic on a
//! loaded row: they never touch the database. The engine writes the new
//! balance back inside the same transaction that loaded it, guarded by the
//! balance it observed (see `ops::accounts`).

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{EngineError, MoneyCents, ResultEngine};

/// The single account of a user.
///
/// Invariant: `balance` is never negative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub balance: MoneyCents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: i64, balance: MoneyCents, at: DateTime<Utc>) -> ResultEngine<Self> {
        if balance.is_negative() {
            return Err(EngineError::InvalidAmount(
                "initial balance must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: 0,
            user_id,
            balance,
            created_at: at,
            updated_at: at,
        })
    }

    /// Credit `amount` to the account.
    pub fn deposit(&mut self, amount: MoneyCents, at: DateTime<Utc>) -> ResultEngine<()> {
        ensure_positive(amount)?;
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        self.updated_at = at;
        Ok(())
    }

    /// Debit `amount` from the account, refusing to go below zero.
    pub fn withdraw(&mut self, amount: MoneyCents, at: DateTime<Utc>) -> ResultEngine<()> {
        ensure_positive(amount)?;
        if self.balance < amount {
            return Err(EngineError::InsufficientFunds(format!(
                "balance {} is lower than {amount}",
                self.balance
            )));
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        self.updated_at = at;
        Ok(())
    }
}

pub(crate) fn ensure_positive(amount: MoneyCents) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be positive".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub balance: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            balance: MoneyCents::new(value.balance),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(value.user_id),
            balance: ActiveValue::Set(value.balance.cents()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn opened_at() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn account(balance: i64) -> Account {
        Account::new(1, MoneyCents::new(balance), opened_at()).unwrap()
    }

    #[test]
    fn deposit_adds_and_touches_updated_at() {
        let mut account = account(0);
        let later = opened_at() + Duration::minutes(5);

        account.deposit(MoneyCents::new(100_00), later).unwrap();

        assert_eq!(account.balance, MoneyCents::new(100_00));
        assert_eq!(account.updated_at, later);
        assert_eq!(account.created_at, opened_at());
    }

    #[test]
    fn deposit_rejects_non_positive_amounts() {
        let mut account = account(10_00);

        let err = account.deposit(MoneyCents::new(-5_00), opened_at()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
        assert!(account.deposit(MoneyCents::ZERO, opened_at()).is_err());
        assert_eq!(account.balance, MoneyCents::new(10_00));
    }

    #[test]
    fn withdraw_to_exactly_zero() {
        let mut account = account(30_00);

        account.withdraw(MoneyCents::new(30_00), opened_at()).unwrap();

        assert_eq!(account.balance, MoneyCents::ZERO);
    }

    #[test]
    fn withdraw_more_than_balance_leaves_account_untouched() {
        let mut account = account(100_00);
        let before = account.clone();

        let err = account
            .withdraw(MoneyCents::new(100_01), opened_at() + Duration::days(1))
            .unwrap_err();

        assert!(matches!(err, EngineError::InsufficientFunds(_)));
        assert_eq!(account, before);
    }

    #[test]
    fn withdraw_checks_amount_before_funds() {
        let mut account = account(0);

        let err = account.withdraw(MoneyCents::new(-1), opened_at()).unwrap_err();

        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn negative_opening_balance_is_rejected() {
        let err = Account::new(1, MoneyCents::new(-1), opened_at()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn deposit_overflow_is_reported() {
        let mut account = account(i64::MAX);
        assert!(account.deposit(MoneyCents::new(1), opened_at()).is_err());
        assert_eq!(account.balance, MoneyCents::new(i64::MAX));
    }
}
