use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{Account, EngineError, MoneyCents, ResultEngine, accounts, records, users};

use super::{Engine, users::user_not_found, with_tx};

impl Engine {
    /// Open the account of `user_id` with `initial_balance`.
    pub async fn create_account(
        &self,
        user_id: i64,
        initial_balance: MoneyCents,
    ) -> ResultEngine<Account> {
        let account = Account::new(user_id, initial_balance, Utc::now())?;
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| user_not_found(user_id))?;

            if self.account_of_user(&db_tx, user_id).await?.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "Account for user {user_id}"
                )));
            }

            let mut active: accounts::ActiveModel = (&account).into();
            active.id = self
                .ids
                .assign::<accounts::Entity, _>(&db_tx, accounts::Column::Id)
                .await?;
            let model = active.insert(&db_tx).await?;

            tracing::info!(account_id = model.id, user_id, "opened account");
            Ok(Account::from(model))
        })
    }

    pub async fn accounts(&self) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Account::from).collect())
    }

    pub async fn account(&self, account_id: i64) -> ResultEngine<Account> {
        accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .map(Account::from)
            .ok_or_else(|| account_not_found(account_id))
    }

    pub async fn balance(&self, account_id: i64) -> ResultEngine<MoneyCents> {
        Ok(self.account(account_id).await?.balance)
    }

    /// Credit `amount` to an account and return the updated account.
    pub async fn deposit(&self, account_id: i64, amount: MoneyCents) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let mut account = accounts::Entity::find_by_id(account_id)
                .one(&db_tx)
                .await?
                .map(Account::from)
                .ok_or_else(|| account_not_found(account_id))?;

            let observed = account.balance;
            account.deposit(amount, Utc::now())?;
            self.persist_balance(&db_tx, observed, &account).await?;

            tracing::info!(account_id, %amount, balance = %account.balance, "deposit");
            Ok(account)
        })
    }

    /// Close an account.
    ///
    /// Refused while the owner still has records: every record must belong
    /// to a user with an account.
    pub async fn delete_account(&self, account_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let account = accounts::Entity::find_by_id(account_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| account_not_found(account_id))?;

            let records = records::Entity::find()
                .filter(records::Column::UserId.eq(account.user_id))
                .count(&db_tx)
                .await?;
            if records > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "Records for user {}",
                    account.user_id
                )));
            }

            accounts::Entity::delete_by_id(account_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(account_id, "closed account");
            Ok(())
        })
    }

    pub(super) async fn account_of_user(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<Option<Account>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .map(Account::from))
    }

    /// Write `account.balance` back, but only if the row still holds
    /// `observed`.
    ///
    /// A miss means another transaction committed a balance change after this
    /// one read the row; the caller's transaction is rolled back and replayed.
    pub(super) async fn persist_balance(
        &self,
        db_tx: &DatabaseTransaction,
        observed: MoneyCents,
        account: &Account,
    ) -> ResultEngine<()> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(account.balance.cents()))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(account.updated_at))
            .filter(accounts::Column::Id.eq(account.id))
            .filter(accounts::Column::Balance.eq(observed.cents()))
            .exec(db_tx)
            .await?;

        if result.rows_affected == 0 {
            return Err(EngineError::Contention(format!(
                "balance of account {} changed concurrently",
                account.id
            )));
        }
        Ok(())
    }
}

pub(super) fn account_not_found(account_id: i64) -> EngineError {
    EngineError::KeyNotFound(format!("Account with id {account_id}"))
}
