use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, MoneyCents, Record, RecordFilter, ResultEngine, accounts::ensure_positive,
    categories, records, users,
};

use super::{Engine, categories::category_not_found, users::user_not_found, with_tx};

impl Engine {
    /// Log a spending event and debit its amount from the user's account.
    ///
    /// Preconditions are checked in order against the state visible inside
    /// the transaction, and the first failure is returned:
    /// user exists, category exists, user has an account, amount is
    /// positive, balance covers the amount.
    ///
    /// The balance write and the record insert commit together. When another
    /// request changed the balance in between, the whole operation is
    /// replayed, so the funds check always runs against the latest balance.
    pub async fn create_record_with_withdrawal(
        &self,
        user_id: i64,
        category_id: i64,
        amount: MoneyCents,
    ) -> ResultEngine<Record> {
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| user_not_found(user_id))?;
            categories::Entity::find_by_id(category_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| category_not_found(category_id))?;
            let mut account = self
                .account_of_user(&db_tx, user_id)
                .await?
                .ok_or_else(|| EngineError::NoAccount(format!("user {user_id}")))?;
            ensure_positive(amount)?;

            let now = Utc::now();
            let observed = account.balance;
            account.withdraw(amount, now)?;
            self.persist_balance(&db_tx, observed, &account).await?;

            let id = self
                .ids
                .assign::<records::Entity, _>(&db_tx, records::Column::Id)
                .await?;
            let model = records::ActiveModel {
                id,
                user_id: ActiveValue::Set(user_id),
                category_id: ActiveValue::Set(category_id),
                amount: ActiveValue::Set(amount.cents()),
                date_time: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                record_id = model.id,
                account_id = account.id,
                %amount,
                balance = %account.balance,
                "recorded spending"
            );
            Ok(Record::from(model))
        })
    }

    pub async fn records(&self, filter: RecordFilter) -> ResultEngine<Vec<Record>> {
        let mut query = records::Entity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(records::Column::UserId.eq(user_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(records::Column::CategoryId.eq(category_id));
        }
        let models = query
            .order_by_asc(records::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Record::from).collect())
    }

    pub async fn record(&self, record_id: i64) -> ResultEngine<Record> {
        records::Entity::find_by_id(record_id)
            .one(&self.database)
            .await?
            .map(Record::from)
            .ok_or_else(|| record_not_found(record_id))
    }
}

fn record_not_found(record_id: i64) -> EngineError {
    EngineError::KeyNotFound(format!("Record with id {record_id}"))
}
