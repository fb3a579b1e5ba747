use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, User, accounts, records, sessions, users};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Register a user. A `password`, if any, is stored through the engine's
    /// [`CredentialHasher`](crate::CredentialHasher).
    pub async fn create_user(&self, name: &str, password: Option<&str>) -> ResultEngine<User> {
        let name = normalize_required_name(name, "user")?;
        let credential = password.map(|secret| self.credentials.hash(secret));
        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Name.eq(name.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(format!("User '{name}'")));
            }

            let id = self
                .ids
                .assign::<users::Entity, _>(&db_tx, users::Column::Id)
                .await?;
            let model = users::ActiveModel {
                id,
                name: ActiveValue::Set(name.clone()),
                password: ActiveValue::Set(credential.clone()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(user_id = model.id, "created user");
            Ok(User::from(model))
        })
    }

    pub async fn users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    pub async fn user(&self, user_id: i64) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| user_not_found(user_id))
    }

    /// The user called `name`, if `password` matches their stored credential.
    ///
    /// Unknown names, users without a credential and wrong passwords all give
    /// `None`.
    pub async fn authenticate(&self, name: &str, password: &str) -> ResultEngine<Option<User>> {
        let model = users::Entity::find()
            .filter(users::Column::Name.eq(name.trim()))
            .one(&self.database)
            .await?;
        Ok(model.and_then(|model| {
            let verified = model
                .password
                .as_deref()
                .is_some_and(|stored| self.credentials.verify(password, stored));
            verified.then(|| User::from(model))
        }))
    }

    /// Delete a user and everything they own: records, account and sessions.
    ///
    /// Children go first so the procedure does not depend on the store's
    /// `ON DELETE CASCADE` being enabled.
    pub async fn delete_user(&self, user_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| user_not_found(user_id))?;

            let removed_records = records::Entity::delete_many()
                .filter(records::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            accounts::Entity::delete_many()
                .filter(accounts::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            sessions::Entity::delete_many()
                .filter(sessions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(user_id).exec(&db_tx).await?;

            tracing::info!(user_id, removed_records, "deleted user");
            Ok(())
        })
    }
}

pub(super) fn user_not_found(user_id: i64) -> EngineError {
    EngineError::KeyNotFound(format!("User with id {user_id}"))
}
