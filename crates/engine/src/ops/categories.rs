use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Category, EngineError, ResultEngine, categories, records};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    pub async fn create_category(&self, name: &str) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let id = self
                .ids
                .assign::<categories::Entity, _>(&db_tx, categories::Column::Id)
                .await?;
            let model = categories::ActiveModel {
                id,
                name: ActiveValue::Set(name.clone()),
            }
            .insert(&db_tx)
            .await?;
            Ok(Category::from(model))
        })
    }

    pub async fn categories(&self) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    pub async fn category(&self, category_id: i64) -> ResultEngine<Category> {
        categories::Entity::find_by_id(category_id)
            .one(&self.database)
            .await?
            .map(Category::from)
            .ok_or_else(|| category_not_found(category_id))
    }

    /// Delete a category and every record filed under it.
    ///
    /// Balances are left alone: the money was spent.
    pub async fn delete_category(&self, category_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            categories::Entity::find_by_id(category_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| category_not_found(category_id))?;

            let removed_records = records::Entity::delete_many()
                .filter(records::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;

            tracing::info!(category_id, removed_records, "deleted category");
            Ok(())
        })
    }
}

pub(super) fn category_not_found(category_id: i64) -> EngineError {
    EngineError::KeyNotFound(format!("Category with id {category_id}"))
}
