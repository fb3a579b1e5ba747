//! Spending records.
//!
//! A record only ever comes into existence together with the withdrawal of
//! its amount from the owner's account.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: MoneyCents,
    pub date_time: DateTime<Utc>,
}

/// Optional filters for listing records.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordFilter {
    pub user_id: Option<i64>,
    pub category_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: i64,
    pub date_time: DateTimeUtc,
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
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Record {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            category_id: value.category_id,
            amount: MoneyCents::new(value.amount),
            date_time: value.date_time,
        }
    }
}
