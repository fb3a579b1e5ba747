//! Bearer-token sessions.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::User;

/// An issued token and when it stops being accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of looking a token up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Active(User),
    Expired,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: Uuid,
    pub user_id: i64,
    pub expires_at: DateTimeUtc,
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

impl From<Model> for Session {
    fn from(value: Model) -> Self {
        Self {
            token: value.token,
            user_id: value.user_id,
            expires_at: value.expires_at,
        }
    }
}
