use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Session, SessionState, User, sessions, users};

use super::{Engine, users::user_not_found, with_tx};

impl Engine {
    /// Issue a fresh token for `user_id`, valid for `ttl`.
    pub async fn create_session(&self, user_id: i64, ttl: Duration) -> ResultEngine<Session> {
        let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
            EngineError::InvalidDuration(format!("token lifetime of {ttl} is out of range"))
        })?;
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| user_not_found(user_id))?;

            let model = sessions::ActiveModel {
                token: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id),
                expires_at: ActiveValue::Set(expires_at),
            }
            .insert(&db_tx)
            .await?;
            Ok(Session::from(model))
        })
    }

    /// Resolve a token to its user as of `now`. Expired tokens are removed.
    pub async fn resolve_session(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<SessionState> {
        with_tx!(self, |db_tx| {
            let Some((session, user)) = sessions::Entity::find_by_id(token)
                .find_also_related(users::Entity)
                .one(&db_tx)
                .await?
            else {
                return Ok(SessionState::Unknown);
            };

            if session.expires_at <= now {
                sessions::Entity::delete_by_id(token).exec(&db_tx).await?;
                return Ok(SessionState::Expired);
            }

            Ok(user.map_or(SessionState::Unknown, |user| {
                SessionState::Active(User::from(user))
            }))
        })
    }

    /// Drop every expired token. Returns how many were removed.
    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> ResultEngine<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(now))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }
}
