//! Id assignment for users, categories, accounts and records.

use sea_orm::{ActiveValue, ConnectionTrait, QueryOrder, QuerySelect, prelude::*};
use serde::Deserialize;

use crate::ResultEngine;

/// How new rows get their integer id.
///
/// Ids carry no meaning beyond identity; the strategy only changes what
/// numbers clients see.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Let the store hand out ever-increasing ids; deleted ids are never reused.
    #[default]
    Monotonic,
    /// Reuse the smallest id not currently taken.
    SmallestAvailable,
}

impl IdStrategy {
    /// Returns the id to insert, or `NotSet` when the store assigns it.
    pub(crate) async fn assign<E, C>(self, db: &C, column: E::Column) -> ResultEngine<ActiveValue<i64>>
    where
        E: EntityTrait,
        C: ConnectionTrait,
    {
        match self {
            Self::Monotonic => Ok(ActiveValue::NotSet),
            Self::SmallestAvailable => {
                let taken: Vec<i64> = E::find()
                    .select_only()
                    .column(column)
                    .order_by_asc(column)
                    .into_tuple()
                    .all(db)
                    .await?;
                Ok(ActiveValue::Set(smallest_gap(&taken)))
            }
        }
    }
}

/// First positive id missing from an ascending list.
fn smallest_gap(taken: &[i64]) -> i64 {
    let mut candidate = 1;
    for &id in taken {
        if id > candidate {
            break;
        }
        if id == candidate {
            candidate += 1;
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_in_the_middle_is_reused() {
        assert_eq!(smallest_gap(&[1, 2, 4, 5]), 3);
    }

    #[test]
    fn empty_table_starts_at_one() {
        assert_eq!(smallest_gap(&[]), 1);
        assert_eq!(smallest_gap(&[2, 3]), 1);
    }

    #[test]
    fn dense_ids_continue_after_max() {
        assert_eq!(smallest_gap(&[1, 2, 3]), 4);
    }
}
