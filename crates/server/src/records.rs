use api_types::record::{Record, RecordNew, RecordQuery};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use engine::RecordFilter;

use crate::{ServerError, server::ServerState, validation};

fn map_record(record: engine::Record) -> Record {
    Record {
        id: record.id,
        user_id: record.user_id,
        category_id: record.category_id,
        amount: validation::to_decimal(record.amount),
        date_time: record.date_time,
    }
}

/// Log a spending event, debiting the user's account in the same step.
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<RecordNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ServerError> {
    let Json(payload) = payload?;
    let (user_id, category_id, amount) = validation::record_new(&payload)?;

    let record = state
        .engine
        .create_record_with_withdrawal(user_id, category_id, amount)
        .await?;
    Ok((StatusCode::CREATED, Json(map_record(record))))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> Result<Json<Vec<Record>>, ServerError> {
    let Query(query) = query?;
    let filter = RecordFilter {
        user_id: query.user_id,
        category_id: query.category_id,
    };
    let records = state.engine.records(filter).await?;
    Ok(Json(records.into_iter().map(map_record).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Record>, ServerError> {
    let Path(id) = id?;
    Ok(Json(map_record(state.engine.record(id).await?)))
}
