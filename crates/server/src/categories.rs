//! Categories API endpoints.

use api_types::{
    Message,
    category::{Category, CategoryNew},
};
use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState, validation};

fn map_category(category: engine::Category) -> Category {
    Category {
        id: category.id,
        name: category.name,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CategoryNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ServerError> {
    let Json(payload) = payload?;
    let name = validation::category_new(&payload)?;

    let category = state.engine.create_category(&name).await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Category>>, ServerError> {
    let categories = state.engine.categories().await?;
    Ok(Json(categories.into_iter().map(map_category).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Category>, ServerError> {
    let Path(id) = id?;
    Ok(Json(map_category(state.engine.category(id).await?)))
}

/// Also deletes every record filed under the category.
pub async fn delete(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, ServerError> {
    let Path(id) = id?;
    state.engine.delete_category(id).await?;
    Ok(Json(Message::new("Category deleted")))
}
