//! Read-only tag endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use crate::db::Tag;
use crate::AppState;

use super::error::ApiError;

/// List all tags
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = Tag::list(&state.db).await?;
    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<Tag>, ApiError> {
    let tag = Tag::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag not found"))?;
    Ok(Json(tag))
}
