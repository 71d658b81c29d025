//! Read-only ingredient endpoints with name-prefix search.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;

use crate::db::filters::IngredientFilter;
use crate::db::Ingredient;
use crate::AppState;

use super::error::ApiError;

/// List ingredients, optionally restricted to a name prefix
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(filter), _): WithRejection<Query<IngredientFilter>, ApiError>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let ingredients = Ingredient::list(&state.db, &filter).await?;
    Ok(Json(ingredients))
}

pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = Ingredient::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient not found"))?;
    Ok(Json(ingredient))
}
