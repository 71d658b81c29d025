//! Recipe endpoints: CRUD, favorite and shopping-cart toggles, shopping list download.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::filters::RecipeFilter;
use crate::db::{
    membership, render_shopping_list, CreateRecipeRequest, Favorite, Ingredient,
    IngredientAmount, MembershipTable, Page, PageQuery, PageWindow, Recipe, RecipeResponse,
    ShoppingCart, ShoppingListItem, ShortRecipe, Tag, UpdateRecipeRequest, User,
};
use crate::AppState;

use super::auth::MaybeUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_amount, validate_cooking_time, validate_text};

const SHOPPING_LIST_FILENAME: &str = "shopping-list.txt";

fn has_duplicates(ids: impl IntoIterator<Item = i64>) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().any(|id| !seen.insert(id))
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check the ingredient and tag sets of a payload, including that every id exists
async fn validate_links(
    state: &AppState,
    ingredients: &[IngredientAmount],
    tags: &[i64],
    errors: &mut ValidationErrorBuilder,
) -> Result<(), ApiError> {
    if ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required");
    } else {
        if has_duplicates(ingredients.iter().map(|i| i.id)) {
            errors.add("ingredients", "Ingredients must not repeat");
        }

        let ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
        let missing = Ingredient::missing_ids(&state.db, &ids).await?;
        if !missing.is_empty() {
            errors.add("ingredients", format!("Unknown ingredients: {}", join_ids(&missing)));
        }

        for item in ingredients {
            if let Err(e) = validate_amount(item.amount) {
                errors.add("amount", e);
            }
        }
    }

    if tags.is_empty() {
        errors.add("tags", "At least one tag is required");
    } else {
        if has_duplicates(tags.iter().copied()) {
            errors.add("tags", "Tags must not repeat");
        }

        let missing = Tag::missing_ids(&state.db, tags).await?;
        if !missing.is_empty() {
            errors.add("tags", format!("Unknown tags: {}", join_ids(&missing)));
        }
    }

    Ok(())
}

/// Validate a CreateRecipeRequest
async fn validate_create_request(
    state: &AppState,
    req: &CreateRecipeRequest,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    validate_links(state, &req.ingredients, &req.tags, &mut errors).await?;

    let limits = &state.config.limits;
    if let Err(e) = validate_text(&req.name, "Name", limits.name_max_length) {
        errors.add("name", e);
    }
    if let Err(e) = validate_text(&req.text, "Text", usize::MAX) {
        errors.add("text", e);
    }
    if let Err(e) = validate_text(&req.image, "Image", usize::MAX) {
        errors.add("image", e);
    }
    if let Err(e) = validate_cooking_time(req.cooking_time) {
        errors.add("cooking_time", e);
    }

    errors.finish()
}

/// Validate an UpdateRecipeRequest; absent header fields are left alone
async fn validate_update_request(
    state: &AppState,
    req: &UpdateRecipeRequest,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    validate_links(state, &req.ingredients, &req.tags, &mut errors).await?;

    let limits = &state.config.limits;
    if let Some(ref name) = req.name {
        if let Err(e) = validate_text(name, "Name", limits.name_max_length) {
            errors.add("name", e);
        }
    }
    if let Some(ref text) = req.text {
        if let Err(e) = validate_text(text, "Text", usize::MAX) {
            errors.add("text", e);
        }
    }
    if let Some(ref image) = req.image {
        if let Err(e) = validate_text(image, "Image", usize::MAX) {
            errors.add("image", e);
        }
    }
    if let Some(minutes) = req.cooking_time {
        if let Err(e) = validate_cooking_time(minutes) {
            errors.add("cooking_time", e);
        }
    }

    errors.finish()
}

async fn get_recipe_or_404(state: &AppState, id: i64) -> Result<Recipe, ApiError> {
    Recipe::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))
}

/// Load a recipe the user is about to modify
async fn get_owned_recipe(state: &AppState, id: i64, user: &User) -> Result<Recipe, ApiError> {
    let recipe = get_recipe_or_404(state, id).await?;
    if recipe.author_id != user.id {
        return Err(ApiError::forbidden("Only the author can modify this recipe"));
    }
    Ok(recipe)
}

async fn read_back(state: &AppState, id: i64, viewer: i64) -> Result<RecipeResponse, ApiError> {
    RecipeResponse::get(&state.db, id, Some(viewer))
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))
}

/// List recipes, filtered and paginated
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    WithRejection(Query(filter), _): WithRejection<Query<RecipeFilter>, ApiError>,
    WithRejection(Query(page), _): WithRejection<Query<PageQuery>, ApiError>,
) -> Result<Json<Page<RecipeResponse>>, ApiError> {
    let window = PageWindow::new(page.page, state.config.page_size(page.limit));
    let recipes = RecipeResponse::list(&state.db, &filter, viewer.id(), window).await?;
    Ok(Json(recipes))
}

/// Get a single recipe
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let recipe = RecipeResponse::get(&state.db, id, viewer.id())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    Ok(Json(recipe))
}

/// Create a recipe authored by the requester
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Json(req), _): WithRejection<Json<CreateRecipeRequest>, ApiError>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    validate_create_request(&state, &req).await?;

    let id = Recipe::create(&state.db, user.id, &req).await?;
    let recipe = read_back(&state, id, user.id).await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Update a recipe, replacing its ingredients and tags
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateRecipeRequest>, ApiError>,
) -> Result<Json<RecipeResponse>, ApiError> {
    get_owned_recipe(&state, id, &user).await?;
    validate_update_request(&state, &req).await?;

    Recipe::update(&state.db, id, &req).await?;
    let recipe = read_back(&state, id, user.id).await?;

    Ok(Json(recipe))
}

/// Delete a recipe
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<StatusCode, ApiError> {
    get_owned_recipe(&state, id, &user).await?;

    if !Recipe::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Recipe not found"));
    }

    tracing::info!(recipe_id = id, user_id = user.id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn add_membership<T: MembershipTable>(
    state: &AppState,
    user: &User,
    id: i64,
) -> Result<(StatusCode, Json<ShortRecipe>), ApiError> {
    let recipe = get_recipe_or_404(state, id).await?;
    membership::add::<T>(&state.db, user.id, recipe.id).await?;
    Ok((StatusCode::CREATED, Json(ShortRecipe::from(recipe))))
}

async fn remove_membership<T: MembershipTable>(
    state: &AppState,
    user: &User,
    id: i64,
) -> Result<StatusCode, ApiError> {
    let recipe = get_recipe_or_404(state, id).await?;
    membership::remove::<T>(&state.db, user.id, recipe.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<(StatusCode, Json<ShortRecipe>), ApiError> {
    add_membership::<Favorite>(&state, &user, id).await
}

pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<StatusCode, ApiError> {
    remove_membership::<Favorite>(&state, &user, id).await
}

pub async fn add_to_shopping_cart(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<(StatusCode, Json<ShortRecipe>), ApiError> {
    add_membership::<ShoppingCart>(&state, &user, id).await
}

pub async fn remove_from_shopping_cart(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<StatusCode, ApiError> {
    remove_membership::<ShoppingCart>(&state, &user, id).await
}

/// Download the aggregated ingredients of the requester's cart as plain text
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<impl IntoResponse, ApiError> {
    let items = ShoppingListItem::for_user(&state.db, user.id).await?;
    tracing::debug!(user_id = user.id, lines = items.len(), "Rendering shopping list");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", SHOPPING_LIST_FILENAME),
            ),
        ],
        render_shopping_list(&items),
    ))
}
