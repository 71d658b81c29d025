//! User endpoints: registration, profiles and subscriptions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{Query, WithRejection};
use std::sync::Arc;

use crate::db::{
    membership, CreateUserRequest, Follow, Page, PageQuery, PageWindow, RegisteredUser,
    SubscriptionResponse, SubscriptionsQuery, User, UserResponse,
};
use crate::AppState;

use super::auth::{hash_password, MaybeUser};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_user;

/// Reject an email or username that already belongs to someone
async fn validate_unique(state: &AppState, req: &CreateUserRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if User::email_taken(&state.db, &req.email).await? {
        errors.add("email", "A user with this email already exists");
    }
    if User::username_taken(&state.db, &req.username).await? {
        errors.add("username", "A user with this username already exists");
    }

    errors.finish()
}

async fn get_author_or_404(state: &AppState, id: i64, viewer: i64) -> Result<UserResponse, ApiError> {
    UserResponse::get(&state.db, id, Some(viewer))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// List users, paginated
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    WithRejection(Query(page), _): WithRejection<Query<PageQuery>, ApiError>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    let window = PageWindow::new(page.page, state.config.page_size(page.limit));
    let users = UserResponse::list(&state.db, viewer.id(), window).await?;
    Ok(Json(users))
}

/// Register a new user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<CreateUserRequest>, ApiError>,
) -> Result<(StatusCode, Json<RegisteredUser>), ApiError> {
    validate_user(&req, &state.config.limits)?;
    validate_unique(&state, &req).await?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "Failed to hash password");
        ApiError::internal("Failed to hash password")
    })?;

    let user = User::create(&state.db, &req, &password_hash).await?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(RegisteredUser::from(user))))
}

/// The requesting user
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<UserResponse>, ApiError> {
    let me = get_author_or_404(&state, user.id, user.id).await?;
    Ok(Json(me))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserResponse::get(&state.db, id, viewer.id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user))
}

/// Authors the requester follows, with a preview of their recipes
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Query(query), _): WithRejection<Query<SubscriptionsQuery>, ApiError>,
) -> Result<Json<Page<SubscriptionResponse>>, ApiError> {
    let window = PageWindow::new(query.page, state.config.page_size(query.limit));
    let subscriptions =
        SubscriptionResponse::list(&state.db, user.id, window, query.preview_limit()).await?;
    Ok(Json(subscriptions))
}

/// Follow an author
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<SubscriptionsQuery>, ApiError>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    let mut author = get_author_or_404(&state, id, user.id).await?;
    membership::add::<Follow>(&state.db, user.id, author.id).await?;
    author.is_subscribed = true;

    let subscription =
        SubscriptionResponse::for_author(&state.db, author, query.preview_limit()).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// Stop following an author
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    user: User,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<StatusCode, ApiError> {
    let author = get_author_or_404(&state, id, user.id).await?;
    membership::remove::<Follow>(&state.db, user.id, author.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
