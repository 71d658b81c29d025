pub mod auth;
pub mod error;
mod ingredients;
mod recipes;
mod tags;
mod users;
pub mod validation;


use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let recipe_routes = Router::new()
        .route("/", get(recipes::list_recipes).post(recipes::create_recipe))
        .route("/download_shopping_cart", get(recipes::download_shopping_cart))
        .route(
            "/:id",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/:id/favorite",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/:id/shopping_cart",
            post(recipes::add_to_shopping_cart).delete(recipes::remove_from_shopping_cart),
        );

    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/me", get(users::me))
        .route("/subscriptions", get(users::list_subscriptions))
        .route("/:id", get(users::get_user))
        .route(
            "/:id/subscribe",
            post(users::subscribe).delete(users::unsubscribe),
        );

    let api_routes = Router::new()
        .nest("/recipes", recipe_routes)
        .nest("/users", user_routes)
        .route("/tags", get(tags::list_tags))
        .route("/tags/:id", get(tags::get_tag))
        .route("/ingredients", get(ingredients::list_ingredients))
        .route("/ingredients/:id", get(ingredients::get_ingredient));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
