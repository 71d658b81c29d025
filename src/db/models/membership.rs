//! Two-key membership tables.
//!
//! Favorites, the shopping cart and follows are all rows whose only meaning
//! is that the (owner, target) pair exists. They share one implementation,
//! parameterized by a [`MembershipTable`] that names the table and its key
//! columns. Duplicate detection is left to the table's UNIQUE constraint so
//! that concurrent inserts of the same pair cannot both succeed.

use sqlx::SqlitePool;
use thiserror::Error;

/// Describes a membership table: `owner_column` always holds the acting user
pub trait MembershipTable {
    const TABLE: &'static str;
    const OWNER_COLUMN: &'static str;
    const TARGET_COLUMN: &'static str;
    /// Human-readable name of the collection, used in error messages
    const LABEL: &'static str;
    /// Whether owner and target reference the same entity and must differ
    const FORBID_SELF: bool = false;
}

/// A user's favorite recipes
pub struct Favorite;

impl MembershipTable for Favorite {
    const TABLE: &'static str = "favorites";
    const OWNER_COLUMN: &'static str = "user_id";
    const TARGET_COLUMN: &'static str = "recipe_id";
    const LABEL: &'static str = "favorites";
}

/// Recipes in a user's shopping cart
pub struct ShoppingCart;

impl MembershipTable for ShoppingCart {
    const TABLE: &'static str = "shopping_cart";
    const OWNER_COLUMN: &'static str = "user_id";
    const TARGET_COLUMN: &'static str = "recipe_id";
    const LABEL: &'static str = "shopping cart";
}

/// Authors a user is subscribed to
pub struct Follow;

impl MembershipTable for Follow {
    const TABLE: &'static str = "follows";
    const OWNER_COLUMN: &'static str = "user_id";
    const TARGET_COLUMN: &'static str = "author_id";
    const LABEL: &'static str = "subscriptions";
    const FORBID_SELF: bool = true;
}

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("Already in {0}")]
    AlreadyExists(&'static str),

    #[error("Not in {0}")]
    NotFound(&'static str),

    #[error("Cannot add yourself to {0}")]
    SelfReference(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Insert the (owner, target) pair
pub async fn add<T: MembershipTable>(
    db: &SqlitePool,
    owner_id: i64,
    target_id: i64,
) -> Result<(), MembershipError> {
    if T::FORBID_SELF && owner_id == target_id {
        return Err(MembershipError::SelfReference(T::LABEL));
    }

    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES (?, ?)",
        T::TABLE,
        T::OWNER_COLUMN,
        T::TARGET_COLUMN
    );

    match sqlx::query(&sql)
        .bind(owner_id)
        .bind(target_id)
        .execute(db)
        .await
    {
        Ok(_) => {
            tracing::info!(table = T::TABLE, owner_id, target_id, "Membership added");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE constraint failed") => {
            Err(MembershipError::AlreadyExists(T::LABEL))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete the (owner, target) pair; missing pairs are an error
pub async fn remove<T: MembershipTable>(
    db: &SqlitePool,
    owner_id: i64,
    target_id: i64,
) -> Result<(), MembershipError> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ? AND {} = ?",
        T::TABLE,
        T::OWNER_COLUMN,
        T::TARGET_COLUMN
    );

    let result = sqlx::query(&sql)
        .bind(owner_id)
        .bind(target_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(MembershipError::NotFound(T::LABEL));
    }

    tracing::info!(table = T::TABLE, owner_id, target_id, "Membership removed");
    Ok(())
}

pub async fn exists<T: MembershipTable>(
    db: &SqlitePool,
    owner_id: i64,
    target_id: i64,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ? AND {} = ?)",
        T::TABLE,
        T::OWNER_COLUMN,
        T::TARGET_COLUMN
    );

    let row: (bool,) = sqlx::query_as(&sql)
        .bind(owner_id)
        .bind(target_id)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::user::fixtures;

    async fn recipe_for(db: &SqlitePool, author_id: i64) -> i64 {
        sqlx::query(
            "INSERT INTO recipes (author_id, name, text, image, cooking_time) VALUES (?, 'Soup', 'Boil', 'img', 10)",
        )
        .bind(author_id)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_add_twice_conflicts() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;
        let recipe = recipe_for(&db, alice.id).await;

        add::<Favorite>(&db, alice.id, recipe).await.unwrap();
        let err = add::<Favorite>(&db, alice.id, recipe).await.unwrap_err();
        assert!(matches!(err, MembershipError::AlreadyExists("favorites")));
        assert!(exists::<Favorite>(&db, alice.id, recipe).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_once() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;
        let recipe = recipe_for(&db, alice.id).await;

        add::<ShoppingCart>(&db, alice.id, recipe).await.unwrap();
        remove::<ShoppingCart>(&db, alice.id, recipe).await.unwrap();
        let err = remove::<ShoppingCart>(&db, alice.id, recipe).await.unwrap_err();
        assert!(matches!(err, MembershipError::NotFound("shopping cart")));
        assert!(!exists::<ShoppingCart>(&db, alice.id, recipe).await.unwrap());
    }

    #[tokio::test]
    async fn test_tables_are_independent() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;
        let recipe = recipe_for(&db, alice.id).await;

        add::<Favorite>(&db, alice.id, recipe).await.unwrap();
        assert!(!exists::<ShoppingCart>(&db, alice.id, recipe).await.unwrap());
        add::<ShoppingCart>(&db, alice.id, recipe).await.unwrap();
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;

        let err = add::<Follow>(&db, alice.id, alice.id).await.unwrap_err();
        assert!(matches!(err, MembershipError::SelfReference(_)));
    }

    #[tokio::test]
    async fn test_self_follow_blocked_by_table() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;

        let result = sqlx::query("INSERT INTO follows (user_id, author_id) VALUES (?, ?)")
            .bind(alice.id)
            .bind(alice.id)
            .execute(&db)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_follow_is_directional() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;
        let bob = fixtures::user(&db, "bob").await;

        add::<Follow>(&db, alice.id, bob.id).await.unwrap();
        add::<Follow>(&db, bob.id, alice.id).await.unwrap();
        assert!(matches!(
            add::<Follow>(&db, alice.id, bob.id).await,
            Err(MembershipError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_target_is_a_database_error() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;

        let err = add::<Favorite>(&db, alice.id, 999).await.unwrap_err();
        assert!(matches!(err, MembershipError::Database(_)));
    }
}
