//! User models, subscription views and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::{Page, PageWindow};
use super::recipe::ShortRecipe;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

/// Public user representation, annotated for the viewer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Response to a successful registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// A followed author with a preview of their recipes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionsQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub recipes_limit: Option<i64>,
    #[serde(default)]
    pub recipe_limit: Option<i64>,
}

impl SubscriptionsQuery {
    /// Preview size, `recipes_limit` winning over the `recipe_limit` spelling
    pub fn preview_limit(&self) -> Option<i64> {
        self.recipes_limit.or(self.recipe_limit)
    }
}

const USER_RESPONSE_COLUMNS: &str = r#"
    u.email, u.id, u.username, u.first_name, u.last_name,
    EXISTS(SELECT 1 FROM follows f WHERE f.author_id = u.id AND f.user_id = ?) AS is_subscribed
"#;

impl User {
    pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Look up the owner of an API token by the token's hash
    pub async fn find_by_token_hash(
        db: &SqlitePool,
        key_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT u.* FROM users u
            INNER JOIN auth_tokens t ON t.user_id = u.id
            WHERE t.key_hash = ?
            "#,
        )
        .bind(key_hash)
        .fetch_optional(db)
        .await
    }

    pub async fn email_taken(db: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(db)
            .await?;
        Ok(row.0)
    }

    pub async fn username_taken(db: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
                .bind(username)
                .fetch_one(db)
                .await?;
        Ok(row.0)
    }

    /// Insert a user whose password has already been hashed
    pub async fn create(
        db: &SqlitePool,
        req: &CreateUserRequest,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.email)
        .bind(&req.username)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(password_hash)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }
}

impl UserResponse {
    /// Fetch one user as seen by `viewer` (anonymous viewers are never subscribed)
    pub async fn get(
        db: &SqlitePool,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<Option<UserResponse>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM users u WHERE u.id = ?",
            USER_RESPONSE_COLUMNS
        ))
        .bind(viewer)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn list(
        db: &SqlitePool,
        viewer: Option<i64>,
        window: PageWindow,
    ) -> Result<Page<UserResponse>, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;

        let results = sqlx::query_as(&format!(
            "SELECT {} FROM users u ORDER BY u.username, u.email LIMIT ? OFFSET ?",
            USER_RESPONSE_COLUMNS
        ))
        .bind(viewer)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(db)
        .await?;

        Ok(Page::new(count.0, results))
    }
}

impl SubscriptionResponse {
    /// Build the subscription view of `author` for `viewer`
    pub async fn for_author(
        db: &SqlitePool,
        author: UserResponse,
        recipes_limit: Option<i64>,
    ) -> Result<SubscriptionResponse, sqlx::Error> {
        let recipes = ShortRecipe::list_by_author(db, author.id, recipes_limit).await?;
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
            .bind(author.id)
            .fetch_one(db)
            .await?;

        Ok(SubscriptionResponse {
            user: author,
            recipes,
            recipes_count: count.0,
        })
    }

    /// Authors followed by `user_id`, one page at a time
    pub async fn list(
        db: &SqlitePool,
        user_id: i64,
        window: PageWindow,
        recipes_limit: Option<i64>,
    ) -> Result<Page<SubscriptionResponse>, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db)
            .await?;

        let authors: Vec<UserResponse> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM users u
            INNER JOIN follows fl ON fl.author_id = u.id
            WHERE fl.user_id = ?
            ORDER BY u.username, u.email
            LIMIT ? OFFSET ?
            "#,
            USER_RESPONSE_COLUMNS
        ))
        .bind(user_id)
        .bind(user_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(db)
        .await?;

        let mut results = Vec::with_capacity(authors.len());
        for author in authors {
            results.push(Self::for_author(db, author, recipes_limit).await?);
        }

        Ok(Page::new(count.0, results))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::db::{membership, test_pool, Follow};

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_pool().await;
        let user = fixtures::user(&db, "alice").await;

        assert_eq!(user.email, "alice@example.com");
        assert!(User::email_taken(&db, "alice@example.com").await.unwrap());
        assert!(User::username_taken(&db, "alice").await.unwrap());
        assert!(!User::username_taken(&db, "bob").await.unwrap());
        assert_eq!(User::get(&db, user.id).await.unwrap().unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_by_table() {
        let db = test_pool().await;
        fixtures::user(&db, "alice").await;

        let req = CreateUserRequest {
            email: "alice@example.com".to_string(),
            username: "other".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            password: String::new(),
        };
        assert!(User::create(&db, &req, "hash").await.is_err());
    }

    #[tokio::test]
    async fn test_token_lookup() {
        let db = test_pool().await;
        let user = fixtures::user(&db, "alice").await;
        fixtures::token(&db, user.id, "secret-key").await;

        let hash = crate::api::auth::hash_token("secret-key");
        let found = User::find_by_token_hash(&db, &hash).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let other = crate::api::auth::hash_token("wrong");
        assert!(User::find_by_token_hash(&db, &other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_is_subscribed_annotation() {
        let db = test_pool().await;
        let alice = fixtures::user(&db, "alice").await;
        let bob = fixtures::user(&db, "bob").await;
        membership::add::<Follow>(&db, alice.id, bob.id).await.unwrap();

        let seen_by_alice = UserResponse::get(&db, bob.id, Some(alice.id)).await.unwrap().unwrap();
        assert!(seen_by_alice.is_subscribed);

        let anonymous = UserResponse::get(&db, bob.id, None).await.unwrap().unwrap();
        assert!(!anonymous.is_subscribed);

        let reverse = UserResponse::get(&db, alice.id, Some(bob.id)).await.unwrap().unwrap();
        assert!(!reverse.is_subscribed);
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_paginated() {
        let db = test_pool().await;
        for name in ["carol", "alice", "bob"] {
            fixtures::user(&db, name).await;
        }

        let page = UserResponse::list(&db, None, PageWindow::new(Some(1), 2)).await.unwrap();
        assert_eq!(page.count, 3);
        let names: Vec<_> = page.results.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        let page = UserResponse::list(&db, None, PageWindow::new(Some(2), 2)).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].username, "carol");
    }
}
