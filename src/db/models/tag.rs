//! Tag models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub slug: String,
    pub color: String,
}

impl Tag {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM tags ORDER BY name")
            .fetch_all(db)
            .await
    }

    pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<Tag>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Tags linked to a recipe, ordered by name
    pub async fn for_recipe<'e>(
        db: impl SqliteExecutor<'e>,
        recipe_id: i64,
    ) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT t.* FROM tags t
            INNER JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(recipe_id)
        .fetch_all(db)
        .await
    }

    /// Ids from `ids` that have no tag row
    pub async fn missing_ids(db: &SqlitePool, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
        let mut missing = Vec::new();
        for id in ids {
            let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?)")
                .bind(id)
                .fetch_one(db)
                .await?;
            if !exists.0 {
                missing.push(*id);
            }
        }
        Ok(missing)
    }

    /// Insert an already-validated tag
    pub async fn create(db: &SqlitePool, req: &CreateTagRequest) -> Result<Tag, sqlx::Error> {
        let result = sqlx::query("INSERT INTO tags (name, slug, color) VALUES (?, ?, ?)")
            .bind(&req.name)
            .bind(&req.slug)
            .bind(&req.color)
            .execute(db)
            .await?;

        sqlx::query_as("SELECT * FROM tags WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub async fn tag(db: &SqlitePool, name: &str, slug: &str, color: &str) -> Tag {
        let req = CreateTagRequest {
            name: name.to_string(),
            slug: slug.to_string(),
            color: color.to_string(),
        };
        Tag::create(db, &req).await.unwrap()
    }
}
