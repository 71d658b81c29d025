//! Ingredient catalog models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::db::filters::IngredientFilter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

impl Ingredient {
    pub async fn list(
        db: &SqlitePool,
        filter: &IngredientFilter,
    ) -> Result<Vec<Ingredient>, sqlx::Error> {
        let mut query = sqlx::QueryBuilder::new("SELECT * FROM ingredients WHERE 1 = 1");
        filter.push_conditions(&mut query);
        query.push(" ORDER BY name, measurement_unit");

        query.build_query_as().fetch_all(db).await
    }

    pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<Ingredient>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM ingredients WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Ids from `ids` that have no ingredient row
    pub async fn missing_ids(db: &SqlitePool, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
        let mut missing = Vec::new();
        for id in ids {
            let exists: (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM ingredients WHERE id = ?)")
                    .bind(id)
                    .fetch_one(db)
                    .await?;
            if !exists.0 {
                missing.push(*id);
            }
        }
        Ok(missing)
    }

    /// Insert an already-validated ingredient
    pub async fn create(
        db: &SqlitePool,
        req: &CreateIngredientRequest,
    ) -> Result<Ingredient, sqlx::Error> {
        let result = sqlx::query("INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?)")
            .bind(&req.name)
            .bind(&req.measurement_unit)
            .execute(db)
            .await?;

        sqlx::query_as("SELECT * FROM ingredients WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }
}
