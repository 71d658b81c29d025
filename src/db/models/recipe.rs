//! Recipe models, read representations and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};

use super::common::{Page, PageWindow};
use super::tag::Tag;
use super::user::UserResponse;
use crate::db::filters::RecipeFilter;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i64,
    pub created_at: String,
}

/// Recipe row annotated with the viewer's memberships
#[derive(Debug, Clone, FromRow)]
pub struct AnnotatedRecipe {
    #[sqlx(flatten)]
    pub recipe: Recipe,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// An ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RecipeIngredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Full read representation of a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

/// Compact recipe used by membership and subscription responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShortRecipe {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

/// One `{id, amount}` entry of a recipe payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    /// Absent amounts read as 0 so they fail amount validation
    #[serde(default)]
    pub amount: i64,
}

// DTOs for API

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRecipeRequest {
    #[serde(default)]
    pub ingredients: Vec<IngredientAmount>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub cooking_time: i64,
}

/// Partial update; ingredient and tag sets are still replaced wholesale
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecipeRequest {
    #[serde(default)]
    pub ingredients: Vec<IngredientAmount>,
    #[serde(default)]
    pub tags: Vec<i64>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// Clear and rebuild the ingredient rows and tag links of a recipe
async fn replace_links(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    ingredients: &[IngredientAmount],
    tags: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if !ingredients.is_empty() {
        let mut insert = QueryBuilder::<Sqlite>::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );
        insert.push_values(ingredients, |mut row, item| {
            row.push_bind(recipe_id)
                .push_bind(item.id)
                .push_bind(item.amount);
        });
        insert.build().execute(&mut *conn).await?;
    }

    if !tags.is_empty() {
        let mut insert = QueryBuilder::<Sqlite>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        insert.push_values(tags, |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        insert.build().execute(&mut *conn).await?;
    }

    Ok(())
}

impl Recipe {
    pub async fn get(db: &SqlitePool, id: i64) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Insert a recipe with its ingredient rows and tag links in one transaction
    pub async fn create(
        db: &SqlitePool,
        author_id: i64,
        req: &CreateRecipeRequest,
    ) -> Result<i64, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO recipes (author_id, name, text, image, cooking_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(author_id)
        .bind(&req.name)
        .bind(&req.text)
        .bind(&req.image)
        .bind(req.cooking_time)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        replace_links(&mut tx, id, &req.ingredients, &req.tags).await?;
        tx.commit().await?;

        tracing::info!(recipe_id = id, author_id, "Recipe created");
        Ok(id)
    }

    /// Update header fields and replace ingredient and tag sets in one transaction.
    ///
    /// Any failure rolls the whole update back.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateRecipeRequest,
    ) -> Result<(), sqlx::Error> {
        let mut tx = db.begin().await?;

        sqlx::query(
            r#"
            UPDATE recipes SET
                name = COALESCE(?, name),
                text = COALESCE(?, text),
                image = COALESCE(?, image),
                cooking_time = COALESCE(?, cooking_time)
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
        .bind(&req.text)
        .bind(&req.image)
        .bind(req.cooking_time)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        replace_links(&mut tx, id, &req.ingredients, &req.tags).await?;
        tx.commit().await?;

        tracing::info!(recipe_id = id, "Recipe updated");
        Ok(())
    }

    /// Delete a recipe; ingredient rows, tag links and memberships cascade
    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl RecipeIngredient {
    pub async fn for_recipe<'e>(
        db: impl SqliteExecutor<'e>,
        recipe_id: i64,
    ) -> Result<Vec<RecipeIngredient>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ?
            ORDER BY ri.id
            "#,
        )
        .bind(recipe_id)
        .fetch_all(db)
        .await
    }
}

/// Start a recipe SELECT with the viewer's membership annotations.
///
/// `is_favorited` and `is_in_shopping_cart` are EXISTS subqueries evaluated per
/// row; a `NULL` viewer never matches, so anonymous viewers see both as false.
fn annotated_select<'a>(viewer: Option<i64>) -> QueryBuilder<'a, Sqlite> {
    let mut query = QueryBuilder::new(
        "SELECT r.*, EXISTS(SELECT 1 FROM favorites fav WHERE fav.recipe_id = r.id AND fav.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS is_favorited, EXISTS(SELECT 1 FROM shopping_cart sc WHERE sc.recipe_id = r.id AND sc.user_id = ",
    );
    query.push_bind(viewer);
    query.push(") AS is_in_shopping_cart FROM recipes r WHERE 1 = 1");
    query
}

impl RecipeResponse {
    async fn hydrate(
        db: &SqlitePool,
        row: AnnotatedRecipe,
        viewer: Option<i64>,
    ) -> Result<RecipeResponse, sqlx::Error> {
        let recipe = row.recipe;
        let tags = Tag::for_recipe(db, recipe.id).await?;
        let ingredients = RecipeIngredient::for_recipe(db, recipe.id).await?;
        let author = UserResponse::get(db, recipe.author_id, viewer)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(RecipeResponse {
            id: recipe.id,
            tags,
            author,
            ingredients,
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        })
    }

    pub async fn get(
        db: &SqlitePool,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<Option<RecipeResponse>, sqlx::Error> {
        let mut query = annotated_select(viewer);
        query.push(" AND r.id = ").push_bind(id);

        let row: Option<AnnotatedRecipe> = query.build_query_as().fetch_optional(db).await?;
        match row {
            Some(row) => Ok(Some(Self::hydrate(db, row, viewer).await?)),
            None => Ok(None),
        }
    }

    pub async fn list(
        db: &SqlitePool,
        filter: &RecipeFilter,
        viewer: Option<i64>,
        window: PageWindow,
    ) -> Result<Page<RecipeResponse>, sqlx::Error> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes r WHERE 1 = 1");
        filter.push_conditions(&mut count_query, viewer);
        let count: (i64,) = count_query.build_query_as().fetch_one(db).await?;

        let mut query = annotated_select(viewer);
        filter.push_conditions(&mut query, viewer);
        query
            .push(" ORDER BY r.name, r.id LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);

        let rows: Vec<AnnotatedRecipe> = query.build_query_as().fetch_all(db).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(Self::hydrate(db, row, viewer).await?);
        }

        Ok(Page::new(count.0, results))
    }
}

impl From<Recipe> for ShortRecipe {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

impl ShortRecipe {
    /// An author's recipes by name, optionally truncated
    pub async fn list_by_author(
        db: &SqlitePool,
        author_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ShortRecipe>, sqlx::Error> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.filter(|l| *l >= 0).unwrap_or(-1);
        sqlx::query_as(
            r#"
            SELECT id, name, image, cooking_time FROM recipes
            WHERE author_id = ?
            ORDER BY name, id
            LIMIT ?
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn payload(name: &str, ingredients: &[(i64, i64)], tags: &[i64]) -> CreateRecipeRequest {
        CreateRecipeRequest {
            ingredients: ingredients
                .iter()
                .map(|&(id, amount)| IngredientAmount { id, amount })
                .collect(),
            tags: tags.to_vec(),
            image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            name: name.to_string(),
            text: format!("How to cook {}", name),
            cooking_time: 15,
        }
    }

    pub async fn recipe(
        db: &SqlitePool,
        author_id: i64,
        name: &str,
        ingredients: &[(i64, i64)],
        tags: &[i64],
    ) -> i64 {
        Recipe::create(db, author_id, &payload(name, ingredients, tags))
            .await
            .unwrap()
    }
}
