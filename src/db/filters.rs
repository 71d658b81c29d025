//! Query filters for list endpoints.
//!
//! Filters are plain values built from query parameters. They never look at
//! the request themselves: the viewer identity is passed in explicitly, and
//! each filter appends its conditions to an `sqlx::QueryBuilder` whose base
//! query already ends in a `WHERE` clause.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use super::common::deserialize_flag;

/// Recipe list filters (`GET /api/recipes`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches when it carries at least one of them
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_favorited: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    /// Append conditions on the recipes alias `r`.
    ///
    /// Membership flags only apply to an authenticated viewer; for anonymous
    /// viewers they are ignored rather than rejected.
    pub fn push_conditions<'a>(&'a self, query: &mut QueryBuilder<'a, Sqlite>, viewer: Option<i64>) {
        if let Some(author) = self.author {
            query.push(" AND r.author_id = ").push_bind(author);
        }

        let slugs: Vec<&str> = self
            .tags
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !slugs.is_empty() {
            query.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug IN (",
            );
            let mut separated = query.separated(", ");
            for slug in slugs {
                separated.push_bind(slug);
            }
            separated.push_unseparated("))");
        }

        if let Some(viewer) = viewer {
            if self.is_favorited {
                query
                    .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                    .push_bind(viewer)
                    .push(")");
            }
            if self.is_in_shopping_cart {
                query
                    .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
                    .push_bind(viewer)
                    .push(")");
            }
        }

        tracing::debug!(filter = ?self, viewer = ?viewer, "Applied recipe filter");
    }
}

/// Ingredient search (`GET /api/ingredients?name=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientFilter {
    /// Name prefix
    #[serde(default)]
    pub name: Option<String>,
}

impl IngredientFilter {
    pub fn push_conditions(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(prefix) = self.name.as_deref().filter(|p| !p.is_empty()) {
            query
                .push(" AND name LIKE ")
                .push_bind(format!("{}%", escape_like(prefix)))
                .push(" ESCAPE '\\'");
        }
    }
}

/// Escape LIKE wildcards so the input is matched literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
