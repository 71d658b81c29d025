//! Aggregated shopping list built from the recipes in a user's cart.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::fmt::Write;

/// One line of the shopping list: an ingredient and its summed amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

impl ShoppingListItem {
    /// Sum ingredient amounts across every recipe in the user's cart.
    ///
    /// Lines are grouped by (name, unit) so that the same ingredient measured
    /// in different units stays on separate lines.
    pub async fn for_user(
        db: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<ShoppingListItem>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT i.name AS name,
                   i.measurement_unit AS measurement_unit,
                   SUM(ri.amount) AS total_amount
            FROM shopping_cart sc
            INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE sc.user_id = ?
            GROUP BY i.name, i.measurement_unit
            ORDER BY i.name, i.measurement_unit
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}

/// Render the plain-text download: a heading followed by `name - amount(unit)` lines
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut out = String::from("Shopping list:\n");
    for item in items {
        let _ = writeln!(
            out,
            "{} - {}({})",
            item.name, item.total_amount, item.measurement_unit
        );
    }
    out
}
