use sqlx::{Pool, Postgres};

use crate::{
    database::error::QueryError,
    error::{ApiError, Conflict, NotFound},
    report::ShoppingList,
    schema::{CartIngredientRow, RecipePreview, Uuid},
};

use super::recipes;

pub async fn is_in_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT recipe_id FROM cart_entries WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(result.is_some())
}

/// Same edge contract as favorites: a duplicate add is a conflict, not a
/// crash, and leaves existing state untouched.
pub async fn add_to_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipePreview, ApiError> {
    let preview = recipes::get_recipe_preview(recipe_id, pool)
        .await?
        .ok_or(NotFound::UnknownRecipe)?;

    let result = sqlx::query(
        "INSERT INTO cart_entries (user_id, recipe_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING RETURNING recipe_id",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Conflict::CartEntryExists.into());
    }

    Ok(preview)
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM cart_entries WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(NotFound::NoSuchEdge.into());
    }

    Ok(())
}

pub async fn has_cart_entries(user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let result: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM cart_entries WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(result.0)
}

/// Every ingredient line of every carted recipe, unmerged. One join
/// feeds the whole aggregation.
pub async fn fetch_cart_ingredient_rows(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredientRow>, ApiError> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM cart_entries c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(rows)
}

/// Builds the merged shopping list for the user's cart. An empty cart is
/// a well-defined state the caller maps to "nothing to export", not a
/// server error.
pub async fn build_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<ShoppingList, ApiError> {
    if !has_cart_entries(user_id, pool).await? {
        return Err(ApiError::EmptyCart);
    }

    let rows = fetch_cart_ingredient_rows(user_id, pool).await?;
    Ok(ShoppingList::from_rows(rows))
}
