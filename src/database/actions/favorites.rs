use sqlx::{Pool, Postgres};

use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    database::error::QueryError,
    error::{ApiError, Conflict, NotFound},
    pagination::PageContext,
    schema::{RecipePreview, RecipeRow, Uuid},
};

use super::recipes;

pub async fn is_favorite(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT recipe_id FROM favorites WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(result.is_some())
}

/// Adds the unique (user, recipe) edge. A second add for the same pair
/// fails at the constraint layer and surfaces as a conflict, leaving the
/// existing edge untouched.
pub async fn add_favorite(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipePreview, ApiError> {
    let preview = recipes::get_recipe_preview(recipe_id, pool)
        .await?
        .ok_or(NotFound::UnknownRecipe)?;

    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING RETURNING recipe_id",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Conflict::FavoriteExists.into());
    }

    Ok(preview)
}

pub async fn remove_favorite(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
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

pub async fn fetch_favorites(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.id, r.author_id, r.name, r.image, r.text, r.cooking_time,
            TRUE AS is_favorited,
            EXISTS(SELECT 1 FROM cart_entries c WHERE c.recipe_id = r.id AND c.user_id = $1)
                AS is_in_shopping_cart,
            COUNT(*) OVER() AS count
        FROM favorites f
        INNER JOIN recipes r ON r.id = f.recipe_id
        WHERE f.user_id = $1
        ORDER BY r.name LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}
