use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};

use crate::{
    cache::cache::{invalidate_catalog, CachedList, CatalogKey},
    constants::{INGREDIENT_COUNT_PER_PAGE, INGREDIENT_NAME_MAX_LEN, MEASUREMENT_UNIT_MAX_LEN},
    database::error::QueryError,
    error::{ApiError, ValidationError},
    pagination::PageContext,
    schema::{Ingredient, Uuid},
};

#[derive(sqlx::FromRow, Debug, Clone)]
struct IngredientRow {
    id: Uuid,
    name: String,
    measurement_unit: String,
    count: i64,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
        }
    }
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let list: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(list)
}

pub async fn list_ingredients_cached(
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Vec<Ingredient>, ApiError> {
    let pool = pool.clone();
    CachedList::get_or_list(CatalogKey::Ingredients, cache, move || async move {
        list_ingredients(&pool).await
    })
    .await
}

/// Prefix search on the ingredient name.
pub async fn fetch_ingredients(
    search: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Ingredient>, ApiError> {
    let pattern = format!("{}%", search.replace('%', "\\%").replace('_', "\\_"));

    let rows: Vec<IngredientRow> = sqlx::query_as(
        "SELECT i.*, COUNT(*) OVER() AS count FROM ingredients i
         WHERE i.name ILIKE $1 ORDER BY i.name LIMIT $2 OFFSET $3",
    )
    .bind(pattern)
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let rows: Vec<Ingredient> = rows.into_iter().map(Ingredient::from).collect();

    Ok(PageContext::from_rows(
        rows,
        total_count,
        INGREDIENT_COUNT_PER_PAGE,
        offset,
    ))
}

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

/// Single batch lookup used by the validation pipeline. Ids absent from
/// the catalog simply yield no row.
pub async fn list_ingredients_by_ids(
    ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let list: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = ANY($1)")
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(list)
}

/// Admin seeding. (name, measurement_unit) is unique; an existing pair
/// yields None. Invalidates the cached catalog on success.
pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Option<Uuid>, ApiError> {
    check_ingredient_fields(name, measurement_unit)?;

    let id: Option<(Uuid,)> = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2)
         ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if id.is_some() {
        invalidate_catalog(cache).await?;
    }

    Ok(id.map(|id| id.0))
}

fn check_ingredient_fields(name: &str, measurement_unit: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.chars().count() > INGREDIENT_NAME_MAX_LEN {
        return Err(ValidationError::BadField(String::from(
            "Invalid ingredient name",
        )));
    }
    if measurement_unit.is_empty() || measurement_unit.chars().count() > MEASUREMENT_UNIT_MAX_LEN {
        return Err(ValidationError::BadField(String::from(
            "Invalid measurement unit",
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_fields_are_bounded() {
        assert!(check_ingredient_fields("flour", "g").is_ok());
        assert!(check_ingredient_fields("", "g").is_err());
        assert!(check_ingredient_fields("flour", "").is_err());
        assert!(check_ingredient_fields(&"a".repeat(INGREDIENT_NAME_MAX_LEN + 1), "g").is_err());
    }
}
