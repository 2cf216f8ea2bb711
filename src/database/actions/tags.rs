use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};

use crate::{
    cache::cache::{invalidate_catalog, CachedList, CatalogKey},
    constants::{TAG_COLOR_LEN, TAG_NAME_MAX_LEN, TAG_SLUG_MAX_LEN},
    database::error::QueryError,
    error::{ApiError, ValidationError},
    schema::{Tag, Uuid},
};

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY slug")
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(list)
}

/// Catalog read through the redis cache; falls through to the database
/// when the cached copy is missing or stale.
pub async fn list_tags_cached(
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Vec<Tag>, ApiError> {
    let pool = pool.clone();
    CachedList::get_or_list(CatalogKey::Tags, cache, move || async move {
        list_tags(&pool).await
    })
    .await
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

/// Single batch lookup used by the validation pipeline. The `ANY` match
/// collapses duplicate ids.
pub async fn list_tags_by_ids(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ANY($1) ORDER BY slug")
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(list)
}

/// Admin seeding. Returns None when an identical tag already exists.
/// Invalidates the cached catalog on success.
pub async fn create_tag(
    name: &str,
    slug: &str,
    color: &str,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Option<Uuid>, ApiError> {
    check_tag_fields(name, slug, color)?;

    let id: Option<(Uuid,)> = sqlx::query_as(
        "INSERT INTO tags (name, slug, color) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .bind(color)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if id.is_some() {
        invalidate_catalog(cache).await?;
    }

    Ok(id.map(|id| id.0))
}

fn check_tag_fields(name: &str, slug: &str, color: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.chars().count() > TAG_NAME_MAX_LEN {
        return Err(ValidationError::BadField(String::from("Invalid tag name")));
    }
    if slug.is_empty() || slug.chars().count() > TAG_SLUG_MAX_LEN {
        return Err(ValidationError::BadField(String::from("Invalid tag slug")));
    }
    // #rrggbb
    let valid_color = color.len() == TAG_COLOR_LEN
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid_color {
        return Err(ValidationError::BadField(String::from("Invalid tag color")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_fields_are_bounded_and_color_is_a_hex_triplet() {
        assert!(check_tag_fields("Breakfast", "breakfast", "#00ff7f").is_ok());
        assert!(check_tag_fields("", "breakfast", "#00ff7f").is_err());
        assert!(check_tag_fields("Breakfast", "", "#00ff7f").is_err());
        assert!(check_tag_fields("Breakfast", "breakfast", "00ff7f").is_err());
        assert!(check_tag_fields("Breakfast", "breakfast", "#00ff7").is_err());
        assert!(check_tag_fields("Breakfast", "breakfast", "#00gg7f").is_err());
    }
}
