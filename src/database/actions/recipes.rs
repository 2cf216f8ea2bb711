use std::collections::HashMap;

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::RECIPE_COUNT_PER_PAGE,
    database::error::QueryError,
    error::{ApiError, Conflict, NotFound},
    pagination::PageContext,
    schema::{
        Ingredient, Recipe, RecipeIngredientRow, RecipePreview, RecipeRow, RecipeView, Tag, Uuid,
    },
    validation::{RecipeDraft, RecipePatch},
};

use super::{cart, favorites, users};

/// Read-path filters. The two flag filters are scoped to the requesting
/// user and are no-ops for anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilters {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

pub async fn fetch_recipes(
    filters: &RecipeFilters,
    viewer: Option<Uuid>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, \
         EXISTS(SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS is_favorited, \
         EXISTS(SELECT 1 FROM cart_entries c WHERE c.recipe_id = r.id AND c.user_id = ",
    );
    query.push_bind(viewer);
    query.push(") AS is_in_shopping_cart, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filters.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    if !filters.tags.is_empty() {
        query.push(
            " AND EXISTS(SELECT 1 FROM recipe_tags rt \
             INNER JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = r.id AND t.slug = ANY(",
        );
        query.push_bind(filters.tags.clone());
        query.push("))");
    }
    if let Some(viewer) = viewer {
        if filters.is_favorited {
            query.push(
                " AND EXISTS(SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
            );
            query.push_bind(viewer);
            query.push(")");
        }
        if filters.is_in_shopping_cart {
            query.push(
                " AND EXISTS(SELECT 1 FROM cart_entries c \
                 WHERE c.recipe_id = r.id AND c.user_id = ",
            );
            query.push_bind(viewer);
            query.push(")");
        }
    }

    query.push(" ORDER BY r.name LIMIT ");
    query.push_bind(RECIPE_COUNT_PER_PAGE);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let rows: Vec<RecipeRow> = query
        .build_query_as()
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

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn get_recipe_preview(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipePreview>, ApiError> {
    let row: Option<RecipePreview> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

/// Fetches a recipe for mutation: the session must be allowed to manage
/// its own recipes, and only admins may touch other authors' recipes.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != Some(session.user_id) {
                    Err(ApiError::Unauthorized)
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(NotFound::UnknownRecipe.into()),
    }
}

/// Inserts the recipe row, its tag links and its ingredient amounts in
/// one transaction; a failure partway rolls back every write.
pub async fn create_recipe(
    draft: &RecipeDraft,
    tags: &[Tag],
    ingredient_amounts: &HashMap<Uuid, (Ingredient, i32)>,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let mut tx = pool.begin().await.map_err(|e| ApiError::from(QueryError::from(e)))?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(&draft.image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| QueryError::from(e).into_conflict(Conflict::DuplicateRecipe))?;

    link_tags(&mut tx, recipe.id, tags).await?;
    link_ingredients(&mut tx, recipe.id, ingredient_amounts).await?;

    tx.commit().await.map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(recipe)
}

/// Patches scalar fields and, when a new set is supplied, fully replaces
/// the tag links and the ingredient amounts. Never merges. Concurrent
/// updates are not coordinated here; the last writer wins.
pub async fn update_recipe(
    recipe_id: Uuid,
    patch: &RecipePatch,
    tags: Option<&[Tag]>,
    ingredient_amounts: Option<&HashMap<Uuid, (Ingredient, i32)>>,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let mut tx = pool.begin().await.map_err(|e| ApiError::from(QueryError::from(e)))?;

    let recipe: Recipe = sqlx::query_as(
        "
        UPDATE recipes SET
        name = COALESCE($1, name),
        image = COALESCE($2, image),
        text = COALESCE($3, text),
        cooking_time = COALESCE($4, cooking_time)
        WHERE id = $5
        RETURNING *
    ",
    )
    .bind(&patch.name)
    .bind(&patch.image)
    .bind(&patch.text)
    .bind(patch.cooking_time)
    .bind(recipe_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| QueryError::from(e).into_conflict(Conflict::DuplicateRecipe))?;

    if let Some(tags) = tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;

        link_tags(&mut tx, recipe_id, tags).await?;
    }

    if let Some(ingredient_amounts) = ingredient_amounts {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;

        link_ingredients(&mut tx, recipe_id, ingredient_amounts).await?;
    }

    tx.commit().await.map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(recipe)
}

pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(NotFound::UnknownRecipe.into());
    }

    Ok(())
}

async fn link_tags(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tags: &[Tag],
) -> Result<(), ApiError> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query.push_values(tags, |mut b, tag| {
        b.push_bind(recipe_id).push_bind(tag.id);
    });

    query
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(())
}

async fn link_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    ingredient_amounts: &HashMap<Uuid, (Ingredient, i32)>,
) -> Result<(), ApiError> {
    if ingredient_amounts.is_empty() {
        return Ok(());
    }

    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query.push_values(ingredient_amounts.values(), |mut b, (ingredient, amount)| {
        b.push_bind(recipe_id).push_bind(ingredient.id).push_bind(*amount);
    });

    query
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(())
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.* FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.slug
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(list)
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, ApiError> {
    let list: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(list)
}

/// Detail view: scalars plus tags, ingredient lines, the author profile
/// and the per-requester flags.
pub async fn get_recipe_view(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe(id, pool).await?.ok_or(NotFound::UnknownRecipe)?;

    let tags = list_recipe_tags(recipe.id, pool).await?;
    let ingredients = list_recipe_ingredients(recipe.id, pool).await?;

    let author = match recipe.author_id {
        Some(author_id) => Some(users::get_user_profile(author_id, viewer, pool).await?),
        None => None,
    };

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            favorites::is_favorite(recipe.id, viewer, pool).await?,
            cart::is_in_cart(recipe.id, viewer, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author,
        name: recipe.name,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Capped preview of an author's recipes, embedded in subscription
/// entries.
pub async fn list_author_previews(
    author_id: Uuid,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePreview>, ApiError> {
    let list: Vec<RecipePreview> = sqlx::query_as(
        "SELECT id, name, image, cooking_time FROM recipes
         WHERE author_id = $1 ORDER BY name LIMIT $2",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(list)
}
