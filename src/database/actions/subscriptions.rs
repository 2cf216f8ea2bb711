use sqlx::{Pool, Postgres};

use crate::{
    constants::{RECIPE_PREVIEW_COUNT, SUBSCRIPTION_COUNT_PER_PAGE},
    database::error::QueryError,
    error::{ApiError, Conflict, NotFound},
    pagination::PageContext,
    schema::{SubscriptionRow, SubscriptionView, User, Uuid},
};

use super::{recipes, users};

pub async fn is_subscribed(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE subscriber_id = $1 AND author_id = $2",
    )
    .bind(subscriber_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(result.is_some())
}

/// Subscribes the user to an author. Self-subscription is rejected
/// before the uniqueness constraint gets a say.
pub async fn subscribe(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, ApiError> {
    if subscriber_id == author_id {
        return Err(ApiError::SelfSubscription);
    }

    let author = users::get_user_by_id(pool, author_id)
        .await?
        .ok_or(NotFound::UnknownUser)?;

    let result = sqlx::query(
        "INSERT INTO subscriptions (subscriber_id, author_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING RETURNING author_id",
    )
    .bind(subscriber_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Conflict::SubscriptionExists.into());
    }

    subscription_view(author, pool).await
}

pub async fn unsubscribe(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result =
        sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND author_id = $2")
            .bind(subscriber_id)
            .bind(author_id)
            .execute(pool)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(NotFound::NoSuchEdge.into());
    }

    Ok(())
}

/// The user's subscriptions, each entry carrying the author's recipe
/// count and a capped recipe preview.
pub async fn fetch_subscriptions(
    subscriber_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionView>, ApiError> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.subscriber_id = $1
        ORDER BY u.username LIMIT $2 OFFSET $3
    ",
    )
    .bind(subscriber_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let previews = recipes::list_author_previews(row.id, RECIPE_PREVIEW_COUNT, pool).await?;
        views.push(SubscriptionView {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_subscribed: true,
            recipes: previews,
            recipes_count: row.recipes_count,
        });
    }

    Ok(PageContext::from_rows(
        views,
        total_count,
        SUBSCRIPTION_COUNT_PER_PAGE,
        offset,
    ))
}

async fn subscription_view(author: User, pool: &Pool<Postgres>) -> Result<SubscriptionView, ApiError> {
    let recipes_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author.id)
            .fetch_one(pool)
            .await
            .map_err(|e| ApiError::from(QueryError::from(e)))?;

    let previews = recipes::list_author_previews(author.id, RECIPE_PREVIEW_COUNT, pool).await?;

    Ok(SubscriptionView {
        id: author.id,
        username: author.username,
        email: author.email,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes: previews,
        recipes_count: recipes_count.0,
    })
}
