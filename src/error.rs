use std::convert::Infallible;

use serde::Serialize;
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

/// Caller-correctable failures from the recipe submission pipeline.
/// Every variant is raised before any row is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("A recipe needs at least one tag")]
    MissingTags,
    #[error("One or more submitted tags do not exist")]
    UnknownTag,
    #[error("A recipe needs at least one ingredient")]
    MissingIngredients,
    #[error("Ingredient amount must be an unsigned number or a digit string")]
    BadAmountFormat,
    #[error("Ingredient amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Ingredient amount is unreasonably large")]
    AmountTooLarge,
    #[error("None of the submitted ingredients exist")]
    EmptyCatalogMatch,
    #[error("{0}")]
    BadField(String),
}

/// A unique-pair insert collided with an existing row. Never retried:
/// the state the caller asked for already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("Recipe is already in favorites")]
    FavoriteExists,
    #[error("Recipe is already in the shopping cart")]
    CartEntryExists,
    #[error("Subscription already exists")]
    SubscriptionExists,
    #[error("Author already has a recipe with this name")]
    DuplicateRecipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("No such edge to remove")]
    NoSuchEdge,
    #[error("No recipe exists with specified id")]
    UnknownRecipe,
    #[error("No user exists with specified id")]
    UnknownUser,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] Conflict),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error("Users cannot subscribe to themselves")]
    SelfSubscription,
    #[error("Shopping cart is empty")]
    EmptyCart,
    #[error("You don't have permission to perform this action")]
    Unauthorized,
    #[error("Invalid session")]
    InvalidSession,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Database error: {0}")]
    Query(String),
    #[error("Cache error: {0}")]
    Cache(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SelfSubscription => StatusCode::BAD_REQUEST,
            ApiError::EmptyCart => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::InvalidSession => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Query(_) | ApiError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl warp::reject::Reject for ApiError {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Recovery handler for the embedding server. Maps every [`ApiError`] to
/// its own status so clients can tell a bad request from a conflict from
/// a missing row.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(e) = err.find::<ApiError>() {
        if e.status() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("internal error: {e}");
        }
        (e.status(), e.to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some()
        || err.find::<warp::body::BodyDeserializeError>().is_some()
    {
        (StatusCode::BAD_REQUEST, String::from("Malformed request"))
    } else {
        log::error!("unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    let body = warp::reply::json(&ErrorBody { error: message });
    Ok(warp::reply::with_status(body, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_stay_distinct_per_taxonomy() {
        assert_eq!(
            ApiError::from(ValidationError::UnknownTag).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Conflict::FavoriteExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(NotFound::NoSuchEdge).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::SelfSubscription.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Query(String::from("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn conflict_is_not_collapsed_into_validation() {
        let conflict = ApiError::from(Conflict::SubscriptionExists);
        let validation = ApiError::from(ValidationError::MissingTags);
        assert_ne!(conflict.status(), validation.status());
    }
}
