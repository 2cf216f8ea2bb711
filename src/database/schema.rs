use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some("user") => Ok(Self::User),
            Some("admin") => Ok(Self::Admin),
            Some(other) => Err(ValidationError::BadField(format!(
                "Invalid user role: {other}"
            ))),
            None => Err(ValidationError::BadField(String::from(
                "Failed to parse value as string",
            ))),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

/// Read-side user representation. Never carries the password hash;
/// `is_subscribed` is relative to the requesting user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// Catalog reference data. Immutable once referenced by recipes.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// Catalog reference data. (name, measurement_unit) is unique; the same
/// name under a different unit is a distinct ingredient.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    /// None once the author account has been deleted.
    pub author_id: Option<Uuid>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// List-query row: recipe scalars plus the per-requester flags and the
/// window total used for pagination.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,

    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,

    pub count: i64,
}

/// Short recipe representation embedded in edge responses and
/// subscription entries.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipePreview {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// One ingredient line of a recipe, joined with its catalog entry.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One ingredient line contributed by a carted recipe, before merging.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: Option<UserProfile>,
    pub name: String,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    pub recipes_count: i64,
    pub count: i64,
}

/// Subscription entry enriched with the author's recipe count and a
/// capped preview of their recipes.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipePreview>,
    pub recipes_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_role_parses_known_variants() {
        assert_eq!(UserRole::try_from(json!("user")), Ok(UserRole::User));
        assert_eq!(UserRole::try_from(json!("admin")), Ok(UserRole::Admin));
    }

    #[test]
    fn user_role_rejects_unknown_input() {
        assert!(UserRole::try_from(json!("root")).is_err());
        assert!(UserRole::try_from(json!(42)).is_err());
    }
}
