use sqlx::{Pool, Postgres};

use crate::{
    authentication::{cryptography, jwt::generate_jwt_session},
    constants::{PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN},
    database::error::QueryError,
    error::{ApiError, NotFound, ValidationError},
    schema::{User, UserProfile, Uuid},
};

use super::subscriptions;

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(row)
}

/// Creates a user account with an argon2-hashed password. Returns false
/// when the username or email is already taken.
pub async fn register_user(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    check_username(username)?;
    check_email(email)?;
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ValidationError::BadField(String::from("Password is too short")).into());
    }

    let hash = cryptography::hash_password(password.to_string())
        .map_err(|e| ApiError::Query(format!("Failed to hash password: {e}")))?;

    let query = sqlx::query(
        "
        INSERT INTO users (username, email, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(username)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(hash)
    .execute(pool)
    .await
    .map_err(|e| ApiError::from(QueryError::from(e)))?;

    Ok(query.rows_affected() > 0)
}

pub async fn login_user(
    username: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = match get_user(pool, username).await? {
        Some(user) => user,
        None => return Err(ApiError::InvalidCredentials),
    };

    let authenticated = cryptography::verify_password(password, &user.password)
        .map_err(|_e| ApiError::InvalidCredentials)?;
    if !authenticated {
        return Err(ApiError::InvalidCredentials);
    }

    Ok(generate_jwt_session(&user))
}

/// Read-side profile with `is_subscribed` computed relative to the
/// viewer. Anonymous viewers and self-views read false.
pub async fn get_user_profile(
    user_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, ApiError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or(NotFound::UnknownUser)?;

    let is_subscribed = match viewer {
        Some(viewer) if viewer != user.id => {
            subscriptions::is_subscribed(viewer, user.id, pool).await?
        }
        _ => false,
    };

    Ok(UserProfile::from_user(user, is_subscribed))
}

fn check_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(ValidationError::BadField(String::from(
            "Username is too short",
        )));
    }
    if len > USERNAME_MAX_LEN {
        return Err(ValidationError::BadField(String::from(
            "Username is too long",
        )));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::BadField(String::from(
            "Username contains a forbidden character",
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(ValidationError::BadField(String::from(
            "Enter a valid email address",
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_word_characters_within_bounds() {
        assert!(check_username("maija_m").is_ok());
        assert!(check_username("ab").is_err());
        assert!(check_username(&"a".repeat(USERNAME_MAX_LEN + 1)).is_err());
        assert!(check_username("maija m").is_err());
        assert!(check_username("maija!").is_err());
    }

    #[test]
    fn emails_need_a_local_part_and_a_dotted_domain() {
        assert!(check_email("maija@example.com").is_ok());
        assert!(check_email("@example.com").is_err());
        assert!(check_email("maija@localhost").is_err());
        assert!(check_email("maija.example.com").is_err());
    }
}
