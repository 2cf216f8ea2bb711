use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::User;
use crate::error::ApiError;
use crate::schema::UserRole;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(1)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(data: JwtSessionData) -> Self {
        SessionData {
            username: data.username,
            user_id: data.user_id,
            is_admin: data.role == UserRole::Admin,
            role: data.role,
        }
    }
}

pub fn generate_jwt_session(user: &User) -> String {
    let key: Hmac<Sha256> = Hmac::new_from_slice(b"secret").unwrap();
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims.sign_with_key(&key).unwrap()
}

pub fn verify_jwt_session(token: String) -> Result<JwtSessionData, ApiError> {
    let key: Hmac<Sha256> = Hmac::new_from_slice(b"secret").unwrap();

    token
        .verify_with_key(&key)
        .map_err(|_| ApiError::InvalidSession)
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(ApiError::InvalidSession);
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 7,
            username: String::from("maija"),
            email: String::from("maija@example.com"),
            first_name: String::from("Maija"),
            last_name: String::from("Meikäläinen"),
            password: String::from("unused"),
            role: UserRole::User,
        }
    }

    #[test]
    fn signed_session_verifies_back_to_the_same_claims() {
        let token = generate_jwt_session(&test_user());
        let session = verify_jwt_session(token).unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "maija");
        assert_eq!(session.role, UserRole::User);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = generate_jwt_session(&test_user());
        token.push('x');

        assert!(verify_jwt_session(token).is_err());
    }

    #[test]
    fn admin_session_data_carries_the_admin_flag() {
        let session: SessionData =
            JwtSessionData::new(1, String::from("root"), UserRole::Admin).into();
        assert!(session.is_admin);

        let session: SessionData =
            JwtSessionData::new(2, String::from("maija"), UserRole::User).into();
        assert!(!session.is_admin);
    }
}
