use std::convert::Infallible;

use warp::{reject::Rejection, Filter};

use crate::error::ApiError;

use super::jwt::{verify_jwt_session, JwtSessionData, SessionData};

pub fn with_auth() -> impl Filter<Extract = ((),), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        if verify_jwt_session(session).is_ok() {
            Ok(())
        } else {
            Err(warp::reject::custom(ApiError::InvalidSession))
        }
    })
}

pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        if let Ok(data) = verify_jwt_session(session) {
            Ok(data.into())
        } else {
            Err(warp::reject::custom(ApiError::InvalidSession))
        }
    })
}

/// Read-side filter for endpoints that render for both members and
/// anonymous visitors. A missing or stale cookie extracts None.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<JwtSessionData>,), Error = Infallible> + Copy {
    warp::cookie::optional::<String>("session").map(move |session: Option<String>| {
        session.and_then(|token| verify_jwt_session(token).ok())
    })
}
