use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        debug!("undecodable body: {}", e);
        ApiErrorCode::InvalidInput
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        ApiErrorCode::PayloadTooLarge
    } else if err.find::<reject::LengthRequired>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::InvalidInput
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else {
        warn!("unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("invalid input")]
    InvalidInput,
    #[error("not valid login or password")]
    ValidationFailed,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidInput | ApiErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ApiErrorCode::UsernameTaken => StatusCode::CONFLICT,
            ApiErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(e) => {
                debug!("rejected input: {}", e);
                ApiErrorCode::ValidationFailed
            }
            AuthError::AlreadyExists => ApiErrorCode::UsernameTaken,
            // One answer for both, so responses do not reveal which usernames exist.
            AuthError::NotFound | AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::Hashing(e) | AuthError::TokenGeneration(e) | AuthError::Persistence(e) => {
                ApiErrorCode::internal(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::Validation("short".into()), StatusCode::BAD_REQUEST),
            (AuthError::AlreadyExists, StatusCode::CONFLICT),
            (AuthError::NotFound, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::Hashing("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::TokenGeneration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::Persistence("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(ApiErrorCode::from(error).status(), status);
        }
    }

    #[test]
    fn unknown_user_and_bad_password_look_the_same() {
        assert_eq!(
            ApiErrorCode::from(AuthError::NotFound),
            ApiErrorCode::from(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let code = ApiErrorCode::from(AuthError::Persistence(
            "Duplicate entry 'alice' for key 'users.uq_users_username'".into(),
        ));
        assert_eq!(code.to_string(), "Internal error");
    }
}
