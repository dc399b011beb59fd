use super::cookie::CookiePolicy;
use super::error::*;
use crate::application_port::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use validator::Validate;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{self, Reply, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Tokens travel only in cookies; the body reports when they expire.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<&IssuedTokenPair> for SessionResponse {
    fn from(tokens: &IssuedTokenPair) -> Self {
        SessionResponse {
            access_token_expires_at: tokens.access_token_expires_at,
            refresh_token_expires_at: tokens.refresh_token_expires_at,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 20, message = "username must be 3-20 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 16, message = "password must be 8-16 characters"))]
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn session_reply(
    tokens: &IssuedTokenPair,
    status: StatusCode,
    cookie_policy: CookiePolicy,
) -> Result<Response, warp::Rejection> {
    let json = warp::reply::json(&ApiResponse::ok(SessionResponse::from(tokens)));
    cookie_policy
        .attach(warp::reply::with_status(json, status).into_response(), tokens)
        .map_err(ApiErrorCode::internal)
        .map_err(reject::custom)
}

pub async fn register(
    body: RegisterRequest,
    auth_service: Arc<dyn AuthService>,
    cookie_policy: CookiePolicy,
) -> Result<Response, warp::Rejection> {
    body.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let registration_input = RegistrationInput {
        username: body.username,
        password: body.password,
    };
    let tokens = auth_service
        .registration(registration_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    session_reply(&tokens, StatusCode::CREATED, cookie_policy)
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    cookie_policy: CookiePolicy,
) -> Result<Response, warp::Rejection> {
    let login_input = LoginInput {
        username: body.username,
        password: body.password,
    };
    let tokens = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    session_reply(&tokens, StatusCode::OK, cookie_policy)
}
