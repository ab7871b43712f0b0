use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    jwt::JwtKeys,
    password,
    repo_types::User,
};
use crate::{
    error::{ApiError, ApiResult},
    store::DocumentStore,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account and issue its first token.
///
/// The duplicate check is a lookup before the insert, so two concurrent
/// registrations of the same address can both pass it.
pub async fn register(
    store: &dyn DocumentStore,
    keys: &JwtKeys,
    payload: RegisterRequest,
) -> ApiResult<AuthResponse> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }

    if User::find_by_email(store, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password: password::hash(payload.password).await?,
        name,
        created_at: OffsetDateTime::now_utc(),
    };
    User::create(store, &user).await?;

    let token = keys.sign(&user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

pub async fn login(
    store: &dyn DocumentStore,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> ApiResult<AuthResponse> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let user = match User::find_by_email(store, &email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !password::verify(payload.password, user.password.clone()).await? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let token = keys.sign(&user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

pub async fn current_user(store: &dyn DocumentStore, user_id: &str) -> ApiResult<PublicUser> {
    User::find_by_id(store, user_id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}
