use crate::{AppState, error::AppError};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use core_types::UserAccount;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "harvest_session";

/// A fresh random session token. Only the client ever sees it in clear.
pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The form a token takes in the `sessions` table.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// An empty cookie with the same name and path, for removal.
pub fn expired_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(verified.unwrap_or(false))
}

/// The signed-in account behind the request's session cookie.
///
/// Handlers that take this extractor answer 401 to anonymous requests.
/// Wrap it in `Option` for pages that also serve signed-out visitors.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserAccount,
    pub token_hash: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Please log in to access this page.".to_string()))?;

        let token_hash = hash_token(&token);
        let user = state
            .repo
            .find_session_user(&token_hash, Utc::now())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Your session has expired. Please log in again.".to_string()))?;

        Ok(CurrentUser { user, token_hash })
    }
}
