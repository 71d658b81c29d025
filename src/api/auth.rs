use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::error::ApiError;
use crate::db::User;
use crate::AppState;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Hash an API token the way the issuer stores it
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the token from the Authorization header.
///
/// Accepts `Token <key>` and `Bearer <key>`. `Ok(None)` means no header was
/// sent; a header in any other shape is an error.
fn extract_token(headers: &axum::http::HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(header) = headers.get("Authorization") else {
        return Ok(None);
    };

    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;

    let token = value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header"))?;

    Ok(Some(token.to_string()))
}

/// Resolve the request's identity; `None` for anonymous requests
async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(token) = extract_token(&parts.headers)? else {
        return Ok(None);
    };

    let user = User::find_by_token_hash(&state.db, &hash_token(&token))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    Ok(Some(user))
}

/// Extractor for routes that require an authenticated user
#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided"))
    }
}

/// Extractor for routes open to anonymous viewers.
///
/// A missing header yields `MaybeUser(None)`; a bad token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(current_user(parts, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    use axum::http::{HeaderMap, HeaderValue};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token(&HeaderMap::new()).unwrap(), None);
        assert_eq!(
            extract_token(&headers("Token abc123")).unwrap().as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_token(&headers("Bearer abc123")).unwrap().as_deref(),
            Some("abc123")
        );
        assert!(extract_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_token(&headers("Token ")).is_err());
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let hash = hash_token("secret");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("secret"));
        assert_ne!(hash, hash_token("Secret"));
    }

    #[test]
    fn test_hash_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong horse", &parsed)
            .is_err());
    }
}
