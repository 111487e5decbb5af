use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, models::Role, repository::RepositoryState};

/// bcrypt work factor for stored passwords.
pub const BCRYPT_COST: u32 = 10;

pub const MSG_NO_TOKEN: &str = "Unauthorized. No token provided.";
pub const MSG_EXPIRED_TOKEN: &str = "Token has expired. Please log in again.";
pub const MSG_INVALID_TOKEN: &str = "Invalid token. Please log in or provide a valid token.";
pub const MSG_ADMINS_ONLY: &str = "Access denied. Admins only.";

/// Claims
///
/// Payload of the access tokens this service signs. Validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
}

/// issue_token
///
/// Signs an HS256 token for `user_id`, valid for `ttl`.
pub fn issue_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, ApiError> {
    let now = Utc::now().timestamp() as usize;
    let exp = usize::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| now.checked_add(secs))
        .ok_or_else(|| ApiError::Internal("token lifetime out of range".to_string()))?;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))
}

/// verify_token
///
/// Decodes and validates a token, translating the failure into the message the client sees.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ApiError::Unauthorized(MSG_EXPIRED_TOKEN.to_string()),
        _ => ApiError::Unauthorized(MSG_INVALID_TOKEN.to_string()),
    })
}

/// hash_password
///
/// bcrypt is CPU-bound, so it runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verification task failed: {}", e)))?
        // A corrupt stored hash is treated as a failed match.
        .or(Ok(false))
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers use it for the caller's id
/// and for role checks.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// AuthUser Extractor Implementation
///
/// Makes AuthUser usable as a handler argument. The process:
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Token Extraction: `Authorization: Bearer <token>`.
/// 3. Token Validation: signature and expiry.
/// 4. DB Lookup: the user must still exist; the role is read fresh from the database.
///
/// The resolved identity is cached in the request extensions, so the auth middleware and
/// the handler behind it only pay for one lookup.
///
/// Rejection: `ApiError::Unauthorized` (401) with a message naming the failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<AuthUser>() {
            return Ok(cached.clone());
        }

        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Token Extraction
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(MSG_NO_TOKEN.to_string()))?;

        // 3. Token Validation
        let claims = verify_token(token, &config.jwt_secret)?;

        // 4. Database Lookup
        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(MSG_INVALID_TOKEN.to_string()))?;

        let auth_user = AuthUser {
            id: user.id,
            role: user.role,
        };
        parts.extensions.insert(auth_user.clone());

        Ok(auth_user)
    }
}

/// MaybeAuthUser
///
/// Optional identity for public routes that personalize their answer. A missing or invalid
/// token yields `None`; only database failures are surfaced.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(ApiError::Repository(e)) => Err(ApiError::Repository(e)),
            Err(_) => Ok(MaybeAuthUser(None)),
        }
    }
}

/// require_admin
///
/// Route layer for the admin router. Runs the AuthUser extractor (401 on failure) and then
/// rejects non-admins with 403.
pub async fn require_admin(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !auth_user.is_admin() {
        tracing::warn!("Non-admin user {} attempted an admin route", auth_user.id);
        return Err(ApiError::Forbidden(MSG_ADMINS_ONLY.to_string()));
    }
    Ok(next.run(request).await)
}
