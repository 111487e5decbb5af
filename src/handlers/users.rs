use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
};

use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    handlers::ValidatedJson,
    models::{
        ApiResponse, BookmarkedBook, LoginRequest, NewUser, PageQuery, Pagination,
        ReadingHistoryEntry, RegisterRequest, Role, UpdateProfileRequest, UploadPurpose,
        UserProfile,
    },
};

/// register
///
/// [Public Route] Creates an account. The password is stored as a bcrypt hash and is never
/// echoed back. Admin accounts can only be created when `ALLOW_ADMIN_SIGNUP` is enabled.
#[utoipa::path(
    post,
    path = "/api/v1/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Validation failed or user already exists"),
        (status = 403, description = "Admin signup disabled")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let role = payload.role.unwrap_or_default();
    if role == Role::Admin && !state.config.allow_admin_signup {
        return Err(ApiError::Forbidden(
            "Admin accounts cannot be created through registration".to_string(),
        ));
    }

    if state
        .repo
        .user_exists(&payload.email, &payload.username)
        .await?
    {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = auth::hash_password(payload.password).await?;
    let user = state
        .repo
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            role,
        })
        .await?;

    tracing::info!("Registered user {} ({:?})", user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(UserProfile::from(user)).with_message("User created successfully")),
    ))
}

/// login
///
/// [Public Route] Verifies the credentials and returns the access token in the
/// `Authorization: Bearer <token>` response header.
#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; token in the Authorization header"),
        (status = 401, description = "Unknown account or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<(HeaderMap, Json<ApiResponse<()>>), ApiError> {
    let user = state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account doesn't exist".to_string()))?;

    if !auth::verify_password(payload.password, user.password_hash.clone()).await? {
        return Err(ApiError::Unauthorized("Authentication failed".to_string()));
    }

    let token = auth::issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl)?;
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ApiError::Internal(format!("invalid token header: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value);

    Ok((
        headers,
        Json(ApiResponse::message(
            "User logged in, see Authorization header for token",
        )),
    ))
}

/// get_profile
///
/// [Authenticated Route] The caller's account, without the password hash.
#[utoipa::path(
    get,
    path = "/api/v1/user/profile",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(ApiResponse::data(user.into())))
}

/// update_profile
///
/// [Authenticated Route] Partial update of username, e-mail and avatar. `avatarKey` must be
/// an avatar key previously issued by the presigned upload endpoint.
#[utoipa::path(
    put,
    path = "/api/v1/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or e-mail already taken")
    )
)]
pub async fn update_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(mut payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let avatar_url = payload
        .avatar_key
        .take()
        .map(|key| resolve_upload_key(&state, &key, UploadPurpose::Avatar))
        .transpose()?;

    let user = state
        .repo
        .update_user_profile(id, payload, avatar_url)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(
        ApiResponse::data(UserProfile::from(user)).with_message("Profile updated successfully"),
    ))
}

/// get_bookmarks
///
/// [Authenticated Route] The caller's bookmarked books, newest bookmark first.
#[utoipa::path(
    get,
    path = "/api/v1/user/bookmarks",
    params(PageQuery),
    responses((status = 200, description = "Bookmarked books", body = [BookmarkedBook]))
)]
pub async fn get_bookmarks(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<BookmarkedBook>>>, ApiError> {
    let (page, limit) = query.resolve();
    let offset = PageQuery::offset(page, limit)
        .ok_or_else(|| ApiError::BadRequest("page is out of range".to_string()))?;
    let (bookmarks, total) = state
        .repo
        .get_user_bookmarks(id, offset, limit)
        .await?;

    Ok(Json(ApiResponse::list(
        bookmarks,
        Some(Pagination::new(total, page, limit)),
    )))
}

/// get_history
///
/// [Authenticated Route] The caller's most recently read books (at most ten), newest first.
#[utoipa::path(
    get,
    path = "/api/v1/user/history",
    responses((status = 200, description = "Reading history", body = [ReadingHistoryEntry]))
)]
pub async fn get_history(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ReadingHistoryEntry>>>, ApiError> {
    let history = state.repo.get_reading_history(id).await?;
    Ok(Json(ApiResponse::list(history, None)))
}

/// resolve_upload_key
///
/// Turns an object key from the upload flow into its public URL. Keys outside the folder
/// of the expected purpose are rejected.
pub(crate) fn resolve_upload_key(
    state: &AppState,
    key: &str,
    purpose: UploadPurpose,
) -> Result<String, ApiError> {
    let key = crate::storage::sanitize_key(key);
    let folder = format!("{}/", purpose.prefix());
    if !key.starts_with(&folder) || key.len() == folder.len() {
        return Err(ApiError::BadRequest(format!(
            "Invalid {} upload key",
            purpose.prefix()
        )));
    }
    Ok(state.storage.public_url(&key))
}
