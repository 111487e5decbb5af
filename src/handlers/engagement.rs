use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    handlers::ValidatedJson,
    models::{ApiResponse, Bookmark, BookmarkToggle, Comment, CreateCommentRequest, Like, LikeToggle},
};

/// toggle_like
///
/// [Authenticated Route] Likes the book, or removes the caller's like if there is one.
/// The response carries the book's like counter after the change.
#[utoipa::path(
    post,
    path = "/api/v1/books/{book_id}/toggle-like",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Book liked", body = Like),
        (status = 200, description = "Book unliked"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn toggle_like(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Like>>), ApiError> {
    let outcome = state
        .repo
        .toggle_like(id, book_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book"))?;

    Ok(match outcome {
        LikeToggle::Liked { like, like_count } => (
            StatusCode::CREATED,
            Json(
                ApiResponse::data(like)
                    .with_message("Book liked successfully")
                    .with_like_count(like_count),
            ),
        ),
        LikeToggle::Unliked { like_count } => (
            StatusCode::OK,
            Json(ApiResponse::message("Book unliked successfully").with_like_count(like_count)),
        ),
    })
}

/// toggle_bookmark
///
/// [Authenticated Route] Bookmarks the book, or removes the caller's bookmark.
#[utoipa::path(
    post,
    path = "/api/v1/books/{book_id}/toggle-bookmark",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Book bookmarked", body = Bookmark),
        (status = 200, description = "Bookmark removed"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn toggle_bookmark(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Bookmark>>), ApiError> {
    let outcome = state
        .repo
        .toggle_bookmark(id, book_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book"))?;

    Ok(match outcome {
        BookmarkToggle::Added(bookmark) => (
            StatusCode::CREATED,
            Json(ApiResponse::data(bookmark).with_message("Book bookmarked successfully")),
        ),
        BookmarkToggle::Removed => (
            StatusCode::OK,
            Json(ApiResponse::message("Bookmark removed successfully")),
        ),
    })
}

/// add_comment
///
/// [Authenticated Route] Posts a comment (1-100 characters) on a book.
#[utoipa::path(
    post,
    path = "/api/v1/books/{book_id}/comments",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_comment(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), ApiError> {
    if state.repo.get_book(book_id).await?.is_none() {
        return Err(ApiError::not_found("Book"));
    }

    let comment = state
        .repo
        .add_comment(book_id, id, payload.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(comment).with_message("Comment added successfully")),
    ))
}

/// get_comments
///
/// [Public Route] A book's comments with their authors' usernames, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/books/{book_id}/comments",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_comments(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    if state.repo.get_book(book_id).await?.is_none() {
        return Err(ApiError::not_found("Book"));
    }

    let comments = state.repo.get_comments(book_id).await?;
    Ok(Json(ApiResponse::list(comments, None)))
}

/// delete_comment
///
/// [Authenticated Route] Owners delete their own comments; admins may delete any comment.
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{comment_id}",
    params(("comment_id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 403, description = "Not the comment's author"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let comment = state
        .repo
        .get_comment(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    if comment.user_id != auth_user.id && !auth_user.is_admin() {
        return Err(ApiError::Forbidden(
            "Unauthorized to delete this comment".to_string(),
        ));
    }

    if !state.repo.delete_comment(comment_id).await? {
        return Err(ApiError::not_found("Comment"));
    }

    Ok(Json(ApiResponse::message("Comment deleted successfully")))
}
