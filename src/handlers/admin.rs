//! Catalogue management. Every route here sits behind `require_admin`.

use std::collections::HashSet;

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
    handlers::{ValidatedJson, users::resolve_upload_key},
    models::{
        ApiResponse, Book, Chapter, CreateBookRequest, CreateChapterRequest, UpdateBookRequest,
        UpdateChapterRequest, UploadPurpose,
    },
};

/// create_book
///
/// [Admin Route] Adds a book to the catalogue, owned by the calling admin.
#[utoipa::path(
    post,
    path = "/api/v1/admin/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn create_book(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(mut payload): ValidatedJson<CreateBookRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Book>>), ApiError> {
    if payload.tags.is_empty() {
        return Err(ApiError::BadRequest("tags can not be empty".to_string()));
    }
    let mut seen = HashSet::new();
    payload.tags.retain(|tag| seen.insert(*tag));

    let cover_image = payload
        .cover_image_key
        .take()
        .map(|key| resolve_upload_key(&state, &key, UploadPurpose::BookImage))
        .transpose()?;

    let book = state.repo.create_book(payload, cover_image, id).await?;
    tracing::info!("Admin {} created book {}", id, book.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(book).with_message("Book created successfully")),
    ))
}

/// update_book
///
/// [Admin Route] Partial update; tags, when present, replace the whole set.
#[utoipa::path(
    put,
    path = "/api/v1/admin/books/{book_id}",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    ValidatedJson(mut payload): ValidatedJson<UpdateBookRequest>,
) -> Result<Json<ApiResponse<Book>>, ApiError> {
    let cover_image = payload
        .cover_image_key
        .take()
        .map(|key| resolve_upload_key(&state, &key, UploadPurpose::BookImage))
        .transpose()?;
    if let Some(tags) = payload.tags.as_mut() {
        let mut seen = HashSet::new();
        tags.retain(|tag| seen.insert(*tag));
    }

    let book = state
        .repo
        .update_book(book_id, payload, cover_image)
        .await?
        .ok_or_else(|| ApiError::not_found("Book"))?;

    Ok(Json(
        ApiResponse::data(book).with_message("Book updated successfully"),
    ))
}

/// delete_book
///
/// [Admin Route] Removes the book with its chapters, likes, bookmarks, comments and
/// reading-history entries.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/books/{book_id}",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.repo.delete_book(book_id).await? {
        return Err(ApiError::not_found("Book"));
    }
    tracing::info!("Admin {} deleted book {}", id, book_id);

    Ok(Json(ApiResponse::message(
        "Book and associated chapters deleted",
    )))
}

/// add_chapter
///
/// [Admin Route] Appends a chapter; its number is one past the book's highest.
#[utoipa::path(
    post,
    path = "/api/v1/admin/books/{book_id}/chapters",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    request_body = CreateChapterRequest,
    responses(
        (status = 201, description = "Chapter created", body = Chapter),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_chapter(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateChapterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Chapter>>), ApiError> {
    let chapter = state
        .repo
        .add_chapter(book_id, payload, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(chapter).with_message("Chapter added successfully")),
    ))
}

/// update_chapter
#[utoipa::path(
    put,
    path = "/api/v1/admin/chapters/{chapter_id}",
    params(("chapter_id" = Uuid, Path, description = "Chapter ID")),
    request_body = UpdateChapterRequest,
    responses(
        (status = 200, description = "Chapter updated", body = Chapter),
        (status = 404, description = "Chapter not found")
    )
)]
pub async fn update_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateChapterRequest>,
) -> Result<Json<ApiResponse<Chapter>>, ApiError> {
    let chapter = state
        .repo
        .update_chapter(chapter_id, payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Chapter"))?;

    Ok(Json(
        ApiResponse::data(chapter).with_message("Chapter updated successfully"),
    ))
}

/// delete_chapter
///
/// [Admin Route] Remaining chapters keep their numbers.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/books/{book_id}/chapters/{chapter_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book ID"),
        ("chapter_id" = Uuid, Path, description = "Chapter ID")
    ),
    responses(
        (status = 200, description = "Chapter deleted"),
        (status = 404, description = "Chapter not found")
    )
)]
pub async fn delete_chapter(
    State(state): State<AppState>,
    Path((book_id, chapter_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.repo.delete_chapter(book_id, chapter_id).await? {
        return Err(ApiError::not_found("Chapter"));
    }

    Ok(Json(ApiResponse::message("Chapter deleted successfully")))
}
