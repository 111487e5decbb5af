use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::MaybeAuthUser,
    error::ApiError,
    models::{
        ApiResponse, Book, BookDetail, BookSearchQuery, Chapter, PageQuery, Pagination,
        RecommendationQuery,
    },
    recommendations,
};

/// search_books
///
/// [Public Route] Filters books by keyword (title or author, case-insensitive), category,
/// status and tags (all listed tags must match). Newest first, paginated.
#[utoipa::path(
    get,
    path = "/api/v1/books/search",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = [Book]),
        (status = 400, description = "Unknown tag or page out of range")
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<BookSearchQuery>,
) -> Result<Json<ApiResponse<Vec<Book>>>, ApiError> {
    let (filter, paging) = query.into_parts().map_err(ApiError::BadRequest)?;
    let (page, limit) = paging.resolve();
    let offset = PageQuery::offset(page, limit)
        .ok_or_else(|| ApiError::BadRequest("page is out of range".to_string()))?;

    let (books, total) = state
        .repo
        .search_books(&filter, offset, limit)
        .await?;

    Ok(Json(ApiResponse::list(
        books,
        Some(Pagination::new(total, page, limit)),
    )))
}

/// get_recommended_books
///
/// [Public Route, optional auth] A blended feed. Signed-in readers get books matching
/// their reading history mixed with popular and random picks; guests get popular, recent
/// and random picks. Never contains duplicates or books the reader already read.
#[utoipa::path(
    get,
    path = "/api/v1/books/recommended",
    params(RecommendationQuery),
    responses((status = 200, description = "Recommended books", body = [Book]))
)]
pub async fn get_recommended_books(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<ApiResponse<Vec<Book>>>, ApiError> {
    let limit = recommendations::resolve_limit(query.limit);
    let books =
        recommendations::recommend_books(state.repo.as_ref(), user.map(|u| u.id), limit).await?;

    Ok(Json(ApiResponse::list(books, None)))
}

/// get_book
///
/// [Public Route] Book detail with the uploader's username and the chapter list in reading
/// order. Each call counts as a view.
#[utoipa::path(
    get,
    path = "/api/v1/books/{book_id}",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book detail", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookDetail>>, ApiError> {
    let detail = state
        .repo
        .get_book_detail(book_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book"))?;

    Ok(Json(ApiResponse::data(detail)))
}

/// get_chapter
///
/// [Public Route, optional auth] A single chapter of a book. For signed-in readers the read
/// is recorded in their reading history.
#[utoipa::path(
    get,
    path = "/api/v1/books/{book_id}/chapters/{chapter_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book ID"),
        ("chapter_id" = Uuid, Path, description = "Chapter ID")
    ),
    responses(
        (status = 200, description = "Chapter", body = Chapter),
        (status = 404, description = "Book or chapter not found")
    )
)]
pub async fn get_chapter(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path((book_id, chapter_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Chapter>>, ApiError> {
    if state.repo.get_book(book_id).await?.is_none() {
        return Err(ApiError::not_found("Book"));
    }

    let chapter = state
        .repo
        .get_chapter(book_id, chapter_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Chapter not found in the specified book".to_string())
        })?;

    if let Some(user) = user {
        state
            .repo
            .record_reading(user.id, book_id, chapter.id)
            .await?;
    }

    Ok(Json(ApiResponse::data(chapter)))
}
