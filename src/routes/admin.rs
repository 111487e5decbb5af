use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{post, put},
};

/// Admin Router Module
///
/// Catalogue management, nested under `/api/v1/admin`. `create_router` wraps this router in
/// the `require_admin` layer, which authenticates the caller and rejects non-admins with 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/books
        .route("/books", post(admin::create_book))
        // PUT/DELETE /admin/books/{book_id}
        // Deleting a book also removes its chapters, likes, bookmarks, comments and history.
        .route(
            "/books/{book_id}",
            put(admin::update_book).delete(admin::delete_book),
        )
        // POST /admin/books/{book_id}/chapters
        // The new chapter is numbered one past the book's highest chapter.
        .route("/books/{book_id}/chapters", post(admin::add_chapter))
        // DELETE /admin/books/{book_id}/chapters/{chapter_id}
        .route(
            "/books/{book_id}/chapters/{chapter_id}",
            axum::routing::delete(admin::delete_chapter),
        )
        // PUT /admin/chapters/{chapter_id}
        .route("/chapters/{chapter_id}", put(admin::update_chapter))
}
