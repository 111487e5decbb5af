use crate::{
    AppState,
    handlers::{engagement, uploads, users},
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Authenticated Router Module
///
/// Routes for any signed-in reader. The router is wrapped by the auth middleware in
/// `create_router`, so every handler here receives a validated `AuthUser`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Profile ---
        // GET/PUT /user/profile
        .route(
            "/user/profile",
            get(users::get_profile).put(users::update_profile),
        )
        // GET /user/bookmarks?page=&limit=
        .route("/user/bookmarks", get(users::get_bookmarks))
        // GET /user/history
        // The ten most recently read books, newest first.
        .route("/user/history", get(users::get_history))
        // --- Engagement ---
        // POST /books/{book_id}/toggle-like
        // Likes or unlikes; the response carries the updated like count.
        .route("/books/{book_id}/toggle-like", post(engagement::toggle_like))
        // POST /books/{book_id}/toggle-bookmark
        .route(
            "/books/{book_id}/toggle-bookmark",
            post(engagement::toggle_bookmark),
        )
        // POST /books/{book_id}/comments
        .route("/books/{book_id}/comments", post(engagement::add_comment))
        // DELETE /comments/{comment_id}
        // Authors delete their own comments; admins may delete any.
        .route("/comments/{comment_id}", delete(engagement::delete_comment))
        // --- Media ---
        // POST /upload/presigned
        // Short-lived S3 URL for a direct image upload (avatars, book covers).
        .route("/upload/presigned", post(uploads::get_presigned_url))
}
