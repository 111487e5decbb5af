use crate::{
    AppState,
    handlers::{books, engagement, users},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints: account creation and login, plus the read-only catalogue.
/// Mounted under `/api/v1`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // --- Accounts ---
        // POST /user/register
        // Creates a reader account (or an admin account when ALLOW_ADMIN_SIGNUP is on).
        .route("/user/register", post(users::register))
        // POST /user/login
        // Returns the access token in the Authorization response header.
        .route("/user/login", post(users::login))
        // --- Catalogue ---
        // GET /books/search?keyword=&category=&tags=&status=&page=&limit=
        // Newest first; `tags` is comma-separated and all of them must match.
        .route("/books/search", get(books::search_books))
        // GET /books/recommended?limit=
        // Personalized when a valid token is present, otherwise the guest mix.
        .route("/books/recommended", get(books::get_recommended_books))
        // GET /books/{book_id}
        // Book detail with chapter list; counts a view.
        .route("/books/{book_id}", get(books::get_book))
        // GET /books/{book_id}/chapters/{chapter_id}
        // Records the read in the caller's history when a valid token is present.
        .route(
            "/books/{book_id}/chapters/{chapter_id}",
            get(books::get_chapter),
        )
        // GET /books/{book_id}/comments
        .route("/books/{book_id}/comments", get(engagement::get_comments))
}
