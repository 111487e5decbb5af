use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod recommendations;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// Every versioned endpoint lives under this prefix.
pub const API_PREFIX: &str = "/api/v1";

/// ApiDoc
///
/// Auto-generated OpenAPI document for every `#[utoipa::path]` handler and every
/// `ToSchema` model. Served at `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::users::register, handlers::users::login, handlers::users::get_profile,
        handlers::users::update_profile, handlers::users::get_bookmarks,
        handlers::users::get_history,
        handlers::books::search_books, handlers::books::get_recommended_books,
        handlers::books::get_book, handlers::books::get_chapter,
        handlers::admin::create_book, handlers::admin::update_book, handlers::admin::delete_book,
        handlers::admin::add_chapter, handlers::admin::update_chapter,
        handlers::admin::delete_chapter,
        handlers::engagement::toggle_like, handlers::engagement::toggle_bookmark,
        handlers::engagement::add_comment, handlers::engagement::get_comments,
        handlers::engagement::delete_comment,
        handlers::uploads::get_presigned_url
    ),
    components(
        schemas(
            models::Role, models::BookCategory, models::BookStatus, models::BookTag,
            models::UserProfile, models::Book, models::BookDetail, models::ChapterSummary,
            models::Chapter, models::Like, models::Bookmark, models::BookmarkedBook,
            models::Comment, models::ReadingHistoryEntry, models::Pagination,
            models::RegisterRequest, models::LoginRequest, models::UpdateProfileRequest,
            models::CreateBookRequest, models::UpdateBookRequest, models::CreateChapterRequest,
            models::UpdateChapterRequest, models::CreateCommentRequest, models::UploadPurpose,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
        )
    ),
    tags(
        (name = "novella", description = "Serialized fiction reading platform API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single, immutable container of the application's services and configuration,
/// cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: all database access.
    pub repo: RepositoryState,
    /// Storage Layer: S3/MinIO presigned uploads and public object URLs.
    pub storage: StorageState,
    /// Configuration: loaded once at startup.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors (AuthUser, MaybeAuthUser) pull single components out of the AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes`. Extracting `AuthUser` rejects the
/// request with 401 when the token is missing, expired, invalid or belongs to a deleted
/// user; otherwise the request proceeds with the identity cached for the handler.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies scoped and global middleware, and registers the
/// application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    // The login token is returned in the Authorization header, so browsers must be allowed
    // to read it.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any)
        .expose_headers([header::AUTHORIZATION]);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Versioned API
    let api = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin,
            )),
        );

    // 3. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health))
        .nest(API_PREFIX, api)
        .with_state(state);

    // 4. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. A fresh UUID per request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. One tracing span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id`, so every log line of a
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
