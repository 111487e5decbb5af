use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Hard cap on a requested page size.
pub const MAX_PAGE_SIZE: i64 = 100;

// --- Enumerations (mapped to Postgres enum types) ---

/// Role
///
/// The RBAC field of a user account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// BookCategory
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "book_category")]
#[ts(export)]
pub enum BookCategory {
    #[default]
    Translation,
    #[serde(rename = "Original stories")]
    #[sqlx(rename = "Original stories")]
    OriginalStories,
    Fanfiction,
}

/// BookStatus
///
/// Publication state of a serialized book.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "book_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BookStatus {
    #[default]
    Ongoing,
    Completed,
}

/// BookTag
///
/// The closed set of genre/trope tags a book can carry. The wire and database labels
/// are the human-readable names ("Female protagonist", "Sci-fi", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, TS, ToSchema)]
#[sqlx(type_name = "book_tag")]
#[ts(export)]
pub enum BookTag {
    Revenge,
    Romance,
    #[serde(rename = "CEO")]
    #[sqlx(rename = "CEO")]
    Ceo,
    System,
    #[serde(rename = "Female protagonist")]
    #[sqlx(rename = "Female protagonist")]
    FemaleProtagonist,
    #[serde(rename = "Male protagonist")]
    #[sqlx(rename = "Male protagonist")]
    MaleProtagonist,
    #[serde(rename = "Ancient China")]
    #[sqlx(rename = "Ancient China")]
    AncientChina,
    #[serde(rename = "Slow burn")]
    #[sqlx(rename = "Slow burn")]
    SlowBurn,
    Action,
    Adventure,
    Thriller,
    Horror,
    Comedy,
    #[serde(rename = "Sci-fi")]
    #[sqlx(rename = "Sci-fi")]
    SciFi,
}

impl BookTag {
    pub const ALL: [BookTag; 14] = [
        BookTag::Revenge,
        BookTag::Romance,
        BookTag::Ceo,
        BookTag::System,
        BookTag::FemaleProtagonist,
        BookTag::MaleProtagonist,
        BookTag::AncientChina,
        BookTag::SlowBurn,
        BookTag::Action,
        BookTag::Adventure,
        BookTag::Thriller,
        BookTag::Horror,
        BookTag::Comedy,
        BookTag::SciFi,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BookTag::Revenge => "Revenge",
            BookTag::Romance => "Romance",
            BookTag::Ceo => "CEO",
            BookTag::System => "System",
            BookTag::FemaleProtagonist => "Female protagonist",
            BookTag::MaleProtagonist => "Male protagonist",
            BookTag::AncientChina => "Ancient China",
            BookTag::SlowBurn => "Slow burn",
            BookTag::Action => "Action",
            BookTag::Adventure => "Adventure",
            BookTag::Thriller => "Thriller",
            BookTag::Horror => "Horror",
            BookTag::Comedy => "Comedy",
            BookTag::SciFi => "Sci-fi",
        }
    }
}

impl fmt::Display for BookTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BookTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BookTag::ALL
            .into_iter()
            .find(|tag| tag.label() == wanted)
            .ok_or_else(|| format!("Unknown tag: {}", wanted))
    }
}

// --- Core Records (Mapped to Database) ---

/// User
///
/// Internal account record from the `users` table. Carries the password hash, so it is
/// never serialized directly; handlers respond with [`UserProfile`].
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// UserProfile
///
/// Public view of an account: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// NewUser
///
/// Insert payload for an account whose password has already been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Book
///
/// A serialized book from the `books` table. `views` and `like_count` drive the
/// popularity ordering used by recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: BookCategory,
    pub tags: Vec<BookTag>,
    pub free_chapters: i32,
    pub status: BookStatus,
    pub cover_image: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub views: i64,
    pub like_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ChapterSummary
///
/// Table-of-contents entry embedded in a book's detail view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChapterSummary {
    pub id: Uuid,
    pub title: String,
    pub chapter_no: i32,
}

/// BookDetail
///
/// A book enriched with its uploader's username and its chapters in reading order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub uploader: Option<String>,
    pub chapters: Vec<ChapterSummary>,
}

/// Chapter
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Chapter {
    pub id: Uuid,
    pub book_id: Uuid,
    pub chapter_no: i32,
    pub title: String,
    pub content: String,
    pub is_locked: bool,
    pub uploaded_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Like
///
/// One user's like of one book. Unique per (user_id, book_id).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Bookmark
///
/// One user's bookmark of one book. Unique per (user_id, book_id).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// BookmarkedBook
///
/// Row of the user's bookmark listing: the book's headline fields plus when it was bookmarked.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BookmarkedBook {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub bookmarked_at: DateTime<Utc>,
}

/// Comment
///
/// A comment on a book, augmented with the author's username (loaded via a JOIN).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub author_username: Option<String>,
}

/// ReadingHistoryEntry
///
/// One entry of a user's reading history, most recent first when listed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReadingHistoryEntry {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub last_chapter_id: Option<Uuid>,
    #[ts(type = "string")]
    pub read_at: DateTime<Utc>,
}

// --- Toggle Outcomes ---

/// LikeToggle
///
/// Result of flipping a user's like on a book, with the book's counter after the flip.
#[derive(Debug, Clone, PartialEq)]
pub enum LikeToggle {
    Liked { like: Like, like_count: i64 },
    Unliked { like_count: i64 },
}

/// BookmarkToggle
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkToggle {
    Added(Bookmark),
    Removed,
}

// --- Request Payloads (Input Schemas) ---

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|value| value.trim().to_string())
}

fn trimmed_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|value| value.map(|v| v.trim().to_string()))
}

fn trimmed_lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|value| value.trim().to_lowercase())
}

fn trimmed_lowercase_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer)
        .map(|value| value.map(|v| v.trim().to_lowercase()))
}

/// RegisterRequest
///
/// Input payload for POST /user/register. Usernames and e-mails are trimmed; e-mails
/// are lower-cased before validation and storage.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 20, message = "username must be 3-20 characters"))]
    pub username: String,
    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(
        email(message = "email must be a valid address"),
        length(min = 6, max = 255, message = "email must be 6-255 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 255, message = "password must be 8-255 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "trimmed_lowercase")]
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// UpdateProfileRequest
///
/// Partial update of the caller's profile. Absent fields keep their current value.
/// `avatarKey` is the object key returned by the presigned upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "trimmed_opt", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 20, message = "username must be 3-20 characters"))]
    pub username: Option<String>,
    #[serde(
        default,
        deserialize_with = "trimmed_lowercase_opt",
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_key: Option<String>,
}

/// CreateBookRequest
///
/// Input payload for POST /admin/books. `coverImageKey` comes from the presigned upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 6, max = 80, message = "title must be 6-80 characters"))]
    pub title: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 50, message = "author must be 3-50 characters"))]
    pub author: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 20, max = 200, message = "description must be 20-200 characters"))]
    pub description: String,
    #[serde(default)]
    pub category: Option<BookCategory>,
    #[serde(default)]
    pub tags: Vec<BookTag>,
    #[serde(default)]
    pub status: Option<BookStatus>,
    #[serde(default)]
    #[validate(range(min = 0, message = "freeChapters cannot be negative"))]
    pub free_chapters: Option<i32>,
    #[serde(default)]
    pub cover_image_key: Option<String>,
}

/// UpdateBookRequest
///
/// Partial update for PUT /admin/books/{id}. Provided tags replace the whole set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    #[serde(default, deserialize_with = "trimmed_opt", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, max = 80, message = "title must be 6-80 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, max = 50, message = "author must be 3-50 characters"))]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 20, max = 200, message = "description must be 20-200 characters"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BookCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "tags can not be empty"))]
    pub tags: Option<Vec<BookTag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "freeChapters cannot be negative"))]
    pub free_chapters: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_key: Option<String>,
}

/// CreateChapterRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateChapterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 6, max = 80, message = "title must be 6-80 characters"))]
    pub title: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[serde(default)]
    pub is_locked: Option<bool>,
}

/// UpdateChapterRequest
///
/// Partial update; `isLocked` only changes when it is present in the payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChapterRequest {
    #[serde(default, deserialize_with = "trimmed_opt", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, max = 80, message = "title must be 6-80 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "content is required"))]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
}

/// CreateCommentRequest
///
/// Accepts the legacy `text` key as well as `content`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, Default)]
pub struct CreateCommentRequest {
    #[serde(alias = "text", deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "comment must be 1-100 characters"))]
    pub content: String,
}

/// UploadPurpose
///
/// What an uploaded image is for; also the top-level folder of its object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum UploadPurpose {
    #[serde(rename = "bookImage")]
    BookImage,
    #[serde(rename = "avatar")]
    Avatar,
}

impl UploadPurpose {
    pub fn prefix(self) -> &'static str {
        match self {
            UploadPurpose::BookImage => "bookImage",
            UploadPurpose::Avatar => "avatar",
        }
    }
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived S3 upload URL (POST /upload/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "cover.png")]
    pub filename: String,
    /// The MIME type; only `image/*` is accepted.
    #[schema(example = "image/png")]
    pub file_type: String,
    /// Size of the upload in bytes; the signed URL only accepts exactly this length.
    #[schema(example = 204800)]
    pub file_size: u64,
    pub purpose: UploadPurpose,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to send back on book or profile updates.
    pub resource_key: String,
}

// --- Query Parameters ---

/// PageQuery
///
/// `page`/`limit` query parameters. Non-positive values fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolves to `(page, limit)` with `page >= 1` and `1 <= limit <= MAX_PAGE_SIZE`.
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        (page, limit)
    }

    /// Row offset of `page`, or None when it does not fit in an i64.
    pub fn offset(page: i64, limit: i64) -> Option<i64> {
        (page - 1).checked_mul(limit)
    }
}

/// BookSearchQuery
///
/// Query parameters of GET /books/search. `tags` is a comma-separated list; a book must
/// carry every listed tag to match.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookSearchQuery {
    /// Case-insensitive substring matched against title and author.
    pub keyword: Option<String>,
    pub category: Option<BookCategory>,
    /// Comma-separated tag labels, e.g. `Romance,CEO`.
    pub tags: Option<String>,
    pub status: Option<BookStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// BookFilter
///
/// Parsed search criteria handed to the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub keyword: Option<String>,
    pub category: Option<BookCategory>,
    pub tags: Vec<BookTag>,
    pub status: Option<BookStatus>,
}

impl BookSearchQuery {
    /// Splits the query into repository criteria and paging parameters.
    pub fn into_parts(self) -> Result<(BookFilter, PageQuery), String> {
        let tags = match self.tags.as_deref() {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(BookTag::from_str)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let keyword = self
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok((
            BookFilter {
                keyword,
                category: self.category,
                tags,
                status: self.status,
            },
            PageQuery {
                page: self.page,
                limit: self.limit,
            },
        ))
    }
}

/// RecommendationQuery
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendationQuery {
    /// Number of books wanted (default 10, max 50).
    pub limit: Option<usize>,
}

// --- Response Envelopes (Output) ---

/// Pagination
///
/// Paging metadata attached to list responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub total: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            total,
            current_page: page,
            total_pages,
        }
    }
}

/// ApiResponse
///
/// Success envelope shared by every endpoint: `{"status": "success", ...}` with whichever
/// of `message`, `results`, `data`, `pagination` and `likeCount` apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            results: None,
            data: None,
            pagination: None,
            like_count: None,
        }
    }

    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::success()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_like_count(mut self, like_count: i64) -> Self {
        self.like_count = Some(like_count);
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A list response carrying `results` (the page length) and optional paging metadata.
    pub fn list(items: Vec<T>, pagination: Option<Pagination>) -> Self {
        Self {
            results: Some(items.len()),
            data: Some(items),
            pagination,
            ..Self::success()
        }
    }
}
