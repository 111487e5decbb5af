use crate::models::{
    Book, BookDetail, BookFilter, Bookmark, BookmarkToggle, BookmarkedBook, Chapter,
    ChapterSummary, Comment, CreateBookRequest, CreateChapterRequest, Like, LikeToggle, NewUser,
    ReadingHistoryEntry, UpdateBookRequest, UpdateChapterRequest, UpdateProfileRequest, User,
};
use crate::models::{BookCategory, BookTag};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Maximum number of entries kept in a user's reading history.
pub const READING_HISTORY_LIMIT: i64 = 10;

/// RepositoryError
///
/// Persistence failures. Unique-constraint violations are surfaced separately so the
/// HTTP layer can answer 409 instead of 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("duplicate value for {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Maps a unique violation onto `Duplicate`, naming the offending column when the
/// constraint name reveals it.
fn classify(err: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let what = match db_err.constraint() {
                Some(c) if c.contains("email") => "email",
                Some(c) if c.contains("username") => "username",
                _ => "record",
            };
            return RepositoryError::Duplicate(what.to_string());
        }
    }
    RepositoryError::Database(err)
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers depend on this
/// trait only, so the Postgres implementation can be swapped for an in-memory one in tests.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // True when either the e-mail or the username is already registered.
    async fn user_exists(&self, email: &str, username: &str) -> RepoResult<bool>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    // Absent fields keep their stored value.
    async fn update_user_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
        avatar_url: Option<String>,
    ) -> RepoResult<Option<User>>;

    // --- Reading History ---
    // Moves the book to the front of the history and trims it to READING_HISTORY_LIMIT.
    async fn record_reading(&self, user_id: Uuid, book_id: Uuid, chapter_id: Uuid)
    -> RepoResult<()>;
    async fn get_reading_history(&self, user_id: Uuid) -> RepoResult<Vec<ReadingHistoryEntry>>;
    // Books in the user's history, or None when the user does not exist.
    async fn reading_history_books(&self, user_id: Uuid) -> RepoResult<Option<Vec<Book>>>;

    // --- Books ---
    async fn search_books(
        &self,
        filter: &BookFilter,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Book>, i64)>;
    async fn get_book(&self, id: Uuid) -> RepoResult<Option<Book>>;
    // Detail view; also counts the view.
    async fn get_book_detail(&self, id: Uuid) -> RepoResult<Option<BookDetail>>;
    async fn create_book(
        &self,
        req: CreateBookRequest,
        cover_image: Option<String>,
        uploaded_by: Uuid,
    ) -> RepoResult<Book>;
    async fn update_book(
        &self,
        id: Uuid,
        req: UpdateBookRequest,
        cover_image: Option<String>,
    ) -> RepoResult<Option<Book>>;
    // Removes the book together with its chapters, likes, bookmarks, comments and history rows.
    async fn delete_book(&self, id: Uuid) -> RepoResult<bool>;

    // --- Recommendation Candidates ---
    async fn preferred_books(
        &self,
        exclude: &[Uuid],
        categories: &[BookCategory],
        tags: &[BookTag],
        limit: i64,
    ) -> RepoResult<Vec<Book>>;
    async fn popular_books(&self, exclude: &[Uuid], limit: i64) -> RepoResult<Vec<Book>>;
    async fn recent_books(&self, limit: i64) -> RepoResult<Vec<Book>>;
    async fn random_books(&self, exclude: &[Uuid], limit: i64) -> RepoResult<Vec<Book>>;

    // --- Chapters ---
    async fn get_chapter(&self, book_id: Uuid, chapter_id: Uuid) -> RepoResult<Option<Chapter>>;
    // Returns None when the book does not exist. Chapter numbers are max + 1 per book.
    async fn add_chapter(
        &self,
        book_id: Uuid,
        req: CreateChapterRequest,
        uploaded_by: Uuid,
    ) -> RepoResult<Option<Chapter>>;
    async fn update_chapter(
        &self,
        id: Uuid,
        req: UpdateChapterRequest,
    ) -> RepoResult<Option<Chapter>>;
    async fn delete_chapter(&self, book_id: Uuid, chapter_id: Uuid) -> RepoResult<bool>;

    // --- Likes & Bookmarks ---
    // Both return None when the book does not exist.
    async fn toggle_like(&self, user_id: Uuid, book_id: Uuid) -> RepoResult<Option<LikeToggle>>;
    async fn toggle_bookmark(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> RepoResult<Option<BookmarkToggle>>;
    async fn get_user_bookmarks(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<BookmarkedBook>, i64)>;

    // --- Comments ---
    async fn add_comment(&self, book_id: Uuid, user_id: Uuid, content: String)
    -> RepoResult<Comment>;
    async fn get_comments(&self, book_id: Uuid) -> RepoResult<Vec<Comment>>;
    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, avatar_url, created_at, updated_at";

const BOOK_COLUMNS: &str = "id, title, author, description, category, tags, free_chapters, \
     status, cover_image, uploaded_by, views, like_count, created_at, updated_at";

// Same columns as BOOK_COLUMNS, qualified for joins against `books b`.
const HISTORY_BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.description, b.category, b.tags, \
     b.free_chapters, b.status, b.cover_image, b.uploaded_by, b.views, b.like_count, \
     b.created_at, b.updated_at";

const CHAPTER_COLUMNS: &str =
    "id, book_id, chapter_no, title, content, is_locked, uploaded_by, created_at, updated_at";

/// Escapes LIKE wildcards so a keyword is matched literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_book_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    builder.push(" WHERE TRUE");

    if let Some(keyword) = &filter.keyword {
        let pattern = like_pattern(keyword);
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR author ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(category) = filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category);
    }

    if !filter.tags.is_empty() {
        // Array containment: the book must carry every requested tag.
        builder.push(" AND tags @> ");
        builder.push_bind(filter.tags.clone());
    }

    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_exists(&self, email: &str, username: &str) -> RepoResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?)
    }

    /// create_user
    ///
    /// Inserts the account. A concurrent registration with the same e-mail or username
    /// loses on the unique index and comes back as `Duplicate`.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.username)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    /// update_user_profile
    ///
    /// Uses COALESCE so only the provided fields are written.
    async fn update_user_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
        avatar_url: Option<String>,
    ) -> RepoResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET username = COALESCE($2, username), email = COALESCE($3, email), \
             avatar_url = COALESCE($4, avatar_url), updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(req.username)
            .bind(req.email)
            .bind(avatar_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)
    }

    // --- READING HISTORY ---

    /// record_reading
    ///
    /// Upserts the (user, book) entry with a fresh timestamp, then deletes everything
    /// beyond the newest READING_HISTORY_LIMIT entries, in one transaction.
    async fn record_reading(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        chapter_id: Uuid,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO reading_history (user_id, book_id, last_chapter_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, book_id)
            DO UPDATE SET last_chapter_id = EXCLUDED.last_chapter_id, created_at = EXCLUDED.created_at
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(chapter_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM reading_history
            WHERE user_id = $1 AND book_id NOT IN (
                SELECT book_id FROM reading_history
                WHERE user_id = $1
                ORDER BY created_at DESC
                LIMIT $2
            )
            "#,
        )
        .bind(user_id)
        .bind(READING_HISTORY_LIMIT)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_reading_history(&self, user_id: Uuid) -> RepoResult<Vec<ReadingHistoryEntry>> {
        Ok(sqlx::query_as::<_, ReadingHistoryEntry>(
            r#"
            SELECT h.book_id, b.title, b.author, h.last_chapter_id, h.created_at AS read_at
            FROM reading_history h
            JOIN books b ON b.id = h.book_id
            WHERE h.user_id = $1
            ORDER BY h.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(READING_HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn reading_history_books(&self, user_id: Uuid) -> RepoResult<Option<Vec<Book>>> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {HISTORY_BOOK_COLUMNS} FROM reading_history h JOIN books b ON b.id = h.book_id \
             WHERE h.user_id = $1 ORDER BY h.created_at DESC"
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(Some(books))
    }

    // --- BOOKS ---

    /// search_books
    ///
    /// Builds the filter with QueryBuilder so every user-supplied value is bound, never
    /// interpolated. The page and the total count are fetched concurrently.
    async fn search_books(
        &self,
        filter: &BookFilter,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Book>, i64)> {
        let mut page_query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {BOOK_COLUMNS} FROM books"));
        push_book_filter(&mut page_query, filter);
        page_query.push(" ORDER BY created_at DESC OFFSET ");
        page_query.push_bind(offset);
        page_query.push(" LIMIT ");
        page_query.push_bind(limit);

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM books");
        push_book_filter(&mut count_query, filter);

        let (books, total) = tokio::try_join!(
            page_query.build_query_as::<Book>().fetch_all(&self.pool),
            count_query.build_query_scalar::<i64>().fetch_one(&self.pool),
        )?;

        Ok((books, total))
    }

    async fn get_book(&self, id: Uuid) -> RepoResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// get_book_detail
    ///
    /// Counts the view and returns the book with its uploader's username and its chapter
    /// list sorted by chapter number.
    async fn get_book_detail(&self, id: Uuid) -> RepoResult<Option<BookDetail>> {
        let sql = format!("UPDATE books SET views = views + 1 WHERE id = $1 RETURNING {BOOK_COLUMNS}");
        let Some(book) = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let uploader = match book.uploaded_by {
            Some(uploader_id) => {
                sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
                    .bind(uploader_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let chapters = sqlx::query_as::<_, ChapterSummary>(
            "SELECT id, title, chapter_no FROM chapters WHERE book_id = $1 ORDER BY chapter_no ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(BookDetail {
            book,
            uploader,
            chapters,
        }))
    }

    async fn create_book(
        &self,
        req: CreateBookRequest,
        cover_image: Option<String>,
        uploaded_by: Uuid,
    ) -> RepoResult<Book> {
        let sql = format!(
            "INSERT INTO books (id, title, author, description, category, tags, free_chapters, \
             status, cover_image, uploaded_by, views, like_count, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, 0, NOW(), NOW()) \
             RETURNING {BOOK_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.title)
            .bind(req.author)
            .bind(req.description)
            .bind(req.category.unwrap_or_default())
            .bind(req.tags)
            .bind(req.free_chapters.unwrap_or(3))
            .bind(req.status.unwrap_or_default())
            .bind(cover_image)
            .bind(uploaded_by)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_book(
        &self,
        id: Uuid,
        req: UpdateBookRequest,
        cover_image: Option<String>,
    ) -> RepoResult<Option<Book>> {
        let sql = format!(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                tags = COALESCE($6, tags),
                status = COALESCE($7, status),
                free_chapters = COALESCE($8, free_chapters),
                cover_image = COALESCE($9, cover_image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(req.title)
            .bind(req.author)
            .bind(req.description)
            .bind(req.category)
            .bind(req.tags)
            .bind(req.status)
            .bind(req.free_chapters)
            .bind(cover_image)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// delete_book
    ///
    /// Performs the cascade the schema does not enforce, atomically.
    async fn delete_book(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        for table in ["chapters", "likes", "bookmarks", "comments", "reading_history"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE book_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let deleted = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if deleted {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(deleted)
    }

    // --- RECOMMENDATION CANDIDATES ---

    async fn preferred_books(
        &self,
        exclude: &[Uuid],
        categories: &[BookCategory],
        tags: &[BookTag],
        limit: i64,
    ) -> RepoResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE NOT (id = ANY($1)) AND (category = ANY($2) OR tags && $3) \
             LIMIT $4"
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(exclude)
            .bind(categories)
            .bind(tags)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn popular_books(&self, exclude: &[Uuid], limit: i64) -> RepoResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE NOT (id = ANY($1)) \
             ORDER BY views DESC, like_count DESC LIMIT $2"
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(exclude)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn recent_books(&self, limit: i64) -> RepoResult<Vec<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC LIMIT $1");
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn random_books(&self, exclude: &[Uuid], limit: i64) -> RepoResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE NOT (id = ANY($1)) ORDER BY random() LIMIT $2"
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(exclude)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    // --- CHAPTERS ---

    async fn get_chapter(&self, book_id: Uuid, chapter_id: Uuid) -> RepoResult<Option<Chapter>> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1 AND book_id = $2");
        Ok(sqlx::query_as::<_, Chapter>(&sql)
            .bind(chapter_id)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// add_chapter
    ///
    /// Locks the parent book row so concurrent inserts for the same book are serialized,
    /// then numbers the chapter `max(chapter_no) + 1`.
    async fn add_chapter(
        &self,
        book_id: Uuid,
        req: CreateChapterRequest,
        uploaded_by: Uuid,
    ) -> RepoResult<Option<Chapter>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let next_no = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(chapter_no), 0) + 1 FROM chapters WHERE book_id = $1",
        )
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            "INSERT INTO chapters (id, book_id, chapter_no, title, content, is_locked, uploaded_by, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) \
             RETURNING {CHAPTER_COLUMNS}"
        );
        let chapter = sqlx::query_as::<_, Chapter>(&sql)
            .bind(Uuid::new_v4())
            .bind(book_id)
            .bind(next_no)
            .bind(req.title)
            .bind(req.content)
            .bind(req.is_locked.unwrap_or(false))
            .bind(uploaded_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET updated_at = NOW() WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(chapter))
    }

    async fn update_chapter(
        &self,
        id: Uuid,
        req: UpdateChapterRequest,
    ) -> RepoResult<Option<Chapter>> {
        let sql = format!(
            "UPDATE chapters SET title = COALESCE($2, title), content = COALESCE($3, content), \
             is_locked = COALESCE($4, is_locked), updated_at = NOW() \
             WHERE id = $1 RETURNING {CHAPTER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Chapter>(&sql)
            .bind(id)
            .bind(req.title)
            .bind(req.content)
            .bind(req.is_locked)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_chapter(&self, book_id: Uuid, chapter_id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM chapters WHERE id = $1 AND book_id = $2")
            .bind(chapter_id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !deleted {
            tx.rollback().await?;
            return Ok(false);
        }

        // History keeps the book but forgets the removed chapter.
        sqlx::query("UPDATE reading_history SET last_chapter_id = NULL WHERE last_chapter_id = $1")
            .bind(chapter_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    // --- LIKES & BOOKMARKS ---

    /// toggle_like
    ///
    /// Locks the book row, flips the (user, book) like and adjusts `like_count` in the same
    /// transaction. The counter is floored at zero.
    async fn toggle_like(&self, user_id: Uuid, book_id: Uuid) -> RepoResult<Option<LikeToggle>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        let outcome = if removed {
            let like_count = sqlx::query_scalar::<_, i64>(
                "UPDATE books SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1 RETURNING like_count",
            )
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
            LikeToggle::Unliked { like_count }
        } else {
            let like = sqlx::query_as::<_, Like>(
                "INSERT INTO likes (id, user_id, book_id, created_at) VALUES ($1, $2, $3, NOW()) \
                 RETURNING id, user_id, book_id, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
            let like_count = sqlx::query_scalar::<_, i64>(
                "UPDATE books SET like_count = like_count + 1 WHERE id = $1 RETURNING like_count",
            )
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await?;
            LikeToggle::Liked { like, like_count }
        };

        tx.commit().await?;
        Ok(Some(outcome))
    }

    async fn toggle_bookmark(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> RepoResult<Option<BookmarkToggle>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM books WHERE id = $1 FOR SHARE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        let outcome = if removed {
            BookmarkToggle::Removed
        } else {
            let bookmark = sqlx::query_as::<_, Bookmark>(
                "INSERT INTO bookmarks (id, user_id, book_id, created_at) VALUES ($1, $2, $3, NOW()) \
                 RETURNING id, user_id, book_id, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(book_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;
            BookmarkToggle::Added(bookmark)
        };

        tx.commit().await?;
        Ok(Some(outcome))
    }

    async fn get_user_bookmarks(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<BookmarkedBook>, i64)> {
        let page = sqlx::query_as::<_, BookmarkedBook>(
            r#"
            SELECT b.id AS book_id, b.title, b.author, b.created_at, bm.created_at AS bookmarked_at
            FROM bookmarks bm
            JOIN books b ON b.id = bm.book_id
            WHERE bm.user_id = $1
            ORDER BY bm.created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool);

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookmarks bm JOIN books b ON b.id = bm.book_id WHERE bm.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool);

        let (bookmarks, total) = tokio::try_join!(page, count)?;
        Ok((bookmarks, total))
    }

    // --- COMMENTS ---

    /// add_comment
    ///
    /// Inserts and joins with `users` in one statement so the response carries the
    /// author's username.
    async fn add_comment(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> RepoResult<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (id, user_id, book_id, content, created_at, updated_at)
                VALUES ($1, $2, $3, $4, NOW(), NOW())
                RETURNING id, user_id, book_id, content, created_at, updated_at
            )
            SELECT i.id, i.user_id, i.book_id, i.content, i.created_at, i.updated_at,
                   u.username AS author_username
            FROM inserted i LEFT JOIN users u ON i.user_id = u.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(book_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_comments(&self, book_id: Uuid) -> RepoResult<Vec<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.user_id, c.book_id, c.content, c.created_at, c.updated_at,
                   u.username AS author_username
            FROM comments c
            LEFT JOIN users u ON c.user_id = u.id
            WHERE c.book_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.user_id, c.book_id, c.content, c.created_at, c.updated_at,
                   u.username AS author_username
            FROM comments c
            LEFT JOIN users u ON c.user_id = u.id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        Ok(sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected()
            > 0)
    }
}
