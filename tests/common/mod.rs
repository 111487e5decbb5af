#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Response};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use novella_api::{
    AppState,
    auth::{self, AuthUser},
    config::AppConfig,
    models::{
        Book, BookCategory, BookDetail, BookFilter, BookStatus, BookTag, Bookmark,
        BookmarkToggle, BookmarkedBook, Chapter, ChapterSummary, Comment, CreateBookRequest,
        CreateChapterRequest, Like, LikeToggle, NewUser, ReadingHistoryEntry, Role,
        UpdateBookRequest, UpdateChapterRequest, UpdateProfileRequest, User,
    },
    repository::{READING_HISTORY_LIMIT, RepoResult, Repository, RepositoryError},
    storage::MockStorageService,
};
use rand::seq::SliceRandom;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use uuid::Uuid;

// --- IN-MEMORY REPOSITORY ---

struct HistoryRow {
    user_id: Uuid,
    book_id: Uuid,
    last_chapter_id: Option<Uuid>,
    read_at: DateTime<Utc>,
}

#[derive(Default)]
struct Store {
    clock: Option<DateTime<Utc>>,
    users: Vec<User>,
    books: Vec<Book>,
    chapters: Vec<Chapter>,
    likes: Vec<Like>,
    bookmarks: Vec<Bookmark>,
    comments: Vec<Comment>,
    // Newest first across all users.
    history: Vec<HistoryRow>,
}

impl Store {
    // Strictly increasing timestamps, so "newest first" orderings are deterministic.
    fn now(&mut self) -> DateTime<Utc> {
        let next = match self.clock {
            Some(last) => (last + ChronoDuration::milliseconds(1)).max(Utc::now()),
            None => Utc::now(),
        };
        self.clock = Some(next);
        next
    }

    fn username(&self, id: Uuid) -> Option<String> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
    }
}

/// InMemoryRepository
///
/// Full `Repository` implementation over vectors behind a mutex. Used by the handler,
/// router and recommendation tests. `set_failing(true)` turns every call into a database
/// error.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    failing: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> RepoResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    // --- Seeding helpers ---

    pub fn seed_user(&self, username: &str, role: Role) -> User {
        // Cheap cost: only login tests verify it.
        let password_hash = bcrypt::hash("password123", 4).expect("hash");
        self.seed_user_with_hash(username, role, password_hash)
    }

    pub fn seed_user_with_hash(&self, username: &str, role: Role, password_hash: String) -> User {
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash,
            role,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        store.users.push(user.clone());
        user
    }

    pub fn seed_book(&self, title: &str, category: BookCategory, tags: &[BookTag]) -> Book {
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        let book = Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: "Seed Author".to_string(),
            description: "A seeded description long enough to pass.".to_string(),
            category,
            tags: tags.to_vec(),
            free_chapters: 3,
            status: BookStatus::Ongoing,
            cover_image: None,
            uploaded_by: None,
            views: 0,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        store.books.push(book.clone());
        book
    }

    pub fn set_views(&self, book_id: Uuid, views: i64) {
        let mut store = self.store.lock().unwrap();
        if let Some(book) = store.books.iter_mut().find(|b| b.id == book_id) {
            book.views = views;
        }
    }

    pub fn seed_chapter(&self, book_id: Uuid, title: &str) -> Chapter {
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        let next_no = store
            .chapters
            .iter()
            .filter(|c| c.book_id == book_id)
            .map(|c| c.chapter_no)
            .max()
            .unwrap_or(0)
            + 1;
        let chapter = Chapter {
            id: Uuid::new_v4(),
            book_id,
            chapter_no: next_no,
            title: title.to_string(),
            content: "Once upon a time.".to_string(),
            is_locked: false,
            uploaded_by: None,
            created_at: now,
            updated_at: now,
        };
        store.chapters.push(chapter.clone());
        chapter
    }

    pub fn book(&self, id: Uuid) -> Option<Book> {
        let store = self.store.lock().unwrap();
        store.books.iter().find(|b| b.id == id).cloned()
    }

    pub fn like_rows(&self, book_id: Uuid) -> usize {
        let store = self.store.lock().unwrap();
        store.likes.iter().filter(|l| l.book_id == book_id).count()
    }

    pub fn chapter_count(&self, book_id: Uuid) -> usize {
        let store = self.store.lock().unwrap();
        store.chapters.iter().filter(|c| c.book_id == book_id).count()
    }

    pub fn comment_count(&self, book_id: Uuid) -> usize {
        let store = self.store.lock().unwrap();
        store.comments.iter().filter(|c| c.book_id == book_id).count()
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }

    pub fn stored_user(&self, id: Uuid) -> Option<User> {
        let store = self.store.lock().unwrap();
        store.users.iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- Users ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_exists(&self, email: &str, username: &str) -> RepoResult<bool> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .users
            .iter()
            .any(|u| u.email == email || u.username == username))
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate("email".to_string()));
        }
        if store.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate("username".to_string()));
        }
        let now = store.now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        store.users.push(created.clone());
        Ok(created)
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
        avatar_url: Option<String>,
    ) -> RepoResult<Option<User>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        if let Some(name) = &req.username {
            if store.users.iter().any(|u| u.id != id && &u.username == name) {
                return Err(RepositoryError::Duplicate("username".to_string()));
            }
        }
        if let Some(email) = &req.email {
            if store.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(RepositoryError::Duplicate("email".to_string()));
            }
        }
        let now = store.now();
        let Some(user) = store.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.username {
            user.username = name;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if avatar_url.is_some() {
            user.avatar_url = avatar_url;
        }
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    // --- Reading History ---

    async fn record_reading(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        chapter_id: Uuid,
    ) -> RepoResult<()> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        store
            .history
            .retain(|h| !(h.user_id == user_id && h.book_id == book_id));
        store.history.insert(
            0,
            HistoryRow {
                user_id,
                book_id,
                last_chapter_id: Some(chapter_id),
                read_at: now,
            },
        );

        let mut kept = 0;
        store.history.retain(|h| {
            if h.user_id != user_id {
                return true;
            }
            kept += 1;
            kept <= READING_HISTORY_LIMIT
        });
        Ok(())
    }

    async fn get_reading_history(&self, user_id: Uuid) -> RepoResult<Vec<ReadingHistoryEntry>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .filter_map(|h| {
                store
                    .books
                    .iter()
                    .find(|b| b.id == h.book_id)
                    .map(|b| ReadingHistoryEntry {
                        book_id: b.id,
                        title: b.title.clone(),
                        author: b.author.clone(),
                        last_chapter_id: h.last_chapter_id,
                        read_at: h.read_at,
                    })
            })
            .collect())
    }

    async fn reading_history_books(&self, user_id: Uuid) -> RepoResult<Option<Vec<Book>>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        if !store.users.iter().any(|u| u.id == user_id) {
            return Ok(None);
        }
        Ok(Some(
            store
                .history
                .iter()
                .filter(|h| h.user_id == user_id)
                .filter_map(|h| store.books.iter().find(|b| b.id == h.book_id).cloned())
                .collect(),
        ))
    }

    // --- Books ---

    async fn search_books(
        &self,
        filter: &BookFilter,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Book>, i64)> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let keyword = filter.keyword.as_ref().map(|k| k.to_lowercase());
        let mut matches: Vec<Book> = store
            .books
            .iter()
            .filter(|b| match &keyword {
                Some(k) => b.title.to_lowercase().contains(k) || b.author.to_lowercase().contains(k),
                None => true,
            })
            .filter(|b| filter.category.is_none_or(|c| b.category == c))
            .filter(|b| filter.status.is_none_or(|s| b.status == s))
            .filter(|b| filter.tags.iter().all(|t| b.tags.contains(t)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_book(&self, id: Uuid) -> RepoResult<Option<Book>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store.books.iter().find(|b| b.id == id).cloned())
    }

    async fn get_book_detail(&self, id: Uuid) -> RepoResult<Option<BookDetail>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let Some(book) = store.books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        book.views += 1;
        let book = book.clone();

        let uploader = book.uploaded_by.and_then(|u| store.username(u));
        let mut chapters: Vec<ChapterSummary> = store
            .chapters
            .iter()
            .filter(|c| c.book_id == id)
            .map(|c| ChapterSummary {
                id: c.id,
                title: c.title.clone(),
                chapter_no: c.chapter_no,
            })
            .collect();
        chapters.sort_by_key(|c| c.chapter_no);

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
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        let book = Book {
            id: Uuid::new_v4(),
            title: req.title,
            author: req.author,
            description: req.description,
            category: req.category.unwrap_or_default(),
            tags: req.tags,
            free_chapters: req.free_chapters.unwrap_or(3),
            status: req.status.unwrap_or_default(),
            cover_image,
            uploaded_by: Some(uploaded_by),
            views: 0,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        store.books.push(book.clone());
        Ok(book)
    }

    async fn update_book(
        &self,
        id: Uuid,
        req: UpdateBookRequest,
        cover_image: Option<String>,
    ) -> RepoResult<Option<Book>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        let Some(book) = store.books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            book.title = v;
        }
        if let Some(v) = req.author {
            book.author = v;
        }
        if let Some(v) = req.description {
            book.description = v;
        }
        if let Some(v) = req.category {
            book.category = v;
        }
        if let Some(v) = req.tags {
            book.tags = v;
        }
        if let Some(v) = req.status {
            book.status = v;
        }
        if let Some(v) = req.free_chapters {
            book.free_chapters = v;
        }
        if cover_image.is_some() {
            book.cover_image = cover_image;
        }
        book.updated_at = now;
        Ok(Some(book.clone()))
    }

    async fn delete_book(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let before = store.books.len();
        store.books.retain(|b| b.id != id);
        if store.books.len() == before {
            return Ok(false);
        }
        store.chapters.retain(|c| c.book_id != id);
        store.likes.retain(|l| l.book_id != id);
        store.bookmarks.retain(|b| b.book_id != id);
        store.comments.retain(|c| c.book_id != id);
        store.history.retain(|h| h.book_id != id);
        Ok(true)
    }

    // --- Recommendation Candidates ---

    async fn preferred_books(
        &self,
        exclude: &[Uuid],
        categories: &[BookCategory],
        tags: &[BookTag],
        limit: i64,
    ) -> RepoResult<Vec<Book>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .books
            .iter()
            .filter(|b| !exclude.contains(&b.id))
            .filter(|b| categories.contains(&b.category) || b.tags.iter().any(|t| tags.contains(t)))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn popular_books(&self, exclude: &[Uuid], limit: i64) -> RepoResult<Vec<Book>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut books: Vec<Book> = store
            .books
            .iter()
            .filter(|b| !exclude.contains(&b.id))
            .cloned()
            .collect();
        books.sort_by(|a, b| {
            b.views
                .cmp(&a.views)
                .then_with(|| b.like_count.cmp(&a.like_count))
        });
        books.truncate(limit as usize);
        Ok(books)
    }

    async fn recent_books(&self, limit: i64) -> RepoResult<Vec<Book>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut books = store.books.clone();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        books.truncate(limit as usize);
        Ok(books)
    }

    async fn random_books(&self, exclude: &[Uuid], limit: i64) -> RepoResult<Vec<Book>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let mut books: Vec<Book> = store
            .books
            .iter()
            .filter(|b| !exclude.contains(&b.id))
            .cloned()
            .collect();
        books.shuffle(&mut rand::thread_rng());
        books.truncate(limit as usize);
        Ok(books)
    }

    // --- Chapters ---

    async fn get_chapter(&self, book_id: Uuid, chapter_id: Uuid) -> RepoResult<Option<Chapter>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .chapters
            .iter()
            .find(|c| c.id == chapter_id && c.book_id == book_id)
            .cloned())
    }

    async fn add_chapter(
        &self,
        book_id: Uuid,
        req: CreateChapterRequest,
        uploaded_by: Uuid,
    ) -> RepoResult<Option<Chapter>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        if !store.books.iter().any(|b| b.id == book_id) {
            return Ok(None);
        }
        let now = store.now();
        let next_no = store
            .chapters
            .iter()
            .filter(|c| c.book_id == book_id)
            .map(|c| c.chapter_no)
            .max()
            .unwrap_or(0)
            + 1;
        let chapter = Chapter {
            id: Uuid::new_v4(),
            book_id,
            chapter_no: next_no,
            title: req.title,
            content: req.content,
            is_locked: req.is_locked.unwrap_or(false),
            uploaded_by: Some(uploaded_by),
            created_at: now,
            updated_at: now,
        };
        store.chapters.push(chapter.clone());
        Ok(Some(chapter))
    }

    async fn update_chapter(
        &self,
        id: Uuid,
        req: UpdateChapterRequest,
    ) -> RepoResult<Option<Chapter>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        let Some(chapter) = store.chapters.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            chapter.title = v;
        }
        if let Some(v) = req.content {
            chapter.content = v;
        }
        if let Some(v) = req.is_locked {
            chapter.is_locked = v;
        }
        chapter.updated_at = now;
        Ok(Some(chapter.clone()))
    }

    async fn delete_chapter(&self, book_id: Uuid, chapter_id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let before = store.chapters.len();
        store
            .chapters
            .retain(|c| !(c.id == chapter_id && c.book_id == book_id));
        if store.chapters.len() == before {
            return Ok(false);
        }
        for row in store.history.iter_mut() {
            if row.last_chapter_id == Some(chapter_id) {
                row.last_chapter_id = None;
            }
        }
        Ok(true)
    }

    // --- Likes & Bookmarks ---

    async fn toggle_like(&self, user_id: Uuid, book_id: Uuid) -> RepoResult<Option<LikeToggle>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        if !store.books.iter().any(|b| b.id == book_id) {
            return Ok(None);
        }
        let existing = store
            .likes
            .iter()
            .position(|l| l.user_id == user_id && l.book_id == book_id);
        let now = store.now();

        let outcome = match existing {
            Some(index) => {
                store.likes.remove(index);
                let book = store
                    .books
                    .iter_mut()
                    .find(|b| b.id == book_id)
                    .expect("book checked above");
                book.like_count = (book.like_count - 1).max(0);
                LikeToggle::Unliked {
                    like_count: book.like_count,
                }
            }
            None => {
                let like = Like {
                    id: Uuid::new_v4(),
                    user_id,
                    book_id,
                    created_at: now,
                };
                store.likes.push(like.clone());
                let book = store
                    .books
                    .iter_mut()
                    .find(|b| b.id == book_id)
                    .expect("book checked above");
                book.like_count += 1;
                LikeToggle::Liked {
                    like,
                    like_count: book.like_count,
                }
            }
        };
        Ok(Some(outcome))
    }

    async fn toggle_bookmark(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> RepoResult<Option<BookmarkToggle>> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        if !store.books.iter().any(|b| b.id == book_id) {
            return Ok(None);
        }
        if let Some(index) = store
            .bookmarks
            .iter()
            .position(|b| b.user_id == user_id && b.book_id == book_id)
        {
            store.bookmarks.remove(index);
            return Ok(Some(BookmarkToggle::Removed));
        }
        let now = store.now();
        let bookmark = Bookmark {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            created_at: now,
        };
        store.bookmarks.push(bookmark.clone());
        Ok(Some(BookmarkToggle::Added(bookmark)))
    }

    async fn get_user_bookmarks(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<BookmarkedBook>, i64)> {
        self.check()?;
        let store = self.store.lock().unwrap();
        let all: Vec<BookmarkedBook> = store
            .bookmarks
            .iter()
            .rev()
            .filter(|bm| bm.user_id == user_id)
            .filter_map(|bm| {
                store
                    .books
                    .iter()
                    .find(|b| b.id == bm.book_id)
                    .map(|b| BookmarkedBook {
                        book_id: b.id,
                        title: b.title.clone(),
                        author: b.author.clone(),
                        created_at: b.created_at,
                        bookmarked_at: bm.created_at,
                    })
            })
            .collect();
        let total = all.len() as i64;
        Ok((
            all.into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect(),
            total,
        ))
    }

    // --- Comments ---

    async fn add_comment(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        content: String,
    ) -> RepoResult<Comment> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let now = store.now();
        let comment = Comment {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            content,
            created_at: now,
            updated_at: now,
            author_username: store.username(user_id),
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }

    async fn get_comments(&self, book_id: Uuid) -> RepoResult<Vec<Comment>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store
            .comments
            .iter()
            .filter(|c| c.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        self.check()?;
        let store = self.store.lock().unwrap();
        Ok(store.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut store = self.store.lock().unwrap();
        let before = store.comments.len();
        store.comments.retain(|c| c.id != id);
        Ok(store.comments.len() < before)
    }
}

// --- TEST UTILITIES ---

pub fn test_state(repo: Arc<InMemoryRepository>) -> AppState {
    test_state_with_storage(repo, MockStorageService::new())
}

pub fn test_state_with_storage(
    repo: Arc<InMemoryRepository>,
    storage: MockStorageService,
) -> AppState {
    AppState {
        repo,
        storage: Arc::new(storage),
        config: AppConfig::default(),
    }
}

pub fn auth_user(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        role: user.role,
    }
}

/// A valid bearer token for `user_id`, signed with the default config secret.
pub fn token_for(user_id: Uuid) -> String {
    let config = AppConfig::default();
    auth::issue_token(user_id, &config.jwt_secret, config.token_ttl).expect("token")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
