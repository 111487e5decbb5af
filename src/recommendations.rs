//! Recommendation feed.
//!
//! Candidates come from three pools fetched concurrently (personal preferences or recency,
//! popularity, and a random sample) in fixed proportions, then get blended: shuffled,
//! deduplicated by book id and cut to the requested size.

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    models::{Book, BookCategory, BookTag},
    repository::{RepoResult, Repository},
};

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;
pub const MAX_RECOMMENDATION_LIMIT: usize = 50;

/// Clamps the requested size to `1..=MAX_RECOMMENDATION_LIMIT`; zero or absent means default.
pub fn resolve_limit(requested: Option<usize>) -> usize {
    match requested {
        Some(0) | None => DEFAULT_RECOMMENDATION_LIMIT,
        Some(n) => n.min(MAX_RECOMMENDATION_LIMIT),
    }
}

/// PersonalizedQuotas
///
/// 40% preference matches, 30% popular, the rest random. Integer division floors the first
/// two shares, so the three always add up to `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonalizedQuotas {
    pub preferred: usize,
    pub popular: usize,
    pub random: usize,
}

impl PersonalizedQuotas {
    pub fn for_limit(limit: usize) -> Self {
        let preferred = limit * 2 / 5;
        let popular = limit * 3 / 10;
        Self {
            preferred,
            popular,
            random: limit - preferred - popular,
        }
    }
}

/// GuestQuotas
///
/// 40% popular, 40% most recent, the rest random.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestQuotas {
    pub popular: usize,
    pub recent: usize,
    pub random: usize,
}

impl GuestQuotas {
    pub fn for_limit(limit: usize) -> Self {
        let popular = limit * 2 / 5;
        let recent = limit * 2 / 5;
        Self {
            popular,
            recent,
            random: limit - popular - recent,
        }
    }
}

/// ReadingProfile
///
/// What a user's reading history says about them: the books already read (never
/// recommended again) and the categories and tags they gravitate to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingProfile {
    pub read_ids: Vec<Uuid>,
    pub categories: Vec<BookCategory>,
    pub tags: Vec<BookTag>,
}

impl ReadingProfile {
    pub fn from_books(books: &[Book]) -> Self {
        let mut profile = ReadingProfile::default();
        for book in books {
            if !profile.read_ids.contains(&book.id) {
                profile.read_ids.push(book.id);
            }
            if !profile.categories.contains(&book.category) {
                profile.categories.push(book.category);
            }
            for tag in &book.tags {
                if !profile.tags.contains(tag) {
                    profile.tags.push(*tag);
                }
            }
        }
        profile
    }

    pub fn has_preferences(&self) -> bool {
        !self.categories.is_empty() || !self.tags.is_empty()
    }
}

/// blend
///
/// Fisher-Yates shuffle of the concatenated pools, then drops repeated ids (first
/// occurrence wins) and truncates to `limit`.
pub fn blend<R: Rng + ?Sized>(pools: Vec<Vec<Book>>, limit: usize, rng: &mut R) -> Vec<Book> {
    let mut books: Vec<Book> = pools.into_iter().flatten().collect();
    books.shuffle(rng);

    let mut seen = HashSet::new();
    books.retain(|book| seen.insert(book.id));
    books.truncate(limit);
    books
}

/// recommend_books
///
/// Builds the feed for `user_id`, or the guest feed when there is no caller or the caller's
/// account no longer exists.
pub async fn recommend_books(
    repo: &dyn Repository,
    user_id: Option<Uuid>,
    limit: usize,
) -> RepoResult<Vec<Book>> {
    let history = match user_id {
        Some(id) => repo.reading_history_books(id).await?,
        None => None,
    };

    let pools = match history {
        Some(read_books) => {
            let profile = ReadingProfile::from_books(&read_books);
            personalized_pools(repo, &profile, PersonalizedQuotas::for_limit(limit)).await?
        }
        None => guest_pools(repo, GuestQuotas::for_limit(limit)).await?,
    };

    // ThreadRng is not Send; it must be created after the last await.
    let mut rng = rand::thread_rng();
    Ok(blend(pools, limit, &mut rng))
}

async fn personalized_pools(
    repo: &dyn Repository,
    profile: &ReadingProfile,
    quotas: PersonalizedQuotas,
) -> RepoResult<Vec<Vec<Book>>> {
    let exclude = profile.read_ids.as_slice();

    let preferred = async {
        if profile.has_preferences() && quotas.preferred > 0 {
            repo.preferred_books(
                exclude,
                &profile.categories,
                &profile.tags,
                quotas.preferred as i64,
            )
            .await
        } else {
            Ok(Vec::new())
        }
    };

    let (preferred, popular, random) = tokio::try_join!(
        preferred,
        fetch_or_empty(quotas.popular, || repo.popular_books(exclude, quotas.popular as i64)),
        fetch_or_empty(quotas.random, || repo.random_books(exclude, quotas.random as i64)),
    )?;

    Ok(vec![preferred, popular, random])
}

async fn guest_pools(repo: &dyn Repository, quotas: GuestQuotas) -> RepoResult<Vec<Vec<Book>>> {
    let (popular, recent, random) = tokio::try_join!(
        fetch_or_empty(quotas.popular, || repo.popular_books(&[], quotas.popular as i64)),
        fetch_or_empty(quotas.recent, || repo.recent_books(quotas.recent as i64)),
        fetch_or_empty(quotas.random, || repo.random_books(&[], quotas.random as i64)),
    )?;

    Ok(vec![popular, recent, random])
}

// Skips the query entirely for an empty quota.
async fn fetch_or_empty<F, Fut>(quota: usize, fetch: F) -> RepoResult<Vec<Book>>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = RepoResult<Vec<Book>>>,
{
    if quota == 0 {
        return Ok(Vec::new());
    }
    fetch().await
}
