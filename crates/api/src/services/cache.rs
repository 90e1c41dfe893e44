//! Tagged read-through cache for serialized list pages.
//!
//! Entries are keyed by a logical key (see [`CacheKey`]) and carry one or
//! more tags. Invalidating a tag drops every entry carrying it.
//!
//! Each tag has a generation counter, and the physical moka key embeds the
//! current generation of every tag on the entry. Bumping a generation makes
//! every older entry unreachable at once, including entries whose compute
//! was still in flight when the invalidation happened. The old entries are
//! then reclaimed in the background.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use moka::future::Cache;
use tracing::{debug, warn};

use handset_core::CustomerId;

use crate::config::CacheConfig;
use crate::models::Pagination;

/// Tag carried by every user list page.
pub const USER_LIST_TAG: &str = "userList";
/// Tag carried by every phone list page.
pub const PHONE_LIST_TAG: &str = "phoneList";

/// Logical cache keys for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `phones-<page>-<limit>`
    Phones(Pagination),
    /// `users-<page>-<limit>-<customer>`; scoped to the caller.
    Users {
        owner: CustomerId,
        page: Pagination,
    },
}

impl CacheKey {
    /// The invalidation tag for this key.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Phones(_) => PHONE_LIST_TAG,
            Self::Users { .. } => USER_LIST_TAG,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phones(page) => write!(f, "phones-{}-{}", page.page, page.limit),
            Self::Users { owner, page } => {
                write!(f, "users-{}-{}-{owner}", page.page, page.limit)
            }
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    payload: Arc<str>,
    tags: Arc<[String]>,
}

/// Process-wide cache shared by the resource services.
///
/// Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct TaggedCache {
    inner: Arc<TaggedCacheInner>,
}

struct TaggedCacheInner {
    entries: Cache<String, CacheEntry>,
    generations: DashMap<String, u64>,
}

impl TaggedCache {
    /// Create a cache with the given capacity and time-to-live.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .support_invalidation_closures()
            .build();

        Self {
            inner: Arc::new(TaggedCacheInner {
                entries,
                generations: DashMap::new(),
            }),
        }
    }

    /// Current generation of `tag`. Starts at zero.
    #[must_use]
    pub fn generation(&self, tag: &str) -> u64 {
        self.inner.generations.get(tag).map_or(0, |g| *g)
    }

    fn physical_key(&self, key: &str, tags: &[String]) -> String {
        tags.iter().fold(key.to_owned(), |mut physical, tag| {
            physical.push('|');
            physical.push_str(tag);
            physical.push('@');
            physical.push_str(&self.generation(tag).to_string());
            physical
        })
    }

    /// Return the payload cached under `key`, computing it on a miss.
    ///
    /// Concurrent callers racing on the same missing key share a single
    /// compute and all receive its result. Computes for different keys never
    /// wait on each other. A failed compute is not cached; every waiter gets
    /// the same shared error.
    ///
    /// # Errors
    ///
    /// Returns the compute error, shared between all callers that waited on it.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        tags: &[&str],
        compute: F,
    ) -> Result<Arc<str>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Send + Sync + 'static,
    {
        let mut tags: Vec<String> = tags.iter().map(|t| (*t).to_owned()).collect();
        tags.sort_unstable();
        tags.dedup();
        let physical = self.physical_key(key, &tags);
        let tags: Arc<[String]> = tags.into();

        let entry = self
            .inner
            .entries
            .entry(physical)
            .or_try_insert_with(async move {
                let payload = compute().await?;
                Ok(CacheEntry {
                    payload: payload.into(),
                    tags,
                })
            })
            .await?;

        if entry.is_fresh() {
            debug!(key, "Cache miss");
        } else {
            debug!(key, "Cache hit");
        }

        Ok(entry.into_value().payload)
    }

    /// Drop every entry tagged with `tag`.
    pub fn invalidate(&self, tag: &str) {
        let generation = {
            let mut current = self.inner.generations.entry(tag.to_owned()).or_insert(0);
            *current += 1;
            *current
        };
        debug!(tag, generation, "Invalidated cache tag");

        let tag = tag.to_owned();
        if let Err(e) = self
            .inner
            .entries
            .invalidate_entries_if(move |_, entry| entry.tags.iter().any(|t| *t == tag))
        {
            warn!(error = %e, "Could not schedule removal of invalidated entries");
        }
    }
}
