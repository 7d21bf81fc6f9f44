use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use super::{CacheTag, Mutation, Query};
use crate::error::ApiError;
use crate::public::decode;
use crate::transport::RequestExecutor;

const INVALIDATION_CAPACITY: usize = 64;

#[derive(Debug)]
struct Entry {
    value: Value,
    tags: Vec<CacheTag>,
    stale: bool,
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    /// Provided tag to the keys of the entries that provided it.
    subscribers: HashMap<CacheTag, BTreeSet<String>>,
}

impl State {
    fn insert(&mut self, key: String, value: Value, tags: Vec<CacheTag>) {
        self.unlink(&key);
        for tag in &tags {
            self.subscribers
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        self.entries.insert(
            key,
            Entry {
                value,
                tags,
                stale: false,
            },
        );
    }

    fn unlink(&mut self, key: &str) {
        let Some(entry) = self.entries.get(key) else {
            return;
        };
        for tag in &entry.tags {
            if let Some(keys) = self.subscribers.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.subscribers.remove(tag);
                }
            }
        }
    }
}

/// Caches query results by key and invalidates them by tag.
///
/// Stale entries stay readable through [`QueryCache::cached`] but are
/// refetched by the next [`QueryCache::query`]. A cache that follows a
/// session holds nothing while that session is logged out.
pub struct QueryCache {
    executor: Arc<dyn RequestExecutor>,
    state: Mutex<State>,
    invalidations: broadcast::Sender<String>,
    authenticated: Option<watch::Receiver<bool>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CAPACITY);
        Self {
            executor,
            state: Mutex::new(State::default()),
            invalidations,
            authenticated: None,
        }
    }

    /// Drop every entry whenever `authenticated` reads `false`, including a
    /// logout forced by a failed refresh.
    #[must_use]
    pub fn follow_session(mut self, authenticated: watch::Receiver<bool>) -> Self {
        self.authenticated = Some(authenticated);
        self
    }

    fn logged_out(&self) -> bool {
        self.authenticated
            .as_ref()
            .is_some_and(|authenticated| !*authenticated.borrow())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.logged_out() && !state.entries.is_empty() {
            debug!(entries = state.entries.len(), "session ended; dropping cache");
            state.entries.clear();
            state.subscribers.clear();
        }
        state
    }

    /// Cache key of `query`: its name plus its serialized parameters.
    ///
    /// # Errors
    /// Fails when the query cannot be serialized.
    pub fn key<Q: Query>(query: &Q) -> Result<String, ApiError> {
        let params =
            serde_json::to_string(query).map_err(|err| ApiError::Decode(err.to_string()))?;
        Ok(format!("{}:{params}", Q::NAME))
    }

    /// Cached result when fresh, otherwise fetched and cached.
    ///
    /// # Errors
    /// Fetch or decode failures; a failed fetch leaves any stale entry in place.
    pub async fn query<Q: Query>(&self, query: &Q) -> Result<Q::Output, ApiError> {
        let key = Self::key(query)?;
        let cached = {
            let state = self.state();
            state
                .entries
                .get(&key)
                .filter(|entry| !entry.stale)
                .map(|entry| entry.value.clone())
        };

        match cached {
            Some(value) => {
                debug!(key = %key, "cache hit");
                decode(value)
            }
            None => self.fetch(key, query).await,
        }
    }

    /// Fetch `query` regardless of what is cached.
    ///
    /// # Errors
    /// Fetch or decode failures.
    pub async fn refetch<Q: Query>(&self, query: &Q) -> Result<Q::Output, ApiError> {
        let key = Self::key(query)?;
        self.fetch(key, query).await
    }

    async fn fetch<Q: Query>(&self, key: String, query: &Q) -> Result<Q::Output, ApiError> {
        debug!(key = %key, "fetching");
        let value = self.executor.execute(&query.request()?).await?;
        let output: Q::Output = decode(value.clone())?;
        if !self.logged_out() {
            let tags = query.provides(&output);
            self.state().insert(key, value, tags);
        }
        Ok(output)
    }

    /// Last cached result of `query`, fresh or stale.
    #[must_use]
    pub fn cached<Q: Query>(&self, query: &Q) -> Option<Q::Output> {
        let key = Self::key(query).ok()?;
        let value = self.state().entries.get(&key)?.value.clone();
        decode(value).ok()
    }

    /// Run `mutation` and, if it succeeds, invalidate its tags.
    ///
    /// # Errors
    /// The mutation's failure; nothing is invalidated then.
    pub async fn mutate<M: Mutation>(&self, mutation: &M) -> Result<M::Output, ApiError> {
        let value = self.executor.execute(&mutation.request()?).await?;
        self.invalidate(&mutation.invalidates());
        decode(value)
    }

    /// Mark every entry covered by `tags` stale and notify subscribers.
    ///
    /// Returns the affected keys in order.
    pub fn invalidate(&self, tags: &[CacheTag]) -> Vec<String> {
        let keys: Vec<String> = {
            let mut state = self.state();
            let keys: BTreeSet<String> = state
                .subscribers
                .iter()
                .filter(|(provided, _)| tags.iter().any(|tag| tag.covers(provided)))
                .flat_map(|(_, keys)| keys.iter().cloned())
                .collect();

            for key in &keys {
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.stale = true;
                }
            }
            keys.into_iter().collect()
        };

        if !keys.is_empty() {
            debug!(
                tags = ?tags.iter().map(ToString::to_string).collect::<Vec<_>>(),
                keys = keys.len(),
                "invalidated cache entries"
            );
        }
        for key in &keys {
            // No subscribers is fine.
            let _ = self.invalidations.send(key.clone());
        }
        keys
    }

    /// Stream of invalidated keys.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.invalidations.subscribe()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state().entries.contains_key(key)
    }

    /// Whether `key` is cached and stale.
    #[must_use]
    pub fn is_stale(&self, key: &str) -> bool {
        self.state().entries.get(key).is_some_and(|entry| entry.stale)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    /// Drop every entry, e.g. on logout.
    pub fn reset(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.subscribers.clear();
    }
}
