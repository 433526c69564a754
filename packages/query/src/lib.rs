#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-session query cache for dashboard data.
//!
//! [`QueryClient::fetch`] runs a fetcher at most once per [`QueryKey`]:
//!
//! - concurrent requests for the same key share a single in-flight fetch;
//! - once a fetch settles, its outcome (data *or* error) is served for the
//!   rest of the session, with no automatic refetch;
//! - a new key (e.g. a different filter value) triggers a fresh fetch.
//!
//! Fetches run in their own `tokio` task, so a caller that stops waiting
//! does not cancel the fetch; its result is still stored. Errors are not
//! retried unless the entry is explicitly [`QueryClient::invalidate`]d.

pub mod key;
pub mod state;

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

pub use key::QueryKey;
pub use state::QueryState;

/// Errors surfaced through [`QueryState::Error`].
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The fetcher returned an error.
    #[error("fetch failed: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The key is cached with a different payload type than requested.
    #[error("cached value for {key} has a different type than requested")]
    TypeMismatch {
        /// The offending key.
        key: String,
    },

    /// The fetch task ended without producing a result (it panicked).
    #[error("fetch task for {key} ended without a result")]
    TaskFailed {
        /// The affected key.
        key: String,
    },
}

type Erased = Arc<dyn Any + Send + Sync>;
type Outcome = Result<Erased, Arc<QueryError>>;

enum Entry {
    InFlight(watch::Receiver<Option<Outcome>>),
    Settled(Outcome),
}

/// What [`QueryClient::fetch`] decided to do while holding the lock.
enum Plan {
    Cached(Outcome),
    Join(watch::Receiver<Option<Outcome>>),
    Start(watch::Sender<Option<Outcome>>, watch::Receiver<Option<Outcome>>),
}

/// Process-wide query cache.
///
/// Cheap to clone; every clone shares the same entries. Entries are only
/// ever written by the cache's own fetch tasks.
#[derive(Clone, Default)]
pub struct QueryClient {
    entries: Arc<Mutex<BTreeMap<QueryKey, Entry>>>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.lock().len())
            .finish()
    }
}

impl QueryClient {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached state for `key`, fetching it with `fetcher` if
    /// it has never been requested.
    ///
    /// `fetcher` is only called when a fetch actually starts. Must be
    /// called from within a `tokio` runtime.
    pub async fn fetch<T, E, F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let plan = {
            let mut entries = self.lock();
            match entries.get(&key) {
                Some(Entry::Settled(outcome)) => Plan::Cached(outcome.clone()),
                Some(Entry::InFlight(rx)) => Plan::Join(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    entries.insert(key.clone(), Entry::InFlight(rx.clone()));
                    Plan::Start(tx, rx)
                }
            }
        };

        let mut rx = match plan {
            Plan::Cached(outcome) => {
                log::trace!("Query {key}: cache hit");
                return into_state(&key, outcome);
            }
            Plan::Join(rx) => {
                log::debug!("Query {key}: joining in-flight fetch");
                rx
            }
            Plan::Start(tx, rx) => {
                log::debug!("Query {key}: fetching");
                self.spawn_fetch(key.clone(), fetcher(), tx);
                rx
            }
        };

        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map(|outcome| (*outcome).clone());

        match outcome {
            Ok(Some(outcome)) => into_state(&key, outcome),
            Ok(None) | Err(_) => {
                let e = Arc::new(QueryError::TaskFailed {
                    key: key.to_string(),
                });
                log::error!("Query {key}: {e}");
                self.lock().insert(key, Entry::Settled(Err(Arc::clone(&e))));
                QueryState::Error(e)
            }
        }
    }

    /// Returns the current state of `key` without fetching.
    ///
    /// `None` if the key has never been requested.
    #[must_use]
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<QueryState<T>> {
        match self.lock().get(key)? {
            Entry::InFlight(_) => Some(QueryState::Loading),
            Entry::Settled(outcome) => Some(into_state(key, outcome.clone())),
        }
    }

    /// Drops the settled entry for `key` so the next [`Self::fetch`] runs
    /// again.
    ///
    /// In-flight fetches are left alone. Returns `true` if an entry was
    /// removed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut entries = self.lock();
        if matches!(entries.get(key), Some(Entry::Settled(_))) {
            entries.remove(key);
            log::debug!("Query {key}: invalidated");
            true
        } else {
            false
        }
    }

    fn spawn_fetch<T, E, Fut>(&self, key: QueryKey, fut: Fut, tx: watch::Sender<Option<Outcome>>)
    where
        T: Send + Sync + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);

        tokio::spawn(async move {
            let outcome: Outcome = match fut.await {
                Ok(value) => Ok(Arc::new(value) as Erased),
                Err(e) => {
                    let e = QueryError::Fetch(e.into());
                    log::warn!("Query {key}: {e}");
                    Err(Arc::new(e))
                }
            };

            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key, Entry::Settled(outcome.clone()));
            tx.send_replace(Some(outcome));
        });
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn into_state<T: Send + Sync + 'static>(key: &QueryKey, outcome: Outcome) -> QueryState<T> {
    match outcome {
        Ok(value) => value.downcast::<T>().map_or_else(
            |_| {
                QueryState::Error(Arc::new(QueryError::TypeMismatch {
                    key: key.to_string(),
                }))
            },
            QueryState::Success,
        ),
        Err(e) => QueryState::Error(e),
    }
}
