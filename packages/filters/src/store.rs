//! Session-wide holder for the current [`MapFilters`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::{FatalityFilter, MapFilters};

/// Shared, cloneable handle to the current map filters.
///
/// Every clone reads and writes the same value. Writes are visible to
/// the next read immediately, and every [`FilterStore::subscribe`]
/// receiver is notified so dependent views can refresh.
#[derive(Debug, Clone)]
pub struct FilterStore {
    tx: Arc<watch::Sender<MapFilters>>,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(MapFilters::default())
    }
}

impl FilterStore {
    /// Creates a store holding `initial`.
    #[must_use]
    pub fn new(initial: MapFilters) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a store from a shared link's query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::new(MapFilters::from_query(query))
    }

    /// The current filters.
    #[must_use]
    pub fn filters(&self) -> MapFilters {
        *self.tx.borrow()
    }

    /// The current fatality toggle.
    #[must_use]
    pub fn fatalities_only(&self) -> Option<FatalityFilter> {
        self.tx.borrow().fatalities_only
    }

    /// Applies a partial update (see [`MapFilters::merge`]).
    ///
    /// `FatalityFilter::No` is stored explicitly, so switching back to
    /// "show all" after "only fatal" takes effect. Subscribers are only
    /// notified when the value actually changed.
    pub fn set_filters(&self, update: MapFilters) {
        let changed = self.tx.send_if_modified(|current| current.merge(update));
        log::debug!("set_filters: update={update:?} changed={changed}");
    }

    /// Receiver that observes every change to the filters.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MapFilters> {
        self.tx.subscribe()
    }

    /// The current filters as a shareable query string.
    #[must_use]
    pub fn to_query(&self) -> String {
        self.filters().to_query()
    }
}
