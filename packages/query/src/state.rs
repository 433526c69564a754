//! The tri-state view of a query.

use std::sync::Arc;

use crate::QueryError;

/// What a view renders for a query: a spinner, the data, or an error.
#[derive(Debug)]
pub enum QueryState<T> {
    /// The fetch is still in flight.
    Loading,
    /// The fetch succeeded.
    Success(Arc<T>),
    /// The fetch failed.
    Error(Arc<QueryError>),
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading => Self::Loading,
            Self::Success(data) => Self::Success(Arc::clone(data)),
            Self::Error(e) => Self::Error(Arc::clone(e)),
        }
    }
}

impl<T> QueryState<T> {
    /// The data, once loaded successfully.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Loading | Self::Error(_) => None,
        }
    }

    /// Whether the fetch is still in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the fetch failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&QueryError> {
        match self {
            Self::Error(e) => Some(e),
            Self::Loading | Self::Success(_) => None,
        }
    }

    /// Transforms the loaded data, keeping loading and error states.
    #[must_use]
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> QueryState<U> {
        match self {
            Self::Loading => QueryState::Loading,
            Self::Success(data) => QueryState::Success(Arc::new(f(data))),
            Self::Error(e) => QueryState::Error(Arc::clone(e)),
        }
    }
}
