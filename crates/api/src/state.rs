//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Storage;
use crate::services::auth::TokenIssuer;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; carries the storage backend and the
/// token issuer. Handlers never touch configuration or the environment
/// directly.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    storage: Arc<dyn Storage>,
    tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, tokens: TokenIssuer) -> Self {
        Self {
            inner: Arc::new(AppStateInner { storage, tokens }),
        }
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.inner.storage.as_ref()
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }
}
