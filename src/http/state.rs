//! Application state for the HTTP server.

use std::sync::Arc;

use chrono::Duration;

use crate::db::repository::FullRepository;
use crate::db::RepositoryConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// How long issued session tokens stay valid
    pub session_ttl: Duration,
    /// How long team invitations stay open
    pub invitation_ttl: Duration,
}

impl AppState {
    /// Create application state with the default token lifetimes.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_config(repository, &RepositoryConfig::default())
    }

    /// Create application state taking token lifetimes from a config.
    pub fn with_config(repository: Arc<dyn FullRepository>, config: &RepositoryConfig) -> Self {
        Self {
            repository,
            session_ttl: config.session_ttl(),
            invitation_ttl: config.invitation_ttl(),
        }
    }
}
