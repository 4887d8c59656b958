//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::PostWorkflow;
use blog_core::ports::{PasswordService, PostRepository, RateLimiter, TokenService, UserRepository};
use blog_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

#[cfg(feature = "postgres")]
use blog_infra::{PostgresPostRepository, PostgresUserRepository, database::connect};

#[cfg(feature = "rate-limit")]
use blog_infra::InMemoryRateLimiter;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub workflow: PostWorkflow,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    /// Applied to the authentication endpoints when present.
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    pub home_page_size: u64,
}

impl AppState {
    /// Assemble state from already-built services.
    pub fn from_parts(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        home_page_size: u64,
    ) -> Self {
        Self {
            workflow: PostWorkflow::new(posts, users.clone()),
            users,
            tokens,
            passwords,
            rate_limiter: None,
            home_page_size,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let (posts, users) = repositories(config).await;

        let state = Self::from_parts(
            posts,
            users,
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            Arc::new(Argon2PasswordService::new()),
            config.home_page_size,
        );

        #[cfg(feature = "rate-limit")]
        let state = match InMemoryRateLimiter::new(config.rate_limit.clone()) {
            Ok(limiter) => state.with_rate_limiter(Arc::new(limiter)),
            Err(e) => {
                tracing::error!(error = %e, "Invalid rate limit configuration. Rate limiting disabled.");
                state
            }
        };

        tracing::info!("Application state initialized");
        state
    }
}

type Repositories = (Arc<dyn PostRepository>, Arc<dyn UserRepository>);

fn in_memory() -> Repositories {
    let store = Arc::new(InMemoryStore::new());
    (store.clone(), store)
}

#[cfg(feature = "postgres")]
async fn repositories(config: &AppConfig) -> Repositories {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return in_memory();
    };

    match connect(db_config).await {
        Ok(conn) => (
            Arc::new(PostgresPostRepository::new(conn.clone())),
            Arc::new(PostgresUserRepository::new(conn)),
        ),
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            in_memory()
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn repositories(_config: &AppConfig) -> Repositories {
    tracing::info!("Running without postgres feature - using in-memory store");
    in_memory()
}
