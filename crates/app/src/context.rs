//! App Context

use std::{sync::Arc, time::Duration};

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::{
    admission::{AdmissionConfig, RateLimiter},
    auth::{AuthorizationGate, CredentialStore, PgPermissionsRepository, PgTokensRepository},
    clock::Clock,
    database::{self, DEFAULT_STORE_TIMEOUT},
    domain::{
        mailer::Mailer,
        movies::{MoviesService, PgMoviesService},
        users::{PgUsersService, UsersService},
    },
    lifecycle::Lifecycle,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

/// What the context needs to wire itself up.
#[derive(Debug, Clone)]
pub struct ContextSettings {
    pub database_url: String,
    pub max_connections: u32,

    /// Deadline for every record store call.
    pub store_timeout: Duration,

    pub admission: AdmissionConfig,
}

impl ContextSettings {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            admission: AdmissionConfig::default(),
        }
    }
}

/// The request pipeline's shared components.
#[derive(Clone)]
pub struct AppContext {
    pub admission: Arc<RateLimiter>,
    pub credentials: CredentialStore,
    pub gate: AuthorizationGate,
    pub movies: Arc<dyn MoviesService>,
    pub users: Arc<dyn UsersService>,
    pub lifecycle: Lifecycle,
    pool: Option<PgPool>,
}

impl AppContext {
    /// Connect to the store, build every component, and start the admission
    /// sweep.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn connect(
        settings: &ContextSettings,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(&settings.database_url, settings.max_connections)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::with_pool(settings, pool, clock, mailer))
    }

    /// Build every component over an existing pool and start the admission
    /// sweep.
    #[must_use]
    pub fn with_pool(
        settings: &ContextSettings,
        pool: PgPool,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let lifecycle = Lifecycle::new();
        let admission = Arc::new(RateLimiter::new(settings.admission.clone(), clock.clone()));

        let credentials = CredentialStore::new(
            Arc::new(PgTokensRepository::new(pool.clone())),
            clock.clone(),
        )
        .with_timeout(settings.store_timeout);
        let gate = AuthorizationGate::new(Arc::new(PgPermissionsRepository::new(pool.clone())))
            .with_timeout(settings.store_timeout);

        let movies = PgMoviesService::new(pool.clone(), clock).with_timeout(settings.store_timeout);
        let users = PgUsersService::new(
            pool.clone(),
            credentials.clone(),
            gate.clone(),
            mailer,
            lifecycle.clone(),
        )
        .with_timeout(settings.store_timeout);

        admission.spawn_sweeper(&lifecycle);

        Self {
            admission,
            credentials,
            gate,
            movies: Arc::new(movies),
            users: Arc::new(users),
            lifecycle,
            pool: Some(pool),
        }
    }

    /// Assemble a context from ready-made components, with no pool to close.
    #[must_use]
    pub fn from_parts(
        admission: Arc<RateLimiter>,
        credentials: CredentialStore,
        gate: AuthorizationGate,
        movies: Arc<dyn MoviesService>,
        users: Arc<dyn UsersService>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            admission,
            credentials,
            gate,
            movies,
            users,
            lifecycle,
            pool: None,
        }
    }

    /// Signal shutdown, let tracked work drain for up to `grace`, then release
    /// the store connection. Returns `false` if work was still running.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let drained = self.lifecycle.shutdown(grace).await;

        if let Some(pool) = &self.pool {
            pool.close().await;

            info!("database pool closed");
        }

        drained
    }
}
