//! Application state for printeasy-cloud

use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cleanup::{self, CLEANUP_QUEUE_CAPACITY};
use crate::config::Config;
use crate::live::{EventDispatcher, SessionRegistry};
use crate::store::{DataStore, PgStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Persistence seam (PostgreSQL in production)
    pub store: Arc<dyn DataStore>,
    /// Connected WebSocket sessions
    pub registry: Arc<SessionRegistry>,
    /// Single ingress for post-commit domain events
    pub dispatcher: Arc<EventDispatcher>,
    /// JWT secret for user authentication
    pub jwt_secret: String,
}

impl AppState {
    /// Create a new AppState: pool, migrations, cleanup worker, dispatcher
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let store: Arc<dyn DataStore> = Arc::new(PgStore::new(pool));
        let registry = Arc::new(SessionRegistry::new());

        let (cleanup_tx, cleanup_rx) = mpsc::channel(CLEANUP_QUEUE_CAPACITY);
        cleanup::spawn_worker(store.clone(), config.upload_dir.clone().into(), cleanup_rx);

        let dispatcher = Arc::new(EventDispatcher::new(registry.clone(), cleanup_tx));

        Ok(Self {
            store,
            registry,
            dispatcher,
            jwt_secret: config.jwt_secret.clone(),
        })
    }
}
