use std::sync::Arc;

use rallypoint_core::{DualStore, EngagementService, MemoryStore, PgStore, SignatureService, petition};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DualStore>,
    pub signatures: SignatureService,
    pub engagement: EngagementService,
}

impl AppState {
    pub fn with_store(store: Arc<DualStore>, config: &ServerConfig) -> Self {
        Self {
            signatures: SignatureService::new(store.clone()).with_default_goal(config.default_goal),
            engagement: EngagementService::new(store.clone()),
            store,
        }
    }

    /// Wires the durable store (when configured) in front of a process-wide
    /// in-memory fallback.
    pub async fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let fallback = Arc::new(MemoryStore::seeded());

        let store = match &config.database_url {
            Some(url) => {
                let durable = PgStore::connect_lazy(url, config.max_connections, config.store_timeout())?
                    .with_seed([petition::flagship()]);
                prepare_durable(&durable, &config).await;
                DualStore::new(Arc::new(durable), fallback, config.store_timeout())
            }
            None => {
                tracing::warn!("DATABASE_URL not set, signatures are kept in memory only");
                DualStore::fallback_only(fallback)
            }
        };

        Ok(Self::with_store(Arc::new(store), &config))
    }
}

/// Best effort: a database that is down at boot is bootstrapped on its first
/// successful use instead.
async fn prepare_durable(durable: &PgStore, config: &ServerConfig) {
    match tokio::time::timeout(config.store_timeout(), durable.bootstrap()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "could not prepare durable store schema, will retry on use"),
        Err(_) => tracing::warn!(
            timeout_ms = config.store_timeout_ms,
            "durable store did not answer during startup, will retry on use"
        ),
    }
}
