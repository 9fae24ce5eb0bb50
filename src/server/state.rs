use crate::application::PlanUpgradeService;
use crate::infrastructure::{
    AppConfig, InMemorySubscriptionStore, PostgresSubscriptionStore, StoreBackend,
    SubscriptionStore,
};
use anyhow::Context;
use axum::http::HeaderName;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

pub type PlanUpgradeServiceType = PlanUpgradeService<dyn SubscriptionStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubscriptionStore>,
    pub upgrades: Arc<PlanUpgradeServiceType>,
    pub account_header: HeaderName,
}

/// Build state around an existing store.
///
/// Intended for embedding, or for tests that bring their own store.
pub fn build_state_with_store(
    config: &AppConfig,
    store: Arc<dyn SubscriptionStore>,
) -> anyhow::Result<AppState> {
    let account_header = HeaderName::from_bytes(config.account_header.trim().as_bytes())
        .context("parse account header name")?;

    let upgrades = Arc::new(PlanUpgradeService::new(store.clone()));

    Ok(AppState {
        store,
        upgrades,
        account_header,
    })
}

/// Build state from config + an existing pool.
///
/// Intended for embedding into a larger service that already manages a `PgPool`.
pub async fn build_state_with_pool(
    config: &AppConfig,
    pool: PgPool,
    run_migrations: bool,
) -> anyhow::Result<AppState> {
    if run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
    }

    build_state_with_store(config, Arc::new(PostgresSubscriptionStore::new(pool)))
}

/// Build state for the standalone server from the configured backend.
pub async fn build_state_from_env(config: &AppConfig) -> anyhow::Result<AppState> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory subscription store");
            build_state_with_store(config, Arc::new(InMemorySubscriptionStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("database_url is required for the postgres backend")?;
            let pool = PgPool::connect(url).await.context("connect database")?;
            info!("Using postgres subscription store");
            build_state_with_pool(config, pool, config.run_migrations).await
        }
    }
}
