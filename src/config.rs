use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use compute::{Clock, RecurringBillService, SystemClock};
use sea_orm::{Database, DatabaseConnection};
use serde::Deserialize;

use crate::cache::MokaAggregateCache;

/// Runtime settings.
///
/// Read from an optional `billcycle.toml`, then `BILLCYCLE_*` environment
/// variables. `DATABASE_URL` wins over both.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    /// Periods kept ahead of today for bills without their own look-ahead.
    pub default_lookahead_periods: u32,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = ::config::Config::builder()
            .set_default("database_url", "sqlite://billcycle.db?mode=rwc")?
            .set_default("default_lookahead_periods", 3)?
            .set_default("cache_capacity", 1000)?
            .set_default("cache_ttl_secs", 300)?
            .add_source(::config::File::with_name("billcycle").required(false))
            .add_source(::config::Environment::with_prefix("BILLCYCLE"))
            .set_override_option("database_url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Replaces the database URL when one was given on the command line.
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        self
    }
}

/// Shared state of one CLI invocation.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub cache: Arc<MokaAggregateCache>,
    pub settings: Settings,
}

impl AppState {
    /// The bill engine reading the system clock.
    pub fn service(&self) -> RecurringBillService {
        self.service_with_clock(Arc::new(SystemClock))
    }

    pub fn service_with_clock(&self, clock: Arc<dyn Clock>) -> RecurringBillService {
        RecurringBillService::new_with_lookahead(
            self.db.clone(),
            clock,
            self.cache.clone(),
            self.settings.default_lookahead_periods,
        )
    }
}

/// Connects to the database and builds the cache.
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let cache = MokaAggregateCache::new(
        settings.cache_capacity,
        Duration::from_secs(settings.cache_ttl_secs),
    );

    Ok(AppState {
        db,
        cache: Arc::new(cache),
        settings,
    })
}
