//! Estado compartido de la aplicación
//!
//! Este módulo define el estado que se pasa a través del router de Axum.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::listing_query::ListingDefaults;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<EnvironmentConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    pub fn listing_defaults(&self) -> ListingDefaults {
        ListingDefaults {
            per_page: self.config.listings_per_page,
            popular_min_views: self.config.popular_min_views,
        }
    }
}
