// Library exports for the server binary and integration tests

pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use handlers::{api, pages};
use services::{commands::CommandProcessor, config_store::ConfigStore, item_store::ItemStore};
use utils::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub site_config: Arc<ConfigStore>,
    pub items: Arc<ItemStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let site_config = Arc::new(ConfigStore::new(&config.config_file));
        let items = Arc::new(ItemStore::new(&config.data_file));

        Self {
            config: Arc::new(config),
            site_config,
            items,
        }
    }

    /// Command front-end over the same stores the HTTP handlers use.
    pub fn command_processor(&self) -> CommandProcessor {
        CommandProcessor::new(self.site_config.clone(), self.items.clone())
    }
}

/// Build the application router (without middleware layers)
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        // Public pages
        .route("/", get(pages::index))
        .route("/item/:slug", get(pages::item_page))

        // REST API
        .route("/api", get(api::api_root))
        .route("/api/items", get(api::list_items).post(api::create_item))
        .route(
            "/api/items/:id",
            get(api::get_item).put(api::update_item).delete(api::delete_item),
        )
        .route("/api/config", put(api::update_config))

        .with_state(app_state)
}
