pub mod catalog;
pub mod config;
pub mod http;
pub mod merge;

// Re-export frequently used items for easier access
pub use catalog::{CatalogStore, MemoryCatalog};
pub use http::{build_router, AppState};
pub use merge::{list_endpoints, merge_documents, DocumentInfo, OperationSelection, SourceSet};

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Merge error: {0}")]
    MergeError(#[from] merge::MergeError),

    #[error("Store error: {0}")]
    StoreError(#[from] catalog::StoreError),

    #[error("Server error: {0}")]
    ServerError(#[from] hyper::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Serve the documentation hub over HTTP until the process is stopped
pub async fn serve(config: &config::Config, store: Arc<dyn CatalogStore>) -> Result<()> {
    let state = AppState::new(store, config);
    let app = build_router(state);

    tracing::info!(
        bind = %config.bind,
        login_guard = config.login_gateway_url.is_some(),
        "openapi-hub listening"
    );

    axum::Server::bind(&config.bind)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
