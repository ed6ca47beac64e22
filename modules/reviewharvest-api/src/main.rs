use std::sync::Arc;

use anyhow::Result;
use axum::{routing::post, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reviewharvest_common::{Config, HeuristicLists};
use reviewharvest_ingest::discovery::{NoopDiscovery, UrlDiscovery};
use reviewharvest_ingest::fetch::PageFetcher;
use reviewharvest_ingest::render::select_renderer;
use reviewharvest_ingest::{Aggregator, PipelineConfig};
use reviewharvest_store::{PgProductCatalog, PgReviewStore, ProductCatalog};

mod rest;

pub struct AppState {
    pub aggregator: Aggregator,
    pub discovery: Arc<dyn UrlDiscovery>,
    pub catalog: Arc<dyn ProductCatalog>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reviewharvest=info".parse()?))
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let store = PgReviewStore::new(pool.clone());
    store.migrate().await?;

    let pipeline_config = PipelineConfig::default();
    let fetcher = Arc::new(PageFetcher::new(pipeline_config.fetch_timeout));
    let renderer = select_renderer(
        config.browserless_url.as_deref(),
        config.browserless_token.as_deref(),
    );
    let classifier = Arc::new(classifier_client::ClassifierClient::new(&config.openai_api_key));

    let aggregator = Aggregator::new(
        fetcher,
        renderer,
        classifier,
        Arc::new(store),
        HeuristicLists::default(),
        pipeline_config,
    );

    let state = Arc::new(AppState {
        aggregator,
        // URL discovery is an external search-provider concern; without
        // one configured, community requests harvest nothing.
        discovery: Arc::new(NoopDiscovery),
        catalog: Arc::new(PgProductCatalog::new(pool)),
    });

    let app = Router::new()
        .route("/reviews/community", post(rest::community_reviews))
        .route("/reviews/store", post(rest::store_reviews))
        .route("/product/{id}/reviews", post(rest::product_reviews))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(addr, "reviewharvest API listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
