// One-off pipeline runs from the command line. Useful for poking at a
// product's sources without standing up the API.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use reviewharvest_common::{Config, HeuristicLists, ProductRef, SourceKind};
use reviewharvest_ingest::fetch::PageFetcher;
use reviewharvest_ingest::render::select_renderer;
use reviewharvest_ingest::{Aggregator, PipelineConfig, SourceTarget};
use reviewharvest_store::{MemoryReviewStore, PgReviewStore, ReviewStore};

#[derive(Parser, Debug)]
#[command(name = "harvest", about = "Harvest reviews for a product from explicit source URLs")]
struct Args {
    /// Product name to match against page content
    #[arg(long)]
    product: String,

    /// Product brand, if known
    #[arg(long)]
    brand: Option<String>,

    /// Known product UUID; a random one is used when omitted
    #[arg(long)]
    product_id: Option<Uuid>,

    /// Source URL as kind=url (e.g. store=https://..., reddit=https://...);
    /// repeatable
    #[arg(long = "source", value_parser = parse_source)]
    sources: Vec<(SourceKind, String)>,

    /// Bypass the freshness window
    #[arg(long)]
    force_refresh: bool,

    /// Skip Postgres and keep results in memory (prints them regardless)
    #[arg(long)]
    dry_run: bool,
}

fn parse_source(s: &str) -> std::result::Result<(SourceKind, String), String> {
    let (kind, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected kind=url, got '{s}'"))?;
    let kind = SourceKind::parse(kind).ok_or_else(|| format!("unknown source kind '{kind}'"))?;
    Ok((kind, url.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reviewharvest=info".parse()?))
        .init();

    let args = Args::parse();
    if args.sources.is_empty() {
        anyhow::bail!("at least one --source kind=url is required");
    }

    let config = Config::from_env();

    let store: Arc<dyn ReviewStore> = if args.dry_run {
        Arc::new(MemoryReviewStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await?;
        let store = PgReviewStore::new(pool);
        store.migrate().await?;
        Arc::new(store)
    };

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
        store,
        HeuristicLists::default(),
        pipeline_config,
    );

    let product = ProductRef::new(
        args.product_id.unwrap_or_else(Uuid::new_v4),
        &args.product,
        args.brand.as_deref(),
    );

    // Group repeated --source flags by kind
    let mut targets: Vec<SourceTarget> = Vec::new();
    for (kind, url) in args.sources {
        match targets.iter_mut().find(|t| t.kind == kind) {
            Some(target) => target.urls.push(url),
            None => targets.push(SourceTarget {
                kind,
                urls: vec![url],
            }),
        }
    }

    info!(product = %product.name, sources = targets.len(), "Harvest starting");

    let outcome = aggregator
        .fetch_reviews(&product, targets, args.force_refresh)
        .await;

    println!("{}", serde_json::to_string_pretty(&outcome.reviews)?);
    info!("Done: {}", outcome.stats);

    Ok(())
}
