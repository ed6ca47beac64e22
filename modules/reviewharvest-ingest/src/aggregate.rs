//! Request-level orchestration: per-source fetch-and-extract tasks run
//! concurrently, their candidates merge into one dedup/validate pass, and
//! the surviving reviews are persisted behind the freshness window.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use reviewharvest_common::{HeuristicLists, ProductRef, RawCandidate, SourceKind, ValidatedReview};
use reviewharvest_store::ReviewStore;

use crate::config::PipelineConfig;
use crate::dedup::deduplicate;
use crate::escalation::{needs_js_rendering, RenderBudget};
use crate::extract::{extract_candidates, ExtractionContext};
use crate::fetch::Fetcher;
use crate::render::{PageRenderer, RenderOptions};
use crate::validate::{validate_and_normalize, Classifier};

/// One requested source: the kind plus the candidate page URLs to read.
#[derive(Debug, Clone)]
pub struct SourceTarget {
    pub kind: SourceKind,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestStats {
    pub raw_candidates: usize,
    pub after_dedup: usize,
    pub validated: usize,
    pub persisted: u64,
    pub renders_used: usize,
    pub cached_sources: usize,
}

impl std::fmt::Display for HarvestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} raw, {} after dedup, {} validated, {} persisted, {} renders, {} cached sources",
            self.raw_candidates,
            self.after_dedup,
            self.validated,
            self.persisted,
            self.renders_used,
            self.cached_sources
        )
    }
}

pub struct HarvestOutcome {
    pub reviews: Vec<ValidatedReview>,
    pub stats: HarvestStats,
}

pub struct Aggregator {
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn PageRenderer>,
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn ReviewStore>,
    lists: Arc<HeuristicLists>,
    config: PipelineConfig,
}

impl Aggregator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn PageRenderer>,
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn ReviewStore>,
        lists: HeuristicLists,
        config: PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            classifier,
            store,
            lists: Arc::new(lists),
            config,
        }
    }

    /// Harvest reviews for a product across the requested sources.
    ///
    /// One source's total failure never cancels or degrades another
    /// source's task; failures become empty contributions and the request
    /// still succeeds with whatever was obtained.
    pub async fn fetch_reviews(
        &self,
        product: &ProductRef,
        sources: Vec<SourceTarget>,
        force_refresh: bool,
    ) -> HarvestOutcome {
        let mut stats = HarvestStats::default();
        let budget = Arc::new(RenderBudget::new(self.config.render_page_cap));

        // Freshness: sources with recent persisted reviews contribute them
        // without re-fetching, unless the caller forces a refresh.
        let mut cached: Vec<ValidatedReview> = Vec::new();
        let mut to_fetch: Vec<SourceTarget> = Vec::new();

        if force_refresh {
            to_fetch = sources;
        } else {
            let since = Utc::now() - ChronoDuration::days(self.config.freshness_days);
            for target in sources {
                match self.store.fresh_reviews(product.id, target.kind, since).await {
                    Ok(rows) if !rows.is_empty() => {
                        info!(
                            source = target.kind.as_str(),
                            count = rows.len(),
                            "Serving fresh persisted reviews without re-fetching"
                        );
                        stats.cached_sources += 1;
                        cached.extend(rows);
                    }
                    Ok(_) => to_fetch.push(target),
                    Err(e) => {
                        warn!(
                            source = target.kind.as_str(),
                            error = %e,
                            "Freshness check failed, fetching source anyway"
                        );
                        to_fetch.push(target);
                    }
                }
            }
        }

        // Per-source tasks, launched together and awaited jointly.
        let handles: Vec<_> = to_fetch
            .into_iter()
            .map(|target| {
                let task = SourceTask {
                    fetcher: self.fetcher.clone(),
                    renderer: self.renderer.clone(),
                    lists: self.lists.clone(),
                    budget: budget.clone(),
                    config: self.config.clone(),
                    product_name: product.name.clone(),
                };
                tokio::spawn(async move { task.run(target).await })
            })
            .collect();

        let mut raw: Vec<RawCandidate> = Vec::new();
        for result in join_all(handles).await {
            match result {
                Ok(candidates) => raw.extend(candidates),
                Err(e) => {
                    // A panicked task is isolated the same way a failed
                    // fetch is: logged, empty contribution.
                    error!(error = %e, "Source task aborted");
                }
            }
        }

        stats.raw_candidates = raw.len();

        let deduped = deduplicate(raw, self.config.near_dup_threshold);
        stats.after_dedup = deduped.len();

        let validated =
            validate_and_normalize(self.classifier.as_ref(), deduped, product, &self.config).await;
        stats.validated = validated.len();

        if !validated.is_empty() {
            match self.store.upsert_reviews(product.id, &validated).await {
                Ok(written) => stats.persisted = written,
                Err(e) => {
                    warn!(product = %product.name, error = %e, "Failed to persist reviews");
                }
            }
        }

        stats.renders_used = budget.used();
        info!(product = %product.name, "Harvest complete: {stats}");

        let mut reviews = validated;
        reviews.extend(cached);
        HarvestOutcome { reviews, stats }
    }
}

/// The work of one source within one request. Never returns an error:
/// fetch and render failures are logged at this boundary and fold into an
/// empty candidate list.
struct SourceTask {
    fetcher: Arc<dyn Fetcher>,
    renderer: Arc<dyn PageRenderer>,
    lists: Arc<HeuristicLists>,
    budget: Arc<RenderBudget>,
    config: PipelineConfig,
    product_name: String,
}

impl SourceTask {
    async fn run(&self, target: SourceTarget) -> Vec<RawCandidate> {
        let mut candidates = Vec::new();
        for url in &target.urls {
            let url = match target.kind {
                SourceKind::Reddit => crate::extract::canonical_reddit_url(url),
                _ => url.clone(),
            };
            candidates.extend(self.harvest_page(&url, target.kind).await);
        }
        info!(
            source = target.kind.as_str(),
            candidates = candidates.len(),
            "Source task finished"
        );
        candidates
    }

    async fn harvest_page(&self, url: &str, kind: SourceKind) -> Vec<RawCandidate> {
        let mut fetched = self.fetcher.fetch(url).await;

        if needs_js_rendering(&fetched.html, &self.lists) {
            if self.budget.try_acquire() {
                let options = RenderOptions {
                    wait_selectors: wait_selectors(kind),
                    timeout: self.config.render_timeout,
                    settle_wait: self.config.render_settle_wait,
                };
                match self.renderer.render(url, &options).await {
                    Ok(html) if !html.trim().is_empty() => {
                        fetched.html = html;
                        fetched.render_used = true;
                    }
                    Ok(_) => {
                        warn!(url, "Render produced empty HTML, extracting from original");
                    }
                    Err(e) => {
                        warn!(url, error = %e, "Render failed, extracting from original");
                    }
                }
            } else {
                // Budget exhausted: extract from the thin HTML we have
                info!(url, "Render budget exhausted, skipping escalation");
            }
        }

        if fetched.html.is_empty() {
            return Vec::new();
        }

        let ctx = ExtractionContext {
            product_name: &self.product_name,
            lists: &self.lists,
        };
        extract_candidates(&fetched.html, kind, url, &ctx)
    }
}

/// DOM shapes worth waiting for per source kind when rendering.
fn wait_selectors(kind: SourceKind) -> Vec<String> {
    let selectors: &[&str] = match kind {
        SourceKind::Store => &["[data-hook=review]", ".review", ".review-item"],
        SourceKind::Reddit => &["div.comment", "shreddit-comment"],
        SourceKind::Forum => &[".post", ".postbody"],
    };
    selectors.iter().map(|s| s.to_string()).collect()
}
