use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use reviewharvest_common::{ProductRef, SourceKind, ValidatedReview};
use reviewharvest_ingest::{HarvestOutcome, SourceTarget};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CommunityRequest {
    pub product_name: String,
    pub brand: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    pub product_name: String,
    pub store_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductReviewsRequest {
    pub sources: Vec<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

/// Reddit/forum path: discover discussion URLs for an ad-hoc product and
/// run the community sources.
pub async fn community_reviews(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommunityRequest>,
) -> impl IntoResponse {
    if req.product_name.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "product_name is required");
    }

    let product = ProductRef::new(Uuid::new_v4(), &req.product_name, req.brand.as_deref());

    let mut targets = Vec::new();
    for kind in [SourceKind::Reddit, SourceKind::Forum] {
        match state.discovery.discover(&product, kind).await {
            Ok(urls) if !urls.is_empty() => targets.push(SourceTarget { kind, urls }),
            Ok(_) => {}
            Err(e) => {
                // Discovery trouble on one source must not sink the other
                warn!(source = kind.as_str(), error = %e, "URL discovery failed");
            }
        }
    }

    let outcome = state.aggregator.fetch_reviews(&product, targets, true).await;
    harvest_response(outcome)
}

/// Store path: explicit retailer page URLs for an ad-hoc product.
pub async fn store_reviews(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoreRequest>,
) -> impl IntoResponse {
    if req.product_name.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "product_name is required");
    }
    if req.store_urls.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "store_urls is required");
    }

    let product = ProductRef::new(Uuid::new_v4(), &req.product_name, None);
    let targets = vec![SourceTarget {
        kind: SourceKind::Store,
        urls: req.store_urls,
    }];

    let outcome = state.aggregator.fetch_reviews(&product, targets, true).await;
    harvest_response(outcome)
}

/// Orchestrate all requested sources for a known product, honoring the
/// freshness window unless the caller forces a refresh.
pub async fn product_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductReviewsRequest>,
) -> impl IntoResponse {
    let mut kinds = Vec::new();
    for name in &req.sources {
        match SourceKind::parse(name) {
            Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Some(_) => {}
            None => {
                return error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &format!("unknown source kind '{name}'"),
                );
            }
        }
    }
    if kinds.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "sources is required");
    }

    let product = match state.catalog.product_by_id(id).await {
        Ok(Some(product)) => product,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "product not found"),
        Err(e) => {
            warn!(product_id = %id, error = %e, "Product lookup failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "product lookup failed");
        }
    };

    let mut targets = Vec::new();
    for kind in kinds {
        match state.discovery.discover(&product, kind).await {
            Ok(urls) if !urls.is_empty() => targets.push(SourceTarget { kind, urls }),
            Ok(_) => {
                // Freshness-window hits can still serve this source; give
                // the aggregator the kind with no URLs to fetch.
                targets.push(SourceTarget {
                    kind,
                    urls: Vec::new(),
                });
            }
            Err(e) => {
                warn!(source = kind.as_str(), error = %e, "URL discovery failed");
                targets.push(SourceTarget {
                    kind,
                    urls: Vec::new(),
                });
            }
        }
    }

    let outcome = state
        .aggregator
        .fetch_reviews(&product, targets, req.force_refresh)
        .await;

    let total = outcome.reviews.len();
    Json(serde_json::json!({
        "reviews": outcome.reviews,
        "total": total,
    }))
    .into_response()
}

fn harvest_response(outcome: HarvestOutcome) -> axum::response::Response {
    let reviews: Vec<ValidatedReview> = outcome.reviews;
    Json(serde_json::json!({
        "reviews": reviews,
        "summary": format!(
            "{} validated reviews from {} raw candidates",
            reviews.len(),
            outcome.stats.raw_candidates
        ),
        "total_found": reviews.len(),
        "raw_count": outcome.stats.raw_candidates,
    }))
    .into_response()
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
