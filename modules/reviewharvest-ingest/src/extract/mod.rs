//! Content extraction. One contract over `{Store, Reddit, Forum}`: the
//! generic page path is the default; reddit and forum supply their own
//! segmentation, store adds rating extraction.

mod forum;
mod generic;
mod reddit;
mod store;

pub(crate) use reddit::canonical_thread_url as canonical_reddit_url;

use chrono::Utc;
use tracing::debug;

use reviewharvest_common::heuristics::SIGNATURE_SEPARATOR;
use reviewharvest_common::{HeuristicLists, RawCandidate, SourceKind};

/// Page-admission gate: minimum visible text before a store/forum page is
/// worth segmenting at all. Distinct from the per-candidate bounds.
pub(crate) const MIN_PAGE_CHARS: usize = 3000;
/// Relevance gate: the product name must appear this often in visible text.
pub(crate) const MIN_PRODUCT_MENTIONS: usize = 3;

/// Per-candidate length bounds. Overlong blocks are truncated rather than
/// discarded; undersized blocks are dropped.
pub(crate) const MIN_CANDIDATE_CHARS: usize = 50;
pub(crate) const MAX_CANDIDATE_CHARS: usize = 3000;

pub struct ExtractionContext<'a> {
    pub product_name: &'a str,
    pub lists: &'a HeuristicLists,
}

/// Extract raw review candidates from a page. Output ordering is not a
/// contract; callers must not rely on it for correctness.
pub fn extract_candidates(
    html: &str,
    source_kind: SourceKind,
    url: &str,
    ctx: &ExtractionContext<'_>,
) -> Vec<RawCandidate> {
    let candidates = match source_kind {
        SourceKind::Store => store::extract(html, url, ctx),
        SourceKind::Reddit => reddit::extract(html, url, ctx),
        SourceKind::Forum => forum::extract(html, url, ctx),
    };
    debug!(
        url,
        source = source_kind.as_str(),
        count = candidates.len(),
        "Extracted candidates"
    );
    candidates
}

/// Shared candidate constructor. Applies the signature strip, the noise
/// filter, the opinion-token requirement, and the length bounds; text that
/// fails any of them never becomes a candidate.
pub(crate) fn build_candidate(
    text: &str,
    source_kind: SourceKind,
    url: &str,
    author: Option<String>,
    ctx: &ExtractionContext<'_>,
) -> Option<RawCandidate> {
    let text = strip_signature(text);
    let text = text.trim();

    if ctx.lists.is_noise(text) {
        return None;
    }
    if !ctx.lists.has_opinion_token(text) {
        return None;
    }

    let text: String = if text.chars().count() > MAX_CANDIDATE_CHARS {
        text.chars().take(MAX_CANDIDATE_CHARS).collect()
    } else {
        text.to_string()
    };

    if text.chars().count() < MIN_CANDIDATE_CHARS {
        return None;
    }

    Some(RawCandidate {
        text,
        source_kind,
        source_url: url.to_string(),
        author,
        rating_hint: None,
        extracted_at: Utc::now(),
    })
}

/// Drop everything from the first signature separator onward.
pub(crate) fn strip_signature(text: &str) -> String {
    match text.find(SIGNATURE_SEPARATOR) {
        Some(idx) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
