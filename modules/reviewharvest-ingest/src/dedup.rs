//! Two-tier deduplication across the union of candidates from all source
//! pages: an exact pass over normalized-text hashes, then a pairwise
//! near-duplicate pass. O(n²) on the already-shrunk set is acceptable at
//! the low-hundreds candidate counts a request produces.

use std::collections::HashSet;

use tracing::debug;

use reviewharvest_common::{content_hash, RawCandidate};

/// Fingerprint derived from candidate text. Not persisted beyond one
/// request.
#[derive(Debug, Clone)]
pub struct DedupFingerprint {
    pub exact_hash: String,
    pub normalized_text: String,
}

impl DedupFingerprint {
    pub fn of(text: &str) -> Self {
        let normalized = normalize_text(text);
        Self {
            exact_hash: content_hash(&normalized),
            normalized_text: normalized,
        }
    }
}

/// Lowercase and collapse whitespace for comparison.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove exact and near duplicates. The first-encountered candidate of a
/// duplicate pair is retained; the choice carries no other semantic
/// weight. Running this twice on its own output is a no-op.
pub fn deduplicate(candidates: Vec<RawCandidate>, near_dup_threshold: f64) -> Vec<RawCandidate> {
    let input_count = candidates.len();

    // Pass 1: exact-duplicate removal by normalized-text hash.
    let mut seen_hashes = HashSet::new();
    let mut unique: Vec<(RawCandidate, DedupFingerprint)> = Vec::new();
    for candidate in candidates {
        let fp = DedupFingerprint::of(&candidate.text);
        if seen_hashes.insert(fp.exact_hash.clone()) {
            unique.push((candidate, fp));
        }
    }

    // Pass 2: pairwise near-duplicate removal; later-encountered loses.
    let mut kept: Vec<(RawCandidate, DedupFingerprint)> = Vec::new();
    'candidates: for (candidate, fp) in unique {
        for (_, kept_fp) in &kept {
            let similarity = strsim::sorensen_dice(&fp.normalized_text, &kept_fp.normalized_text);
            if similarity >= near_dup_threshold {
                continue 'candidates;
            }
        }
        kept.push((candidate, fp));
    }

    debug!(
        input = input_count,
        output = kept.len(),
        "Deduplicated candidates"
    );
    kept.into_iter().map(|(candidate, _)| candidate).collect()
}
