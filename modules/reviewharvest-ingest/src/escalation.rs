//! Render-escalation decision: given plainly-fetched HTML, decide whether
//! a headless-browser render is needed to obtain real content.

use std::sync::atomic::{AtomicUsize, Ordering};

use reviewharvest_common::HeuristicLists;

use crate::html;

/// Pages whose boilerplate-stripped visible text is shorter than this are
/// assumed to be JS shells.
const MIN_VISIBLE_CHARS: usize = 200;

/// Pure predicate: true when the HTML is unlikely to contain real review
/// content without a browser render. No single heuristic is authoritative;
/// any match escalates. Malformed or empty input fails open toward
/// rendering: false positives cost latency, false negatives cost results.
pub fn needs_js_rendering(html: &str, lists: &HeuristicLists) -> bool {
    if html.trim().is_empty() {
        return true;
    }

    if lists.is_js_wall(html) {
        return true;
    }

    let visible: Vec<String> = html::visible_blocks(html)
        .into_iter()
        .filter(|b| !lists.is_noise(b))
        .collect();
    let visible = visible.join("\n");

    if visible.chars().count() < MIN_VISIBLE_CHARS {
        return true;
    }

    if !lists.has_opinion_token(&visible) {
        return true;
    }

    false
}

/// Per-request render budget. Shared across concurrently running fetch
/// tasks, so acquisition is a single atomic increment-if-below-cap.
pub struct RenderBudget {
    cap: usize,
    used: AtomicUsize,
}

impl RenderBudget {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            used: AtomicUsize::new(0),
        }
    }

    /// Claim one render slot. Returns false once the cap is reached;
    /// callers then extract from the original (possibly thin) HTML.
    pub fn try_acquire(&self) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.cap).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }
}
