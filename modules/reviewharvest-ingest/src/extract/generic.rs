// Default page-level extraction for store/forum shaped sources.

use tracing::debug;

use reviewharvest_common::{RawCandidate, SourceKind};

use crate::html;

use super::{build_candidate, ExtractionContext, MIN_PAGE_CHARS, MIN_PRODUCT_MENTIONS};

/// Run the page-admission and relevance gates. Returns the visible text
/// blocks when the page is worth segmenting, None otherwise. A None here
/// is a valid empty outcome, not an error.
pub(crate) fn admitted_blocks(html: &str, ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    let blocks = html::visible_blocks(html);
    let visible = blocks.join("\n");

    if visible.chars().count() < MIN_PAGE_CHARS {
        debug!(
            chars = visible.chars().count(),
            "Page below admission gate, skipping"
        );
        return None;
    }

    if count_mentions(&visible, ctx.product_name) < MIN_PRODUCT_MENTIONS {
        debug!(product = ctx.product_name, "Page below relevance gate, skipping");
        return None;
    }

    Some(blocks)
}

/// Generic extraction: admission gates, then block-level segmentation with
/// the shared per-block filters.
pub(crate) fn extract(
    html: &str,
    source_kind: SourceKind,
    url: &str,
    ctx: &ExtractionContext<'_>,
) -> Vec<RawCandidate> {
    let Some(blocks) = admitted_blocks(html, ctx) else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter_map(|block| build_candidate(block, source_kind, url, None, ctx))
        .collect()
}

/// Case-insensitive occurrence count of the product name.
fn count_mentions(text: &str, product_name: &str) -> usize {
    if product_name.is_empty() {
        return 0;
    }
    text.to_lowercase()
        .matches(&product_name.to_lowercase())
        .count()
}

#[cfg(test)]
mod tests {
    use reviewharvest_common::HeuristicLists;

    use super::*;

    const URL: &str = "https://example.com/page";

    fn ctx<'a>(lists: &'a HeuristicLists) -> ExtractionContext<'a> {
        ExtractionContext {
            product_name: "Sony WH-1000XM5",
            lists,
        }
    }

    /// A page comfortably past both admission gates, with a few review-like
    /// paragraphs and some noise.
    fn rich_page() -> String {
        let review = "<p>My Sony WH-1000XM5 arrived last week and after heavy daily use \
            I can say the quality is excellent; noise cancelling is easily worth it for \
            commuting and I would recommend them over the previous generation.</p>";
        let filler = "<p>The Sony WH-1000XM5 product discussion continues with owners \
            comparing their experience across firmware versions and ear pad revisions, \
            debating comfort on long flights and the value of the companion app.</p>";
        let noise = "<div>We use cookies to improve your experience. Accept cookies to continue.</div>";
        format!(
            "<html><body>{noise}{}{}</body></html>",
            review.repeat(4),
            filler.repeat(12)
        )
    }

    #[test]
    fn thin_page_returns_empty() {
        let lists = HeuristicLists::default();
        // Product name appears plenty, but visible text is under the gate
        let html = format!(
            "<html><body>{}</body></html>",
            "<p>Sony WH-1000XM5 is worth it, great quality.</p>".repeat(10)
        );
        assert!(extract(&html, SourceKind::Store, URL, &ctx(&lists)).is_empty());
    }

    #[test]
    fn irrelevant_page_returns_empty() {
        let lists = HeuristicLists::default();
        let para = "<p>I bought this vacuum and the suction quality is excellent, \
            definitely worth it and I would recommend it to anyone with pets at home \
            because the filter system works well on carpet and hardwood alike.</p>";
        let html = format!("<html><body>{}</body></html>", para.repeat(20));
        assert!(extract(&html, SourceKind::Store, URL, &ctx(&lists)).is_empty());
    }

    #[test]
    fn rich_page_yields_candidates() {
        let lists = HeuristicLists::default();
        let candidates = extract(&rich_page(), SourceKind::Store, URL, &ctx(&lists));
        assert!(!candidates.is_empty());
        for c in &candidates {
            assert!(c.text.chars().count() >= super::super::MIN_CANDIDATE_CHARS);
            assert!(c.text.chars().count() <= super::super::MAX_CANDIDATE_CHARS);
            assert!(lists.has_opinion_token(&c.text));
        }
    }

    #[test]
    fn noise_blocks_never_become_candidates() {
        let lists = HeuristicLists::default();
        let candidates = extract(&rich_page(), SourceKind::Store, URL, &ctx(&lists));
        for c in &candidates {
            assert!(!c.text.to_lowercase().contains("cookies"));
        }
    }

    #[test]
    fn count_mentions_is_case_insensitive() {
        assert_eq!(
            count_mentions("sony wh-1000xm5 and SONY WH-1000XM5", "Sony WH-1000XM5"),
            2
        );
    }
}
