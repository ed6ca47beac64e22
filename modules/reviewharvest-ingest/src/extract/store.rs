// Store (retailer page) extraction: the generic page path plus numeric
// rating extraction from common rating notations.

use std::sync::LazyLock;

use regex::Regex;

use reviewharvest_common::{RawCandidate, SourceKind};

use super::{generic, ExtractionContext};

static RATING_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-5](?:\.\d)?)\s*/\s*5\b").expect("valid regex"));
static RATING_OUT_OF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-5](?:\.\d)?)\s+out\s+of\s+5\b").expect("valid regex"));
static STAR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[★⭐]{1,5}").expect("valid regex"));

pub(crate) fn extract(
    html_src: &str,
    url: &str,
    ctx: &ExtractionContext<'_>,
) -> Vec<RawCandidate> {
    let mut candidates = generic::extract(html_src, SourceKind::Store, url, ctx);
    for candidate in &mut candidates {
        // A missing rating is valid, not an error
        candidate.rating_hint = parse_rating(&candidate.text);
    }
    candidates
}

/// Pull a numeric rating out of text: "4.5/5", "4.5 out of 5", or a run of
/// star glyphs. First notation that matches wins.
pub(crate) fn parse_rating(text: &str) -> Option<f32> {
    if let Some(cap) = RATING_SLASH_RE.captures(text) {
        return cap[1].parse::<f32>().ok().filter(|r| (0.0..=5.0).contains(r));
    }
    if let Some(cap) = RATING_OUT_OF_RE.captures(text) {
        return cap[1].parse::<f32>().ok().filter(|r| (0.0..=5.0).contains(r));
    }
    if let Some(m) = STAR_RUN_RE.find(text) {
        return Some(m.as_str().chars().count() as f32);
    }
    None
}

#[cfg(test)]
mod tests {
    use reviewharvest_common::HeuristicLists;

    use super::*;

    #[test]
    fn parses_slash_notation() {
        assert_eq!(parse_rating("Solid purchase, 4.5/5 would buy again"), Some(4.5));
        assert_eq!(parse_rating("rated 3/5 overall"), Some(3.0));
    }

    #[test]
    fn parses_out_of_notation() {
        assert_eq!(parse_rating("I give it 4 out of 5"), Some(4.0));
        assert_eq!(parse_rating("Rated 4.5 Out Of 5 stars"), Some(4.5));
    }

    #[test]
    fn parses_star_glyph_run() {
        assert_eq!(parse_rating("★★★★ great value"), Some(4.0));
        assert_eq!(parse_rating("⭐⭐⭐⭐⭐ flawless"), Some(5.0));
    }

    #[test]
    fn missing_rating_is_none() {
        assert_eq!(parse_rating("no rating mentioned anywhere here"), None);
    }

    #[test]
    fn slash_notation_wins_over_stars() {
        assert_eq!(parse_rating("★★★ but really 4/5 for the price"), Some(4.0));
    }

    #[test]
    fn store_candidates_carry_rating_hints() {
        let lists = HeuristicLists::default();
        let ctx = ExtractionContext {
            product_name: "AeroPress Go",
            lists: &lists,
        };
        let rated = "<p>AeroPress Go review: 4.5/5. I bought it for travel and the coffee \
            quality is excellent, well worth it for the size and cleanup is painless. \
            It replaced a bulkier setup I dragged through three countries, and the cup \
            it brews is consistent enough that I stopped missing my grinder at home.</p>";
        let unrated = "<p>My AeroPress Go experience after six months of daily use is very \
            positive; durable, easy to clean, and I would recommend it to any traveler. \
            It makes a dependable cup at campsites and in hotel rooms alike, and packing \
            it has become as automatic as packing a toothbrush for every trip I take.</p>";
        let filler = "<p>Owners keep posting AeroPress Go impressions in this thread, \
            comparing travel mugs, grind settings, and which recipes survived a commute; \
            the running experience notes above cover the recurring quality questions that \
            new buyers ask before deciding whether the upgrade is worth it to them.</p>";
        let html = format!(
            "<html><body>{}{}{}</body></html>",
            rated,
            unrated,
            filler.repeat(9)
        );

        let candidates = extract(&html, "https://shop.example.com/aeropress", &ctx);
        assert!(candidates.len() >= 2);

        let with_rating = candidates.iter().find(|c| c.text.contains("4.5/5")).unwrap();
        assert_eq!(with_rating.rating_hint, Some(4.5));

        let without_rating = candidates.iter().find(|c| c.text.contains("six months")).unwrap();
        assert_eq!(without_rating.rating_hint, None);
    }
}
