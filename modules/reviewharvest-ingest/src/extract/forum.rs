// Forum thread extraction. Detects repeated username+timestamp post
// blocks; when no such pattern exists the page falls back to the generic
// page-level path.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use reviewharvest_common::{RawCandidate, SourceKind};

use crate::html;

use super::{build_candidate, generic, ExtractionContext};

/// At most this many detected post blocks are segmented per page.
const MAX_FORUM_POSTS: usize = 10;
/// A single matching element is not a "repeated" pattern.
const MIN_PATTERN_POSTS: usize = 2;

/// Common forum post-container shapes, tried in order.
static POST_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "article[id^=post]",
        "li.post",
        "div.post",
        "div.postbody",
        "div.message",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("valid selector"))
    .collect()
});

static AUTHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".username, .author, .post-author, .poster").expect("valid selector")
});
static CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".post-content, .postbody, .content, .message-body, .post-text")
        .expect("valid selector")
});

/// Something that reads like a post timestamp: a clock time, a year, a
/// month name, or relative "ago" phrasing.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}:\d{2}\b|\b(19|20)\d{2}\b|\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\b|\bago\b")
        .expect("valid regex")
});

pub(crate) fn extract(
    html_src: &str,
    url: &str,
    ctx: &ExtractionContext<'_>,
) -> Vec<RawCandidate> {
    // Forum pages are page-shaped sources: the admission and relevance
    // gates apply before any segmentation strategy.
    if generic::admitted_blocks(html_src, ctx).is_none() {
        return Vec::new();
    }

    let structured = structured_posts(html_src, url, ctx);
    if !structured.is_empty() {
        return structured;
    }

    debug!(url, "No post-block pattern detected, falling back to generic extraction");
    generic::extract(html_src, SourceKind::Forum, url, ctx)
}

/// Segment by repeated username+timestamp post blocks. Returns empty when
/// no selector matches at least [`MIN_PATTERN_POSTS`] such blocks.
fn structured_posts(
    html_src: &str,
    url: &str,
    ctx: &ExtractionContext<'_>,
) -> Vec<RawCandidate> {
    let doc = Html::parse_document(html_src);

    for selector in POST_SELECTORS.iter() {
        let posts: Vec<ElementRef<'_>> = doc
            .select(selector)
            .filter(|post| is_post_block(post))
            .take(MAX_FORUM_POSTS)
            .collect();

        if posts.len() < MIN_PATTERN_POSTS {
            continue;
        }

        return posts
            .iter()
            .filter_map(|post| {
                let author = post
                    .select(&AUTHOR_SELECTOR)
                    .next()
                    .map(|a| element_text(&a))
                    .filter(|a| !a.is_empty());
                let text = match post.select(&CONTENT_SELECTOR).next() {
                    Some(content) => element_text(&content),
                    None => element_text(post),
                };
                build_candidate(&text, SourceKind::Forum, url, author, ctx)
            })
            .collect();
    }

    Vec::new()
}

/// A post block carries both a username and something timestamp-shaped.
fn is_post_block(el: &ElementRef<'_>) -> bool {
    if el.select(&AUTHOR_SELECTOR).next().is_none() {
        return false;
    }
    TIMESTAMP_RE.is_match(&element_text(el))
}

fn element_text(el: &ElementRef<'_>) -> String {
    html::collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use reviewharvest_common::HeuristicLists;

    use super::*;

    const URL: &str = "https://forum.example.com/threads/xm5-owners";

    fn ctx<'a>(lists: &'a HeuristicLists) -> ExtractionContext<'a> {
        ExtractionContext {
            product_name: "Sony WH-1000XM5",
            lists,
        }
    }

    fn post(author: &str, date: &str, body: &str) -> String {
        format!(
            r#"<li class="post">
                 <div class="post-header"><span class="username">{author}</span>
                 <span class="post-date">{date}</span></div>
                 <div class="post-content"><p>{body}</p></div>
               </li>"#
        )
    }

    fn body_text(i: usize) -> String {
        format!(
            "Post number {i}: I have owned the Sony WH-1000XM5 for quite a while now and \
            the build quality is genuinely impressive, comfortable for long sessions and \
            absolutely worth it compared to what I was using before. Firmware updates have \
            kept the experience solid and I would recommend them to anyone asking here. \
            Battery life still holds up after daily commuting, the case survived a year in \
            a crowded backpack, and the microphones are passable on calls even outdoors. \
            If you are on the fence, my experience says the comfort alone justifies the \
            upgrade, and the transparency mode is good enough that I stopped taking them \
            off at the office entirely."
        )
    }

    fn forum_page(posts: &[String]) -> String {
        format!(
            r#"<html><body>
                 <div class="thread"><ul class="post-list">{}</ul></div>
               </body></html>"#,
            posts.join("\n")
        )
    }

    #[test]
    fn detects_username_timestamp_post_blocks() {
        let lists = HeuristicLists::default();
        let posts: Vec<String> = (0..6)
            .map(|i| post(&format!("member{i}"), "Mar 12, 2026 at 14:33", &body_text(i)))
            .collect();
        let html = forum_page(&posts);
        let candidates = extract(&html, URL, &ctx(&lists));
        assert_eq!(candidates.len(), 6);
        assert_eq!(candidates[0].author.as_deref(), Some("member0"));
        assert!(candidates.iter().all(|c| c.source_kind == SourceKind::Forum));
        // Post chrome (author/date header) stays out of the candidate text
        assert!(!candidates[0].text.contains("Mar 12"));
    }

    #[test]
    fn caps_at_ten_post_blocks() {
        let lists = HeuristicLists::default();
        let posts: Vec<String> = (0..14)
            .map(|i| post(&format!("member{i}"), "Jan 3, 2026 at 09:12", &body_text(i)))
            .collect();
        let html = forum_page(&posts);
        let candidates = extract(&html, URL, &ctx(&lists));
        assert_eq!(candidates.len(), 10);
    }

    #[test]
    fn falls_back_to_generic_without_pattern() {
        let lists = HeuristicLists::default();
        // No username/timestamp chrome at all, just paragraphs
        let paras: Vec<String> = (0..14)
            .map(|i| format!("<p>{}</p>", body_text(i)))
            .collect();
        let html = format!("<html><body>{}</body></html>", paras.join("\n"));
        let candidates = extract(&html, URL, &ctx(&lists));
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.author.is_none()));
    }

    #[test]
    fn thin_forum_page_returns_empty() {
        let lists = HeuristicLists::default();
        let posts: Vec<String> = (0..2)
            .map(|i| post(&format!("member{i}"), "Jan 3, 2026", &body_text(i)))
            .collect();
        let html = forum_page(&posts);
        assert!(extract(&html, URL, &ctx(&lists)).is_empty());
    }
}
