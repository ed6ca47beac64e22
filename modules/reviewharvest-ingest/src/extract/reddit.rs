// Reddit thread extraction. Works against old-reddit markup, which is the
// stable server-rendered shape (thread URLs are canonicalized to the
// old.reddit.com host before fetching).

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use reviewharvest_common::{RawCandidate, SourceKind};

use crate::html;

use super::{build_candidate, ExtractionContext};

/// Threads with fewer total comments than this are skipped entirely.
const MIN_THREAD_COMMENTS: usize = 5;
/// Only the submission body plus this many top-level comments are segmented.
const MAX_TOP_COMMENTS: usize = 3;
/// Individual comments below this word count are dropped.
const MIN_COMMENT_WORDS: usize = 10;

/// Body placeholders left behind by deletion/removal.
const DELETED_PLACEHOLDERS: &[&str] = &["[deleted]", "[removed]"];

static ANY_COMMENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.thing.comment").expect("valid selector"));
static TOP_LEVEL_COMMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.commentarea > div.sitetable > div.thing.comment").expect("valid selector")
});
static POST_BODY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.thing.link div.usertext-body div.md").expect("valid selector")
});
static POST_AUTHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.thing.link a.author").expect("valid selector"));
static COMMENT_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.usertext-body div.md").expect("valid selector"));
static COMMENT_AUTHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.author").expect("valid selector"));

/// Rewrite a reddit thread URL onto the old.reddit.com host.
pub(crate) fn canonical_thread_url(url: &str) -> String {
    url.replacen("://www.reddit.com", "://old.reddit.com", 1)
        .replacen("://reddit.com", "://old.reddit.com", 1)
}

pub(crate) fn extract(
    html_src: &str,
    url: &str,
    ctx: &ExtractionContext<'_>,
) -> Vec<RawCandidate> {
    let doc = Html::parse_document(html_src);

    // Thread admission: enough discussion to be worth reading at all.
    let total_comments = doc.select(&ANY_COMMENT).count();
    if total_comments < MIN_THREAD_COMMENTS {
        debug!(url, total_comments, "Thread below comment gate, skipping");
        return Vec::new();
    }

    let mut candidates = Vec::new();

    // Submission body
    if let Some(body) = doc.select(&POST_BODY).next() {
        let author = doc
            .select(&POST_AUTHOR)
            .next()
            .map(|a| element_text(&a))
            .filter(|a| !a.is_empty());
        let text = element_text(&body);
        if !is_dropped(&text, author.as_deref(), ctx) {
            if let Some(c) = build_candidate(&text, SourceKind::Reddit, url, author, ctx) {
                candidates.push(c);
            }
        }
    }

    // Top 3 top-level comments; replies are never segmented.
    for comment in doc.select(&TOP_LEVEL_COMMENTS).take(MAX_TOP_COMMENTS) {
        let author = first_text(&comment, &COMMENT_AUTHOR);
        let Some(body) = comment.select(&COMMENT_BODY).next() else {
            continue;
        };
        let text = element_text(&body);

        if is_dropped(&text, author.as_deref(), ctx) {
            continue;
        }
        if text.split_whitespace().count() < MIN_COMMENT_WORDS {
            continue;
        }

        if let Some(c) = build_candidate(&text, SourceKind::Reddit, url, author, ctx) {
            candidates.push(c);
        }
    }

    candidates
}

/// Bot authors and deletion placeholders are dropped before the generic
/// noise filter runs.
fn is_dropped(text: &str, author: Option<&str>, ctx: &ExtractionContext<'_>) -> bool {
    if DELETED_PLACEHOLDERS.contains(&text.trim()) {
        return true;
    }
    match author {
        Some(name) => ctx.lists.is_bot_author(name),
        None => false,
    }
}

fn element_text(el: &ElementRef<'_>) -> String {
    html::collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(el: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use reviewharvest_common::HeuristicLists;

    use super::*;

    fn ctx<'a>(lists: &'a HeuristicLists) -> ExtractionContext<'a> {
        ExtractionContext {
            product_name: "Sony WH-1000XM5",
            lists,
        }
    }

    const URL: &str = "https://old.reddit.com/r/headphones/comments/abc/xm5";

    fn comment(id: &str, author: &str, body: &str) -> String {
        format!(
            r#"<div class="thing comment" id="thing_t1_{id}">
                 <div class="entry">
                   <p class="tagline"><a class="author">{author}</a></p>
                   <div class="usertext-body"><div class="md"><p>{body}</p></div></div>
                 </div>
               </div>"#
        )
    }

    fn thread(top_level: &[String], nested: &[String]) -> String {
        let nested_wrapped: String = nested
            .iter()
            .map(|c| format!(r#"<div class="child"><div class="sitetable listing">{c}</div></div>"#))
            .collect();
        format!(
            r#"<html><body>
              <div id="siteTable" class="sitetable linklisting">
                <div class="thing link self" id="thing_t3_abc">
                  <div class="entry">
                    <p class="tagline"><a class="author">original_poster</a></p>
                    <div class="expando">
                      <div class="usertext-body"><div class="md">
                        <p>Thinking about the Sony WH-1000XM5 for commuting; after a week of
                        testing my experience has been positive and the comfort quality beats
                        my old pair, genuinely worth it so far.</p>
                      </div></div>
                    </div>
                  </div>
                </div>
              </div>
              <div class="commentarea">
                <div class="sitetable nestedlisting">
                  {}{nested_wrapped}
                </div>
              </div>
            </body></html>"#,
            top_level.join("\n")
        )
    }

    const GOOD_BODY: &str = "I bought the XM5 in March and the noise cancelling quality \
        is excellent, absolutely worth it on flights and the battery experience has been great.";

    #[test]
    fn thread_below_comment_gate_returns_empty() {
        let lists = HeuristicLists::default();
        let comments: Vec<String> = (0..4)
            .map(|i| comment(&format!("c{i}"), &format!("user{i}"), GOOD_BODY))
            .collect();
        let html = thread(&comments, &[]);
        assert!(extract(&html, URL, &ctx(&lists)).is_empty());
    }

    #[test]
    fn post_and_top_comments_become_candidates() {
        let lists = HeuristicLists::default();
        let comments: Vec<String> = (0..5)
            .map(|i| comment(&format!("c{i}"), &format!("user{i}"), GOOD_BODY))
            .collect();
        let html = thread(&comments, &[]);
        let candidates = extract(&html, URL, &ctx(&lists));
        // submission body + top 3 of 5 comments
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].author.as_deref(), Some("original_poster"));
        assert!(candidates.iter().all(|c| c.source_kind == SourceKind::Reddit));
    }

    #[test]
    fn nested_replies_are_not_segmented() {
        let lists = HeuristicLists::default();
        let top: Vec<String> = (0..2)
            .map(|i| comment(&format!("c{i}"), &format!("user{i}"), GOOD_BODY))
            .collect();
        let nested: Vec<String> = (0..4)
            .map(|i| comment(&format!("n{i}"), &format!("nested{i}"), GOOD_BODY))
            .collect();
        let html = thread(&top, &nested);
        let candidates = extract(&html, URL, &ctx(&lists));
        // 6 comments total passes the gate, but only the 2 top-level ones
        // (plus the post body) are segmented
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| {
            c.author.as_deref() != Some("nested0")
        }));
    }

    #[test]
    fn bot_comments_are_dropped() {
        let lists = HeuristicLists::default();
        let mut comments = vec![comment("c0", "RemindMeBot", GOOD_BODY)];
        comments.extend((1..6).map(|i| comment(&format!("c{i}"), &format!("user{i}"), GOOD_BODY)));
        let html = thread(&comments, &[]);
        let candidates = extract(&html, URL, &ctx(&lists));
        assert!(candidates
            .iter()
            .all(|c| c.author.as_deref() != Some("RemindMeBot")));
    }

    #[test]
    fn deleted_comments_are_dropped() {
        let lists = HeuristicLists::default();
        let mut comments = vec![comment("c0", "ghost", "[deleted]")];
        comments.extend((1..6).map(|i| comment(&format!("c{i}"), &format!("user{i}"), GOOD_BODY)));
        let html = thread(&comments, &[]);
        let candidates = extract(&html, URL, &ctx(&lists));
        assert!(candidates.iter().all(|c| c.author.as_deref() != Some("ghost")));
    }

    #[test]
    fn short_comments_are_dropped() {
        let lists = HeuristicLists::default();
        let mut comments = vec![comment("c0", "terse", "Worth it, great quality purchase.")];
        comments.extend((1..6).map(|i| comment(&format!("c{i}"), &format!("user{i}"), GOOD_BODY)));
        let html = thread(&comments, &[]);
        let candidates = extract(&html, URL, &ctx(&lists));
        assert!(candidates.iter().all(|c| c.author.as_deref() != Some("terse")));
    }

    #[test]
    fn canonicalizes_www_host() {
        assert_eq!(
            canonical_thread_url("https://www.reddit.com/r/headphones/comments/abc/"),
            "https://old.reddit.com/r/headphones/comments/abc/"
        );
        assert_eq!(
            canonical_thread_url("https://old.reddit.com/r/headphones/comments/abc/"),
            "https://old.reddit.com/r/headphones/comments/abc/"
        );
    }
}
