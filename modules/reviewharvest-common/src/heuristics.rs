//! Heuristic keyword lists used by the escalation decision and the noise
//! filter. Plain data rather than scattered conditionals so new sources can
//! tune matching without touching extraction logic.

/// Phrases that indicate a JS/cookie interstitial instead of real content.
const JS_WALL_PHRASES: &[&str] = &[
    "enable javascript",
    "javascript is required",
    "javascript is disabled",
    "cookies required",
    "please enable cookies",
    "checking your browser",
];

/// Boilerplate markers. A text block containing any of these is rejected.
const NOISE_PHRASES: &[&str] = &[
    "cookie policy",
    "privacy policy",
    "accept cookies",
    "accept all cookies",
    "we use cookies",
    "loading...",
    "an error occurred",
    "something went wrong",
    "exception",
    "main menu",
    "navigation",
    "sidebar",
    "skip to content",
    "click here",
    "subscribe to",
    "sign up for our newsletter",
    "newsletter",
    "like this post",
    "share this",
    "log in to comment",
    "add to cart",
    "terms of service",
];

/// Words that mark a block as opinion-bearing. A block with none of these
/// is discarded even when it passes length and noise checks.
const OPINION_TOKENS: &[&str] = &[
    "review",
    "worth it",
    "recommend",
    "disappointed",
    "quality",
    "works well",
    "works great",
    "bought",
    "purchased",
    "returned",
    "love it",
    "hate",
    "great",
    "terrible",
    "excellent",
    "awful",
    "comfortable",
    "satisfied",
    "refund",
    "would buy",
    "using it",
    "experience",
];

/// Author-name suffixes that indicate an automated account.
const BOT_SUFFIXES: &[&str] = &["bot", "automoderator"];

/// Prefixes that mark a quoted reply rather than original text.
const QUOTE_PREFIXES: &[&str] = &[">>", ">"];

/// Line that separates a post body from its signature.
pub const SIGNATURE_SEPARATOR: &str = "---";

/// The recognized heuristic categories, owned as plain string data.
#[derive(Debug, Clone)]
pub struct HeuristicLists {
    pub js_wall_phrases: Vec<String>,
    pub noise_phrases: Vec<String>,
    pub opinion_tokens: Vec<String>,
    pub bot_suffixes: Vec<String>,
    pub quote_prefixes: Vec<String>,
}

impl Default for HeuristicLists {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            js_wall_phrases: owned(JS_WALL_PHRASES),
            noise_phrases: owned(NOISE_PHRASES),
            opinion_tokens: owned(OPINION_TOKENS),
            bot_suffixes: owned(BOT_SUFFIXES),
            quote_prefixes: owned(QUOTE_PREFIXES),
        }
    }
}

impl HeuristicLists {
    /// True if the HTML looks like a JS/cookie wall. Case-insensitive
    /// substring match against the fixed phrase list.
    pub fn is_js_wall(&self, html: &str) -> bool {
        let lower = html.to_lowercase();
        self.js_wall_phrases.iter().any(|p| lower.contains(p.as_str()))
    }

    /// True if a text block matches boilerplate or starts as a quoted reply.
    pub fn is_noise(&self, block: &str) -> bool {
        let trimmed = block.trim_start();
        if self
            .quote_prefixes
            .iter()
            .any(|p| trimmed.starts_with(p.as_str()))
        {
            return true;
        }
        let lower = block.to_lowercase();
        self.noise_phrases.iter().any(|p| lower.contains(p.as_str()))
    }

    /// True if the text contains at least one opinion-indicating token.
    pub fn has_opinion_token(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.opinion_tokens.iter().any(|t| lower.contains(t.as_str()))
    }

    /// True if an author name ends in a bot-indicating suffix.
    pub fn is_bot_author(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.bot_suffixes.iter().any(|s| lower.ends_with(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_wall_matches_case_insensitively() {
        let lists = HeuristicLists::default();
        assert!(lists.is_js_wall("<p>Please Enable JavaScript to continue</p>"));
        assert!(!lists.is_js_wall("<p>Great headphones, highly recommend</p>"));
    }

    #[test]
    fn noise_rejects_cookie_banner() {
        let lists = HeuristicLists::default();
        assert!(lists.is_noise("We use cookies to improve your experience."));
    }

    #[test]
    fn noise_rejects_quoted_reply() {
        let lists = HeuristicLists::default();
        assert!(lists.is_noise("> originally posted by someone else"));
        assert!(lists.is_noise(">> nested quote"));
    }

    #[test]
    fn noise_passes_ordinary_text() {
        let lists = HeuristicLists::default();
        assert!(!lists.is_noise("The bass on these is punchy without being muddy."));
    }

    #[test]
    fn opinion_token_detection() {
        let lists = HeuristicLists::default();
        assert!(lists.has_opinion_token("I bought these last month and love it"));
        assert!(!lists.has_opinion_token("Dimensions: 20cm x 18cm x 8cm"));
    }

    #[test]
    fn bot_author_suffixes() {
        let lists = HeuristicLists::default();
        assert!(lists.is_bot_author("RemindMeBot"));
        assert!(lists.is_bot_author("AutoModerator"));
        assert!(!lists.is_bot_author("actual_human"));
    }
}
