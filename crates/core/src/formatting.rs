//! Removal of inline formatting tags from caption text.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Inline tags the platform may embed in caption text.
pub const FORMATTING_TAGS: [&str; 10] = [
    "strong", "em", "b", "i", "mark", "small", "del", "ins", "sub", "sup",
];

static FORMATTING_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"</?(?:{})\b[^>]*>", FORMATTING_TAGS.join("|"));
    Regex::new(&pattern).expect("formatting tag pattern is valid")
});

/// Drop opening and closing forms of the formatting tags. Any other markup,
/// entity text or plain text passes through untouched.
pub fn strip_formatting(text: &str) -> Cow<'_, str> {
    FORMATTING_TAG_RE.replace_all(text, "")
}
