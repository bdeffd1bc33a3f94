use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

use crate::types::{LinkAnnotation, MessageView};

/// Things that look like links in plain text: `http(s)://…`, `www.…` and `t.me/…`, plus
/// `@usernames` of at least 4 characters.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:https?://|www\.)[^\s<>]+|t\.me/[^\s<>]+)\b|@\w{4,}\b")
        .expect("Regex will always be valid")
});

/// Characters trimmed off both ends of every found link.
const TRIMMED_PUNCTUATION: &[char] = &['.', ',', ')', '>', '('];

/// Get links out of Telegram's link annotations. Hidden links give their target, plain ones
/// give the piece of text they cover.
#[must_use]
pub fn extract_annotated_links(annotations: &[LinkAnnotation]) -> Vec<&str> {
    annotations
        .iter()
        .map(|annotation| match annotation {
            LinkAnnotation::TextLink { url } => url.as_str(),
            LinkAnnotation::Url { text } => text.as_str(),
        })
        .collect()
}

/// Find link-looking things in plain text, for when Telegram did not annotate them.
#[must_use]
pub fn find_links_in_text(text: &str) -> Vec<&str> {
    LINK_RE
        .find_iter(text)
        .filter(|found| {
            if !found.as_str().starts_with('@') {
                return true;
            }
            // A username must not be glued to a preceding word, like in an email address.
            !text[..found.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
        })
        .map(|found| found.as_str())
        .collect()
}

/// Trim and lowercase a found link. Returns [`None`] if nothing is left of it.
fn normalize_link(link: &str) -> Option<String> {
    let trimmed = link.trim().trim_matches(TRIMMED_PUNCTUATION);
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// All links referenced by this message: annotated ones first, then ones found in the text,
/// normalized, lowercased and deduplicated in order of first appearance.
#[must_use]
pub fn extract_all_links(view: &MessageView) -> Vec<String> {
    let annotated = extract_annotated_links(&view.links);
    let found = find_links_in_text(&view.text);

    let mut seen = HashSet::new();
    annotated
        .into_iter()
        .chain(found)
        .filter_map(normalize_link)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
