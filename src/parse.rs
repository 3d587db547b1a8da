use scraper::{Html, Selector};

use crate::{Error, Result, REVIEW_TITLE_SUFFIX_LEN};

/// Title and body of a single review page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub title: String,
    pub content: String,
}

/// Extracts the `href` of the first anchor in an HTML fragment such as
/// `<a href="https://.../reviews/Band/Album/1/user/1">Review</a>`.
pub fn review_link(fragment: &str) -> Result<String> {
    let doc = Html::parse_fragment(fragment);
    let anchor_selector = create_selector("a")?;

    doc.select(&anchor_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .ok_or_else(|| Error::MissingElement(format!("anchor href in `{fragment}`")))
}

/// Attempts to parse a review page.
/// The title is the first `<h3>`, trimmed, with its trailing score stripped.
/// The content is the text of the first `div.reviewContent`.
pub fn parse_review(html: &str) -> Result<Review> {
    let doc = Html::parse_document(html);

    let title_selector = create_selector("h3")?;
    let content_selector = create_selector("div.reviewContent")?;

    let heading = doc
        .select(&title_selector)
        .next()
        .ok_or_else(|| Error::MissingElement("h3".into()))?
        .text()
        .collect::<String>();
    let content = doc
        .select(&content_selector)
        .next()
        .ok_or_else(|| Error::MissingElement("div.reviewContent".into()))?
        .text()
        .collect::<String>();

    Ok(Review {
        title: strip_suffix_chars(heading.trim(), REVIEW_TITLE_SUFFIX_LEN).to_string(),
        content,
    })
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

/// Drops the last `n` characters, or everything if there are fewer.
fn strip_suffix_chars(s: &str, n: usize) -> &str {
    let keep = s.chars().count().saturating_sub(n);
    match s.char_indices().nth(keep) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
