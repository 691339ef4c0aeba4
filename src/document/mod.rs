//! Parsed documents: HTML pages via `scraper`, RSS/Atom feeds via `feed-rs`.
//!
//! A [`Document`] is not `Send` (the HTML tree uses non-atomic strings), so it
//! is parsed, inspected and dropped without crossing an `.await`.

pub mod html;

use feed_rs::model::{Entry, Feed};
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::errors::{HeraldError, HeraldResult};

pub use html::{collapse_whitespace, element_text, style_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Html,
    Xml,
}

pub enum Document {
    Html(Html),
    Feed(Feed),
}

impl Document {
    pub fn parse(bytes: &[u8], kind: DocumentKind) -> HeraldResult<Self> {
        match kind {
            DocumentKind::Html => {
                let text = String::from_utf8_lossy(bytes);
                if text.trim().is_empty() {
                    return Err(HeraldError::MalformedDocument("empty HTML body".to_string()));
                }
                Ok(Document::Html(Html::parse_document(&text)))
            }
            DocumentKind::Xml => feed_rs::parser::parse(bytes)
                .map(Document::Feed)
                .map_err(|e| HeraldError::MalformedDocument(e.to_string())),
        }
    }

    pub fn as_html(&self) -> Option<&Html> {
        match self {
            Document::Html(html) => Some(html),
            Document::Feed(_) => None,
        }
    }

    /// First feed entry (`<item>` / `<entry>`), if this is a feed
    pub fn first_entry(&self) -> Option<&Entry> {
        match self {
            Document::Feed(feed) => feed.entries.first(),
            Document::Html(_) => None,
        }
    }

    /// Content of the first `<meta property=...>` (Open Graph style) tag
    pub fn meta_property(&self, property: &str) -> Option<String> {
        html::meta_property(self.as_html()?, property)
    }
}
