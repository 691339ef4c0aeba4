use std::sync::OnceLock;

use feed_rs::model::Entry;
use regex::Regex;

use super::traits::{DetailSource, ExtractionStrategy};
use crate::document::{Document, DocumentKind};
use crate::domain::{BodyFormat, ChangeKey, ContentRecord, SourceDescriptor};

/// Steam community feeds live at a fixed path per app
pub fn steam_feed_url(app_id: u32) -> String {
    format!("https://steamcommunity.com/games/{}/rss/", app_id)
}

/// Reads the first `<item>` of an RSS (or Atom) feed.
///
/// The change key is the item's guid. The description is kept as markup so
/// the formatter can strip it; the first inline `<img src>` becomes the image.
pub struct RssItemStrategy;

impl RssItemStrategy {
    pub fn new() -> Self {
        Self
    }

    fn description(entry: &Entry) -> Option<String> {
        entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .filter(|d| !d.trim().is_empty())
    }

    /// Bare image URL embedded in a description
    fn embedded_image(description: &str) -> Option<String> {
        static IMG_SRC: OnceLock<Regex> = OnceLock::new();
        let re = IMG_SRC.get_or_init(|| {
            Regex::new(r#"(?i)<img[^>]*?\ssrc\s*=\s*["']([^"']+?\.(?:png|jpe?g|gif|webp))["']"#)
                .expect("img regex is valid")
        });

        re.captures(description).map(|caps| caps[1].to_string())
    }
}

impl Default for RssItemStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for RssItemStrategy {
    fn name(&self) -> &'static str {
        "rss"
    }

    fn listing_kind(&self) -> DocumentKind {
        DocumentKind::Xml
    }

    fn find_latest(&self, doc: &Document, _source: &SourceDescriptor) -> Option<ChangeKey> {
        let entry = doc.first_entry()?;
        Some(ChangeKey::new(entry.id.as_str())).filter(|key| !key.is_empty())
    }

    fn detail_source(&self, _key: &ChangeKey, _source: &SourceDescriptor) -> DetailSource {
        DetailSource::SameDocument
    }

    fn extract(
        &self,
        doc: &Document,
        key: &ChangeKey,
        source: &SourceDescriptor,
    ) -> Option<ContentRecord> {
        let entry = doc.first_entry()?;
        if ChangeKey::new(entry.id.as_str()) != *key {
            return None;
        }

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_else(|| key.to_string());

        let title = entry.title.as_ref().map(|t| t.content.trim().to_string());
        let description = Self::description(entry);
        let image = description
            .as_deref()
            .and_then(Self::embedded_image)
            .map(|src| source.resolve(&src));

        Some(
            ContentRecord::new(source.resolve(&link))
                .with_title(title)
                .with_body(description, BodyFormat::Markup)
                .with_image(image),
        )
    }
}
