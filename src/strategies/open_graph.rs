use scraper::Selector;

use super::traits::{DetailSource, ExtractionStrategy};
use crate::document::{Document, DocumentKind};
use crate::domain::{BodyFormat, ChangeKey, ContentRecord, SourceDescriptor};

/// Finds the latest link on a listing page, then reads the linked page's
/// Open Graph `og:title` / `og:description` / `og:image` tags.
pub struct OpenGraphStrategy {
    latest: Selector,
    attr: String,
}

impl OpenGraphStrategy {
    pub fn new(latest: Selector, attr: &str) -> Self {
        Self {
            latest,
            attr: attr.to_string(),
        }
    }
}

impl ExtractionStrategy for OpenGraphStrategy {
    fn name(&self) -> &'static str {
        "open_graph"
    }

    fn find_latest(&self, doc: &Document, _source: &SourceDescriptor) -> Option<ChangeKey> {
        let html = doc.as_html()?;
        let href = html.select(&self.latest).next()?.value().attr(&self.attr)?;

        Some(ChangeKey::new(href)).filter(|key| !key.is_empty())
    }

    fn detail_source(&self, key: &ChangeKey, source: &SourceDescriptor) -> DetailSource {
        DetailSource::Fetch {
            url: source.resolve(key.as_str()),
            kind: DocumentKind::Html,
        }
    }

    fn extract(
        &self,
        doc: &Document,
        key: &ChangeKey,
        source: &SourceDescriptor,
    ) -> Option<ContentRecord> {
        let title = doc.meta_property("og:title");
        let description = doc.meta_property("og:description");
        if title.is_none() && description.is_none() {
            return None;
        }

        let image = doc.meta_property("og:image").map(|src| source.resolve(&src));

        Some(
            ContentRecord::new(source.resolve(key.as_str()))
                .with_title(title)
                .with_body(description, BodyFormat::Plain)
                .with_image(image),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &[u8] = br#"<html><body>
<div class="newsPostBlock steam_updates">
  <a href="https://steamcommunity.com/games/dota2/announcements/detail/42">Gameplay Update 7.20</a>
</div>
<div class="newsPostBlock steam_updates">
  <a href="https://steamcommunity.com/games/dota2/announcements/detail/41">Older</a>
</div>
</body></html>"#;

    const ARTICLE: &[u8] = br#"<html><head>
<meta property="og:title" content="Gameplay Update 7.20">
<meta property="og:description" content="Balance changes and fixes">
<meta property="og:image" content="/images/720.jpg">
</head><body></body></html>"#;

    fn strategy() -> OpenGraphStrategy {
        OpenGraphStrategy::new(
            Selector::parse(".newsPostBlock.steam_updates a").unwrap(),
            "href",
        )
    }

    fn source() -> SourceDescriptor {
        SourceDescriptor::new("dota2", "https://store.steampowered.com/news/?appids=570").unwrap()
    }

    #[test]
    fn test_find_latest_takes_first_link() {
        let doc = Document::parse(LISTING, DocumentKind::Html).unwrap();
        let key = strategy().find_latest(&doc, &source()).unwrap();
        assert_eq!(
            key.as_str(),
            "https://steamcommunity.com/games/dota2/announcements/detail/42"
        );
    }

    #[test]
    fn test_find_latest_missing_element() {
        let doc = Document::parse(b"<html><body><p>maintenance</p></body></html>", DocumentKind::Html)
            .unwrap();
        assert!(strategy().find_latest(&doc, &source()).is_none());
    }

    #[test]
    fn test_detail_is_fetched_from_key() {
        let key = ChangeKey::new("/news/42");
        assert_eq!(
            strategy().detail_source(&key, &source()),
            DetailSource::Fetch {
                url: "https://store.steampowered.com/news/42".to_string(),
                kind: DocumentKind::Html,
            }
        );
    }

    #[test]
    fn test_extract_reads_meta_tags() {
        let doc = Document::parse(ARTICLE, DocumentKind::Html).unwrap();
        let key = ChangeKey::new("https://steamcommunity.com/games/dota2/announcements/detail/42");
        let record = strategy().extract(&doc, &key, &source()).unwrap();

        assert_eq!(record.title, "Gameplay Update 7.20");
        assert_eq!(record.body, "Balance changes and fixes");
        assert_eq!(record.link, key.as_str());
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://store.steampowered.com/images/720.jpg")
        );
    }

    #[test]
    fn test_extract_without_metadata_is_not_found() {
        let doc = Document::parse(b"<html><head><title>x</title></head></html>", DocumentKind::Html)
            .unwrap();
        let key = ChangeKey::new("/news/42");
        assert!(strategy().extract(&doc, &key, &source()).is_none());
    }
}
