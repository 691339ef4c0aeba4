use scraper::{ElementRef, Selector};

use super::traits::{DetailSource, ExtractionStrategy};
use crate::document::{element_text, style_url, Document, DocumentKind};
use crate::domain::{BodyFormat, ChangeKey, ContentRecord, SourceDescriptor};

/// How a field's value is read from its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Read {
    Text,
    Attr(String),
    /// URL from an inline `style` attribute's `url(...)`
    StyleUrl,
}

/// Locates one value relative to a scope element.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// `None` reads the scope element itself.
    pub selector: Option<Selector>,
    pub read: Read,
}

impl FieldRule {
    pub fn new(selector: Option<Selector>, read: Read) -> Self {
        Self { selector, read }
    }

    pub fn apply(&self, scope: ElementRef<'_>) -> Option<String> {
        let element = match &self.selector {
            Some(selector) => scope.select(selector).next()?,
            None => scope,
        };

        let value = match &self.read {
            Read::Text => element_text(element),
            Read::Attr(name) => element.value().attr(name)?.trim().to_string(),
            Read::StyleUrl => style_url(element.value().attr("style")?)?,
        };

        Some(value).filter(|v| !v.is_empty())
    }
}

/// Per-site CSS navigation for pages without Open Graph metadata.
///
/// `item` scopes the latest entry on the listing page and `link` reads its
/// change key from inside it. With `detail` unset the record is read from the
/// same `item`; otherwise the key is fetched and `detail` scopes the article.
#[derive(Debug, Clone)]
pub struct DomStrategy {
    pub item: Selector,
    pub link: FieldRule,
    pub detail: Option<Selector>,
    pub title: Option<FieldRule>,
    pub body: Option<FieldRule>,
    pub image: Option<FieldRule>,
}

impl DomStrategy {
    fn read(rule: &Option<FieldRule>, scope: ElementRef<'_>) -> Option<String> {
        rule.as_ref().and_then(|r| r.apply(scope))
    }
}

impl ExtractionStrategy for DomStrategy {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn find_latest(&self, doc: &Document, _source: &SourceDescriptor) -> Option<ChangeKey> {
        let item = doc.as_html()?.select(&self.item).next()?;
        self.link.apply(item).map(ChangeKey::new)
    }

    fn detail_source(&self, key: &ChangeKey, source: &SourceDescriptor) -> DetailSource {
        match self.detail {
            Some(_) => DetailSource::Fetch {
                url: source.resolve(key.as_str()),
                kind: DocumentKind::Html,
            },
            None => DetailSource::SameDocument,
        }
    }

    fn extract(
        &self,
        doc: &Document,
        key: &ChangeKey,
        source: &SourceDescriptor,
    ) -> Option<ContentRecord> {
        let html = doc.as_html()?;
        let scope = match &self.detail {
            Some(container) => html.select(container).next()?,
            None => {
                let item = html.select(&self.item).next()?;
                // The listing moved on between find and extract.
                if self.link.apply(item).map(ChangeKey::new).as_ref() != Some(key) {
                    return None;
                }
                item
            }
        };

        let title = Self::read(&self.title, scope);
        let body = Self::read(&self.body, scope);
        if title.is_none() && body.is_none() {
            return None;
        }

        let image = Self::read(&self.image, scope).map(|src| source.resolve(&src));

        Some(
            ContentRecord::new(source.resolve(key.as_str()))
                .with_title(title)
                .with_body(body, BodyFormat::Plain)
                .with_image(image),
        )
    }
}
