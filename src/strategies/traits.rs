use crate::document::{Document, DocumentKind};
use crate::domain::{ChangeKey, ContentRecord, SourceDescriptor};

/// Where a strategy builds its content record from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailSource {
    /// The listing document already holds the full item.
    SameDocument,
    /// The item lives on its own page, fetched in a second request.
    Fetch { url: String, kind: DocumentKind },
}

/// Per-source logic for locating the latest item and building its record.
///
/// Navigation failures (missing element, missing attribute) are reported as
/// `None`; a cycle that gets `None` delivers nothing and changes no state.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name for logs and listings
    fn name(&self) -> &'static str;

    /// Kind of document the source URL serves
    fn listing_kind(&self) -> DocumentKind {
        DocumentKind::Html
    }

    /// Identify the latest item; must be deterministic for unchanged input
    fn find_latest(&self, doc: &Document, source: &SourceDescriptor) -> Option<ChangeKey>;

    /// Where `extract` expects its document to come from
    fn detail_source(&self, key: &ChangeKey, source: &SourceDescriptor) -> DetailSource;

    /// Build the content record for `key` from the listing or detail document
    fn extract(
        &self,
        doc: &Document,
        key: &ChangeKey,
        source: &SourceDescriptor,
    ) -> Option<ContentRecord>;
}
