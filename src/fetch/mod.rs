//! Fetchers turn a URL into raw document bytes.
//!
//! Pollers only see the [`Fetcher`] trait. A plain HTTP fetcher serves most
//! sources; sources flagged `render` are routed to a fetcher that runs page
//! scripts first (see [`render`]).

pub mod http;
pub mod render;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::SourceDescriptor;
use crate::errors::HeraldResult;

pub use http::{FetchConfig, HttpFetcher};
pub use render::CommandRenderer;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET the URL and return the response body
    async fn fetch(&self, url: &str) -> HeraldResult<Vec<u8>>;
}

/// The fetchers available to pollers, chosen per source.
#[derive(Clone)]
pub struct Fetchers {
    plain: Arc<dyn Fetcher>,
    rendered: Option<Arc<dyn Fetcher>>,
}

impl Fetchers {
    pub fn new(plain: Arc<dyn Fetcher>) -> Self {
        Self {
            plain,
            rendered: None,
        }
    }

    pub fn with_renderer(mut self, rendered: Option<Arc<dyn Fetcher>>) -> Self {
        self.rendered = rendered;
        self
    }

    /// Pick the fetcher for a source
    pub fn for_source(&self, source: &SourceDescriptor) -> Arc<dyn Fetcher> {
        match (&self.rendered, source.render) {
            (Some(rendered), true) => Arc::clone(rendered),
            (None, true) => {
                tracing::warn!(
                    source = %source.name,
                    "source wants a rendered fetch but no renderer is configured; using plain HTTP"
                );
                Arc::clone(&self.plain)
            }
            (_, false) => Arc::clone(&self.plain),
        }
    }
}
